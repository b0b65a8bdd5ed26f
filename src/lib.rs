pub mod browser;
pub mod cli;
pub mod explorer;
pub mod report;
pub mod screen;
pub mod state;
pub mod trace;

pub use browser::driver::{UiDriver, ViewId};
pub use explorer::config::ExplorerConfig;
pub use explorer::error::{ExploreError, RunAborted};
pub use explorer::explorer::{CancelFlag, Explorer, explore};
pub use report::report_model::Report;
