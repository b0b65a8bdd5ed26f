pub mod config;
pub mod error;
pub mod executor;
pub mod explorer;
pub mod path;
pub mod signal;
