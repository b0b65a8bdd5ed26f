pub mod driver;
pub mod error;
pub mod session;
pub mod synthetic;
