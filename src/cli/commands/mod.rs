//! CLI command implementations

pub mod config;
pub mod get;

pub use config::execute as config;
pub use get::execute as get;
