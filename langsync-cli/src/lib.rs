//! CLI library for testing purposes

pub mod config;
pub mod edit;
pub mod status;
pub mod sync;
pub mod validation;

pub use config::Config;
