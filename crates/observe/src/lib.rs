//! This crate is intended to contain code that is required to provide or
//! improve the observability of a system. At the moment that is the
//! initialization logic for logging shared by the binaries.
pub mod config;
pub mod tracing;

pub use config::Config;
