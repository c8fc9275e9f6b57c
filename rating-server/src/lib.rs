//! Rating Server Library
//!
//! This library wires the rating engine to an HTTP surface, including
//! configuration management, error handling, and dependency injection.

pub mod config;
pub mod errors;
pub mod server;

pub use config::{Dependencies, Settings};
pub use errors::ServerError;
