//! Common utilities shared across the orchestrator

pub mod error;
pub mod logging;

pub use error::{Error, Result};
