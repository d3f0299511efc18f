//! sinklog core - Shared types, configuration, and error handling

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::*;
pub use constants::*;
pub use error::{error_chain, Error, FatalError, Result};
pub use types::*;

/// Re-exported so `Fields` values can be built without a direct dependency.
pub use serde_json::{self, Value};
