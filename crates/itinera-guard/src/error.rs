//! Error types for itinera-guard.

use thiserror::Error;

/// Result type for itinera-guard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building the guards.
#[derive(Error, Debug)]
pub enum Error {
    /// A built-in pattern failed to compile.
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}
