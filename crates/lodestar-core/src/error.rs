//! Error types for lodestar

use thiserror::Error;

/// Main error type for lodestar
#[derive(Error, Debug)]
pub enum LodestarError {
    /// Dial target could not be parsed
    #[error("Invalid target: {0}")]
    Target(String),

    /// Registry client construction or query error
    #[error("Registry error: {0}")]
    Registry(String),

    /// The address sink rejected an update
    #[error("Sink rejected update: {0}")]
    Sink(String),
}

/// Result type for lodestar operations
pub type LodestarResult<T> = Result<T, LodestarError>;
