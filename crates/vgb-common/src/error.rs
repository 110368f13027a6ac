//! Error types for VGB

use thiserror::Error;

/// Result type alias for VGB operations
pub type Result<T> = std::result::Result<T, VgbError>;

/// Main error type for VGB
#[derive(Error, Debug)]
pub enum VgbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Parse error: {0}")]
    Parse(String),
}
