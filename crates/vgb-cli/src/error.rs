//! Error types for the VGB CLI
//!
//! Run-level errors (configuration, input directory) stop the batch before any
//! file is touched. Everything else is scoped to one file: the processor
//! catches it at the file boundary and its `Display` text becomes the
//! `reason` column of that file's row.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Which leg of the upload handshake failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    CreateBlob,
    PutBytes,
    RegisterFile,
}

impl std::fmt::Display for UploadStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStep::CreateBlob => write!(f, "blob creation"),
            UploadStep::PutBytes => write!(f, "binary upload"),
            UploadStep::RegisterFile => write!(f, "file registration"),
        }
    }
}

/// Error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check --backend-url/--api-key or the BACKEND_URL/API_KEY environment variables.")]
    Config(String),

    /// Input directory does not exist or is not a directory
    #[error("'{0}' is not a valid directory")]
    InvalidDirectory(String),

    /// One step of the upload handshake failed
    #[error("Upload failed during {step}: {message}")]
    Upload { step: UploadStep, message: String },

    /// The backend accepted the blob but returned no file record
    #[error("Failed to create file in backend system: {0}")]
    Registration(String),

    /// Non-success HTTP status or malformed body from the backend
    #[error("Request failed: {0}")]
    Api(String),

    /// The backend answered with a GraphQL `errors` array
    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    /// Results table could not be written or read
    #[error("Results table error: {0}")]
    Csv(#[from] csv::Error),

    /// No results row matches the file being updated
    #[error("No results row for {0}")]
    MissingRow(String),

    /// File system operation failed
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failed
    #[error("Network request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Shared library error (checksums, status transitions)
    #[error(transparent)]
    Common(#[from] vgb_common::VgbError),
}

impl CliError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }

    /// Attach the handshake step to an error raised while performing it
    pub fn during(step: UploadStep, err: CliError) -> Self {
        match err {
            already @ CliError::Upload { .. } => already,
            other => Self::Upload {
                step,
                message: other.to_string(),
            },
        }
    }
}
