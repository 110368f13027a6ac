//! VGB Common Library
//!
//! Shared types, utilities, and error handling for the VGB workspace.
//!
//! # Overview
//!
//! - **Error Handling**: Common error and result types
//! - **Checksums**: Streaming SHA-256 digests used as the upload integrity token
//! - **Logging**: Console/file tracing setup with per-sink verbosity
//! - **Types**: Row lifecycle status and sanitized upload names
//!
//! # Example
//!
//! ```no_run
//! use vgb_common::checksum::sha256_file;
//! use vgb_common::types::SanitizedName;
//!
//! fn describe(path: &str) -> vgb_common::Result<()> {
//!     let digest = sha256_file(path)?;
//!     let name = SanitizedName::from_path(path);
//!     println!("{} {}", name, digest);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, VgbError};
pub use types::{RowStatus, SanitizedName};
