//! Per-file upload metadata
//!
//! Computed once before the handshake and never mutated, so the hash sent in
//! the blob request is guaranteed to match the integrity header on the PUT.

use crate::error::Result;
use std::path::{Path, PathBuf};
use vgb_common::checksum::sha256_file;
use vgb_common::SanitizedName;

/// Everything the backend needs to know about a file before it sees the bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub path: PathBuf,
    pub content_type: String,
    pub content_length: u64,
    pub sha256: String,
    pub file_name: SanitizedName,
}

impl FileDescriptor {
    /// Read metadata and hash the file contents
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content_length = std::fs::metadata(path)?.len();
        let sha256 = sha256_file(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            content_type: content_type_for(path),
            content_length,
            sha256,
            file_name: SanitizedName::from_path(path),
        })
    }
}

/// MIME type guessed from the extension, `application/octet-stream` otherwise
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_descriptor_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("call 01.wav");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"hello world").unwrap();
        drop(file);

        let descriptor = FileDescriptor::from_path(&path).unwrap();
        assert_eq!(descriptor.content_length, 11);
        assert_eq!(
            descriptor.sha256,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(descriptor.file_name.as_str(), "call_01.wav");
        assert!(descriptor.content_type.starts_with("audio/"));
        assert_eq!(descriptor.path, path);
    }

    #[test]
    fn test_unknown_extension_is_octet_stream() {
        assert_eq!(
            content_type_for(Path::new("blob.zzunknown")),
            "application/octet-stream"
        );
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_missing_file() {
        assert!(FileDescriptor::from_path("/nope/missing.wav").is_err());
    }
}
