//! SHA-256 digests for upload integrity
//!
//! The hex digest is sent with the blob request and repeated as the
//! `X-Amz-Content-Sha256` header on the binary upload, so both must come
//! from the same bytes on disk.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Compute the hex SHA-256 of a file, streaming it in 8 KiB blocks
pub fn sha256_file(path: impl AsRef<Path>) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    sha256_reader(&mut file)
}

/// Compute the hex SHA-256 of any readable source
pub fn sha256_reader<R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the hex SHA-256 of an in-memory buffer
pub fn sha256_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_sha256_reader() {
        let mut cursor = Cursor::new(b"hello world");
        let checksum = sha256_reader(&mut cursor).unwrap();
        assert_eq!(checksum, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
    }

    #[test]
    fn test_sha256_empty() {
        assert_eq!(
            sha256_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sha256_file_matches_bytes() {
        let mut temp_file = NamedTempFile::new().unwrap();
        // Larger than one read block
        let data = vec![7u8; 20_000];
        temp_file.write_all(&data).unwrap();
        temp_file.flush().unwrap();

        let from_file = sha256_file(temp_file.path()).unwrap();
        assert_eq!(from_file.len(), 64);
        assert_eq!(from_file, sha256_bytes(&data));
    }

    #[test]
    fn test_sha256_missing_file() {
        assert!(sha256_file("/definitely/not/here.wav").is_err());
    }
}
