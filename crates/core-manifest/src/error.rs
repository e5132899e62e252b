//! Error types for manifest operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during manifest operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },

    /// Entry key that would escape the staging subtree or is not a relative path
    #[error("Invalid path token '{token}': {reason}")]
    InvalidToken { token: String, reason: String },

    /// Subject name that is not a single plain path component
    #[error("Invalid subject name '{0}'")]
    InvalidName(String),

    /// Filesystem path that cannot be expressed as a token
    #[error("Invalid path: {path}")]
    InvalidPath { path: PathBuf },

    /// Manifest file not found
    #[error("Manifest not found: {path}")]
    ManifestNotFound { path: PathBuf },
}

impl Error {
    /// Create a version mismatch error
    pub fn version_mismatch<S: Into<String>>(expected: S, found: S) -> Self {
        Error::VersionMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an invalid token error
    pub fn invalid_token<T: Into<String>, R: Into<String>>(token: T, reason: R) -> Self {
        Error::InvalidToken {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path<P: Into<PathBuf>>(path: P) -> Self {
        Error::InvalidPath { path: path.into() }
    }

    /// Create a manifest not found error
    pub fn manifest_not_found<P: Into<PathBuf>>(path: P) -> Self {
        Error::ManifestNotFound { path: path.into() }
    }

    /// True when the error means the document itself is unusable, as opposed
    /// to the filesystem failing underneath it
    pub fn is_corrupt_manifest(&self) -> bool {
        matches!(
            self,
            Error::Json(_)
                | Error::VersionMismatch { .. }
                | Error::InvalidToken { .. }
                | Error::InvalidName(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_mismatch_error() {
        let err = Error::version_mismatch("v1", "v2");
        assert!(matches!(err, Error::VersionMismatch { .. }));
        assert!(err.to_string().contains("expected v1"));
        assert!(err.to_string().contains("found v2"));
        assert!(err.is_corrupt_manifest());
    }

    #[test]
    fn test_invalid_token_error() {
        let err = Error::invalid_token("../etc/passwd", "parent directory component");
        let msg = err.to_string();
        assert!(msg.contains("../etc/passwd"));
        assert!(msg.contains("parent directory component"));
    }

    #[test]
    fn test_io_error_is_not_corruption() {
        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(!err.is_corrupt_manifest());
        assert!(!Error::manifest_not_found("/mid/x.midsync").is_corrupt_manifest());
    }
}
