/*!
 * Error types for midsync
 */

use std::fmt;
use std::io;
use std::path::PathBuf;

use midsync_core_manifest::Error as ManifestError;

pub type Result<T> = std::result::Result<T, MidsyncError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

/// Kind of filesystem object a command argument must be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Directory,
    File,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::Directory => write!(f, "directory"),
            PathKind::File => write!(f, "file"),
        }
    }
}

#[derive(Debug)]
pub enum MidsyncError {
    /// A command argument is not the expected kind of filesystem object
    InvalidArgument { path: PathBuf, expected: PathKind },

    /// Path that cannot be used (no usable name, not valid UTF-8, ...)
    InvalidPath(PathBuf),

    /// I/O error
    Io(io::Error),

    /// Request manifest could not be parsed, validated or persisted
    Manifest(ManifestError),

    /// Configuration error
    Config(String),

    /// Another responder holds the lock for this request
    Locked(PathBuf),

    /// Metadata operation failed
    MetadataFailed(String),
}

impl MidsyncError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() {
            EXIT_FATAL
        } else {
            EXIT_PARTIAL
        }
    }

    /// Check if this error is fatal (rerunning unchanged cannot succeed)
    pub fn is_fatal(&self) -> bool {
        match self {
            MidsyncError::InvalidArgument { .. } => true,
            MidsyncError::InvalidPath(_) => true,
            MidsyncError::Config(_) => true,
            MidsyncError::Locked(_) => true,
            MidsyncError::Manifest(err) => {
                err.is_corrupt_manifest() || matches!(err, ManifestError::ManifestNotFound { .. })
            }

            MidsyncError::Io(_) => false,
            MidsyncError::MetadataFailed(_) => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            MidsyncError::InvalidArgument { .. } | MidsyncError::InvalidPath(_) => {
                ErrorCategory::Validation
            }
            MidsyncError::Io(_) => ErrorCategory::IoError,
            MidsyncError::Manifest(_) => ErrorCategory::Manifest,
            MidsyncError::Config(_) => ErrorCategory::Configuration,
            MidsyncError::Locked(_) => ErrorCategory::Concurrency,
            MidsyncError::MetadataFailed(_) => ErrorCategory::Metadata,
        }
    }

    pub fn not_a_directory<P: Into<PathBuf>>(path: P) -> Self {
        MidsyncError::InvalidArgument {
            path: path.into(),
            expected: PathKind::Directory,
        }
    }

    pub fn not_a_file<P: Into<PathBuf>>(path: P) -> Self {
        MidsyncError::InvalidArgument {
            path: path.into(),
            expected: PathKind::File,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Argument and path validation errors
    Validation,
    /// I/O operation errors
    IoError,
    /// Request manifest errors
    Manifest,
    /// Configuration errors
    Configuration,
    /// Lock contention between responders
    Concurrency,
    /// Metadata preservation errors
    Metadata,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Manifest => write!(f, "manifest"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Concurrency => write!(f, "concurrency"),
            ErrorCategory::Metadata => write!(f, "metadata"),
        }
    }
}

impl fmt::Display for MidsyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidsyncError::InvalidArgument { path, expected } => {
                write!(f, "'{}' is not a {}.", path.display(), expected)
            }
            MidsyncError::InvalidPath(path) => {
                write!(f, "Invalid path: {}", path.display())
            }
            MidsyncError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
            MidsyncError::Manifest(err) => {
                write!(f, "Request manifest error: {}", err)
            }
            MidsyncError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            MidsyncError::Locked(path) => {
                write!(
                    f,
                    "Request is locked by another responder: {}",
                    path.display()
                )
            }
            MidsyncError::MetadataFailed(msg) => {
                write!(f, "Metadata operation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for MidsyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MidsyncError::Io(err) => Some(err),
            MidsyncError::Manifest(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MidsyncError {
    fn from(err: io::Error) -> Self {
        MidsyncError::Io(err)
    }
}

impl From<ManifestError> for MidsyncError {
    fn from(err: ManifestError) -> Self {
        match err {
            ManifestError::Io(io_err) => MidsyncError::Io(io_err),
            other => MidsyncError::Manifest(other),
        }
    }
}

impl From<serde_json::Error> for MidsyncError {
    fn from(err: serde_json::Error) -> Self {
        MidsyncError::Manifest(ManifestError::Json(err))
    }
}

impl From<walkdir::Error> for MidsyncError {
    fn from(err: walkdir::Error) -> Self {
        let kind = err
            .io_error()
            .map(|e| e.kind())
            .unwrap_or(io::ErrorKind::Other);
        MidsyncError::Io(io::Error::new(kind, err))
    }
}
