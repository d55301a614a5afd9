// Centralized error handling module
// Error taxonomy for digesting, batch control, export and settings

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for hash calculation
#[derive(Debug, Error)]
pub enum HashCalcError {
    /// The requested algorithm name is not one of MD5, SHA1, SHA256, SHA512
    #[error("Invalid hash algorithm: {name} (expected one of MD5, SHA1, SHA256, SHA512)")]
    InvalidAlgorithm { name: String },

    /// File system errors with context
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Permission denied while {operation} file: {}", path.display())]
    PermissionDenied { path: PathBuf, operation: String },

    #[error("I/O error while {operation}{}: {source}", fmt_path(path))]
    Io {
        path: Option<PathBuf>,
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Writing an export file failed
    #[error("Failed to export hash list to {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Settings file could not be read or parsed
    #[error("Invalid settings file {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// A batch is already active on this coordinator
    #[error("A hash calculation batch is already running")]
    BatchAlreadyRunning,

    /// The background batch thread could not be spawned or panicked
    #[error("Batch thread failure: {reason}")]
    Thread { reason: String },
}

fn fmt_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" file {}", p.display()),
        None => String::new(),
    }
}

impl HashCalcError {
    /// Create an error with context about the operation and optional path,
    /// narrowing not-found and permission errors when a path is known
    pub fn from_io_error(err: io::Error, operation: &str, path: Option<PathBuf>) -> Self {
        match (err.kind(), path) {
            (io::ErrorKind::NotFound, Some(p)) => HashCalcError::FileNotFound { path: p },
            (io::ErrorKind::PermissionDenied, Some(p)) => HashCalcError::PermissionDenied {
                path: p,
                operation: operation.to_string(),
            },
            (_, path) => HashCalcError::Io {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    /// True for per-file access failures that a batch records as a blank hash
    pub fn is_file_access(&self) -> bool {
        matches!(
            self,
            HashCalcError::FileNotFound { .. }
                | HashCalcError::PermissionDenied { .. }
                | HashCalcError::Io { .. }
        )
    }
}

impl From<io::Error> for HashCalcError {
    fn from(err: io::Error) -> Self {
        HashCalcError::from_io_error(err, "unknown operation", None)
    }
}

pub type Result<T> = std::result::Result<T, HashCalcError>;
