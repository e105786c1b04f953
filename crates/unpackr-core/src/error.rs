//! Error types for unpackr-core

use crate::archive::ArchiveFormat;
use std::path::PathBuf;
use thiserror::Error;

/// Core error types for the unpackr library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid instance of the probed format
    #[error("{format} extraction failed: {message}")]
    Decode {
        format: ArchiveFormat,
        message: String,
    },

    /// Every configured format probe rejected the archive
    #[error("Extraction failed: {}: {}", path.display(), reasons.join("; "))]
    ExtractionFailed { path: PathBuf, reasons: Vec<String> },

    /// Standard deletion was refused by the operating system
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// Deletion failed even after the forced fallback
    #[error("Deletion failed: {}: {message}", path.display())]
    DeletionFailed { path: PathBuf, message: String },

    /// Invalid file or directory path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Some archives failed during a walk
    #[error("Partial failure: {count} operations failed")]
    PartialFailure { count: u32 },

    /// Generic error for other cases
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Build a decode error for `format` from any displayable cause
    pub fn decode(format: ArchiveFormat, cause: impl std::fmt::Display) -> Self {
        Error::Decode {
            format,
            message: cause.to_string(),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::Io(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
