// src/error.rs

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Core error types for rpmprobe
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Package file cannot be opened or is not an RPM
    #[error("Invalid package: {0}")]
    Format(String),

    /// Header tags are inconsistent (parallel arrays disagree, bad indexes)
    #[error("Corrupt or unsupported header: {0}")]
    DecodingDefect(String),

    /// Base working directory is missing or not a directory
    #[error("Unable to access directory: {}", .0.display())]
    Path(PathBuf),

    /// External program could not be started
    #[error("Failed to run {tool}: {source}")]
    Tool {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// Archive extraction did not finish in time
    #[error("Extraction timed out after {0:?}")]
    ExtractionTimeout(Duration),

    /// File type identification did not finish in time
    #[error("File identification timed out after {0:?}")]
    IdentificationTimeout(Duration),

    /// Extraction requested after the working tree was cleaned up
    #[error("Extracted tree has already been cleaned up")]
    Disposed,

    /// Invalid search pattern
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type alias using rpmprobe's Error type
pub type Result<T> = std::result::Result<T, Error>;
