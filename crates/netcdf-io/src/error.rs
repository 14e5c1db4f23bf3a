//! Error types for NetCDF operations.

use std::path::PathBuf;

use reanalysis_common::ExtractError;
use thiserror::Error;

/// Result type for NetCDF operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF reading and writing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error reported by the NetCDF library
    #[error("NetCDF error: {0}")]
    Library(#[from] netcdf::Error),

    /// File does not exist
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Missing required variable, dimension or attribute
    #[error("Missing required data in {}: {name}", path.display())]
    MissingData { name: String, path: PathBuf },

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Time axis could not be decoded
    #[error("Invalid time axis: {0}")]
    InvalidTime(String),

    /// Existing archive does not match what is being appended
    #[error("Archive schema mismatch in {}: {message}", path.display())]
    SchemaMismatch { path: PathBuf, message: String },

    /// Archive could not be created or extended
    #[error("Failed to write {}: {message}", path.display())]
    WriteFailed { path: PathBuf, message: String },
}

impl NetCdfError {
    pub fn missing(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingData {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn schema_mismatch(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn write_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<NetCdfError> for ExtractError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::FileNotFound { path } => ExtractError::MissingFile { path },
            NetCdfError::SchemaMismatch { path, message } => {
                ExtractError::ArchiveSchemaMismatch { path, message }
            }
            NetCdfError::WriteFailed { path, message } => {
                ExtractError::Write(format!("{}: {}", path.display(), message))
            }
            other => ExtractError::Read(other.to_string()),
        }
    }
}
