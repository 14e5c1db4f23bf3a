//! Error types for reanalysis extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using ExtractError.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Primary error type for extraction operations.
#[derive(Debug, Error)]
pub enum ExtractError {
    // === Request validation (raised before any file I/O) ===
    #[error("Undefined parameter '{param}' for the {archive} archive")]
    UndefinedParameter { param: String, archive: String },

    #[error("Outside archive extent: {0}")]
    OutOfRange(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    // === Archive content ===
    #[error("Missing required file: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("Files are not in time order: {0}")]
    OutOfOrder(String),

    #[error("Shape mismatch: expected {expected} hourly samples, got {actual} ({context})")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        context: String,
    },

    #[error("Failed to read data: {0}")]
    Read(String),

    // === Output archive ===
    #[error("Archive schema mismatch in {}: {message}", path.display())]
    ArchiveSchemaMismatch { path: PathBuf, message: String },

    #[error("Failed to write archive: {0}")]
    Write(String),

    // === Setup ===
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractError {
    pub fn undefined_parameter(param: impl Into<String>, archive: impl Into<String>) -> Self {
        Self::UndefinedParameter {
            param: param.into(),
            archive: archive.into(),
        }
    }

    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::OutOfRange(msg.into())
    }

    pub fn missing_file(path: impl Into<PathBuf>) -> Self {
        Self::MissingFile { path: path.into() }
    }

    pub fn shape_mismatch(expected: usize, actual: usize, context: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected,
            actual,
            context: context.into(),
        }
    }

    pub fn schema_mismatch(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ArchiveSchemaMismatch {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    /// Short name of the error class, used in batch failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::UndefinedParameter { .. } => "UndefinedParameterError",
            ExtractError::OutOfRange(_) => "OutOfRangeError",
            ExtractError::InvalidTime(_) => "InvalidTimeError",
            ExtractError::MissingFile { .. } => "MissingFileError",
            ExtractError::OutOfOrder(_) => "OutOfOrderError",
            ExtractError::ShapeMismatch { .. } => "ShapeMismatchError",
            ExtractError::Read(_) => "ReadError",
            ExtractError::ArchiveSchemaMismatch { .. } => "ArchiveSchemaMismatchError",
            ExtractError::Write(_) => "WriteError",
            ExtractError::Config(_) => "ConfigError",
        }
    }

    /// Whether this error was raised by request validation, i.e. before any file was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ExtractError::UndefinedParameter { .. }
                | ExtractError::OutOfRange(_)
                | ExtractError::InvalidTime(_)
        )
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(err: std::io::Error) -> Self {
        ExtractError::Read(err.to_string())
    }
}
