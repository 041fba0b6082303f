use crate::types::Modality;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for drlcheck operations
pub type Result<T> = std::result::Result<T, DrlError>;

/// Error types for drlcheck operations
#[derive(Error, Debug)]
pub enum DrlError {
    /// Configuration storage could not be read or written
    #[error("{modality} configuration I/O error at {}: {source}", path.display())]
    ConfigIo {
        modality: Modality,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Persisted configuration document is malformed
    #[error("{modality} configuration at {} is malformed: {source}", path.display())]
    ConfigParse {
        modality: Modality,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Protocol rejected before persistence
    #[error("Invalid protocol '{protocol}': {reason}")]
    Validation { protocol: String, reason: String },

    /// Tabular import aborted; prior configuration is untouched
    #[error("Import failed at row {row}, column '{column}': {message}")]
    Import {
        row: usize,
        column: String,
        message: String,
    },

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Value could not be rendered as JSON
    #[error("JSON serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Exam record input could not be read
    #[error("Exam record error: {0}")]
    RecordParse(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DrlError {
    /// Builds a validation error for the named protocol
    pub fn validation(protocol: &str, reason: impl Into<String>) -> Self {
        DrlError::Validation {
            protocol: protocol.to_string(),
            reason: reason.into(),
        }
    }

    /// Builds an import error for a data row and column
    pub fn import(row: usize, column: &str, message: impl Into<String>) -> Self {
        DrlError::Import {
            row,
            column: column.to_string(),
            message: message.into(),
        }
    }
}
