use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the call-log pipeline.
#[derive(Error, Debug)]
pub enum EtlError {
    /// An input CSV file does not exist.
    #[error("{kind} CSV file not found: {path}")]
    InputNotFound { kind: &'static str, path: PathBuf },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A non-integer value in an integer column while loading in strict mode.
    #[error("Invalid integer in {field} at line {line}: {value:?}")]
    RowParse {
        line: u64,
        field: &'static str,
        value: String,
    },

    /// The relational store rejected a statement.
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// The CSV reader or writer failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EtlError {
    /// `true` for the one failure the entry point recovers from with a
    /// printed diagnostic instead of a non-zero exit.
    pub fn is_missing_input(&self) -> bool {
        matches!(self, EtlError::InputNotFound { .. })
    }
}

/// Convenience alias used throughout the ETL crates.
pub type Result<T> = std::result::Result<T, EtlError>;
