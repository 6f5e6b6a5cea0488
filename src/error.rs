//! Unified error hierarchy for fittrack
//!
//! Aggregation functions never fail; errors only arise at the edges
//! (loading history files, reading configuration, CLI input).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for fallible fittrack operations
#[derive(Debug, Error)]
pub enum FitTrackError {
    /// History loading errors
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid user input (CLI arguments, dates)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised while reading workout history
#[derive(Debug, Error)]
pub enum HistoryError {
    /// File not found at specified path
    #[error("History file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unsupported file format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Top-level document has the wrong shape
    #[error("Invalid data structure: {reason}")]
    InvalidStructure { reason: String },

    /// Missing required column or field
    #[error("Missing required data: {field}")]
    MissingData { field: String },
}

/// Result type alias for fittrack operations
pub type Result<T> = std::result::Result<T, FitTrackError>;

impl FitTrackError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FitTrackError::History(HistoryError::FileNotFound { .. }) => ErrorSeverity::Warning,
            FitTrackError::InvalidInput(_) => ErrorSeverity::Warning,
            FitTrackError::Io(_) => ErrorSeverity::Error,
            FitTrackError::Configuration(_)
            | FitTrackError::ConfigParse(_)
            | FitTrackError::ConfigSerialize(_) => ErrorSeverity::Error,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            FitTrackError::History(HistoryError::FileNotFound { path }) => {
                format!("Could not find workout history: {}", path.display())
            }
            FitTrackError::History(HistoryError::UnsupportedFormat { format }) => {
                format!("Workout history must be a .json or .csv file (got '{}')", format)
            }
            FitTrackError::ConfigParse(_) => {
                "Configuration file is not valid TOML. Run `fittrack config --init` to recreate it."
                    .to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}
