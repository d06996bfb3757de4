//! Unified error hierarchy for MyFlow
//!
//! Only malformed top-level input, I/O and configuration problems are fatal.
//! Data quality issues inside a batch are recovered locally: missing fields
//! take defaults and zero-variance ratios become 0. Too few days surfaces
//! here only when a caller explicitly asks for a `Result`.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all MyFlow operations
#[derive(Debug, Error)]
pub enum MyFlowError {
    /// Input could not be turned into daily records at all
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Analysis could not produce a value
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Report writing errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Fatal input shape errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// Payload is not valid JSON
    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is JSON but not an array of records
    #[error("Expected a JSON array of daily records, found {found}")]
    NotAnArray { found: String },

    /// Input file could not be read
    #[error("Could not read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Recoverable analysis conditions, surfaced only through `Result`-returning APIs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Fewer days than the component needs
    #[error("Insufficient data for {analysis}: {reason}")]
    InsufficientData { analysis: String, reason: String },
}

impl AnalysisError {
    pub fn insufficient(analysis: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::InsufficientData {
            analysis: analysis.into(),
            reason: reason.into(),
        }
    }
}

/// Report export errors
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Chart rendering failed: {0}")]
    Chart(String),
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

/// Result type alias for MyFlow operations
pub type Result<T> = std::result::Result<T, MyFlowError>;

impl MyFlowError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MyFlowError::Analysis(_) => ErrorSeverity::Info,
            MyFlowError::Ingest(IngestError::Unreadable { .. }) => ErrorSeverity::Warning,
            MyFlowError::Ingest(_) => ErrorSeverity::Error,
            MyFlowError::Configuration(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            MyFlowError::Ingest(IngestError::Unreadable { path, .. }) => {
                format!("Could not read your tracking log: {}", path.display())
            }
            MyFlowError::Ingest(IngestError::NotAnArray { .. }) => {
                "Your tracking log must be a list of daily entries.".to_string()
            }
            MyFlowError::Analysis(AnalysisError::InsufficientData { analysis, .. }) => {
                format!(
                    "Not enough data yet for {}. Keep tracking and try again.",
                    analysis
                )
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
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = MyFlowError::Analysis(AnalysisError::insufficient("pacing", "6 days"));
        assert_eq!(err.severity(), ErrorSeverity::Info);

        let err = MyFlowError::Ingest(IngestError::NotAnArray {
            found: "object".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Error);

        let err = MyFlowError::Configuration("bad ratio".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_user_messages() {
        let err = MyFlowError::Ingest(IngestError::Unreadable {
            path: PathBuf::from("log.json"),
            reason: "missing".to_string(),
        });
        assert!(err.user_message().contains("log.json"));

        let err = MyFlowError::Analysis(AnalysisError::insufficient("sleep analysis", "3 days"));
        assert!(err.user_message().contains("sleep analysis"));
    }

    #[test]
    fn test_display() {
        let err = AnalysisError::insufficient("pacing", "6 of 7 days");
        assert_eq!(err.to_string(), "Insufficient data for pacing: 6 of 7 days");
    }
}
