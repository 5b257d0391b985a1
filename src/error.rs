//! Error handling for the market simulator
//!
//! Pass-through matching never fails; these errors come from strict
//! validation, configuration, and loading replay data.

use crate::config::ConfigError;
use crate::types::Side;
use std::io;

/// Main error type for the simulator
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Invalid {side} order: {reason}")]
    InvalidOrder { side: Side, reason: String },

    #[error("Invalid bar #{index}: {reason}")]
    InvalidBar { index: u64, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("File read error: {0}")]
    FileRead(String),

    #[error("File write error: {0}")]
    FileWrite(String),

    #[error("Data parse error: {0}")]
    DataParse(String),

    #[error("Replay error: {0}")]
    Replay(String),
}

impl SimError {
    /// Error category for log grouping
    pub fn category(&self) -> &'static str {
        match self {
            SimError::InvalidOrder { .. } | SimError::InvalidBar { .. } => "validation",
            SimError::Config(_) => "config",
            SimError::FileNotFound(_) | SimError::FileRead(_) | SimError::FileWrite(_) => "io",
            SimError::DataParse(_) => "data",
            SimError::Replay(_) => "replay",
        }
    }

    pub fn is_validation(&self) -> bool {
        self.category() == "validation"
    }
}

impl From<io::Error> for SimError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => SimError::FileNotFound(err.to_string()),
            _ => SimError::FileRead(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::DataParse(format!("JSON error: {}", err))
    }
}

/// Result type alias using SimError
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::InvalidOrder {
            side: Side::Sell,
            reason: "price must be positive".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid sell order: price must be positive");
    }

    #[test]
    fn test_error_category() {
        let err = SimError::InvalidBar { index: 3, reason: "test".to_string() };
        assert_eq!(err.category(), "validation");
        assert!(err.is_validation());

        let err = SimError::Config(ConfigError::Validation("test".to_string()));
        assert_eq!(err.category(), "config");

        let err = SimError::DataParse("test".to_string());
        assert_eq!(err.category(), "data");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "bars.json");
        let err: SimError = io_err.into();
        assert!(matches!(err, SimError::FileNotFound(_)));
        assert_eq!(err.category(), "io");
    }

    #[test]
    fn test_json_conversion() {
        let json_err = serde_json::from_str::<Vec<f64>>("[1.0,").unwrap_err();
        let err: SimError = json_err.into();
        assert!(matches!(err, SimError::DataParse(_)));
    }
}
