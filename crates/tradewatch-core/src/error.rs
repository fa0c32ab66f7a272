//! Error types for tradewatch-core.

use thiserror::Error;

use crate::monitor::MonitorKind;

/// Result type alias for monitor operations
pub type MonitorResult<T> = std::result::Result<T, MonitorError>;

/// Result type alias for config store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a monitor's own start/stop/release handshake.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("{kind} failed to start: {message}")]
    Start { kind: MonitorKind, message: String },

    #[error("{kind} failed to stop: {message}")]
    Stop { kind: MonitorKind, message: String },

    #[error("{kind} is already running")]
    AlreadyRunning { kind: MonitorKind },
}

impl MonitorError {
    /// Create a start failure
    pub fn start(kind: MonitorKind, message: impl Into<String>) -> Self {
        Self::Start {
            kind,
            message: message.into(),
        }
    }

    /// Create a stop failure
    pub fn stop(kind: MonitorKind, message: impl Into<String>) -> Self {
        Self::Stop {
            kind,
            message: message.into(),
        }
    }
}

/// Errors from persisting or loading the enablement options.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Check if the underlying file was simply missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Failure to parse a monitor name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown monitor kind: {0}")]
pub struct UnknownMonitorKind(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_monitor() {
        let err = MonitorError::start(MonitorKind::StopLoss, "exchange offline");
        assert!(err.to_string().contains("stopLoss"));
        assert!(err.to_string().contains("exchange offline"));

        let err = MonitorError::stop(MonitorKind::OrderCondition, "hung");
        assert!(err.to_string().contains("orderCondition"));
    }

    #[test]
    fn test_store_error_not_found() {
        let err = StoreError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.is_not_found());

        let err = StoreError::Unavailable("read-only".into());
        assert!(!err.is_not_found());
    }
}
