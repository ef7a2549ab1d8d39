use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core errors for the sampler and its configuration
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sampler is already running")]
    AlreadyRunning,

    #[error("Sampling thread panicked; sensors are gone")]
    WorkerLost,

    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub fn is_invalid_config(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}

/// Why a sensor could not produce a value.
///
/// Sensor failures are data: they travel inside a [`crate::Reading`] and are
/// never raised to the sampler.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorError {
    #[error("not installed")]
    NotInstalled,

    #[error("permission denied")]
    PermissionDenied,

    #[error("unparseable output")]
    ParseError,

    #[error("timed out")]
    Timeout,

    /// Switched off in the config; the sensor is not asked
    #[error("disabled")]
    Disabled,
}

impl SensorError {
    /// Map an I/O failure from spawning or reading a source onto the taxonomy
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotInstalled,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            std::io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::ParseError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error_mapping() {
        let not_found = io::Error::new(io::ErrorKind::NotFound, "radeontop");
        assert_eq!(SensorError::from_io(&not_found), SensorError::NotInstalled);

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "radeontop");
        assert_eq!(SensorError::from_io(&denied), SensorError::PermissionDenied);

        let other = io::Error::new(io::ErrorKind::InvalidData, "garbage");
        assert_eq!(SensorError::from_io(&other), SensorError::ParseError);
    }

    #[test]
    fn test_invalid_config_predicate() {
        assert!(CoreError::invalid_config("interval 3").is_invalid_config());
        assert!(!CoreError::config("unreadable").is_invalid_config());
        assert!(!CoreError::AlreadyRunning.is_invalid_config());
    }
}
