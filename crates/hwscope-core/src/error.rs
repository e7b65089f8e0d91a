//! Error types for hwscope-core.
//!
//! Nothing in the monitoring core is fatal. Errors surface in these places:
//!
//! | Error | Raised by | Session reaction |
//! |-------|-----------|------------------|
//! | [`Error::Settings`] | [`crate::SettingsStore::save`] | Non-fatal notice, in-memory state kept |
//! | [`Error::Hardware`] | [`crate::HardwareHost::update`] / `reset` | Logged, reported in the refresh result |
//! | [`Error::Logger`] | [`crate::SensorLogger::log`] | Logged, refresh still completes |
//! | [`Error::ChannelClosed`] | [`crate::SessionHandle`] | Session is gone; caller stops |
//!
//! Topology inconsistencies (removing an unknown device, duplicate add
//! notifications) and ticks that arrive during a refresh are not errors at all;
//! they are ignored and traced at `debug` level.

use thiserror::Error;

/// Errors that can occur in the monitoring core.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Loading or saving settings failed.
    #[error("Settings error: {0}")]
    Settings(String),

    /// The hardware layer failed to refresh or reset.
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Appending a log record failed.
    #[error("Logger error: {0}")]
    Logger(String),

    /// The session loop has stopped and no longer accepts commands.
    #[error("Session channel closed")]
    ChannelClosed,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Value parsing failed.
    #[error(transparent)]
    Parse(#[from] hwscope_types::ParseError),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a settings error.
    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings(message.into())
    }

    /// Create a hardware error.
    pub fn hardware(message: impl Into<String>) -> Self {
        Self::Hardware(message.into())
    }

    /// Create a logger error.
    pub fn logger(message: impl Into<String>) -> Self {
        Self::Logger(message.into())
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Error::ChannelClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::ChannelClosed
    }
}

/// Result type alias using hwscope-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::settings("disk full");
        assert_eq!(err.to_string(), "Settings error: disk full");

        let err = Error::hardware("SMBus timeout");
        assert!(err.to_string().contains("SMBus timeout"));

        let err = Error::ChannelClosed;
        assert_eq!(err.to_string(), "Session channel closed");

        let err = Error::invalid_config("palette must not be empty");
        assert!(err.to_string().starts_with("Invalid configuration"));
    }

    #[test]
    fn test_parse_error_conversion() {
        let parse = "#12".parse::<hwscope_types::Rgb>().unwrap_err();
        let err: Error = parse.into();
        assert!(matches!(err, Error::Parse(_)));
        assert!(err.to_string().contains("#12"));
    }

    #[tokio::test]
    async fn test_send_error_conversion() {
        let (tx, rx) = tokio::sync::mpsc::channel::<u8>(1);
        drop(rx);
        let err: Error = tx.send(1).await.unwrap_err().into();
        assert!(matches!(err, Error::ChannelClosed));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("read-only"));
    }
}
