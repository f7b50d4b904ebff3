use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
///
/// The scan path never produces these: unreadable directories become empty
/// listings. They only surface at the edges (startup, config, event loop).
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from filesystem or terminal output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A config file named explicitly could not be used.
    #[error("Config error: {0}")]
    Config(String),

    /// The filesystem watcher could not be created or retargeted.
    #[error("Watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// The event channel was closed while the loop was still running.
    #[error("Event channel closed")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("file not found"));
    }

    #[test]
    fn invalid_path_error_display() {
        let err = AppError::InvalidPath("/nonexistent".into());
        assert_eq!(err.to_string(), "Invalid path: /nonexistent");
    }

    #[test]
    fn config_error_display() {
        let err = AppError::Config("bad sort field".into());
        assert_eq!(err.to_string(), "Config error: bad sort field");
    }

    #[test]
    fn channel_closed_display() {
        assert_eq!(AppError::ChannelClosed.to_string(), "Event channel closed");
    }
}
