use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Login controls never became usable, or the form submission did not succeed
    #[error("Authentication error: {0}")]
    Authentication(String),
    /// A calendar page could not be loaded
    #[error("Navigation error for period {period}: {message}")]
    Navigation { period: String, message: String },
    /// Cookies were requested from a session that is not authenticated
    #[error("Bridge error: {0}")]
    Bridge(String),
    /// The export response carried no usable filename
    #[error("Export format error: {0}")]
    ExportFormat(String),
    /// The service rejected the bridged credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// An operation was attempted in the wrong session state
    #[error("Session cannot {operation} while {state}")]
    SessionState {
        operation: &'static str,
        state: String,
    },
    /// Network request failed
    #[error("Network error: {0}")]
    Network(String),
    /// IO operation failed
    #[error("IO error: {0}")]
    Io(String),
    /// Invalid input format
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Operation cancelled")]
    Cancelled,
}

impl AppError {
    /// Fatal errors stop the whole run; the rest are recorded per item.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Authentication(_)
                | AppError::Bridge(_)
                | AppError::SessionState { .. }
                | AppError::Unauthorized(_)
                | AppError::Cancelled
        )
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::InvalidInput(format!("invalid URL: {err}"))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn test_navigation_error_display_includes_period() {
        let err = AppError::Navigation {
            period: "2022-09".to_string(),
            message: "connection reset".to_string(),
        };

        let error_msg = err.to_string();
        assert!(error_msg.contains("2022-09"));
        assert!(error_msg.contains("connection reset"));
    }

    #[test]
    fn test_session_state_error_display() {
        let err = AppError::SessionState {
            operation: "navigate",
            state: "NEW".to_string(),
        };
        assert_eq!(err.to_string(), "Session cannot navigate while NEW");
    }

    #[test]
    fn test_export_format_error_display() {
        let err = AppError::ExportFormat("missing Content-Disposition".to_string());
        assert!(err.to_string().contains("Export format error"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(AppError::Authentication("timeout".into()).is_fatal());
        assert!(AppError::Bridge("not authenticated".into()).is_fatal());
        assert!(AppError::Unauthorized("401".into()).is_fatal());
        assert!(AppError::Cancelled.is_fatal());
        assert!(!AppError::ExportFormat("x".into()).is_fatal());
        assert!(!AppError::Io("disk full".into()).is_fatal());
        assert!(!AppError::Navigation {
            period: "2022-01".into(),
            message: "x".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Io(msg) if msg.contains("denied")));
    }

    #[test]
    fn test_app_error_implements_error_trait() {
        use std::error::Error;
        let err: Box<dyn Error> = Box::new(AppError::Network("test".to_string()));
        assert!(!err.to_string().is_empty());
    }
}
