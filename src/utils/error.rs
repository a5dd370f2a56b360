use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Failed to open serial link {port}: {reason}")]
    LinkOpen { port: String, reason: String },

    #[error("Serial link I/O error: {0}")]
    LinkIo(#[from] std::io::Error),

    #[error("Frame parse error: {message}")]
    FrameParse { message: String },

    #[error("Hex payload error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Roster fetch failed: {message}")]
    RosterFetch { message: String },

    #[error("Result submission failed: {message}")]
    Submission { message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Board actor is no longer running")]
    BoardStopped,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Link,
    Protocol,
    Backend,
    Configuration,
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BoardError {
    pub fn frame(message: impl Into<String>) -> Self {
        BoardError::FrameParse {
            message: message.into(),
        }
    }

    pub fn roster(message: impl Into<String>) -> Self {
        BoardError::RosterFetch {
            message: message.into(),
        }
    }

    pub fn submission(message: impl Into<String>) -> Self {
        BoardError::Submission {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BoardError::LinkOpen { .. } | BoardError::LinkIo(_) => ErrorCategory::Link,
            BoardError::FrameParse { .. } | BoardError::HexDecode(_) => ErrorCategory::Protocol,
            BoardError::RosterFetch { .. }
            | BoardError::Submission { .. }
            | BoardError::ApiError(_) => ErrorCategory::Backend,
            BoardError::ConfigError { .. }
            | BoardError::ConfigValidationError { .. }
            | BoardError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            BoardError::SerializationError(_) | BoardError::BoardStopped => {
                ErrorCategory::Runtime
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Protocol => ErrorSeverity::Low,
            ErrorCategory::Backend => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Link | ErrorCategory::Runtime => ErrorSeverity::Critical,
        }
    }

    /// Link failures end the frame reader; everything else is contained
    /// where it happens.
    pub fn is_fatal(&self) -> bool {
        matches!(self.category(), ErrorCategory::Link)
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BoardError::LinkOpen { port, .. } => {
                format!("Cannot open the radio modem on {}", port)
            }
            BoardError::LinkIo(_) => "Lost connection to the radio modem".to_string(),
            BoardError::FrameParse { .. } | BoardError::HexDecode(_) => {
                "Received an unreadable frame from the judge remote".to_string()
            }
            BoardError::RosterFetch { .. } => "Athlete list is not available".to_string(),
            BoardError::Submission { .. } => "Result could not be sent to the server".to_string(),
            BoardError::ApiError(_) => "Scoring server request failed".to_string(),
            BoardError::SerializationError(_) => "Board state could not be encoded".to_string(),
            BoardError::BoardStopped => "Scoreboard stopped unexpectedly".to_string(),
            other => format!("Configuration problem: {}", other),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Link => {
                "Check that the modem is plugged in and the serial port path and permissions are correct"
            }
            ErrorCategory::Protocol => "Move the judge remote closer to the receiver",
            ErrorCategory::Backend => {
                "Check the backend URL and network connectivity, then reload the roster"
            }
            ErrorCategory::Configuration => "Fix the configuration file or command-line flags",
            ErrorCategory::Runtime => "Restart the scoreboard",
        }
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_errors_are_fatal() {
        let err = BoardError::LinkOpen {
            port: "/dev/ttyUSB0".to_string(),
            reason: "No such file or directory".to_string(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("/dev/ttyUSB0"));
    }

    #[test]
    fn test_contained_errors_are_not_fatal() {
        assert!(!BoardError::frame("odd length").is_fatal());
        assert!(!BoardError::roster("status 500").is_fatal());
        assert!(!BoardError::submission("timeout").is_fatal());
        assert_eq!(BoardError::frame("x").category(), ErrorCategory::Protocol);
        assert_eq!(BoardError::submission("x").severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_serialization_errors_are_runtime() {
        let err: BoardError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert_eq!(err.category(), ErrorCategory::Runtime);
        assert!(!err.is_fatal());
        assert_eq!(err.user_friendly_message(), "Board state could not be encoded");
    }
}
