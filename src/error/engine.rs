// Engine error types and constants

use crate::error::{BackendError, ErrorCode, ErrorKind};
use log::error;
use std::fmt;

/// Engine error code constants
///
/// Error code range: 1001-1004
pub struct EngineErrorCodes {}

impl EngineErrorCodes {
    /// Device has no haptics hardware
    pub const UNSUPPORTED: i32 = 1001;

    /// Backend rejected engine initialization
    pub const START_FAILED: i32 = 1002;

    /// Automatic restart after a backend reset failed
    pub const RESTART_FAILED: i32 = 1003;

    /// System vibration or impact feedback failed
    pub const FEEDBACK_FAILED: i32 = 1004;
}

/// Log an engine error with structured context
///
/// This function logs engine errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_engine_error(err: &EngineError, context: &str) {
    error!(
        "Engine error in {}: code={}, component=HapticEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Engine lifecycle errors
///
/// Error code ranges: 1001-1004
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Hardware reports no haptics support
    Unsupported,

    /// Backend rejected initialization
    StartFailed { cause: BackendError },

    /// Automatic restart after a reset failed
    RestartFailed { cause: BackendError },

    /// System feedback request failed
    FeedbackFailed { cause: BackendError },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Unsupported => ErrorKind::Unsupported,
            EngineError::StartFailed { .. } => ErrorKind::StartFailed,
            EngineError::RestartFailed { .. } => ErrorKind::RestartFailed,
            EngineError::FeedbackFailed { .. } => ErrorKind::FeedbackFailed,
        }
    }
}

impl ErrorCode for EngineError {
    fn code(&self) -> i32 {
        match self {
            EngineError::Unsupported => EngineErrorCodes::UNSUPPORTED,
            EngineError::StartFailed { .. } => EngineErrorCodes::START_FAILED,
            EngineError::RestartFailed { .. } => EngineErrorCodes::RESTART_FAILED,
            EngineError::FeedbackFailed { .. } => EngineErrorCodes::FEEDBACK_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            EngineError::Unsupported => "Device does not support haptics".to_string(),
            EngineError::StartFailed { cause } => {
                format!("Failed to start haptic engine: {}", cause)
            }
            EngineError::RestartFailed { cause } => {
                format!("Failed to restart haptic engine after reset: {}", cause)
            }
            EngineError::FeedbackFailed { cause } => {
                format!("System feedback failed: {}", cause)
            }
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EngineError::{:?} (code {}): {}",
            self.kind(),
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Unsupported => None,
            EngineError::StartFailed { cause }
            | EngineError::RestartFailed { cause }
            | EngineError::FeedbackFailed { cause } => Some(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_engine_error_codes() {
        assert_eq!(EngineError::Unsupported.code(), 1001);
        assert_eq!(
            EngineError::StartFailed {
                cause: BackendError::Busy
            }
            .code(),
            1002
        );
        assert_eq!(
            EngineError::RestartFailed {
                cause: BackendError::Busy
            }
            .code(),
            1003
        );
        assert_eq!(
            EngineError::FeedbackFailed {
                cause: BackendError::Busy
            }
            .code(),
            1004
        );
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::StartFailed {
            cause: BackendError::Busy,
        };
        let text = err.to_string();
        assert!(text.contains("code 1002"));
        assert!(text.contains("busy"));
    }

    #[test]
    fn test_engine_error_source_is_backend_cause() {
        let err = EngineError::RestartFailed {
            cause: BackendError::Disconnected,
        };
        assert!(err.source().is_some());
        assert!(EngineError::Unsupported.source().is_none());
    }
}
