// Error types for the haptic playback core
//
// This module defines custom error types for engine lifecycle, pattern playback
// and backend failures, with numeric error codes and a sink abstraction for
// failures that arrive outside of a caller's control flow.

mod backend;
mod engine;
mod playback;

use serde::{Deserialize, Serialize};

pub use backend::{BackendError, BackendErrorCodes};
pub use engine::{log_engine_error, EngineError, EngineErrorCodes};
pub use playback::{log_play_error, PlayError, PlayErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// sinks, logs and CLI reports.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Coarse classification of a reported failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unsupported,
    StartFailed,
    RestartFailed,
    FeedbackFailed,
    EngineNotReady,
    InvalidEvent,
    PlaybackFailed,
}

/// One failure delivered to an [`ErrorSink`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub code: i32,
    pub cause: String,
}

impl From<&EngineError> for ErrorReport {
    fn from(err: &EngineError) -> Self {
        Self {
            kind: err.kind(),
            code: err.code(),
            cause: err.message(),
        }
    }
}

impl From<&PlayError> for ErrorReport {
    fn from(err: &PlayError) -> Self {
        Self {
            kind: err.kind(),
            code: err.code(),
            cause: err.message(),
        }
    }
}

/// Receiver for diagnostics about failures the core recovered from.
///
/// Implementations are called from whatever context produced the failure,
/// including the backend's notification thread, and must not block.
pub trait ErrorSink: Send + Sync {
    fn record(&self, report: ErrorReport);
}

/// Default sink: forwards every report to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn record(&self, report: ErrorReport) {
        log::error!(
            "Haptic error: kind={:?}, code={}, cause={}",
            report.kind,
            report.code,
            report.cause
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_trait() {
        let engine_err: &dyn ErrorCode = &EngineError::Unsupported;
        assert_eq!(engine_err.code(), 1001);

        let play_err: &dyn ErrorCode = &PlayError::EngineNotReady;
        assert_eq!(play_err.code(), 2001);

        let backend_err: &dyn ErrorCode = &BackendError::Busy;
        assert_eq!(backend_err.code(), 3001);
    }

    #[test]
    fn test_report_from_engine_error() {
        let err = EngineError::RestartFailed {
            cause: BackendError::Disconnected,
        };
        let report = ErrorReport::from(&err);
        assert_eq!(report.kind, ErrorKind::RestartFailed);
        assert_eq!(report.code, 1003);
        assert!(report.cause.contains("disconnected"));
    }

    #[test]
    fn test_report_from_play_error() {
        let err = PlayError::PlaybackFailed {
            cause: BackendError::Rejected {
                reason: "too many events".to_string(),
            },
        };
        let report = ErrorReport::from(&err);
        assert_eq!(report.kind, ErrorKind::PlaybackFailed);
        assert!(report.cause.contains("too many events"));
    }

    #[test]
    fn test_log_sink_accepts_reports() {
        LogErrorSink.record(ErrorReport {
            kind: ErrorKind::StartFailed,
            code: 1002,
            cause: "busy".to_string(),
        });
    }
}
