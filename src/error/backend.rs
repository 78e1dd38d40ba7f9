// Backend error types and constants

use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend error code constants
///
/// Error code range: 3001-3004
pub struct BackendErrorCodes {}

impl BackendErrorCodes {
    /// Haptics hardware is busy with another client
    pub const BUSY: i32 = 3001;

    /// Device has no haptics hardware
    pub const UNSUPPORTED: i32 = 3002;

    /// Connection to the haptics server was lost
    pub const DISCONNECTED: i32 = 3003;

    /// Backend refused the request (pattern, player or parameters)
    pub const REJECTED: i32 = 3004;
}

/// Failure reported by a haptics backend.
///
/// This is the `cause` carried by engine and playback errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendError {
    /// Hardware busy
    Busy,

    /// No haptics hardware
    Unsupported,

    /// Server connection lost
    Disconnected,

    /// Request refused by the backend
    Rejected { reason: String },
}

impl ErrorCode for BackendError {
    fn code(&self) -> i32 {
        match self {
            BackendError::Busy => BackendErrorCodes::BUSY,
            BackendError::Unsupported => BackendErrorCodes::UNSUPPORTED,
            BackendError::Disconnected => BackendErrorCodes::DISCONNECTED,
            BackendError::Rejected { .. } => BackendErrorCodes::REJECTED,
        }
    }

    fn message(&self) -> String {
        match self {
            BackendError::Busy => "Haptics hardware is busy".to_string(),
            BackendError::Unsupported => "Haptics hardware not available".to_string(),
            BackendError::Disconnected => "Haptics server disconnected".to_string(),
            BackendError::Rejected { reason } => format!("Backend rejected request: {}", reason),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BackendError {}
