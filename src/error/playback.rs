// Playback error types and constants

use crate::error::{BackendError, ErrorCode, ErrorKind};
use crate::pattern::EventViolation;
use log::error;
use std::fmt;

/// Playback error code constants
///
/// Error code range: 2001-2003
pub struct PlayErrorCodes {}

impl PlayErrorCodes {
    /// Engine unsupported or not started
    pub const ENGINE_NOT_READY: i32 = 2001;

    /// A pattern event violates the event invariants
    pub const INVALID_EVENT: i32 = 2002;

    /// Backend failed to compile or start the pattern
    pub const PLAYBACK_FAILED: i32 = 2003;
}

/// Log a playback error with structured context
pub fn log_play_error(err: &PlayError, context: &str) {
    error!(
        "Playback error in {}: code={}, component=PatternPlayer, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Pattern playback errors
///
/// Error code ranges: 2001-2003
#[derive(Debug, Clone, PartialEq)]
pub enum PlayError {
    /// Engine is unsupported or not in the started state
    EngineNotReady,

    /// First invalid event in pattern order
    InvalidEvent { index: usize, reason: EventViolation },

    /// Backend could not compile or start the pattern
    PlaybackFailed { cause: BackendError },
}

impl PlayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlayError::EngineNotReady => ErrorKind::EngineNotReady,
            PlayError::InvalidEvent { .. } => ErrorKind::InvalidEvent,
            PlayError::PlaybackFailed { .. } => ErrorKind::PlaybackFailed,
        }
    }
}

impl ErrorCode for PlayError {
    fn code(&self) -> i32 {
        match self {
            PlayError::EngineNotReady => PlayErrorCodes::ENGINE_NOT_READY,
            PlayError::InvalidEvent { .. } => PlayErrorCodes::INVALID_EVENT,
            PlayError::PlaybackFailed { .. } => PlayErrorCodes::PLAYBACK_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            PlayError::EngineNotReady => {
                "Haptic engine not ready. Call start() on a supported engine first.".to_string()
            }
            PlayError::InvalidEvent { index, reason } => {
                format!("Invalid event at index {}: {}", index, reason)
            }
            PlayError::PlaybackFailed { cause } => {
                format!("Failed to play pattern: {}", cause)
            }
        }
    }
}

impl fmt::Display for PlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PlayError::{:?} (code {}): {}",
            self.kind(),
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for PlayError {}
