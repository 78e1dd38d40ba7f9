//! Diagnostic event types exposed to CLI surfaces and broadcast subscribers.

use serde::{Deserialize, Serialize};

use crate::engine::LifecycleEventKind;
use crate::error::ErrorKind;

/// Rich diagnostic events covering failures, engine lifecycle and playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    Error {
        kind: ErrorKind,
        code: i32,
        cause: String,
    },
    Lifecycle {
        kind: LifecycleEventKind,
        timestamp_ms: u64,
    },
    Playback {
        playback_id: u64,
        event_count: usize,
        duration_s: f64,
    },
}
