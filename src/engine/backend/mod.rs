//! Backend abstractions for the haptic engine core.
//!
//! A backend is the opaque platform collaborator that owns the actual
//! hardware: it answers the capability query, starts and stops the
//! connection, compiles patterns, creates players, and pushes unsolicited
//! stop/reset notifications back to the engine.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::pattern::{HapticEventKind, HapticPattern};

mod simulated;
pub use simulated::{FeedbackRecord, SimulatedBackend};

/// Why the backend stopped the engine on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    AudioSessionInterrupt,
    ApplicationSuspended,
    IdleTimeout,
    EngineDestroyed,
    SystemError,
    Unknown,
}

/// Unsolicited event pushed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendNotification {
    Stopped(StopReason),
    Reset,
}

/// Callback the backend invokes from its own notification context.
pub type NotificationHandler = Arc<dyn Fn(BackendNotification) + Send + Sync>;

/// Platform impact feedback styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactStyle {
    Light,
    #[default]
    Medium,
    Heavy,
    Soft,
    Rigid,
}

/// One event in backend-playable form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompiledEvent {
    pub offset: f64,
    pub kind: HapticEventKind,
    pub duration: f64,
    pub intensity: f32,
    pub sharpness: f32,
}

/// A pattern compiled for playback: events sorted by offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledPattern {
    pub events: Vec<CompiledEvent>,
    pub duration: f64,
}

impl CompiledPattern {
    /// Stable sort by offset; events sharing an offset keep authoring order.
    pub fn from_pattern(pattern: &HapticPattern) -> Self {
        let mut events: Vec<CompiledEvent> = pattern
            .events()
            .iter()
            .map(|event| CompiledEvent {
                offset: event.relative_time,
                kind: event.kind,
                duration: event.duration,
                intensity: event.intensity,
                sharpness: event.sharpness,
            })
            .collect();
        events.sort_by(|a, b| a.offset.total_cmp(&b.offset));

        Self {
            events,
            duration: pattern.duration(),
        }
    }
}

/// Trait implemented by platform haptics backends.
///
/// Notifications must arrive on the backend's own context, never from inside
/// a call the engine is making into the backend.
pub trait HapticBackend: Send + Sync {
    fn supports_haptics(&self) -> bool;
    fn start(&self) -> Result<(), BackendError>;
    fn stop(&self);

    fn compile(&self, pattern: &HapticPattern) -> Result<CompiledPattern, BackendError> {
        Ok(CompiledPattern::from_pattern(pattern))
    }

    fn create_player(
        &self,
        compiled: CompiledPattern,
    ) -> Result<Box<dyn BackendPlayer>, BackendError>;

    /// Replace the notification handler. Backends hold at most one.
    fn set_notification_handler(&self, handler: NotificationHandler);

    fn play_alert_vibration(&self) -> Result<(), BackendError>;
    fn impact(&self, style: ImpactStyle) -> Result<(), BackendError>;
}

/// Backend-side player for one compiled pattern.
pub trait BackendPlayer: Send + Sync {
    /// Begin playback `at_time` seconds from now.
    fn start(&self, at_time: f64) -> Result<(), BackendError>;
    fn stop(&self) -> Result<(), BackendError>;
    fn is_finished(&self) -> bool;
}

/// Trait representing a monotonic time source used for timestamps and
/// playback progress.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Default time source backed by `Instant::now`.
#[derive(Default)]
pub struct SystemTimeSource {
    _unit: (),
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Time source that only moves when told to.
///
/// Lets tests step playback to completion without sleeping.
pub struct ManualTimeSource {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|err| err.into_inner());
        *offset += by;
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|err| err.into_inner());
        self.start + offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::HapticEvent;

    #[test]
    fn test_compile_sorts_by_offset_stably() {
        let pattern = HapticPattern::new(vec![
            HapticEvent::transient(0.4).with_intensity(0.1),
            HapticEvent::transient(0.0),
            HapticEvent::transient(0.4).with_intensity(0.2),
        ]);
        let compiled = CompiledPattern::from_pattern(&pattern);
        let offsets: Vec<f64> = compiled.events.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.4, 0.4]);
        assert_eq!(compiled.events[1].intensity, 0.1);
        assert_eq!(compiled.events[2].intensity, 0.2);
    }

    #[test]
    fn test_manual_time_source_advances_only_on_demand() {
        let clock = ManualTimeSource::new();
        let first = clock.now();
        assert_eq!(clock.now(), first);
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - first, Duration::from_millis(250));
    }
}
