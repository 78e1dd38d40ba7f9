use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use crate::error::BackendError;
use crate::pattern::HapticPattern;

use super::{
    BackendNotification, BackendPlayer, CompiledPattern, HapticBackend, ImpactStyle,
    NotificationHandler, StopReason, SystemTimeSource, TimeSource,
};

/// Default cap on compiled pattern size.
const DEFAULT_MAX_EVENTS: usize = 4096;

/// System feedback requests observed by the simulated backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackRecord {
    AlertVibration,
    Impact(ImpactStyle),
}

#[derive(Default)]
struct Faults {
    start: Option<BackendError>,
    compile: Option<BackendError>,
    player_start: Option<BackendError>,
    feedback: Option<BackendError>,
}

#[derive(Default)]
struct PlayerCounters {
    created: AtomicUsize,
    started: AtomicUsize,
    stopped: AtomicUsize,
}

/// In-process backend used for deterministic testing and CLI tooling.
///
/// It simulates the engine lifecycle and pattern playback without hardware:
/// compiled patterns and feedback calls are recorded, failures can be
/// injected per operation, and stop/reset notifications are delivered on the
/// thread that calls [`SimulatedBackend::notify_stopped`] or
/// [`SimulatedBackend::notify_reset`].
pub struct SimulatedBackend {
    supported: AtomicBool,
    running: AtomicBool,
    start_calls: AtomicUsize,
    max_events: usize,
    faults: Mutex<Faults>,
    handler: RwLock<Option<NotificationHandler>>,
    compiled: Mutex<Vec<CompiledPattern>>,
    feedback: Mutex<Vec<FeedbackRecord>>,
    players: Arc<PlayerCounters>,
    time_source: Arc<dyn TimeSource>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::with_time_source(Arc::new(SystemTimeSource::default()))
    }

    pub fn with_time_source(time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            supported: AtomicBool::new(true),
            running: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
            max_events: DEFAULT_MAX_EVENTS,
            faults: Mutex::new(Faults::default()),
            handler: RwLock::new(None),
            compiled: Mutex::new(Vec::new()),
            feedback: Mutex::new(Vec::new()),
            players: Arc::new(PlayerCounters::default()),
            time_source,
        }
    }

    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::SeqCst);
    }

    /// Make every subsequent `start` fail with `err` until cleared with `None`.
    pub fn fail_start(&self, err: Option<BackendError>) {
        self.faults().start = err;
    }

    pub fn fail_compile(&self, err: Option<BackendError>) {
        self.faults().compile = err;
    }

    pub fn fail_player_start(&self, err: Option<BackendError>) {
        self.faults().player_start = err;
    }

    pub fn fail_feedback(&self, err: Option<BackendError>) {
        self.faults().feedback = err;
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn compiled_patterns(&self) -> Vec<CompiledPattern> {
        self.compiled
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|err| err.into_inner().clone())
    }

    pub fn feedback_records(&self) -> Vec<FeedbackRecord> {
        self.feedback
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|err| err.into_inner().clone())
    }

    pub fn players_created(&self) -> usize {
        self.players.created.load(Ordering::SeqCst)
    }

    pub fn players_started(&self) -> usize {
        self.players.started.load(Ordering::SeqCst)
    }

    pub fn players_stopped(&self) -> usize {
        self.players.stopped.load(Ordering::SeqCst)
    }

    /// Stop the connection as the platform would, then notify the engine.
    pub fn notify_stopped(&self, reason: StopReason) {
        self.running.store(false, Ordering::SeqCst);
        self.dispatch(BackendNotification::Stopped(reason));
    }

    /// Drop the connection and ask the engine to reset.
    pub fn notify_reset(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.dispatch(BackendNotification::Reset);
    }

    pub fn has_notification_handler(&self) -> bool {
        self.handler
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    fn dispatch(&self, notification: BackendNotification) {
        // Clone out so the handler can call back into the backend.
        let handler = self
            .handler
            .read()
            .ok()
            .and_then(|guard| guard.as_ref().map(Arc::clone));
        if let Some(handler) = handler {
            handler(notification);
        }
    }

    fn faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn record_feedback(&self, record: FeedbackRecord) -> Result<(), BackendError> {
        if let Some(err) = self.faults().feedback.clone() {
            return Err(err);
        }
        self.feedback
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .push(record);
        Ok(())
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HapticBackend for SimulatedBackend {
    fn supports_haptics(&self) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    fn start(&self) -> Result<(), BackendError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if !self.supports_haptics() {
            return Err(BackendError::Unsupported);
        }
        if let Some(err) = self.faults().start.clone() {
            return Err(err);
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn compile(&self, pattern: &HapticPattern) -> Result<CompiledPattern, BackendError> {
        if !self.is_running() {
            return Err(BackendError::Disconnected);
        }
        if let Some(err) = self.faults().compile.clone() {
            return Err(err);
        }
        if pattern.is_empty() {
            return Err(BackendError::Rejected {
                reason: "pattern has no events".to_string(),
            });
        }
        if pattern.len() > self.max_events {
            return Err(BackendError::Rejected {
                reason: format!(
                    "pattern has {} events, limit is {}",
                    pattern.len(),
                    self.max_events
                ),
            });
        }

        let compiled = CompiledPattern::from_pattern(pattern);
        self.compiled
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .push(compiled.clone());
        Ok(compiled)
    }

    fn create_player(
        &self,
        compiled: CompiledPattern,
    ) -> Result<Box<dyn BackendPlayer>, BackendError> {
        if !self.is_running() {
            return Err(BackendError::Disconnected);
        }
        let duration =
            Duration::try_from_secs_f64(compiled.duration).map_err(|err| BackendError::Rejected {
                reason: format!("invalid pattern duration: {}", err),
            })?;
        self.players.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimulatedPlayer {
            duration,
            started_at: Mutex::new(None),
            stopped: AtomicBool::new(false),
            start_fault: self.faults().player_start.clone(),
            counters: Arc::clone(&self.players),
            time_source: Arc::clone(&self.time_source),
        }))
    }

    fn set_notification_handler(&self, handler: NotificationHandler) {
        if let Ok(mut guard) = self.handler.write() {
            *guard = Some(handler);
        }
    }

    fn play_alert_vibration(&self) -> Result<(), BackendError> {
        self.record_feedback(FeedbackRecord::AlertVibration)
    }

    fn impact(&self, style: ImpactStyle) -> Result<(), BackendError> {
        self.record_feedback(FeedbackRecord::Impact(style))
    }
}

/// Player that finishes once its pattern duration has elapsed on the
/// backend's time source.
struct SimulatedPlayer {
    duration: Duration,
    started_at: Mutex<Option<Instant>>,
    stopped: AtomicBool,
    start_fault: Option<BackendError>,
    counters: Arc<PlayerCounters>,
    time_source: Arc<dyn TimeSource>,
}

impl BackendPlayer for SimulatedPlayer {
    fn start(&self, at_time: f64) -> Result<(), BackendError> {
        if let Some(err) = self.start_fault.clone() {
            return Err(err);
        }
        let delay =
            Duration::try_from_secs_f64(at_time).map_err(|err| BackendError::Rejected {
                reason: format!("invalid start time: {}", err),
            })?;
        let mut started_at = self.started_at.lock().unwrap_or_else(|err| err.into_inner());
        *started_at = Some(self.time_source.now() + delay);
        self.counters.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<(), BackendError> {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.counters.stopped.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            return true;
        }
        let started_at = *self.started_at.lock().unwrap_or_else(|err| err.into_inner());
        match started_at {
            Some(at) => self.time_source.now().saturating_duration_since(at) >= self.duration,
            None => false,
        }
    }
}
