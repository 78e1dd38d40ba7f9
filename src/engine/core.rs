//! HapticEngine: supervised connection to a haptics backend.
//!
//! The engine owns the lifecycle state machine
//! (`Uninitialized -> Started -> Stopped`), dispatches backend stop/reset
//! notifications to registered observers, and performs the single automatic
//! restart attempt after a backend reset.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::EngineConfig;
use crate::engine::backend::{
    BackendNotification, HapticBackend, ImpactStyle, StopReason, SystemTimeSource, TimeSource,
};
use crate::error::{
    log_engine_error, EngineError, ErrorCode, ErrorReport, ErrorSink, LogErrorSink,
};

#[path = "core_subscriptions.rs"]
mod core_subscriptions;

/// Lifecycle state of a [`HapticEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Uninitialized,
    Started,
    Stopped,
}

/// Lifecycle event emitted on every engine transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub timestamp_ms: u64,
    pub kind: LifecycleEventKind,
    pub detail: Option<String>,
}

/// Types of lifecycle events supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEventKind {
    Started,
    /// `reason` is `None` when the caller stopped the engine.
    Stopped { reason: Option<StopReason> },
    Reset,
    Restarted,
    RestartFailed,
}

/// Identifies a registered stop/reset observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type StoppedObserver = Arc<dyn Fn(StopReason) + Send + Sync>;
type ResetObserver = Arc<dyn Fn() + Send + Sync>;

/// Construction options for [`HapticEngine`].
pub struct EngineOptions {
    pub config: EngineConfig,
    pub error_sink: Arc<dyn ErrorSink>,
    pub time_source: Arc<dyn TimeSource>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            error_sink: Arc::new(LogErrorSink),
            time_source: Arc::new(SystemTimeSource::default()),
        }
    }
}

struct Lifecycle {
    state: EngineState,
    /// Set by an explicit `stop()`; a later reset leaves the engine stopped.
    stopped_by_caller: bool,
}

struct EngineShared {
    backend: Arc<dyn HapticBackend>,
    lifecycle: Mutex<Lifecycle>,
    stopped_observers: RwLock<Vec<(ObserverId, StoppedObserver)>>,
    reset_observers: RwLock<Vec<(ObserverId, ResetObserver)>>,
    next_observer: AtomicU64,
    error_sink: Arc<dyn ErrorSink>,
    lifecycle_tx: broadcast::Sender<LifecycleEvent>,
    time_source: Arc<dyn TimeSource>,
    start_instant: Instant,
}

/// One live connection to the haptics hardware.
///
/// Construct exactly one per owner and hand `&HapticEngine` to
/// [`crate::player::PatternPlayer`]. The backend only keeps a weak reference
/// back to the engine, so dropping the engine tears the connection down.
pub struct HapticEngine {
    shared: Arc<EngineShared>,
}

impl HapticEngine {
    pub fn new(backend: Arc<dyn HapticBackend>) -> Self {
        Self::with_options(backend, EngineOptions::default())
    }

    /// Route every failure to `sink` instead of the log.
    pub fn with_error_sink(backend: Arc<dyn HapticBackend>, sink: Arc<dyn ErrorSink>) -> Self {
        Self::with_options(
            backend,
            EngineOptions {
                error_sink: sink,
                ..EngineOptions::default()
            },
        )
    }

    pub fn with_config(backend: Arc<dyn HapticBackend>, config: EngineConfig) -> Self {
        Self::with_options(
            backend,
            EngineOptions {
                config,
                ..EngineOptions::default()
            },
        )
    }

    pub fn with_options(backend: Arc<dyn HapticBackend>, options: EngineOptions) -> Self {
        let (lifecycle_tx, _) = broadcast::channel(options.config.lifecycle_buffer.max(1));
        let start_instant = options.time_source.now();

        let shared = Arc::new(EngineShared {
            backend: Arc::clone(&backend),
            lifecycle: Mutex::new(Lifecycle {
                state: EngineState::Uninitialized,
                stopped_by_caller: false,
            }),
            stopped_observers: RwLock::new(Vec::new()),
            reset_observers: RwLock::new(Vec::new()),
            next_observer: AtomicU64::new(1),
            error_sink: options.error_sink,
            lifecycle_tx,
            time_source: options.time_source,
            start_instant,
        });

        let weak: Weak<EngineShared> = Arc::downgrade(&shared);
        backend.set_notification_handler(Arc::new(move |notification: BackendNotification| {
            if let Some(shared) = weak.upgrade() {
                shared.handle_notification(notification);
            }
        }));

        Self { shared }
    }

    /// Hardware capability query; no side effects.
    pub fn capabilities_supported(&self) -> bool {
        self.shared.backend.supports_haptics()
    }

    pub fn state(&self) -> EngineState {
        self.shared.lock_lifecycle().state
    }

    /// Supported hardware and a started connection.
    pub fn is_ready(&self) -> bool {
        self.capabilities_supported() && self.state() == EngineState::Started
    }

    /// Establish the hardware connection.
    ///
    /// Starting an already started engine is a no-op. A rejected start leaves
    /// the state unchanged.
    pub fn start(&self) -> Result<(), EngineError> {
        if !self.capabilities_supported() {
            let err = EngineError::Unsupported;
            self.shared.fail(&err, "start");
            return Err(err);
        }

        let mut lifecycle = self.shared.lock_lifecycle();
        if lifecycle.state == EngineState::Started {
            tracing::debug!("[HapticEngine] start() while already started; ignoring");
            return Ok(());
        }

        if let Err(cause) = self.shared.backend.start() {
            drop(lifecycle);
            let err = EngineError::StartFailed { cause };
            self.shared.fail(&err, "start");
            return Err(err);
        }

        lifecycle.state = EngineState::Started;
        lifecycle.stopped_by_caller = false;
        self.shared.emit(LifecycleEventKind::Started, None);
        tracing::info!("[HapticEngine] Engine started");
        Ok(())
    }

    /// Release the hardware connection. Safe to call repeatedly.
    pub fn stop(&self) {
        let mut lifecycle = self.shared.lock_lifecycle();
        if lifecycle.state != EngineState::Started {
            lifecycle.stopped_by_caller = lifecycle.state == EngineState::Stopped;
            return;
        }

        self.shared.backend.stop();
        lifecycle.state = EngineState::Stopped;
        lifecycle.stopped_by_caller = true;
        self.shared
            .emit(LifecycleEventKind::Stopped { reason: None }, None);
        tracing::info!("[HapticEngine] Engine stopped by caller");
    }

    /// Observe backend-initiated stops.
    ///
    /// Called synchronously on the backend's notification thread; keep it short.
    pub fn on_stopped<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(StopReason) + Send + Sync + 'static,
    {
        let id = self.shared.next_observer_id();
        if let Ok(mut observers) = self.shared.stopped_observers.write() {
            observers.push((id, Arc::new(callback)));
        }
        id
    }

    /// Observe backend resets. Called before the automatic restart attempt.
    pub fn on_reset<F>(&self, callback: F) -> ObserverId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.shared.next_observer_id();
        if let Ok(mut observers) = self.shared.reset_observers.write() {
            observers.push((id, Arc::new(callback)));
        }
        id
    }

    /// Unregister an observer. Returns false if `id` was unknown.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut removed = false;
        if let Ok(mut observers) = self.shared.stopped_observers.write() {
            let before = observers.len();
            observers.retain(|(observer_id, _)| *observer_id != id);
            removed |= observers.len() != before;
        }
        if let Ok(mut observers) = self.shared.reset_observers.write() {
            let before = observers.len();
            observers.retain(|(observer_id, _)| *observer_id != id);
            removed |= observers.len() != before;
        }
        removed
    }

    /// Play the platform's plain vibration alert.
    pub fn play_alert_vibration(&self) -> Result<(), EngineError> {
        self.shared.backend.play_alert_vibration().map_err(|cause| {
            let err = EngineError::FeedbackFailed { cause };
            self.shared.fail(&err, "play_alert_vibration");
            err
        })
    }

    /// Fire a single platform impact tap.
    pub fn impact(&self, style: ImpactStyle) -> Result<(), EngineError> {
        self.shared.backend.impact(style).map_err(|cause| {
            let err = EngineError::FeedbackFailed { cause };
            self.shared.fail(&err, "impact");
            err
        })
    }

    /// Run `f` against the backend while the engine is held in `Started`.
    ///
    /// Returns `None` without calling `f` if the engine is not ready.
    pub(crate) fn with_started_backend<T>(
        &self,
        f: impl FnOnce(&dyn HapticBackend) -> T,
    ) -> Option<T> {
        if !self.capabilities_supported() {
            return None;
        }
        let lifecycle = self.shared.lock_lifecycle();
        if lifecycle.state != EngineState::Started {
            return None;
        }
        let result = f(self.shared.backend.as_ref());
        drop(lifecycle);
        Some(result)
    }

    pub(crate) fn report(&self, report: ErrorReport) {
        self.shared.error_sink.record(report);
    }
}

impl Drop for HapticEngine {
    fn drop(&mut self) {
        let lifecycle = self.shared.lock_lifecycle();
        if lifecycle.state == EngineState::Started {
            self.shared.backend.stop();
        }
    }
}

impl EngineShared {
    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn next_observer_id(&self) -> ObserverId {
        ObserverId(self.next_observer.fetch_add(1, Ordering::Relaxed))
    }

    fn uptime_ms(&self) -> u64 {
        self.time_source
            .now()
            .saturating_duration_since(self.start_instant)
            .as_millis() as u64
    }

    fn emit(&self, kind: LifecycleEventKind, detail: Option<String>) {
        let _ = self.lifecycle_tx.send(LifecycleEvent {
            timestamp_ms: self.uptime_ms(),
            kind,
            detail,
        });
    }

    fn fail(&self, err: &EngineError, context: &str) {
        log_engine_error(err, context);
        self.error_sink.record(ErrorReport::from(err));
    }

    fn handle_notification(&self, notification: BackendNotification) {
        match notification {
            BackendNotification::Stopped(reason) => self.handle_stopped(reason),
            BackendNotification::Reset => self.handle_reset(),
        }
    }

    fn handle_stopped(&self, reason: StopReason) {
        {
            let mut lifecycle = self.lock_lifecycle();
            if lifecycle.state == EngineState::Started {
                lifecycle.state = EngineState::Stopped;
                lifecycle.stopped_by_caller = false;
                self.emit(
                    LifecycleEventKind::Stopped {
                        reason: Some(reason),
                    },
                    None,
                );
            }
        }
        tracing::warn!("[HapticEngine] The engine stopped: {:?}", reason);

        let observers: Vec<StoppedObserver> = self
            .stopped_observers
            .read()
            .map(|guard| guard.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();
        for observer in observers {
            observer(reason);
        }
    }

    fn handle_reset(&self) {
        tracing::warn!("[HapticEngine] The engine reset");
        self.emit(LifecycleEventKind::Reset, None);

        let observers: Vec<ResetObserver> = self
            .reset_observers
            .read()
            .map(|guard| guard.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();
        for observer in observers {
            observer();
        }

        let failure = {
            let mut lifecycle = self.lock_lifecycle();
            match lifecycle.state {
                EngineState::Uninitialized => {
                    tracing::debug!("[HapticEngine] Reset before first start; ignoring");
                    return;
                }
                EngineState::Stopped if lifecycle.stopped_by_caller => {
                    tracing::debug!("[HapticEngine] Reset after caller stop; staying stopped");
                    return;
                }
                _ => {}
            }

            // Exactly one attempt; no backoff.
            match self.backend.start() {
                Ok(()) => {
                    lifecycle.state = EngineState::Started;
                    lifecycle.stopped_by_caller = false;
                    self.emit(LifecycleEventKind::Restarted, None);
                    tracing::info!("[HapticEngine] Engine restarted after reset");
                    None
                }
                Err(cause) => {
                    lifecycle.state = EngineState::Uninitialized;
                    let err = EngineError::RestartFailed { cause };
                    self.emit(LifecycleEventKind::RestartFailed, Some(err.message()));
                    Some(err)
                }
            }
        };

        if let Some(err) = failure {
            self.fail(&err, "reset_handler");
        }
    }
}
