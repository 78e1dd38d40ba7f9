//! Diagnostics collector and helpers.
//!
//! The collector multiplexes error reports, engine lifecycle transitions and
//! playback starts into a bounded history plus an async broadcast stream. It
//! doubles as an [`ErrorSink`] so engines can report straight into it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::OnceCell;
use tokio::runtime::Builder;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};

use crate::config::TelemetryConfig;
use crate::engine::LifecycleEvent;
use crate::error::{ErrorReport, ErrorSink};
use crate::player::PlaybackHandle;

pub mod events;

pub use events::DiagnosticEvent;

/// Process-wide collector used by tooling that has no owner to hand one down.
static HUB: OnceCell<TelemetryCollector> = OnceCell::new();

/// Size the global collector from `config`.
///
/// Only the first initialization wins; later calls return the existing hub.
pub fn init_hub(config: &TelemetryConfig) -> &'static TelemetryCollector {
    HUB.get_or_init(|| TelemetryCollector::from_config(config))
}

/// Access the global diagnostics collector, creating it with defaults if
/// [`init_hub`] was never called.
pub fn hub() -> &'static TelemetryCollector {
    HUB.get_or_init(TelemetryCollector::default)
}

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<DiagnosticEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of diagnostics.
pub struct TelemetryCollector {
    tx: broadcast::Sender<DiagnosticEvent>,
    history: Mutex<VecDeque<DiagnosticEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(config.channel_capacity, config.history_capacity)
    }

    pub fn publish(&self, event: DiagnosticEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if self.history_capacity > 0 {
            let mut history = self.lock_history();
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        } else {
            self.dropped_history.fetch_add(1, Ordering::Relaxed);
        }

        let _ = self.tx.send(event);
    }

    pub fn record_lifecycle(&self, event: &LifecycleEvent) {
        self.publish(DiagnosticEvent::Lifecycle {
            kind: event.kind,
            timestamp_ms: event.timestamp_ms,
        });
    }

    pub fn record_playback(&self, handle: &PlaybackHandle) {
        self.publish(DiagnosticEvent::Playback {
            playback_id: handle.id().value(),
            event_count: handle.event_count(),
            duration_s: handle.duration(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DiagnosticEvent> {
        self.tx.subscribe()
    }

    /// Forward diagnostics into an unbounded channel.
    ///
    /// Runs on its own thread, so no Tokio runtime is needed by the caller.
    /// The thread exits once the collector is dropped or the receiver is
    /// closed.
    pub fn subscribe_unbounded(&self) -> mpsc::UnboundedReceiver<DiagnosticEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut broadcast_rx = self.tx.subscribe();

        std::thread::spawn(move || {
            let rt = match Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(err) => {
                    log::error!("[Telemetry] Failed to create forwarding runtime: {}", err);
                    return;
                }
            };
            rt.block_on(async move {
                loop {
                    match broadcast_rx.recv().await {
                        Ok(event) => {
                            if tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            log::warn!("[Telemetry] Subscriber lagged by {}", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        });

        rx
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = self.lock_history();
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }

    /// Error reports currently held in history, oldest first.
    pub fn errors(&self) -> Vec<ErrorReport> {
        self.lock_history()
            .iter()
            .filter_map(|event| match event {
                DiagnosticEvent::Error { kind, code, cause } => Some(ErrorReport {
                    kind: *kind,
                    code: *code,
                    cause: cause.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    fn lock_history(&self) -> MutexGuard<'_, VecDeque<DiagnosticEvent>> {
        self.history.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::from_config(&TelemetryConfig::default())
    }
}

impl ErrorSink for TelemetryCollector {
    fn record(&self, report: ErrorReport) {
        self.publish(DiagnosticEvent::Error {
            kind: report.kind,
            code: report.code,
            cause: report.cause,
        });
    }
}
