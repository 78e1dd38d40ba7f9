use futures::Stream;
use tokio::runtime::Builder;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{EngineState, HapticEngine, LifecycleEvent};

impl HapticEngine {
    // ========================================================================
    // LIFECYCLE SUBSCRIPTIONS
    // ========================================================================

    /// Raw broadcast receiver; lagging receivers lose the oldest events.
    pub fn subscribe_lifecycle(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.shared.lifecycle_tx.subscribe()
    }

    /// Forward lifecycle events into an unbounded channel.
    ///
    /// The forwarding thread exits once the engine is dropped or the receiver
    /// is closed.
    pub fn subscribe_lifecycle_unbounded(&self) -> mpsc::UnboundedReceiver<LifecycleEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut broadcast_rx = self.shared.lifecycle_tx.subscribe();

        std::thread::spawn(move || {
            let rt = match Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(err) => {
                    log::error!("[HapticEngine] Failed to create lifecycle runtime: {}", err);
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
                            log::warn!("[HapticEngine] Lifecycle subscriber lagged by {}", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        });

        rx
    }

    // ========================================================================
    // ASYNC STREAM ADAPTERS
    // ========================================================================

    pub fn lifecycle_stream(&self) -> impl Stream<Item = LifecycleEvent> + Unpin {
        UnboundedReceiverStream::new(self.subscribe_lifecycle_unbounded())
    }

    // ========================================================================
    // INTROSPECTION
    // ========================================================================

    /// Milliseconds elapsed since the engine was created.
    pub fn uptime_ms(&self) -> u64 {
        self.shared.uptime_ms()
    }

    /// Number of registered stop and reset observers.
    pub fn observer_count(&self) -> usize {
        let stopped = self
            .shared
            .stopped_observers
            .read()
            .map(|guard| guard.len())
            .unwrap_or(0);
        let reset = self
            .shared
            .reset_observers
            .read()
            .map(|guard| guard.len())
            .unwrap_or(0);
        stopped + reset
    }

    pub fn is_started(&self) -> bool {
        self.state() == EngineState::Started
    }
}
