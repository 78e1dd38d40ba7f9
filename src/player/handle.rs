use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::engine::backend::BackendPlayer;

/// Identifier of one playback; never reused within a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackId(pub(crate) u64);

impl PlaybackId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "playback-{}", self.0)
    }
}

struct PlaybackInner {
    id: PlaybackId,
    player: Box<dyn BackendPlayer>,
    stopped: AtomicBool,
    duration: f64,
    event_count: usize,
}

/// Handle to one in-flight pattern playback.
///
/// Clones refer to the same playback, so a clone can be moved to another
/// thread and stopped from there.
#[derive(Clone)]
pub struct PlaybackHandle {
    inner: Arc<PlaybackInner>,
}

impl PlaybackHandle {
    pub(crate) fn new(
        id: PlaybackId,
        player: Box<dyn BackendPlayer>,
        duration: f64,
        event_count: usize,
    ) -> Self {
        Self {
            inner: Arc::new(PlaybackInner {
                id,
                player,
                stopped: AtomicBool::new(false),
                duration,
                event_count,
            }),
        }
    }

    pub fn id(&self) -> PlaybackId {
        self.inner.id
    }

    /// Pattern duration in seconds.
    pub fn duration(&self) -> f64 {
        self.inner.duration
    }

    pub fn event_count(&self) -> usize {
        self.inner.event_count
    }

    /// True once [`crate::player::PatternPlayer::stop`] halted this playback.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Stopped early or ran past its last event.
    pub fn is_finished(&self) -> bool {
        self.is_stopped() || self.inner.player.is_finished()
    }

    /// Same playback, not merely an equal id; ids are only unique per player.
    pub(crate) fn same_playback(&self, other: &PlaybackHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Halt the backend player. Only the first call has any effect.
    ///
    /// Returns true if this call stopped a playback that was still running.
    pub(crate) fn halt(&self) -> bool {
        if self.inner.player.is_finished() {
            return false;
        }
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let Err(err) = self.inner.player.stop() {
            tracing::warn!("[PatternPlayer] Failed to stop {}: {}", self.inner.id, err);
        }
        true
    }
}

impl fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("id", &self.inner.id)
            .field("duration", &self.inner.duration)
            .field("event_count", &self.inner.event_count)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
