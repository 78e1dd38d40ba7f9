//! Pattern playback on top of a [`HapticEngine`].
//!
//! `PatternPlayer::play` checks the engine, validates the pattern in event
//! order, compiles it through the backend and starts it at pattern time 0.
//! It returns as soon as the backend player is running.

mod handle;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::engine::backend::{BackendPlayer, HapticBackend};
use crate::engine::HapticEngine;
use crate::error::{log_play_error, BackendError, ErrorReport, PlayError};
use crate::pattern::HapticPattern;

pub use handle::{PlaybackHandle, PlaybackId};

/// Drives [`HapticPattern`]s through an engine and tracks running playbacks.
pub struct PatternPlayer {
    next_id: AtomicU64,
    active: Mutex<Vec<PlaybackHandle>>,
}

impl PatternPlayer {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            active: Mutex::new(Vec::new()),
        }
    }

    /// Start `pattern` on `engine` without waiting for it to finish.
    ///
    /// # Errors
    /// - `EngineNotReady` if the engine is unsupported or not started,
    ///   regardless of the pattern
    /// - `InvalidEvent` for the lowest-index invalid event
    /// - `PlaybackFailed` if the backend cannot compile or start the pattern;
    ///   nothing is left playing in that case
    pub fn play(
        &self,
        engine: &HapticEngine,
        pattern: &HapticPattern,
    ) -> Result<PlaybackHandle, PlayError> {
        if !engine.is_ready() {
            return Err(self.fail(engine, PlayError::EngineNotReady));
        }

        if let Some((index, reason)) = pattern.first_violation() {
            return Err(self.fail(engine, PlayError::InvalidEvent { index, reason }));
        }

        let player = match engine.with_started_backend(|backend| start_pattern(backend, pattern)) {
            None => return Err(self.fail(engine, PlayError::EngineNotReady)),
            Some(Err(cause)) => return Err(self.fail(engine, PlayError::PlaybackFailed { cause })),
            Some(Ok(player)) => player,
        };

        let id = PlaybackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handle = PlaybackHandle::new(id, player, pattern.duration(), pattern.len());
        tracing::debug!(
            "[PatternPlayer] Started {} ({} events, {:.3}s)",
            id,
            handle.event_count(),
            handle.duration()
        );

        let mut active = self.lock_active();
        active.retain(|running| !running.is_finished());
        active.push(handle.clone());
        Ok(handle)
    }

    /// Halt a playback early. No-op if it already finished or was stopped.
    pub fn stop(&self, handle: &PlaybackHandle) {
        if handle.halt() {
            tracing::debug!("[PatternPlayer] Stopped {}", handle.id());
        }
        self.lock_active()
            .retain(|running| !running.same_playback(handle) && !running.is_finished());
    }

    /// Halt every playback this player started that is still running.
    pub fn stop_all(&self) {
        let handles: Vec<PlaybackHandle> = self.lock_active().drain(..).collect();
        for handle in handles {
            handle.halt();
        }
    }

    /// Number of playbacks still running.
    pub fn active_count(&self) -> usize {
        let mut active = self.lock_active();
        active.retain(|running| !running.is_finished());
        active.len()
    }

    fn lock_active(&self) -> MutexGuard<'_, Vec<PlaybackHandle>> {
        self.active.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn fail(&self, engine: &HapticEngine, err: PlayError) -> PlayError {
        log_play_error(&err, "play");
        engine.report(ErrorReport::from(&err));
        err
    }
}

impl Default for PatternPlayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile, create and start; a player that fails to start is stopped.
fn start_pattern(
    backend: &dyn HapticBackend,
    pattern: &HapticPattern,
) -> Result<Box<dyn BackendPlayer>, BackendError> {
    let compiled = backend.compile(pattern)?;
    let player = backend.create_player(compiled)?;
    if let Err(err) = player.start(0.0) {
        let _ = player.stop();
        return Err(err);
    }
    Ok(player)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::engine::backend::{ManualTimeSource, SimulatedBackend};
    use crate::pattern::{presets, EventViolation, HapticEvent};

    fn started_engine() -> (HapticEngine, Arc<SimulatedBackend>, Arc<ManualTimeSource>) {
        let clock = Arc::new(ManualTimeSource::new());
        let backend = Arc::new(SimulatedBackend::with_time_source(clock.clone()));
        let engine = HapticEngine::new(backend.clone());
        engine.start().unwrap();
        (engine, backend, clock)
    }

    #[test]
    fn test_play_returns_handle_immediately() {
        let (engine, _, _) = started_engine();
        let player = PatternPlayer::new();

        let handle = player.play(&engine, &presets::sos()).unwrap();
        assert_eq!(handle.event_count(), 9);
        assert!(!handle.is_finished());
        assert_eq!(player.active_count(), 1);
    }

    #[test]
    fn test_not_ready_checked_before_validation() {
        let backend = Arc::new(SimulatedBackend::new());
        let engine = HapticEngine::new(backend);
        let player = PatternPlayer::new();

        let invalid = HapticPattern::new(vec![HapticEvent::continuous(0.0, 0.0)]);
        assert_eq!(
            player.play(&engine, &invalid).unwrap_err(),
            PlayError::EngineNotReady
        );
    }

    #[test]
    fn test_invalid_event_reports_index() {
        let (engine, backend, _) = started_engine();
        let player = PatternPlayer::new();

        let pattern = HapticPattern::new(vec![
            HapticEvent::transient(0.0),
            HapticEvent::transient(0.1).with_sharpness(2.0),
        ]);
        assert_eq!(
            player.play(&engine, &pattern).unwrap_err(),
            PlayError::InvalidEvent {
                index: 1,
                reason: EventViolation::SharpnessOutOfRange
            }
        );
        assert!(backend.compiled_patterns().is_empty());
    }

    #[test]
    fn test_player_start_failure_leaves_nothing_running() {
        let (engine, backend, _) = started_engine();
        backend.fail_player_start(Some(BackendError::Busy));
        let player = PatternPlayer::new();

        let err = player.play(&engine, &presets::sharp_tap()).unwrap_err();
        assert_eq!(
            err,
            PlayError::PlaybackFailed {
                cause: BackendError::Busy
            }
        );
        assert_eq!(backend.players_created(), 1);
        assert_eq!(backend.players_started(), 0);
        assert_eq!(backend.players_stopped(), 1);
        assert_eq!(player.active_count(), 0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (engine, backend, _) = started_engine();
        let player = PatternPlayer::new();
        let handle = player.play(&engine, &presets::sos()).unwrap();

        player.stop(&handle);
        player.stop(&handle);

        assert!(handle.is_stopped());
        assert!(handle.is_finished());
        assert_eq!(backend.players_stopped(), 1);
        assert_eq!(player.active_count(), 0);
    }

    #[test]
    fn test_stop_after_natural_finish_is_noop() {
        let (engine, backend, clock) = started_engine();
        let player = PatternPlayer::new();
        let handle = player.play(&engine, &presets::decay_series(10)).unwrap();

        clock.advance(Duration::from_secs(1));
        assert!(handle.is_finished());
        assert_eq!(player.active_count(), 0);

        player.stop(&handle);
        assert_eq!(backend.players_stopped(), 0);
        assert!(!handle.is_stopped());
        assert!(handle.is_finished());
    }

    #[test]
    fn test_stop_with_foreign_handle_keeps_own_playback_tracked() {
        let (engine, backend, _) = started_engine();
        let mine = PatternPlayer::new();
        let other = PatternPlayer::new();
        let own = mine.play(&engine, &presets::sos()).unwrap();
        let foreign = other.play(&engine, &presets::sos()).unwrap();
        assert_eq!(own.id(), foreign.id());

        mine.stop(&foreign);
        assert!(foreign.is_stopped());
        assert!(!own.is_finished());
        assert_eq!(mine.active_count(), 1);

        mine.stop_all();
        assert!(own.is_stopped());
        assert_eq!(backend.players_stopped(), 2);
    }

    #[test]
    fn test_stop_all_halts_running_playbacks() {
        let (engine, backend, _) = started_engine();
        let player = PatternPlayer::new();
        let first = player.play(&engine, &presets::sos()).unwrap();
        let second = player.play(&engine, &presets::sos()).unwrap();
        assert_ne!(first.id(), second.id());

        player.stop_all();
        assert!(first.is_stopped());
        assert!(second.is_stopped());
        assert_eq!(backend.players_stopped(), 2);
    }
}
