//! Declarative haptic patterns.
//!
//! A [`HapticPattern`] is an ordered list of [`HapticEvent`]s kept in the
//! order they were authored. Events are not sorted by time and may overlap;
//! overlap handling belongs to the backend.

mod event;
pub mod presets;

use serde::{Deserialize, Serialize};

pub use event::{
    EventViolation, HapticEvent, HapticEventKind, DEFAULT_INTENSITY, DEFAULT_SHARPNESS,
};

/// Immutable, ordered collection of haptic events forming one playable effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HapticPattern {
    events: Vec<HapticEvent>,
}

impl HapticPattern {
    /// Wrap `events` in authoring order. No validation happens here.
    pub fn new(events: Vec<HapticEvent>) -> Self {
        Self { events }
    }

    pub fn builder() -> PatternBuilder {
        PatternBuilder::default()
    }

    pub fn events(&self) -> &[HapticEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Seconds from pattern start until the last event finishes.
    pub fn duration(&self) -> f64 {
        self.events
            .iter()
            .map(HapticEvent::end_time)
            .fold(0.0_f64, f64::max)
    }

    /// Lowest-index invalid event, if any.
    pub fn first_violation(&self) -> Option<(usize, EventViolation)> {
        self.events
            .iter()
            .enumerate()
            .find_map(|(index, event)| event.validate().err().map(|reason| (index, reason)))
    }
}

impl From<Vec<HapticEvent>> for HapticPattern {
    fn from(events: Vec<HapticEvent>) -> Self {
        Self::new(events)
    }
}

/// Incremental construction of a [`HapticPattern`].
#[derive(Debug, Clone, Default)]
pub struct PatternBuilder {
    events: Vec<HapticEvent>,
}

impl PatternBuilder {
    pub fn event(mut self, event: HapticEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn transient(self, relative_time: f64, intensity: f32, sharpness: f32) -> Self {
        self.event(
            HapticEvent::transient(relative_time)
                .with_intensity(intensity)
                .with_sharpness(sharpness),
        )
    }

    pub fn continuous(
        self,
        relative_time: f64,
        duration: f64,
        intensity: f32,
        sharpness: f32,
    ) -> Self {
        self.event(
            HapticEvent::continuous(relative_time, duration)
                .with_intensity(intensity)
                .with_sharpness(sharpness),
        )
    }

    pub fn build(self) -> HapticPattern {
        HapticPattern::new(self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pattern_has_zero_duration() {
        let pattern = HapticPattern::default();
        assert!(pattern.is_empty());
        assert_eq!(pattern.duration(), 0.0);
        assert!(pattern.first_violation().is_none());
    }

    #[test]
    fn test_builder_preserves_authoring_order() {
        let pattern = HapticPattern::builder()
            .transient(0.5, 1.0, 1.0)
            .continuous(0.0, 0.25, 0.4, 0.2)
            .build();

        assert_eq!(pattern.len(), 2);
        assert_eq!(pattern.events()[0].relative_time, 0.5);
        assert_eq!(pattern.events()[1].kind, HapticEventKind::Continuous);
    }

    #[test]
    fn test_duration_uses_latest_end_time() {
        let pattern = HapticPattern::new(vec![
            HapticEvent::continuous(0.0, 2.0),
            HapticEvent::transient(1.5),
        ]);
        assert!((pattern.duration() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_violation_reports_lowest_index() {
        let pattern = HapticPattern::new(vec![
            HapticEvent::transient(0.0),
            HapticEvent::continuous(0.1, 0.0),
            HapticEvent::transient(-1.0),
        ]);
        assert_eq!(
            pattern.first_violation(),
            Some((1, EventViolation::ContinuousWithoutDuration))
        );
    }

    #[test]
    fn test_json_is_a_plain_event_array() {
        let pattern: HapticPattern = serde_json::from_str(
            r#"[
                {"kind":"transient","relative_time":0.0,"intensity":1.0,"sharpness":1.0},
                {"kind":"continuous","relative_time":0.2,"duration":0.3}
            ]"#,
        )
        .unwrap();
        assert_eq!(pattern.len(), 2);
        assert!((pattern.duration() - 0.5).abs() < 1e-9);
    }
}
