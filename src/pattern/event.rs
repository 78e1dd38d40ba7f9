//! Haptic event descriptor and its validation rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Intensity used when an event is authored without an explicit value.
pub const DEFAULT_INTENSITY: f32 = 1.0;

/// Sharpness used when an event is authored without an explicit value.
pub const DEFAULT_SHARPNESS: f32 = 0.5;

/// Discrete pulse or sustained buzz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HapticEventKind {
    Transient,
    Continuous,
}

/// One timed instruction to the haptics hardware.
///
/// Times are in seconds relative to the start of the owning pattern.
/// Construction never fails; invariants are checked by [`HapticEvent::validate`]
/// when the event is played.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HapticEvent {
    pub kind: HapticEventKind,
    pub relative_time: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default = "default_sharpness")]
    pub sharpness: f32,
}

fn default_intensity() -> f32 {
    DEFAULT_INTENSITY
}

fn default_sharpness() -> f32 {
    DEFAULT_SHARPNESS
}

/// Reason an event failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventViolation {
    /// `relative_time` or `duration` is NaN or infinite
    NonFiniteValue { field: &'static str },
    NegativeRelativeTime,
    /// Transient events are instantaneous
    TransientWithDuration,
    /// Continuous events need a positive duration
    ContinuousWithoutDuration,
    IntensityOutOfRange,
    SharpnessOutOfRange,
}

impl fmt::Display for EventViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventViolation::NonFiniteValue { field } => write!(f, "{} must be finite", field),
            EventViolation::NegativeRelativeTime => write!(f, "relative time must be >= 0"),
            EventViolation::TransientWithDuration => {
                write!(f, "transient events must have zero duration")
            }
            EventViolation::ContinuousWithoutDuration => {
                write!(f, "continuous events must have a positive duration")
            }
            EventViolation::IntensityOutOfRange => write!(f, "intensity must be in [0.0, 1.0]"),
            EventViolation::SharpnessOutOfRange => write!(f, "sharpness must be in [0.0, 1.0]"),
        }
    }
}

impl HapticEvent {
    /// Instantaneous pulse at `relative_time` with default parameters.
    pub fn transient(relative_time: f64) -> Self {
        Self {
            kind: HapticEventKind::Transient,
            relative_time,
            duration: 0.0,
            intensity: DEFAULT_INTENSITY,
            sharpness: DEFAULT_SHARPNESS,
        }
    }

    /// Sustained buzz starting at `relative_time` lasting `duration` seconds.
    pub fn continuous(relative_time: f64, duration: f64) -> Self {
        Self {
            kind: HapticEventKind::Continuous,
            relative_time,
            duration,
            intensity: DEFAULT_INTENSITY,
            sharpness: DEFAULT_SHARPNESS,
        }
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_sharpness(mut self, sharpness: f32) -> Self {
        self.sharpness = sharpness;
        self
    }

    /// Pattern-relative time at which the event finishes.
    pub fn end_time(&self) -> f64 {
        self.relative_time + self.duration
    }

    /// Check the event invariants.
    ///
    /// Checks run in a fixed order (time, duration, intensity, sharpness) so
    /// an event with several problems always reports the same one.
    pub fn validate(&self) -> Result<(), EventViolation> {
        if !self.relative_time.is_finite() {
            return Err(EventViolation::NonFiniteValue {
                field: "relative_time",
            });
        }
        if self.relative_time < 0.0 {
            return Err(EventViolation::NegativeRelativeTime);
        }

        if !self.duration.is_finite() {
            return Err(EventViolation::NonFiniteValue { field: "duration" });
        }
        match self.kind {
            HapticEventKind::Transient if self.duration != 0.0 => {
                return Err(EventViolation::TransientWithDuration);
            }
            HapticEventKind::Continuous if self.duration <= 0.0 => {
                return Err(EventViolation::ContinuousWithoutDuration);
            }
            _ => {}
        }

        if !(0.0..=1.0).contains(&self.intensity) {
            return Err(EventViolation::IntensityOutOfRange);
        }
        if !(0.0..=1.0).contains(&self.sharpness) {
            return Err(EventViolation::SharpnessOutOfRange);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_defaults() {
        let event = HapticEvent::transient(0.25);
        assert_eq!(event.kind, HapticEventKind::Transient);
        assert_eq!(event.duration, 0.0);
        assert_eq!(event.intensity, DEFAULT_INTENSITY);
        assert_eq!(event.sharpness, DEFAULT_SHARPNESS);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_continuous_end_time() {
        let event = HapticEvent::continuous(0.6, 0.5);
        assert!((event.end_time() - 1.1).abs() < 1e-9);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_transient_with_duration_rejected() {
        let mut event = HapticEvent::transient(0.0);
        event.duration = 0.1;
        assert_eq!(
            event.validate(),
            Err(EventViolation::TransientWithDuration)
        );
    }

    #[test]
    fn test_continuous_without_duration_rejected() {
        assert_eq!(
            HapticEvent::continuous(0.0, 0.0).validate(),
            Err(EventViolation::ContinuousWithoutDuration)
        );
        assert_eq!(
            HapticEvent::continuous(0.0, -0.5).validate(),
            Err(EventViolation::ContinuousWithoutDuration)
        );
    }

    #[test]
    fn test_negative_time_rejected() {
        assert_eq!(
            HapticEvent::transient(-0.1).validate(),
            Err(EventViolation::NegativeRelativeTime)
        );
    }

    #[test]
    fn test_non_finite_values_rejected() {
        assert_eq!(
            HapticEvent::transient(f64::NAN).validate(),
            Err(EventViolation::NonFiniteValue {
                field: "relative_time"
            })
        );
        assert_eq!(
            HapticEvent::continuous(0.0, f64::INFINITY).validate(),
            Err(EventViolation::NonFiniteValue { field: "duration" })
        );
    }

    #[test]
    fn test_parameter_ranges() {
        assert_eq!(
            HapticEvent::transient(0.0).with_intensity(1.5).validate(),
            Err(EventViolation::IntensityOutOfRange)
        );
        assert_eq!(
            HapticEvent::transient(0.0).with_sharpness(-0.1).validate(),
            Err(EventViolation::SharpnessOutOfRange)
        );
        assert_eq!(
            HapticEvent::transient(0.0).with_intensity(f32::NAN).validate(),
            Err(EventViolation::IntensityOutOfRange)
        );
        assert!(HapticEvent::transient(0.0)
            .with_intensity(0.0)
            .with_sharpness(1.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_time_checked_before_parameters() {
        let event = HapticEvent::transient(-1.0).with_intensity(2.0);
        assert_eq!(event.validate(), Err(EventViolation::NegativeRelativeTime));
    }

    #[test]
    fn test_json_defaults_fill_parameters() {
        let event: HapticEvent =
            serde_json::from_str(r#"{"kind":"transient","relative_time":0.2}"#).unwrap();
        assert_eq!(event, HapticEvent::transient(0.2));
    }
}
