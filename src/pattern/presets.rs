//! Ready-made patterns: a single sharp tap, a fading tap series and a
//! Morse-code SOS mixing taps with sustained buzzes.

use super::{HapticEvent, HapticPattern};

/// Number of taps in the default decay series.
pub const DECAY_SERIES_STEPS: usize = 10;

/// Seconds covered by a decay series, independent of its step count.
pub const DECAY_SERIES_SPAN: f64 = 1.0;

/// Names accepted by [`by_name`].
pub const PRESET_NAMES: [&str; 3] = ["sharp_tap", "decay_series", "sos"];

/// One strong, sharp tap at t=0.
pub fn sharp_tap() -> HapticPattern {
    HapticPattern::builder().transient(0.0, 1.0, 1.0).build()
}

/// Taps at even offsets fading from strong and sharp toward weak and dull.
///
/// Tap `i` sits at `t = i / steps` seconds with intensity and sharpness
/// `1 - t`. `steps == 0` yields an empty pattern.
pub fn decay_series(steps: usize) -> HapticPattern {
    let events = (0..steps)
        .map(|i| {
            let t = DECAY_SERIES_SPAN * i as f64 / steps as f64;
            let level = (1.0 - t) as f32;
            HapticEvent::transient(t)
                .with_intensity(level)
                .with_sharpness(level)
        })
        .collect();
    HapticPattern::new(events)
}

/// SOS in Morse (`... --- ...`): three taps, three 0.5 s buzzes, three taps.
///
/// Events carry the default intensity and sharpness.
pub fn sos() -> HapticPattern {
    const SHORT_GAP: f64 = 0.2;
    const LONG_START: f64 = 0.6;
    const LONG_GAP: f64 = 0.6;
    const LONG_DURATION: f64 = 0.5;
    const TAIL_START: f64 = 2.4;

    let mut builder = HapticPattern::builder();
    for i in 0..3 {
        builder = builder.event(HapticEvent::transient(SHORT_GAP * i as f64));
    }
    for i in 0..3 {
        builder = builder.event(HapticEvent::continuous(
            LONG_START + LONG_GAP * i as f64,
            LONG_DURATION,
        ));
    }
    for i in 0..3 {
        builder = builder.event(HapticEvent::transient(TAIL_START + SHORT_GAP * i as f64));
    }
    builder.build()
}

/// Look a preset up by name (see [`PRESET_NAMES`]).
pub fn by_name(name: &str) -> Option<HapticPattern> {
    match name {
        "sharp_tap" => Some(sharp_tap()),
        "decay_series" => Some(decay_series(DECAY_SERIES_STEPS)),
        "sos" => Some(sos()),
        _ => None,
    }
}
