//! Trend Detector — slope to qualitative direction with confidence.

use crate::config::EngineTuning;
use crate::engine::features::SignalFeatures;
use crate::types::{TrendAssessment, TrendDirection};

/// Assess one signal's trend from its current feature snapshot.
///
/// The slope is normalized by the signal's healthy-band width before the
/// epsilon comparison, so a single `trend_epsilon` is meaningful across
/// signals with different units and scales. Direction is forced to Stable
/// while history is insufficient; confidence ramps linearly from 0 at
/// `min_samples` to 1 at a full window.
pub fn assess(
    features: &SignalFeatures,
    healthy_band_width: f64,
    tuning: &EngineTuning,
) -> TrendAssessment {
    // Band width is validated nonzero at config load.
    let magnitude = features.slope / healthy_band_width;

    let confidence = if features.samples < tuning.min_samples {
        0.0
    } else if tuning.window_size <= tuning.min_samples {
        1.0
    } else {
        let ramp = (features.samples - tuning.min_samples) as f64
            / (tuning.window_size - tuning.min_samples) as f64;
        ramp.clamp(0.0, 1.0)
    };

    let direction = if !features.sufficient {
        TrendDirection::Stable
    } else if magnitude > tuning.trend_epsilon {
        TrendDirection::Rising
    } else if magnitude < -tuning.trend_epsilon {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    };

    TrendAssessment {
        signal: features.signal,
        direction,
        magnitude,
        confidence,
    }
}
