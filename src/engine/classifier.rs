//! Status Classifier — per-signal severity scoring and the hysteresis
//! state machine.
//!
//! Severity comes from absolute thresholds; a confirmed rising trend on an
//! elevated value escalates one level but never into Fail — Fail always
//! requires the absolute `fail_over` breach, so a slope alone cannot declare
//! a failure. Transitions commit only after the configured number of
//! consecutive supporting readings; upgrades and downgrades carry
//! independent thresholds. Fail is latched: sensor data alone never
//! downgrades it, only an operator acknowledgement does.

use crate::config::{EngineTuning, HysteresisConfig, SignalConfig};
use crate::engine::features::SignalFeatures;
use crate::types::{ClassificationState, PendingTransition, PumpStatus, TrendAssessment, TrendDirection};

// ============================================================================
// Severity Scoring
// ============================================================================

/// Severity one signal contributes to the pump's candidate status.
pub fn signal_severity(
    features: &SignalFeatures,
    trend: &TrendAssessment,
    cfg: &SignalConfig,
    tuning: &EngineTuning,
) -> PumpStatus {
    // Insufficient history classifies Healthy-by-default with low confidence.
    if !features.sufficient {
        return PumpStatus::Healthy;
    }

    let value = features.latest;
    let base = if value >= cfg.fail_over {
        PumpStatus::Fail
    } else if value >= cfg.warning_over {
        PumpStatus::Warning
    } else {
        PumpStatus::Healthy
    };

    // Rising-trend escalation: an elevated-but-sub-threshold value with a
    // confirmed rising trend already supports WARNING. Capped below Fail.
    if base == PumpStatus::Healthy
        && trend.direction == TrendDirection::Rising
        && trend.confidence >= tuning.trend_min_confidence
        && value >= cfg.warning_over * tuning.elevated_fraction
    {
        return PumpStatus::Warning;
    }

    base
}

// ============================================================================
// Hysteresis State Machine
// ============================================================================

/// Result of applying one reading's candidate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionDecision {
    /// A transition was committed on this reading
    pub committed: bool,
    /// The candidate was an improvement out of Fail and was suppressed
    pub blocked_by_fail_latch: bool,
}

/// Advance the hysteresis state machine with this reading's candidate.
///
/// - candidate == current: the pending counter clears (a supporting reading
///   for the current status interrupts any opposing run).
/// - candidate != current: the pending counter increments if it already
///   tracks this candidate, otherwise restarts at 1. Reaching the applicable
///   threshold commits the transition and stamps `status_since`.
pub fn apply_candidate(
    state: &mut ClassificationState,
    candidate: PumpStatus,
    timestamp: u64,
    hysteresis: HysteresisConfig,
) -> TransitionDecision {
    if candidate == state.status {
        state.pending = None;
        return TransitionDecision {
            committed: false,
            blocked_by_fail_latch: false,
        };
    }

    // Fail latch: improvements out of Fail require acknowledge(), not data.
    if state.status == PumpStatus::Fail && candidate < PumpStatus::Fail {
        state.pending = None;
        return TransitionDecision {
            committed: false,
            blocked_by_fail_latch: true,
        };
    }

    let supporting = match state.pending {
        Some(p) if p.candidate == candidate => p.supporting_readings + 1,
        _ => 1,
    };

    let threshold = if candidate > state.status {
        hysteresis.upgrade
    } else {
        hysteresis.downgrade
    };

    if supporting >= threshold {
        state.status = candidate;
        state.status_since = timestamp;
        state.pending = None;
        TransitionDecision {
            committed: true,
            blocked_by_fail_latch: false,
        }
    } else {
        state.pending = Some(PendingTransition {
            candidate,
            supporting_readings: supporting,
        });
        TransitionDecision {
            committed: false,
            blocked_by_fail_latch: false,
        }
    }
}

/// Operator acknowledgement of a failed pump: back to Warning for
/// re-evaluation, counters cleared. Feature windows are left intact by the
/// caller. Returns false when the pump was not in Fail (counters are still
/// cleared).
pub fn acknowledge(state: &mut ClassificationState, timestamp: u64) -> bool {
    state.pending = None;
    if state.status == PumpStatus::Fail {
        state.status = PumpStatus::Warning;
        state.status_since = timestamp;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Signal;

    fn tuning() -> EngineTuning {
        EngineTuning {
            window_size: 5,
            min_samples: 3,
            max_gap_secs: 3600,
            trend_epsilon: 0.001,
            trend_min_confidence: 0.5,
            elevated_fraction: 0.85,
        }
    }

    fn signal_cfg() -> SignalConfig {
        SignalConfig {
            plausible_min: 0.0,
            plausible_max: 50.0,
            healthy_min: 0.0,
            healthy_max: 4.0,
            warning_over: 4.5,
            fail_over: 7.1,
        }
    }

    fn features(latest: f64) -> SignalFeatures {
        SignalFeatures {
            signal: Signal::Vibration,
            samples: 5,
            mean: latest,
            std_dev: 0.1,
            slope: 0.0,
            latest,
            sufficient: true,
        }
    }

    fn trend(direction: TrendDirection, confidence: f64) -> TrendAssessment {
        TrendAssessment {
            signal: Signal::Vibration,
            direction,
            magnitude: 0.01,
            confidence,
        }
    }

    #[test]
    fn absolute_thresholds_map_to_severity() {
        let cfg = signal_cfg();
        let t = trend(TrendDirection::Stable, 1.0);
        assert_eq!(
            signal_severity(&features(2.0), &t, &cfg, &tuning()),
            PumpStatus::Healthy
        );
        assert_eq!(
            signal_severity(&features(5.0), &t, &cfg, &tuning()),
            PumpStatus::Warning
        );
        assert_eq!(
            signal_severity(&features(8.0), &t, &cfg, &tuning()),
            PumpStatus::Fail
        );
    }

    #[test]
    fn rising_trend_escalates_elevated_value() {
        let cfg = signal_cfg();
        // 4.0 < warning (4.5) but above the elevated floor (4.5 * 0.85 = 3.825)
        let rising = trend(TrendDirection::Rising, 1.0);
        assert_eq!(
            signal_severity(&features(4.0), &rising, &cfg, &tuning()),
            PumpStatus::Warning
        );
        // Same value, stable trend: one level lower.
        let stable = trend(TrendDirection::Stable, 1.0);
        assert_eq!(
            signal_severity(&features(4.0), &stable, &cfg, &tuning()),
            PumpStatus::Healthy
        );
    }

    #[test]
    fn escalation_requires_confidence() {
        let cfg = signal_cfg();
        let rising_low_conf = trend(TrendDirection::Rising, 0.2);
        assert_eq!(
            signal_severity(&features(4.0), &rising_low_conf, &cfg, &tuning()),
            PumpStatus::Healthy
        );
    }

    #[test]
    fn escalation_never_reaches_fail() {
        let cfg = signal_cfg();
        let rising = trend(TrendDirection::Rising, 1.0);
        // Well above warning, rising — still Warning, not Fail.
        assert_eq!(
            signal_severity(&features(6.9), &rising, &cfg, &tuning()),
            PumpStatus::Warning
        );
    }

    #[test]
    fn insufficient_history_is_healthy_regardless_of_value() {
        let cfg = signal_cfg();
        let mut f = features(40.0);
        f.sufficient = false;
        let t = trend(TrendDirection::Stable, 0.0);
        assert_eq!(signal_severity(&f, &t, &cfg, &tuning()), PumpStatus::Healthy);
    }

    #[test]
    fn transition_commits_only_at_threshold() {
        let h = HysteresisConfig {
            upgrade: 3,
            downgrade: 5,
        };
        let mut state = ClassificationState::new(0);

        for (i, ts) in [10u64, 20, 30].iter().enumerate() {
            let d = apply_candidate(&mut state, PumpStatus::Warning, *ts, h);
            if i < 2 {
                assert!(!d.committed);
                assert_eq!(state.status, PumpStatus::Healthy);
                assert_eq!(state.consecutive_supporting_readings(), i as u32 + 1);
            } else {
                assert!(d.committed);
                assert_eq!(state.status, PumpStatus::Warning);
                assert_eq!(state.status_since, 30);
                assert_eq!(state.consecutive_supporting_readings(), 0);
            }
        }
    }

    #[test]
    fn supporting_reading_for_current_status_clears_pending() {
        let h = HysteresisConfig {
            upgrade: 3,
            downgrade: 3,
        };
        let mut state = ClassificationState::new(0);
        apply_candidate(&mut state, PumpStatus::Warning, 10, h);
        apply_candidate(&mut state, PumpStatus::Warning, 20, h);
        assert_eq!(state.consecutive_supporting_readings(), 2);
        // A healthy reading interrupts the run entirely.
        apply_candidate(&mut state, PumpStatus::Healthy, 30, h);
        assert_eq!(state.consecutive_supporting_readings(), 0);
        // The run must start over.
        apply_candidate(&mut state, PumpStatus::Warning, 40, h);
        assert_eq!(state.consecutive_supporting_readings(), 1);
        assert_eq!(state.status, PumpStatus::Healthy);
    }

    #[test]
    fn candidate_change_restarts_counter() {
        let h = HysteresisConfig {
            upgrade: 3,
            downgrade: 3,
        };
        let mut state = ClassificationState::new(0);
        apply_candidate(&mut state, PumpStatus::Warning, 10, h);
        apply_candidate(&mut state, PumpStatus::Fail, 20, h);
        assert_eq!(state.consecutive_supporting_readings(), 1);
        assert_eq!(state.pending.unwrap().candidate, PumpStatus::Fail);
    }

    #[test]
    fn fail_is_latched_until_acknowledged() {
        let h = HysteresisConfig {
            upgrade: 1,
            downgrade: 1,
        };
        let mut state = ClassificationState::new(0);
        apply_candidate(&mut state, PumpStatus::Fail, 10, h);
        assert_eq!(state.status, PumpStatus::Fail);

        // Even with downgrade hysteresis of 1, healthy data cannot clear Fail.
        let d = apply_candidate(&mut state, PumpStatus::Healthy, 20, h);
        assert!(!d.committed);
        assert!(d.blocked_by_fail_latch);
        assert_eq!(state.status, PumpStatus::Fail);

        assert!(acknowledge(&mut state, 30));
        assert_eq!(state.status, PumpStatus::Warning);
        assert_eq!(state.status_since, 30);
    }

    #[test]
    fn acknowledge_outside_fail_only_clears_counters() {
        let h = HysteresisConfig {
            upgrade: 3,
            downgrade: 3,
        };
        let mut state = ClassificationState::new(0);
        apply_candidate(&mut state, PumpStatus::Warning, 10, h);
        assert!(!acknowledge(&mut state, 20));
        assert_eq!(state.status, PumpStatus::Healthy);
        assert_eq!(state.consecutive_supporting_readings(), 0);
    }
}
