//! Pump Health Engine
//!
//! ## Pipeline per reading
//!
//! ```text
//! STAGE 1: Reading Validator   (order + plausibility, reject scoped to pump)
//! STAGE 2: Feature Extractor   (rolling window insert, mean/stddev/slope)
//! STAGE 3: Trend Detector      (normalized slope -> direction/confidence)
//! STAGE 4: Status Classifier   (severity + hysteresis state machine)
//! STAGE 5: Advisory Generator  (first-match rule table, literal-value justification)
//! STAGE 6: Event Emitter       (transition / heartbeat records, bounded queue)
//! ```
//!
//! Per-pump state lives in a registry keyed by pump id; pumps never interact.
//! Readings for one pump must arrive in timestamp order through the engine's
//! `&mut self` contract — that single-writer discipline is what keeps the
//! hysteresis counters meaningful. Everything here is synchronous and
//! deterministic: replaying a batch through a fresh engine reproduces
//! byte-identical events.

pub mod advisor;
pub mod classifier;
pub mod emitter;
pub mod features;
pub mod trend;
pub mod validator;

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PumpConfig;
use crate::errors::{EngineError, ProcessingNotice, ReadingError};
use crate::types::{
    Advisory, ClassificationState, EventKind, HealthEvent, PumpStatus, SensorReading, Signal,
    TrendAssessment, TrendSummary,
};

use advisor::{AdvisoryContext, RuleTable};
use emitter::EventEmitter;
use features::{FeatureSet, SignalFeatures};

// ============================================================================
// Per-Pump State
// ============================================================================

/// Everything the engine keeps for one pump between readings.
#[derive(Debug)]
struct PumpState {
    /// Timestamp of the last accepted reading (validator state)
    last_accepted: Option<u64>,
    /// Rolling windows, one per signal
    features: FeatureSet,
    /// Hysteresis state machine
    classification: ClassificationState,
    /// Timestamp of the last emitted event (heartbeat cadence)
    last_emit: Option<u64>,
}

impl PumpState {
    fn new(window_size: usize, timestamp: u64) -> Self {
        Self {
            last_accepted: None,
            features: FeatureSet::new(window_size),
            classification: ClassificationState::new(timestamp),
            last_emit: None,
        }
    }
}

// ============================================================================
// Outcomes & Stats
// ============================================================================

/// What processing one accepted reading produced.
#[derive(Debug, Clone)]
pub struct ReadingOutcome {
    pub pump_id: String,
    /// Committed status after this reading
    pub status: PumpStatus,
    /// The candidate this reading supported (may differ while hysteresis
    /// holds the committed status)
    pub candidate: PumpStatus,
    pub transition_committed: bool,
    /// Per-signal trends in fixed signal order
    pub trends: Vec<TrendAssessment>,
    /// Informational conditions (insufficient history, gap reset, ...)
    pub notices: Vec<ProcessingNotice>,
    /// Kind of event emitted for this reading, if any
    pub emitted: Option<EventKind>,
}

/// Counters since engine construction.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EngineStats {
    pub readings_accepted: u64,
    pub readings_rejected: u64,
    pub transitions_committed: u64,
    pub heartbeats_emitted: u64,
    pub acknowledgements: u64,
    pub fallback_advisories: u64,
}

// ============================================================================
// Engine
// ============================================================================

/// Deterministic pump-health classification engine.
pub struct PumpHealthEngine {
    config: PumpConfig,
    rules: RuleTable,
    pumps: HashMap<String, PumpState>,
    emitter: EventEmitter,
    stats: EngineStats,
}

impl PumpHealthEngine {
    /// Engine with the built-in advisory rule table.
    ///
    /// The config is expected to have passed [`PumpConfig::validate`]
    /// (loading via `PumpConfig::load_from_file` guarantees it).
    pub fn new(config: PumpConfig) -> Self {
        Self::with_rules(config, RuleTable::standard())
    }

    /// Engine with a caller-supplied advisory rule table.
    pub fn with_rules(config: PumpConfig, rules: RuleTable) -> Self {
        let emitter = EventEmitter::new(config.emitter);
        Self {
            config,
            rules,
            pumps: HashMap::new(),
            emitter,
            stats: EngineStats::default(),
        }
    }

    /// Process one reading through the full pipeline.
    ///
    /// Rejections return `Err` and leave all state untouched; the error is
    /// scoped to this pump and reading, and processing of other pumps or
    /// later readings is unaffected.
    pub fn process_reading(
        &mut self,
        reading: &SensorReading,
    ) -> Result<ReadingOutcome, ReadingError> {
        let last_accepted = self
            .pumps
            .get(&reading.pump_id)
            .and_then(|s| s.last_accepted);

        if let Err(err) = validator::validate(reading, last_accepted, &self.config.signals) {
            self.stats.readings_rejected += 1;
            warn!(pump_id = %reading.pump_id, error = %err, "Reading rejected");
            return Err(err);
        }

        let config = &self.config;
        let state = self
            .pumps
            .entry(reading.pump_id.clone())
            .or_insert_with(|| PumpState::new(config.engine.window_size, reading.timestamp));

        let mut notices = Vec::new();

        // Stale-gap handling: discard history rather than silently bridging.
        if let Some(last) = state.last_accepted {
            let gap = reading.timestamp - last;
            if gap > config.engine.max_gap_secs {
                state.features.reset_all();
                info!(
                    pump_id = %reading.pump_id,
                    gap_secs = gap,
                    max_gap_secs = config.engine.max_gap_secs,
                    "Stale gap — feature windows reset"
                );
                notices.push(ProcessingNotice::StaleGapReset {
                    gap_secs: gap,
                    max_gap_secs: config.engine.max_gap_secs,
                });
            }
        }
        state.last_accepted = Some(reading.timestamp);

        for signal in Signal::ALL {
            state
                .features
                .window_mut(signal)
                .insert(reading.timestamp, reading.value(signal));
        }

        let evals = evaluate_signals(&state.features, config);
        for (f, _, _) in &evals {
            if !f.sufficient {
                notices.push(ProcessingNotice::InsufficientHistory {
                    signal: f.signal,
                    samples: f.samples,
                    required: config.engine.min_samples,
                });
            }
        }

        let candidate = evals
            .iter()
            .map(|&(_, _, sev)| sev)
            .max()
            .unwrap_or(PumpStatus::Healthy);

        let decision = classifier::apply_candidate(
            &mut state.classification,
            candidate,
            reading.timestamp,
            config.hysteresis,
        );
        if decision.committed {
            self.stats.transitions_committed += 1;
            info!(
                pump_id = %reading.pump_id,
                status = %state.classification.status,
                timestamp = reading.timestamp,
                "Status transition committed"
            );
        } else if decision.blocked_by_fail_latch {
            debug!(
                pump_id = %reading.pump_id,
                candidate = %candidate,
                "Improvement suppressed — FAIL held pending acknowledgement"
            );
        }

        // Emission: every committed transition, plus heartbeats on cadence.
        let kind = if decision.committed {
            Some(EventKind::Transition)
        } else if self
            .emitter
            .heartbeat_due(state.last_emit, reading.timestamp)
        {
            Some(EventKind::Heartbeat)
        } else {
            None
        };

        if let Some(kind) = kind {
            let trigger_idx = select_trigger(&evals);
            let (ref trig_features, ref trig_trend, _) = evals[trigger_idx];
            let ctx = AdvisoryContext {
                pump_id: &reading.pump_id,
                status: state.classification.status,
                trigger: trig_features,
                trend: trig_trend,
                signal_cfg: config.signals.get(trig_features.signal),
                tuning: &config.engine,
            };
            let (advisory, rule_notice) = self.rules.advise(&ctx, &config.advisory);
            if let Some(n) = rule_notice {
                warn!(pump_id = %reading.pump_id, "{}", n);
                self.stats.fallback_advisories += 1;
                notices.push(n);
            }

            let event = build_event(state, &reading.pump_id, advisory, &evals, reading.timestamp, kind);
            self.emitter.push(event);
            state.last_emit = Some(reading.timestamp);
            if kind == EventKind::Heartbeat {
                self.stats.heartbeats_emitted += 1;
            }
        }

        self.stats.readings_accepted += 1;

        Ok(ReadingOutcome {
            pump_id: reading.pump_id.clone(),
            status: state.classification.status,
            candidate,
            transition_committed: decision.committed,
            trends: evals.iter().map(|&(_, t, _)| t).collect(),
            notices,
            emitted: kind,
        })
    }

    /// Operator acknowledgement of a failed pump.
    ///
    /// Moves FAIL back to the re-evaluation state (WARNING) with hysteresis
    /// counters cleared; feature-window history is kept. Returns whether a
    /// FAIL was actually cleared. Unknown pumps are an error.
    pub fn acknowledge(&mut self, pump_id: &str) -> Result<bool, EngineError> {
        let config = &self.config;
        let state = self
            .pumps
            .get_mut(pump_id)
            .ok_or_else(|| EngineError::UnknownPump(pump_id.to_string()))?;

        let timestamp = state
            .last_accepted
            .unwrap_or(state.classification.status_since);
        let cleared = classifier::acknowledge(&mut state.classification, timestamp);

        if cleared {
            self.stats.acknowledgements += 1;
            info!(pump_id = %pump_id, "FAIL acknowledged — pump re-entering evaluation");

            let evals = evaluate_signals(&state.features, config);
            let trigger_idx = select_trigger(&evals);
            let (ref trig_features, ref trig_trend, _) = evals[trigger_idx];
            let ctx = AdvisoryContext {
                pump_id,
                status: state.classification.status,
                trigger: trig_features,
                trend: trig_trend,
                signal_cfg: config.signals.get(trig_features.signal),
                tuning: &config.engine,
            };
            let (advisory, _) = self.rules.advise(&ctx, &config.advisory);
            let event = build_event(
                state,
                pump_id,
                advisory,
                &evals,
                timestamp,
                EventKind::Acknowledgement,
            );
            self.emitter.push(event);
            state.last_emit = Some(timestamp);
        }

        Ok(cleared)
    }

    /// Remove all state for a pump. The only way per-pump state is deleted.
    pub fn deregister(&mut self, pump_id: &str) -> Result<(), EngineError> {
        self.pumps
            .remove(pump_id)
            .map(|_| ())
            .ok_or_else(|| EngineError::UnknownPump(pump_id.to_string()))
    }

    /// Drain all queued output events in emission order.
    pub fn drain_events(&mut self) -> Vec<HealthEvent> {
        self.emitter.drain()
    }

    /// Committed classification state for a pump, if registered.
    pub fn classification(&self, pump_id: &str) -> Option<&ClassificationState> {
        self.pumps.get(pump_id).map(|s| &s.classification)
    }

    pub fn pump_count(&self) -> usize {
        self.pumps.len()
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    /// Heartbeats evicted under queue pressure (observability).
    pub fn dropped_heartbeats(&self) -> u64 {
        self.emitter.dropped_heartbeats()
    }
}

// ============================================================================
// Helpers
// ============================================================================

type SignalEval = (SignalFeatures, TrendAssessment, PumpStatus);

/// Features, trend, and severity for every signal, in fixed signal order.
fn evaluate_signals(features: &FeatureSet, config: &PumpConfig) -> Vec<SignalEval> {
    Signal::ALL
        .iter()
        .map(|&signal| {
            let f = features.features(signal, config.engine.min_samples);
            let cfg = config.signals.get(signal);
            let t = trend::assess(&f, cfg.healthy_band_width(), &config.engine);
            let sev = classifier::signal_severity(&f, &t, cfg, &config.engine);
            (f, t, sev)
        })
        .collect()
}

/// Index of the triggering signal: worst severity, ties broken by larger
/// normalized trend magnitude, then fixed signal order.
fn select_trigger(evals: &[SignalEval]) -> usize {
    let mut best = 0;
    for i in 1..evals.len() {
        let (best_sev, best_mag) = (evals[best].2, evals[best].1.magnitude.abs());
        let (sev, mag) = (evals[i].2, evals[i].1.magnitude.abs());
        if sev > best_sev || (sev == best_sev && mag > best_mag) {
            best = i;
        }
    }
    best
}

fn build_event(
    state: &PumpState,
    pump_id: &str,
    advisory: Advisory,
    evals: &[SignalEval],
    emitted_at: u64,
    kind: EventKind,
) -> HealthEvent {
    HealthEvent {
        pump_id: pump_id.to_string(),
        status: state.classification.status,
        status_since: state.classification.status_since,
        trend_summary: evals
            .iter()
            .map(|&(_, t, _)| TrendSummary {
                signal: t.signal,
                direction: t.direction,
                magnitude: t.magnitude,
            })
            .collect(),
        advisory,
        emitted_at,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AdvisoryConfig, EmitterConfig, EngineTuning, HysteresisConfig, MonitorInfo, SignalConfig,
        SignalThresholds,
    };

    fn test_config() -> PumpConfig {
        let sig = SignalConfig {
            plausible_min: 0.0,
            plausible_max: 200.0,
            healthy_min: 0.0,
            healthy_max: 4.0,
            warning_over: 4.5,
            fail_over: 7.1,
        };
        PumpConfig {
            monitor: MonitorInfo::default(),
            engine: EngineTuning {
                window_size: 5,
                min_samples: 3,
                max_gap_secs: 3600,
                trend_epsilon: 0.001,
                trend_min_confidence: 0.5,
                elevated_fraction: 0.85,
            },
            hysteresis: HysteresisConfig {
                upgrade: 2,
                downgrade: 4,
            },
            emitter: EmitterConfig {
                heartbeat_secs: 300,
                queue_capacity: 64,
            },
            advisory: AdvisoryConfig {
                fail_urgency_hours: 4,
                warning_urgency_hours: 48,
                healthy_urgency_hours: 720,
            },
            signals: SignalThresholds {
                vibration: sig,
                motor_current: SignalConfig {
                    healthy_max: 8.0,
                    warning_over: 10.0,
                    fail_over: 14.0,
                    ..sig
                },
                temperature: SignalConfig {
                    healthy_max: 55.0,
                    warning_over: 70.0,
                    fail_over: 90.0,
                    ..sig
                },
            },
        }
    }

    fn reading(pump: &str, ts: u64, vib: f64) -> SensorReading {
        SensorReading {
            pump_id: pump.to_string(),
            timestamp: ts,
            vibration_mm_s: vib,
            motor_current_a: 6.0,
            temperature_c: 41.0,
        }
    }

    #[test]
    fn lazy_registration_on_first_accepted_reading() {
        let mut engine = PumpHealthEngine::new(test_config());
        assert_eq!(engine.pump_count(), 0);
        engine.process_reading(&reading("P-1", 0, 2.0)).unwrap();
        assert_eq!(engine.pump_count(), 1);
        assert!(engine.classification("P-1").is_some());
    }

    #[test]
    fn rejected_first_reading_does_not_register_pump() {
        let mut engine = PumpHealthEngine::new(test_config());
        let err = engine.process_reading(&reading("P-1", 0, -5.0));
        assert!(err.is_err());
        assert_eq!(engine.pump_count(), 0);
        assert_eq!(engine.stats().readings_rejected, 1);
    }

    #[test]
    fn rejection_leaves_other_pumps_untouched() {
        let mut engine = PumpHealthEngine::new(test_config());
        engine.process_reading(&reading("P-1", 0, 2.0)).unwrap();
        engine.process_reading(&reading("P-2", 0, 2.0)).unwrap();
        let before = engine.classification("P-1").cloned();

        assert!(engine.process_reading(&reading("P-2", 10, -1.0)).is_err());
        assert_eq!(engine.classification("P-1").cloned(), before);
        // P-2 continues from its last accepted state.
        let out = engine.process_reading(&reading("P-2", 20, 2.1)).unwrap();
        assert_eq!(out.status, PumpStatus::Healthy);
    }

    #[test]
    fn first_readings_report_insufficient_history() {
        let mut engine = PumpHealthEngine::new(test_config());
        let out = engine.process_reading(&reading("P-1", 0, 100.0)).unwrap();
        // Value is way over fail_over but history is insufficient.
        assert_eq!(out.status, PumpStatus::Healthy);
        assert_eq!(out.candidate, PumpStatus::Healthy);
        assert!(out
            .notices
            .iter()
            .any(|n| matches!(n, ProcessingNotice::InsufficientHistory { .. })));
    }

    #[test]
    fn deregister_removes_state() {
        let mut engine = PumpHealthEngine::new(test_config());
        engine.process_reading(&reading("P-1", 0, 2.0)).unwrap();
        engine.deregister("P-1").unwrap();
        assert_eq!(engine.pump_count(), 0);
        assert_eq!(
            engine.deregister("P-1"),
            Err(EngineError::UnknownPump("P-1".to_string()))
        );
    }

    #[test]
    fn acknowledge_unknown_pump_errors() {
        let mut engine = PumpHealthEngine::new(test_config());
        assert_eq!(
            engine.acknowledge("ghost"),
            Err(EngineError::UnknownPump("ghost".to_string()))
        );
    }

    #[test]
    fn first_reading_emits_heartbeat_snapshot() {
        let mut engine = PumpHealthEngine::new(test_config());
        let out = engine.process_reading(&reading("P-1", 0, 2.0)).unwrap();
        assert_eq!(out.emitted, Some(EventKind::Heartbeat));
        let events = engine.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Heartbeat);
        // Justification still present and traceable even for a snapshot.
        assert!(!events[0].advisory.justification.is_empty());
    }
}
