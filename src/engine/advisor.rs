//! Advisory Generator — deterministic first-match rule table.
//!
//! Rules are evaluated in a fixed priority order (Fail before Warning before
//! Healthy-informational); the first match wins. Every advisory's
//! justification interpolates the literal feature values of the decision —
//! the triggering signal's latest value, window mean, sample count, slope,
//! and the threshold that fired — never a generic message. A non-exhaustive
//! custom table that matches nothing yields a fallback manual-review
//! advisory and a configuration-gap notice, not a crash.
//!
//! Recommended actions follow long-standing pump maintenance heuristics:
//! vibration points at bearings/alignment/lubrication, temperature at
//! lubrication and cooling, motor current at load and electrical faults.

use crate::config::{AdvisoryConfig, EngineTuning, SignalConfig};
use crate::engine::features::SignalFeatures;
use crate::errors::ProcessingNotice;
use crate::types::{Advisory, PumpStatus, Signal, TrendAssessment, TrendDirection};

// ============================================================================
// Rules
// ============================================================================

/// One advisory rule. `None` fields are wildcards.
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryRule {
    pub id: &'static str,
    pub status: PumpStatus,
    pub trend: Option<TrendDirection>,
    pub signal: Option<Signal>,
    pub action: &'static str,
}

impl AdvisoryRule {
    fn matches(&self, status: PumpStatus, trend: TrendDirection, signal: Signal) -> bool {
        self.status == status
            && self.trend.map_or(true, |t| t == trend)
            && self.signal.map_or(true, |s| s == signal)
    }
}

/// Ordered advisory rule table.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<AdvisoryRule>,
}

impl RuleTable {
    /// The built-in exhaustive table: every (status, trend) pair is covered
    /// by a catch-all per status, so the fallback path is unreachable with
    /// this table.
    pub fn standard() -> Self {
        use PumpStatus::{Fail, Healthy, Warning};
        use Signal::{MotorCurrent, Temperature, Vibration};
        use TrendDirection::Rising;

        Self {
            rules: vec![
                AdvisoryRule {
                    id: "fail/rising/vibration",
                    status: Fail,
                    trend: Some(Rising),
                    signal: Some(Vibration),
                    action: "Stop the pump and inspect bearings and shaft alignment immediately",
                },
                AdvisoryRule {
                    id: "fail/any/vibration",
                    status: Fail,
                    trend: None,
                    signal: Some(Vibration),
                    action: "Stop the pump and inspect bearings and coupling for damage",
                },
                AdvisoryRule {
                    id: "fail/rising/temperature",
                    status: Fail,
                    trend: Some(Rising),
                    signal: Some(Temperature),
                    action: "Shut down and inspect the cooling circuit and lubrication before restart",
                },
                AdvisoryRule {
                    id: "fail/any/temperature",
                    status: Fail,
                    trend: None,
                    signal: Some(Temperature),
                    action: "Shut down and verify lubrication and cooling before restart",
                },
                AdvisoryRule {
                    id: "fail/any/motor_current",
                    status: Fail,
                    trend: None,
                    signal: Some(MotorCurrent),
                    action: "Isolate the motor and inspect for overload or electrical fault",
                },
                AdvisoryRule {
                    id: "fail/any/any",
                    status: Fail,
                    trend: None,
                    signal: None,
                    action: "Remove the pump from service for inspection",
                },
                AdvisoryRule {
                    id: "warning/rising/vibration",
                    status: Warning,
                    trend: Some(Rising),
                    signal: Some(Vibration),
                    action: "Schedule bearing lubrication and an alignment check",
                },
                AdvisoryRule {
                    id: "warning/any/vibration",
                    status: Warning,
                    trend: None,
                    signal: Some(Vibration),
                    action: "Schedule a vibration survey and alignment check",
                },
                AdvisoryRule {
                    id: "warning/rising/temperature",
                    status: Warning,
                    trend: Some(Rising),
                    signal: Some(Temperature),
                    action: "Check lubrication level and cooling flow",
                },
                AdvisoryRule {
                    id: "warning/any/temperature",
                    status: Warning,
                    trend: None,
                    signal: Some(Temperature),
                    action: "Check cooling system performance",
                },
                AdvisoryRule {
                    id: "warning/any/motor_current",
                    status: Warning,
                    trend: None,
                    signal: Some(MotorCurrent),
                    action: "Inspect motor load and supply phases",
                },
                AdvisoryRule {
                    id: "warning/any/any",
                    status: Warning,
                    trend: None,
                    signal: None,
                    action: "Schedule a general condition inspection",
                },
                AdvisoryRule {
                    id: "healthy/any/any",
                    status: Healthy,
                    trend: None,
                    signal: None,
                    action: "No action required — continue monitoring",
                },
            ],
        }
    }

    /// A caller-supplied table (tests, site-specific deployments).
    pub fn custom(rules: Vec<AdvisoryRule>) -> Self {
        Self { rules }
    }
}

// ============================================================================
// Advisory Construction
// ============================================================================

/// Everything the generator needs about the triggering signal.
#[derive(Debug, Clone, Copy)]
pub struct AdvisoryContext<'a> {
    pub pump_id: &'a str,
    pub status: PumpStatus,
    pub trigger: &'a SignalFeatures,
    pub trend: &'a TrendAssessment,
    pub signal_cfg: &'a SignalConfig,
    pub tuning: &'a EngineTuning,
}

impl RuleTable {
    /// Produce the advisory for a classification outcome.
    pub fn advise(
        &self,
        ctx: &AdvisoryContext<'_>,
        advisory_cfg: &AdvisoryConfig,
    ) -> (Advisory, Option<ProcessingNotice>) {
        let justification = build_justification(ctx);

        let matched = self
            .rules
            .iter()
            .find(|r| r.matches(ctx.status, ctx.trend.direction, ctx.trigger.signal));

        match matched {
            Some(rule) => {
                let urgency_hours = match ctx.status {
                    PumpStatus::Fail => advisory_cfg.fail_urgency_hours,
                    PumpStatus::Warning => advisory_cfg.warning_urgency_hours,
                    PumpStatus::Healthy => advisory_cfg.healthy_urgency_hours,
                };
                (
                    Advisory {
                        pump_id: ctx.pump_id.to_string(),
                        status: ctx.status,
                        triggered_rule: rule.id.to_string(),
                        triggering_signal: ctx.trigger.signal,
                        justification,
                        recommended_action: rule.action.to_string(),
                        urgency_hours,
                    },
                    None,
                )
            }
            None => {
                let notice = ProcessingNotice::UnmatchedAdvisoryRule {
                    status: ctx.status,
                    trend: ctx.trend.direction,
                    signal: ctx.trigger.signal,
                };
                (
                    Advisory {
                        pump_id: ctx.pump_id.to_string(),
                        status: ctx.status,
                        triggered_rule: "fallback/unmatched".to_string(),
                        triggering_signal: ctx.trigger.signal,
                        justification,
                        recommended_action: "Unclassified condition — manual review required"
                            .to_string(),
                        // Most conservative window: treat a configuration gap
                        // like a failure until a human has looked.
                        urgency_hours: advisory_cfg.fail_urgency_hours,
                    },
                    Some(notice),
                )
            }
        }
    }
}

/// Build the justification string from the literal triggering values.
fn build_justification(ctx: &AdvisoryContext<'_>) -> String {
    let f = ctx.trigger;
    let unit = f.signal.unit();
    let cfg = ctx.signal_cfg;

    if !f.sufficient {
        return format!(
            "{} history insufficient ({}/{} samples) — HEALTHY by default with low confidence",
            f.signal, f.samples, ctx.tuning.min_samples
        );
    }

    let stats = format!(
        "{} at {:.2} {unit} (window mean {:.2} {unit} over {} samples, slope {:+.4} {unit}/s)",
        f.signal, f.latest, f.mean, f.samples, f.slope
    );

    match ctx.status {
        PumpStatus::Fail => format!(
            "{stats} at or above FAIL threshold {:.2} {unit}",
            cfg.fail_over
        ),
        PumpStatus::Warning => {
            if f.latest >= cfg.warning_over {
                format!(
                    "{stats} at or above WARNING threshold {:.2} {unit}",
                    cfg.warning_over
                )
            } else {
                // Rising-trend escalation fired below the absolute threshold.
                format!(
                    "{stats} rising with confidence {:.2} above {:.0}% of WARNING threshold {:.2} {unit}",
                    ctx.trend.confidence,
                    ctx.tuning.elevated_fraction * 100.0,
                    cfg.warning_over
                )
            }
        }
        PumpStatus::Healthy => format!(
            "{stats} within nominal band (WARNING threshold {:.2} {unit})",
            cfg.warning_over
        ),
    }
}
