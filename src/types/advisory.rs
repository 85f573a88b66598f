//! Advisory and output-event types

use serde::{Deserialize, Serialize};

use super::{PumpStatus, Signal, TrendDirection};

// ============================================================================
// Advisory
// ============================================================================

/// A structured, justified maintenance recommendation tied to a specific
/// classification outcome.
///
/// `justification` always interpolates the literal feature values (window
/// mean, latest value, slope, threshold) of the rule that fired — no
/// classification leaves the engine without traceable reasoning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Advisory {
    pub pump_id: String,
    pub status: PumpStatus,
    /// Identifier of the rule that fired (e.g. "warning/rising/vibration"),
    /// or "fallback/unmatched" when no rule in the table matched
    pub triggered_rule: String,
    /// Signal that drove the classification
    pub triggering_signal: Signal,
    /// Human-readable reasoning citing the literal values behind the decision
    pub justification: String,
    /// Recommended maintenance action
    pub recommended_action: String,
    /// Window within which the action should be taken (hours)
    pub urgency_hours: u32,
}

// ============================================================================
// Health Event (external output contract)
// ============================================================================

/// Why an event was emitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A status transition was committed on this reading
    Transition,
    /// Periodic snapshot; no transition occurred
    Heartbeat,
    /// Operator acknowledged a FAIL and the pump re-entered evaluation
    Acknowledgement,
}

/// Compact per-signal trend entry carried on every emitted event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrendSummary {
    pub signal: Signal,
    pub direction: TrendDirection,
    /// Normalized slope (healthy-band widths per second)
    pub magnitude: f64,
}

/// The immutable record handed to external reporting/advisory consumers.
///
/// This is the sole contract those collaborators depend on: no internal
/// window sizes, thresholds, or counters leak through it. `emitted_at` is
/// the triggering reading's timestamp, never wall clock, so replays emit
/// byte-identical records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthEvent {
    pub pump_id: String,
    pub status: PumpStatus,
    /// When the current status was committed (unix seconds)
    pub status_since: u64,
    pub trend_summary: Vec<TrendSummary>,
    pub advisory: Advisory,
    /// Timestamp of the reading that produced this event (unix seconds)
    pub emitted_at: u64,
    pub kind: EventKind,
}
