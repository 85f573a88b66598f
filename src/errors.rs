//! Error and notice taxonomy for per-reading processing.
//!
//! Rejections (`ReadingError`) are scoped to the offending pump and reading:
//! they never abort processing of other pumps or of subsequent readings for
//! the same pump. Degraded-but-valid conditions (insufficient history, stale
//! gap resets) are `ProcessingNotice`s on the reading outcome, not errors.

use thiserror::Error;

use crate::types::{PumpStatus, Signal, TrendDirection};

// ============================================================================
// Reading Rejections
// ============================================================================

/// A reading the validator refused. The reading is dropped; the pump's state
/// is untouched.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReadingError {
    #[error("out-of-order reading for pump {pump_id}: timestamp {timestamp} precedes last accepted {last_accepted}")]
    OutOfOrder {
        pump_id: String,
        timestamp: u64,
        last_accepted: u64,
    },

    #[error("out-of-range {signal} reading for pump {pump_id}: {value} outside plausible bounds [{min}, {max}]")]
    OutOfRange {
        pump_id: String,
        signal: Signal,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ReadingError {
    /// Pump the rejection is scoped to.
    pub fn pump_id(&self) -> &str {
        match self {
            ReadingError::OutOfOrder { pump_id, .. } => pump_id,
            ReadingError::OutOfRange { pump_id, .. } => pump_id,
        }
    }
}

// ============================================================================
// Engine Operations
// ============================================================================

/// Errors from explicit engine operations (not per-reading processing).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown pump: {0}")]
    UnknownPump(String),
}

// ============================================================================
// Processing Notices
// ============================================================================

/// Informational conditions attached to an accepted reading's outcome.
///
/// These are first-class states, not failures: downstream code must tolerate
/// them and processing always continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingNotice {
    /// A signal's window holds fewer than the configured minimum samples;
    /// the signal classifies Healthy with zero trend confidence until
    /// history accumulates.
    InsufficientHistory {
        signal: Signal,
        samples: usize,
        required: usize,
    },

    /// The gap since the previous accepted reading exceeded the configured
    /// maximum; all of the pump's windows were reset before this insert.
    StaleGapReset { gap_secs: u64, max_gap_secs: u64 },

    /// No advisory rule matched (possible only with a non-exhaustive custom
    /// table); a fallback manual-review advisory was emitted.
    UnmatchedAdvisoryRule {
        status: PumpStatus,
        trend: TrendDirection,
        signal: Signal,
    },
}

impl std::fmt::Display for ProcessingNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingNotice::InsufficientHistory {
                signal,
                samples,
                required,
            } => write!(
                f,
                "insufficient history for {signal}: {samples}/{required} samples"
            ),
            ProcessingNotice::StaleGapReset {
                gap_secs,
                max_gap_secs,
            } => write!(
                f,
                "stale gap reset: {gap_secs}s since last reading exceeds {max_gap_secs}s"
            ),
            ProcessingNotice::UnmatchedAdvisoryRule {
                status,
                trend,
                signal,
            } => write!(
                f,
                "no advisory rule matched ({status}, {trend}, {signal}) — fallback emitted"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_error_cites_pump_and_signal() {
        let err = ReadingError::OutOfRange {
            pump_id: "P-7".to_string(),
            signal: Signal::Vibration,
            value: -5.0,
            min: 0.0,
            max: 50.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("P-7"));
        assert!(msg.contains("vibration"));
        assert!(msg.contains("-5"));
        assert_eq!(err.pump_id(), "P-7");
    }
}
