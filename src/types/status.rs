//! Classification status, severity, and trend types

use serde::{Deserialize, Serialize};

use super::Signal;

// ============================================================================
// Pump Status
// ============================================================================

/// Health status of a pump.
///
/// Ordered: `Healthy < Warning < Fail`. Comparisons drive the
/// upgrade-vs-downgrade hysteresis selection in the classifier.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub enum PumpStatus {
    #[default]
    Healthy = 0,
    Warning = 1,
    Fail = 2,
}

impl std::fmt::Display for PumpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PumpStatus::Healthy => write!(f, "HEALTHY"),
            PumpStatus::Warning => write!(f, "WARNING"),
            PumpStatus::Fail => write!(f, "FAIL"),
        }
    }
}

// ============================================================================
// Trend Assessment
// ============================================================================

/// Qualitative direction of a signal's trend over its feature window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TrendDirection {
    #[default]
    Stable,
    Rising,
    Falling,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Stable => write!(f, "STABLE"),
            TrendDirection::Rising => write!(f, "RISING"),
            TrendDirection::Falling => write!(f, "FALLING"),
        }
    }
}

/// Per-signal trend for one reading. Not persisted.
///
/// `magnitude` is the slope normalized by the signal's healthy-band width,
/// so one `trend_epsilon` threshold works across signals of different units.
/// `confidence` ramps linearly from 0 at `min_samples` to 1 at a full window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrendAssessment {
    pub signal: Signal,
    pub direction: TrendDirection,
    /// Normalized slope (healthy-band widths per second; signed)
    pub magnitude: f64,
    /// 0.0 (minimum history) to 1.0 (full window)
    pub confidence: f64,
}

// ============================================================================
// Classification State
// ============================================================================

/// A provisional status change that has not yet met its hysteresis threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingTransition {
    /// The status the recent readings support
    pub candidate: PumpStatus,
    /// Consecutive readings that supported `candidate`
    pub supporting_readings: u32,
}

/// Per-pump classifier state. The only state that outlives a single reading
/// besides the feature windows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationState {
    /// Committed status
    pub status: PumpStatus,
    /// Timestamp (unix seconds) when `status` was committed
    pub status_since: u64,
    /// In-flight candidate transition, if any
    pub pending: Option<PendingTransition>,
}

impl ClassificationState {
    /// Fresh state for a newly registered pump.
    pub fn new(timestamp: u64) -> Self {
        Self {
            status: PumpStatus::Healthy,
            status_since: timestamp,
            pending: None,
        }
    }

    /// Supporting-reading count for the current candidate (0 when none).
    pub fn consecutive_supporting_readings(&self) -> u32 {
        self.pending.map_or(0, |p| p.supporting_readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ordering_drives_upgrade_detection() {
        assert!(PumpStatus::Healthy < PumpStatus::Warning);
        assert!(PumpStatus::Warning < PumpStatus::Fail);
    }

    #[test]
    fn fresh_state_is_healthy_with_no_pending() {
        let s = ClassificationState::new(1_700_000_000);
        assert_eq!(s.status, PumpStatus::Healthy);
        assert_eq!(s.status_since, 1_700_000_000);
        assert_eq!(s.consecutive_supporting_readings(), 0);
    }
}
