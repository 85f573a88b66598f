//! Sensor reading types

use serde::{Deserialize, Serialize};

/// The measured signals every pump reports.
///
/// Ordering is significant: it is the fixed tie-break order used when two
/// signals carry equal severity (vibration first — it is the earliest and
/// most specific indicator of mechanical degradation).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Casing vibration velocity (mm/s RMS)
    Vibration,
    /// Motor current draw (A)
    MotorCurrent,
    /// Bearing housing temperature (°C)
    Temperature,
}

impl Signal {
    /// All signals, in tie-break order.
    pub const ALL: [Signal; 3] = [Signal::Vibration, Signal::MotorCurrent, Signal::Temperature];

    /// Engineering unit for display and justification strings.
    pub fn unit(&self) -> &'static str {
        match self {
            Signal::Vibration => "mm/s",
            Signal::MotorCurrent => "A",
            Signal::Temperature => "°C",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Vibration => write!(f, "vibration"),
            Signal::MotorCurrent => write!(f, "motor_current"),
            Signal::Temperature => write!(f, "temperature"),
        }
    }
}

/// One raw sample from a pump's sensor package.
///
/// Immutable once ingested. Timestamps are unix seconds as stamped by the
/// data feed; the engine never substitutes wall-clock time, so replaying a
/// recorded batch reproduces identical output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorReading {
    /// Pump identifier (natural key from the data feed, e.g. "P-301")
    pub pump_id: String,
    /// Sample timestamp (unix seconds); non-decreasing per pump
    pub timestamp: u64,
    /// Vibration velocity (mm/s RMS)
    pub vibration_mm_s: f64,
    /// Motor current (A)
    pub motor_current_a: f64,
    /// Temperature (°C)
    pub temperature_c: f64,
}

impl SensorReading {
    /// Value of a single signal.
    pub fn value(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Vibration => self.vibration_mm_s,
            Signal::MotorCurrent => self.motor_current_a,
            Signal::Temperature => self.temperature_c,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_value_accessor_matches_fields() {
        let r = SensorReading {
            pump_id: "P-1".to_string(),
            timestamp: 100,
            vibration_mm_s: 2.5,
            motor_current_a: 6.0,
            temperature_c: 41.0,
        };
        assert_eq!(r.value(Signal::Vibration), 2.5);
        assert_eq!(r.value(Signal::MotorCurrent), 6.0);
        assert_eq!(r.value(Signal::Temperature), 41.0);
    }

    #[test]
    fn signal_serializes_snake_case() {
        let json = serde_json::to_string(&Signal::MotorCurrent).unwrap();
        assert_eq!(json, "\"motor_current\"");
    }
}
