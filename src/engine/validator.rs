//! Reading Validator — order and plausibility checks.
//!
//! Rejections are scoped to the offending reading: no per-pump state is
//! touched on the reject path, so one bad sample never poisons the windows
//! or the hysteresis counters.

use crate::config::SignalThresholds;
use crate::errors::ReadingError;
use crate::types::{SensorReading, Signal};

/// Validate a reading against the pump's last accepted timestamp and the
/// configured plausible ranges.
///
/// Equal timestamps are allowed (non-decreasing contract); NaN and
/// infinities are out of range by definition.
pub fn validate(
    reading: &SensorReading,
    last_accepted: Option<u64>,
    signals: &SignalThresholds,
) -> Result<(), ReadingError> {
    if let Some(last) = last_accepted {
        if reading.timestamp < last {
            return Err(ReadingError::OutOfOrder {
                pump_id: reading.pump_id.clone(),
                timestamp: reading.timestamp,
                last_accepted: last,
            });
        }
    }

    for signal in Signal::ALL {
        let value = reading.value(signal);
        let cfg = signals.get(signal);
        if !value.is_finite() || value < cfg.plausible_min || value > cfg.plausible_max {
            return Err(ReadingError::OutOfRange {
                pump_id: reading.pump_id.clone(),
                signal,
                value,
                min: cfg.plausible_min,
                max: cfg.plausible_max,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalConfig;

    fn thresholds() -> SignalThresholds {
        let sig = SignalConfig {
            plausible_min: 0.0,
            plausible_max: 50.0,
            healthy_min: 0.0,
            healthy_max: 4.0,
            warning_over: 4.5,
            fail_over: 7.1,
        };
        SignalThresholds {
            vibration: sig,
            motor_current: sig,
            temperature: sig,
        }
    }

    fn reading(timestamp: u64, vibration: f64) -> SensorReading {
        SensorReading {
            pump_id: "P-1".to_string(),
            timestamp,
            vibration_mm_s: vibration,
            motor_current_a: 6.0,
            temperature_c: 41.0,
        }
    }

    #[test]
    fn accepts_in_order_in_range() {
        assert!(validate(&reading(100, 3.0), Some(50), &thresholds()).is_ok());
    }

    #[test]
    fn equal_timestamp_is_accepted() {
        assert!(validate(&reading(100, 3.0), Some(100), &thresholds()).is_ok());
    }

    #[test]
    fn rejects_out_of_order() {
        let err = validate(&reading(99, 3.0), Some(100), &thresholds()).unwrap_err();
        assert!(matches!(err, ReadingError::OutOfOrder { .. }));
    }

    #[test]
    fn rejects_negative_vibration() {
        let err = validate(&reading(100, -5.0), None, &thresholds()).unwrap_err();
        match err {
            ReadingError::OutOfRange { signal, value, .. } => {
                assert_eq!(signal, Signal::Vibration);
                assert_eq!(value, -5.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_nan() {
        let err = validate(&reading(100, f64::NAN), None, &thresholds()).unwrap_err();
        assert!(matches!(err, ReadingError::OutOfRange { .. }));
    }
}
