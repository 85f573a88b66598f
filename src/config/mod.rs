//! Monitor Configuration
//!
//! Every threshold the engine consults is a field in this module, supplied
//! by the operator as a named TOML configuration object. Threshold fields
//! are deliberately required (no serde defaults): a missing threshold has no
//! safe substitute — silently defaulting one could mask a failing pump — so
//! an incomplete config is a fatal startup error.
//!
//! ## Usage
//!
//! ```ignore
//! let config = PumpConfig::load_from_file(Path::new("pump_config.toml"))?;
//! let engine = PumpHealthEngine::new(config);
//! ```

pub mod validation;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::types::Signal;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a monitoring deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PumpConfig {
    /// Deployment identification (ambient; defaults allowed)
    #[serde(default)]
    pub monitor: MonitorInfo,

    /// Feature-window and trend tuning
    pub engine: EngineTuning,

    /// Status-transition hysteresis counts
    pub hysteresis: HysteresisConfig,

    /// Event emission cadence and buffering
    pub emitter: EmitterConfig,

    /// Advisory urgency windows per status
    pub advisory: AdvisoryConfig,

    /// Per-signal physical bounds and classification thresholds
    pub signals: SignalThresholds,
}

/// Deployment identification, used only for logging and export headers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorInfo {
    #[serde(default = "default_monitor_name")]
    pub name: String,
    #[serde(default)]
    pub site: String,
}

fn default_monitor_name() -> String {
    "pumpguard".to_string()
}

impl Default for MonitorInfo {
    fn default() -> Self {
        Self {
            name: default_monitor_name(),
            site: String::new(),
        }
    }
}

/// Feature extraction and trend detection tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineTuning {
    /// Rolling window capacity per (pump, signal)
    pub window_size: usize,
    /// Samples required before a signal's features are trusted
    pub min_samples: usize,
    /// Reading gap (seconds) beyond which a pump's windows are reset
    pub max_gap_secs: u64,
    /// Normalized-slope threshold separating STABLE from RISING/FALLING
    pub trend_epsilon: f64,
    /// Minimum trend confidence for the rising-trend severity escalation
    pub trend_min_confidence: f64,
    /// Fraction of the warning threshold above which a value counts as
    /// "elevated" for the rising-trend escalation
    pub elevated_fraction: f64,
}

/// Hysteresis counts. Upgrade and downgrade are independent: false
/// reassurance is costlier than a delayed alarm, so downgrades typically
/// require a longer supporting run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HysteresisConfig {
    /// Consecutive supporting readings to commit a worsening transition
    pub upgrade: u32,
    /// Consecutive supporting readings to commit an improving transition
    pub downgrade: u32,
}

/// Event emitter cadence and buffering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmitterConfig {
    /// Heartbeat cadence in seconds, measured on reading timestamps
    pub heartbeat_secs: u64,
    /// Bounded queue capacity for emitted events
    pub queue_capacity: usize,
}

/// Urgency windows (hours) attached to advisories, per status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdvisoryConfig {
    pub fail_urgency_hours: u32,
    pub warning_urgency_hours: u32,
    pub healthy_urgency_hours: u32,
}

/// Bounds and thresholds for all three monitored signals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalThresholds {
    pub vibration: SignalConfig,
    pub motor_current: SignalConfig,
    pub temperature: SignalConfig,
}

impl SignalThresholds {
    /// Config for one signal.
    pub fn get(&self, signal: Signal) -> &SignalConfig {
        match signal {
            Signal::Vibration => &self.vibration,
            Signal::MotorCurrent => &self.motor_current,
            Signal::Temperature => &self.temperature,
        }
    }
}

/// Per-signal configuration. All fields required.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SignalConfig {
    /// Physical plausibility bounds — readings outside are rejected
    pub plausible_min: f64,
    pub plausible_max: f64,
    /// Nominal operating band; its width normalizes trend slopes
    pub healthy_min: f64,
    pub healthy_max: f64,
    /// Value at or above which the signal supports WARNING
    pub warning_over: f64,
    /// Value at or above which the signal supports FAIL
    pub fail_over: f64,
}

impl SignalConfig {
    /// Width of the nominal operating band (normalizes trend slopes).
    pub fn healthy_band_width(&self) -> f64 {
        self.healthy_max - self.healthy_min
    }
}

// ============================================================================
// Loading & Validation
// ============================================================================

impl PumpConfig {
    /// Load and validate a TOML config file. Unknown keys produce warnings;
    /// missing required fields or inconsistent thresholds are fatal.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        for w in validation::validate_unknown_keys(&contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        info!(monitor = %config.monitor.name, path = %path.display(), "Loaded pump monitor config");
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate cross-field consistency.
    ///
    /// Rules:
    /// - fail thresholds must exceed warning thresholds
    /// - healthy bands must sit inside the plausible ranges with nonzero width
    /// - hysteresis counts and sample counts must be ≥ 1
    /// - min_samples must not exceed window_size (and window_size ≥ 2)
    /// - ratios (trend_min_confidence, elevated_fraction) must be in (0, 1]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let e = &self.engine;
        if e.window_size < 2 {
            errors.push(format!(
                "engine.window_size must be >= 2 (got {})",
                e.window_size
            ));
        }
        if e.min_samples < 2 {
            errors.push(format!(
                "engine.min_samples must be >= 2 (got {})",
                e.min_samples
            ));
        }
        if e.min_samples > e.window_size {
            errors.push(format!(
                "engine.min_samples ({}) must not exceed engine.window_size ({})",
                e.min_samples, e.window_size
            ));
        }
        if e.max_gap_secs == 0 {
            errors.push("engine.max_gap_secs must be > 0".to_string());
        }
        if !(e.trend_epsilon > 0.0) {
            errors.push(format!(
                "engine.trend_epsilon must be > 0 (got {})",
                e.trend_epsilon
            ));
        }
        Self::check_ratio(e.trend_min_confidence, "engine.trend_min_confidence", &mut errors);
        Self::check_ratio(e.elevated_fraction, "engine.elevated_fraction", &mut errors);

        if self.hysteresis.upgrade == 0 {
            errors.push("hysteresis.upgrade must be >= 1".to_string());
        }
        if self.hysteresis.downgrade == 0 {
            errors.push("hysteresis.downgrade must be >= 1".to_string());
        }

        if self.emitter.heartbeat_secs == 0 {
            errors.push("emitter.heartbeat_secs must be > 0".to_string());
        }
        if self.emitter.queue_capacity == 0 {
            errors.push("emitter.queue_capacity must be >= 1".to_string());
        }

        for signal in Signal::ALL {
            self.signals.get(signal).check(&signal.to_string(), &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    fn check_ratio(value: f64, name: &str, errors: &mut Vec<String>) {
        if !(value > 0.0 && value <= 1.0) {
            errors.push(format!("{name} must be in (0, 1] (got {value})"));
        }
    }
}

impl SignalConfig {
    fn check(&self, name: &str, errors: &mut Vec<String>) {
        if !self.plausible_min.is_finite() || !self.plausible_max.is_finite() {
            errors.push(format!("signals.{name}: plausible bounds must be finite"));
            return;
        }
        if self.plausible_min >= self.plausible_max {
            errors.push(format!(
                "signals.{name}: plausible_min ({}) must be < plausible_max ({})",
                self.plausible_min, self.plausible_max
            ));
        }
        if self.healthy_min >= self.healthy_max {
            errors.push(format!(
                "signals.{name}: healthy_min ({}) must be < healthy_max ({})",
                self.healthy_min, self.healthy_max
            ));
        }
        if self.healthy_min < self.plausible_min || self.healthy_max > self.plausible_max {
            errors.push(format!(
                "signals.{name}: healthy band [{}, {}] must sit inside plausible bounds [{}, {}]",
                self.healthy_min, self.healthy_max, self.plausible_min, self.plausible_max
            ));
        }
        if self.warning_over >= self.fail_over {
            errors.push(format!(
                "signals.{name}: warning_over ({}) must be < fail_over ({})",
                self.warning_over, self.fail_over
            ));
        }
        if self.warning_over <= self.healthy_min {
            errors.push(format!(
                "signals.{name}: warning_over ({}) must exceed healthy_min ({})",
                self.warning_over, self.healthy_min
            ));
        }
    }
}
