//! PumpGuard: Pump Health Classification & Predictive Maintenance
//!
//! Deterministic pipeline turning raw pump sensor streams (vibration, motor
//! current, temperature) into per-pump health status, trend assessment, and
//! an explainable maintenance advisory.
//!
//! ## Architecture
//!
//! - **Reading Validator**: order and plausibility checks, pump-scoped rejects
//! - **Feature Extractor**: rolling windows with mean/stddev/slope per signal
//! - **Trend Detector**: normalized slope → STABLE/RISING/FALLING + confidence
//! - **Status Classifier**: hysteresis state machine over HEALTHY/WARNING/FAIL
//! - **Advisory Generator**: deterministic rule table with literal-value justifications
//! - **Event Emitter**: transition + heartbeat records on a bounded queue

pub mod config;
pub mod engine;
pub mod errors;
pub mod history;
pub mod pipeline;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, PumpConfig};

// Re-export commonly used types
pub use types::{
    Advisory, ClassificationState, EventKind, HealthEvent, PumpStatus, SensorReading, Signal,
    TrendAssessment, TrendDirection, TrendSummary,
};

// Re-export the engine
pub use engine::{EngineStats, PumpHealthEngine, ReadingOutcome};

// Re-export error taxonomy
pub use errors::{EngineError, ProcessingNotice, ReadingError};

// Re-export history
pub use history::EventHistory;
