//! Core data types for the pump-health engine

mod advisory;
mod reading;
mod status;

pub use advisory::{Advisory, EventKind, HealthEvent, TrendSummary};
pub use reading::{SensorReading, Signal};
pub use status::{
    ClassificationState, PendingTransition, PumpStatus, TrendAssessment, TrendDirection,
};
