//! Ingestion Pipeline Module
//!
//! Sources feed the engine through one per-reading contract:
//!
//! ```text
//! ReadingSource (CSV | stdin | simulated)
//!     -> PumpHealthEngine::process_reading
//!     -> EventSink (JSONL, in-memory history, ...)
//! ```
//!
//! Batch and streaming ingestion differ only in the source; cancellation is
//! cooperative and never discards committed state.

pub mod processing_loop;
pub mod simulator;
pub mod source;

pub use processing_loop::{EventSink, JsonlSink, PipelineStats, ProcessingLoop};
pub use simulator::SimulatedSource;
pub use source::{CsvSource, ReadingSource, SourceEvent, StdinSource};
