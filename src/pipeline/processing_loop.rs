//! Unified reading-processing loop shared across all input modes.
//!
//! One loop drives CSV replay, stdin feeds, and the simulator through the
//! same reading → engine → sink flow, with cooperative cancellation.
//! Rejected readings are logged and counted, never fatal; cancellation stops
//! ingestion only, leaving per-pump state exactly as last committed.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::source::{ReadingSource, SourceEvent};
use crate::engine::PumpHealthEngine;
use crate::types::{EventKind, HealthEvent};

// ============================================================================
// Event Sinks
// ============================================================================

/// Consumer of emitted health events (the external-collaborator boundary).
pub trait EventSink: Send {
    fn handle(&mut self, event: &HealthEvent) -> anyhow::Result<()>;
}

/// Writes each event as one JSON line.
pub struct JsonlSink<W: std::io::Write + Send> {
    writer: W,
}

impl<W: std::io::Write + Send> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: std::io::Write + Send> EventSink for JsonlSink<W> {
    fn handle(&mut self, event: &HealthEvent) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

// ============================================================================
// Pipeline Statistics
// ============================================================================

/// Final counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PipelineStats {
    pub readings_processed: u64,
    pub readings_rejected: u64,
    pub transitions: u64,
    pub heartbeats: u64,
    pub events_delivered: u64,
}

// ============================================================================
// Processing Loop
// ============================================================================

/// Owns the engine and sinks for one ingestion run.
pub struct ProcessingLoop {
    engine: PumpHealthEngine,
    sinks: Vec<Box<dyn EventSink>>,
    cancel_token: CancellationToken,
}

impl ProcessingLoop {
    pub fn new(engine: PumpHealthEngine, cancel_token: CancellationToken) -> Self {
        Self {
            engine,
            sinks: Vec::new(),
            cancel_token,
        }
    }

    /// Attach an event sink. Sinks receive every drained event in order.
    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Access the engine (e.g. to acknowledge pumps between runs).
    pub fn engine_mut(&mut self) -> &mut PumpHealthEngine {
        &mut self.engine
    }

    /// Run until the source is exhausted or cancellation fires.
    ///
    /// Returns the final statistics and hands back the engine so a caller
    /// can resume ingestion later — cancellation discards nothing.
    pub async fn run<S: ReadingSource>(mut self, source: &mut S) -> (PipelineStats, PumpHealthEngine) {
        let mut stats = PipelineStats::default();

        info!("Processing readings from {}...", source.source_name());

        loop {
            let event = tokio::select! {
                // Cancellation wins over a ready reading so shutdown is prompt.
                biased;
                _ = self.cancel_token.cancelled() => {
                    info!("[ReadingProcessor] Shutdown signal received");
                    break;
                }
                result = source.next_reading() => {
                    match result {
                        Ok(ev) => ev,
                        Err(e) => {
                            warn!("[ReadingProcessor] Source error: {}", e);
                            break;
                        }
                    }
                }
            };

            let reading = match event {
                SourceEvent::Reading(r) => r,
                SourceEvent::Eof => {
                    info!(
                        "[ReadingProcessor] Source reached end ({} readings processed)",
                        stats.readings_processed
                    );
                    break;
                }
            };

            match self.engine.process_reading(&reading) {
                Ok(outcome) => {
                    stats.readings_processed += 1;
                    if outcome.transition_committed {
                        stats.transitions += 1;
                    }
                    if outcome.emitted == Some(EventKind::Heartbeat) {
                        stats.heartbeats += 1;
                    }
                }
                Err(_) => {
                    // Already logged by the engine; pump-scoped, keep going.
                    stats.readings_rejected += 1;
                }
            }

            stats.events_delivered += self.deliver_events();

            if stats.readings_processed > 0 && stats.readings_processed % 500 == 0 {
                info!(
                    "Progress: {} readings | {} transitions | {} pumps tracked",
                    stats.readings_processed,
                    stats.transitions,
                    self.engine.pump_count()
                );
            }
        }

        // Flush anything still queued (e.g. events from the final reading).
        stats.events_delivered += self.deliver_events();

        let engine_stats = self.engine.stats();
        info!("");
        info!("==============================================================");
        info!(" FINAL STATISTICS");
        info!("==============================================================");
        info!("   Readings Processed:   {}", stats.readings_processed);
        info!("   Readings Rejected:    {}", stats.readings_rejected);
        info!("   Transitions:          {}", engine_stats.transitions_committed);
        info!("   Heartbeats:           {}", engine_stats.heartbeats_emitted);
        info!("   Acknowledgements:     {}", engine_stats.acknowledgements);
        info!("   Events Delivered:     {}", stats.events_delivered);
        info!("   Pumps Tracked:        {}", self.engine.pump_count());
        info!("==============================================================");

        (stats, self.engine)
    }

    /// Drain the engine queue into every sink. Sink failures are logged and
    /// skipped — a broken consumer must not stall classification.
    fn deliver_events(&mut self) -> u64 {
        let events = self.engine.drain_events();
        let delivered = events.len() as u64;
        for event in &events {
            for sink in &mut self.sinks {
                if let Err(e) = sink.handle(event) {
                    warn!(pump_id = %event.pump_id, error = %e, "Event sink failed");
                }
            }
        }
        delivered
    }
}
