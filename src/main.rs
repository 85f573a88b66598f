//! PumpGuard monitor binary.
//!
//! Selects an ingestion source (CSV batch, stdin JSON feed, or the built-in
//! simulator), loads the mandatory TOML configuration, and runs the
//! processing loop until the source ends or ctrl-c.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pumpguard::config::PumpConfig;
use pumpguard::engine::PumpHealthEngine;
use pumpguard::history::EventHistory;
use pumpguard::pipeline::{
    CsvSource, EventSink, JsonlSink, ProcessingLoop, ReadingSource, SimulatedSource, StdinSource,
};
use pumpguard::types::HealthEvent;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "pumpguard")]
#[command(about = "Pump health classification and predictive maintenance monitor")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration (required; no built-in thresholds)
    #[arg(short, long, env = "PUMPGUARD_CONFIG", default_value = "pump_config.toml")]
    config: PathBuf,

    /// Replay a CSV batch file
    #[arg(long, conflicts_with_all = ["stdin", "simulate"])]
    csv: Option<PathBuf>,

    /// Read JSON readings from stdin (one per line)
    #[arg(long, conflicts_with = "simulate")]
    stdin: bool,

    /// Run the built-in simulator for N seconds of simulated time
    #[arg(long, value_name = "SECS")]
    simulate: Option<u64>,

    /// Random seed for the simulator
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Pacing delay between readings in milliseconds (0 = full speed)
    #[arg(long, default_value = "0")]
    delay_ms: u64,

    /// Write emitted events as JSON lines to this file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// In-memory event history capacity
    #[arg(long, default_value = "1024")]
    history_capacity: usize,

    /// Export the event history as CSV to this file on exit
    #[arg(long)]
    export_history: Option<PathBuf>,
}

// ============================================================================
// Shared History Sink
// ============================================================================

/// Lets the history receive events inside the loop while main keeps a handle
/// for the CSV export afterwards.
struct SharedHistorySink(Arc<Mutex<EventHistory>>);

impl EventSink for SharedHistorySink {
    fn handle(&mut self, event: &HealthEvent) -> Result<()> {
        self.0
            .lock()
            .map_err(|_| anyhow::anyhow!("history lock poisoned"))?
            .record(event.clone());
        Ok(())
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Malformed or missing configuration is fatal at startup — there is no
    // safe default to substitute for a missing threshold.
    let config = match PumpConfig::load_from_file(&args.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {e}");
            bail!("cannot start without a valid configuration");
        }
    };

    let engine = PumpHealthEngine::new(config);

    let cancel_token = CancellationToken::new();
    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received — stopping ingestion");
            signal_token.cancel();
        }
    });

    let mut pipeline = ProcessingLoop::new(engine, cancel_token);

    // Event output: JSONL to a file or stdout.
    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to create output file {}", path.display()))?;
            pipeline = pipeline.with_sink(Box::new(JsonlSink::new(std::io::BufWriter::new(file))));
        }
        None => {
            pipeline = pipeline.with_sink(Box::new(JsonlSink::new(std::io::stdout())));
        }
    }

    let history = Arc::new(Mutex::new(EventHistory::new(args.history_capacity)));
    pipeline = pipeline.with_sink(Box::new(SharedHistorySink(history.clone())));

    // Source selection.
    let stats = if let Some(path) = &args.csv {
        let mut source = CsvSource::load(path, args.delay_ms)?;
        run(pipeline, &mut source).await
    } else if args.stdin {
        let mut source = StdinSource::new();
        run(pipeline, &mut source).await
    } else if let Some(duration) = args.simulate {
        let start = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        let mut source = SimulatedSource::new(start, duration, args.seed, args.delay_ms);
        run(pipeline, &mut source).await
    } else {
        bail!("no input selected: pass --csv <file>, --stdin, or --simulate <secs>");
    };

    if let Some(path) = &args.export_history {
        match history.lock() {
            Ok(h) => {
                std::fs::write(path, h.to_csv()).with_context(|| {
                    format!("failed to write history export {}", path.display())
                })?;
                info!(path = %path.display(), events = h.len(), "Event history exported");
            }
            Err(_) => warn!("history lock poisoned — skipping export"),
        }
    }

    if stats.readings_rejected > 0 {
        warn!(
            "{} of {} readings were rejected — see log for pump-scoped reasons",
            stats.readings_rejected,
            stats.readings_rejected + stats.readings_processed
        );
    }

    Ok(())
}

async fn run<S: ReadingSource>(
    pipeline: ProcessingLoop,
    source: &mut S,
) -> pumpguard::pipeline::PipelineStats {
    let (stats, _engine) = pipeline.run(source).await;
    stats
}
