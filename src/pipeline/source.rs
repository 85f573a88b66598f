//! Reading source abstraction for sensor-data ingestion.
//!
//! Provides a unified trait for reading sensor samples from different
//! sources: CSV files (bounded batch replay), stdin (JSON lines, unbounded
//! live feed), and the synthetic simulator. Both batch and streaming
//! ingestion flow through the same per-reading processing contract.

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::types::SensorReading;

/// Events produced by a reading source.
pub enum SourceEvent {
    /// A parsed sensor reading.
    Reading(SensorReading),
    /// Source reached end of data (EOF for files/stdin, end of simulation).
    Eof,
}

/// Trait abstracting where sensor readings come from.
///
/// Implementations handle format parsing and pacing internally. The
/// processing loop calls [`next_reading`](ReadingSource::next_reading) in a
/// select! with cancellation.
#[async_trait]
pub trait ReadingSource: Send + 'static {
    /// Read the next reading from the source.
    async fn next_reading(&mut self) -> Result<SourceEvent>;

    /// Human-readable name for logging (e.g. "CSV", "stdin", "simulated").
    fn source_name(&self) -> &str;
}

// ============================================================================
// CSV Source (bounded batch replay)
// ============================================================================

/// Replays readings loaded from a CSV file, with optional inter-reading delay.
pub struct CsvSource {
    readings: std::vec::IntoIter<SensorReading>,
    delay_ms: u64,
    yielded_first: bool,
}

impl CsvSource {
    /// Load a CSV file up front. Headers are matched against common column
    /// aliases, so exports named `vib` / `temp` / `amps` ingest unchanged.
    pub fn load(path: &Path, delay_ms: u64) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read CSV file {}", path.display()))?;
        let readings = parse_csv(&contents)?;
        tracing::info!(
            path = %path.display(),
            readings = readings.len(),
            "Loaded CSV batch"
        );
        Ok(Self {
            readings: readings.into_iter(),
            delay_ms,
            yielded_first: false,
        })
    }

    /// Source over already-parsed readings (tests, programmatic batches).
    pub fn from_readings(readings: Vec<SensorReading>, delay_ms: u64) -> Self {
        Self {
            readings: readings.into_iter(),
            delay_ms,
            yielded_first: false,
        }
    }
}

#[async_trait]
impl ReadingSource for CsvSource {
    async fn next_reading(&mut self) -> Result<SourceEvent> {
        // No delay before the first reading.
        if self.yielded_first && self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        match self.readings.next() {
            Some(r) => {
                self.yielded_first = true;
                Ok(SourceEvent::Reading(r))
            }
            None => Ok(SourceEvent::Eof),
        }
    }

    fn source_name(&self) -> &str {
        "CSV"
    }
}

// ============================================================================
// CSV Parsing
// ============================================================================

const PUMP_ID_ALIASES: [&str; 5] = ["pump_id", "pump", "device_id", "equipment_id", "id"];
const TIMESTAMP_ALIASES: [&str; 4] = ["timestamp", "time", "ts", "datetime"];
const VIBRATION_ALIASES: [&str; 3] = ["vibration_mm_s", "vibration", "vib"];
const CURRENT_ALIASES: [&str; 4] = ["motor_current_a", "motor_current", "current", "amps"];
const TEMPERATURE_ALIASES: [&str; 3] = ["temperature_c", "temperature", "temp"];

/// Find the header column matching one of the candidate aliases: exact
/// (case-insensitive) match first, then substring containment.
fn detect_column(headers: &[&str], candidates: &[&str]) -> Option<usize> {
    for cand in candidates {
        if let Some(i) = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(cand))
        {
            return Some(i);
        }
    }
    for cand in candidates {
        if let Some(i) = headers
            .iter()
            .position(|h| h.to_ascii_lowercase().contains(&cand.to_ascii_lowercase()))
        {
            return Some(i);
        }
    }
    None
}

/// Parse a timestamp cell: unix seconds or RFC 3339.
fn parse_timestamp(cell: &str) -> Option<u64> {
    if let Ok(ts) = cell.parse::<u64>() {
        return Some(ts);
    }
    chrono::DateTime::parse_from_rfc3339(cell)
        .ok()
        .and_then(|dt| u64::try_from(dt.timestamp()).ok())
}

/// Parse CSV contents into readings. Malformed rows are skipped with a
/// warning; missing required columns fail the load.
pub fn parse_csv(contents: &str) -> Result<Vec<SensorReading>> {
    let mut lines = contents.lines();
    let header_line = lines.next().context("CSV file is empty")?;
    let headers: Vec<&str> = header_line.split(',').map(str::trim).collect();

    let pump_col = detect_column(&headers, &PUMP_ID_ALIASES)
        .context("no pump id column found (tried pump_id/pump/device_id/equipment_id/id)")?;
    let ts_col = detect_column(&headers, &TIMESTAMP_ALIASES)
        .context("no timestamp column found (tried timestamp/time/ts/datetime)")?;
    let vib_col = detect_column(&headers, &VIBRATION_ALIASES)
        .context("no vibration column found (tried vibration_mm_s/vibration/vib)")?;
    let curr_col = detect_column(&headers, &CURRENT_ALIASES)
        .context("no motor current column found (tried motor_current_a/motor_current/current/amps)")?;
    let temp_col = detect_column(&headers, &TEMPERATURE_ALIASES)
        .context("no temperature column found (tried temperature_c/temperature/temp)")?;

    let mut readings = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        let parsed = (|| {
            let pump_id = cells.get(pump_col)?.to_string();
            if pump_id.is_empty() {
                return None;
            }
            let timestamp = parse_timestamp(cells.get(ts_col)?)?;
            let vibration_mm_s = cells.get(vib_col)?.parse::<f64>().ok()?;
            let motor_current_a = cells.get(curr_col)?.parse::<f64>().ok()?;
            let temperature_c = cells.get(temp_col)?.parse::<f64>().ok()?;
            Some(SensorReading {
                pump_id,
                timestamp,
                vibration_mm_s,
                motor_current_a,
                temperature_c,
            })
        })();
        match parsed {
            Some(r) => readings.push(r),
            None => {
                tracing::warn!(line = line_no + 2, "Skipping malformed CSV row");
            }
        }
    }
    Ok(readings)
}

// ============================================================================
// Stdin Source (JSON readings, one per line)
// ============================================================================

/// Reads JSON-formatted sensor readings from stdin.
///
/// Used with external feeders:
/// `gateway-export --json | pumpguard --stdin`
pub struct StdinSource {
    reader: tokio::io::BufReader<tokio::io::Stdin>,
    line_buffer: String,
}

impl StdinSource {
    pub fn new() -> Self {
        Self {
            reader: tokio::io::BufReader::new(tokio::io::stdin()),
            line_buffer: String::with_capacity(512),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadingSource for StdinSource {
    async fn next_reading(&mut self) -> Result<SourceEvent> {
        use tokio::io::AsyncBufReadExt;
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_line(&mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(SourceEvent::Eof);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<SensorReading>(line) {
                Ok(reading) => return Ok(SourceEvent::Reading(reading)),
                Err(e) => {
                    tracing::warn!("[StdinSource] Failed to parse reading: {}", e);
                    // Skip malformed lines and keep reading
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        "stdin"
    }
}
