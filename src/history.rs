//! Event History
//!
//! Bounded in-memory record of emitted health events, with recent-N queries
//! and CSV export for operators. Persistence is an external collaborator's
//! concern; this store exists so a running monitor can always answer "what
//! happened recently" and hand over a spreadsheet-friendly dump.

use std::collections::VecDeque;

use chrono::DateTime;

use crate::pipeline::EventSink;
use crate::types::HealthEvent;

/// Bounded ring of emitted events (oldest evicted first).
#[derive(Debug)]
pub struct EventHistory {
    events: VecDeque<HealthEvent>,
    capacity: usize,
}

impl EventHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    /// Record an event, evicting the oldest at capacity.
    pub fn record(&mut self, event: HealthEvent) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// The most recent `limit` events, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&HealthEvent> {
        self.events.iter().rev().take(limit).collect()
    }

    /// Events within an inclusive timestamp range, oldest first.
    pub fn range(&self, start_ts: u64, end_ts: u64) -> Vec<&HealthEvent> {
        self.events
            .iter()
            .filter(|e| e.emitted_at >= start_ts && e.emitted_at <= end_ts)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Export all retained events as CSV, oldest first.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(
            "emitted_at,time_utc,pump_id,kind,status,status_since,triggered_rule,recommended_action,urgency_hours,justification\n",
        );
        for e in &self.events {
            let time_utc = DateTime::from_timestamp(e.emitted_at as i64, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            let kind = serde_json::to_string(&e.kind)
                .unwrap_or_default()
                .trim_matches('"')
                .to_string();
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{}\n",
                e.emitted_at,
                time_utc,
                csv_field(&e.pump_id),
                kind,
                e.status,
                e.status_since,
                csv_field(&e.advisory.triggered_rule),
                csv_field(&e.advisory.recommended_action),
                e.advisory.urgency_hours,
                csv_field(&e.advisory.justification),
            ));
        }
        out
    }
}

impl EventSink for EventHistory {
    fn handle(&mut self, event: &HealthEvent) -> anyhow::Result<()> {
        self.record(event.clone());
        Ok(())
    }
}

/// Quote a field when it contains CSV metacharacters.
fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Advisory, EventKind, PumpStatus, Signal};

    fn event(ts: u64, pump: &str) -> HealthEvent {
        HealthEvent {
            pump_id: pump.to_string(),
            status: PumpStatus::Warning,
            status_since: ts,
            trend_summary: Vec::new(),
            advisory: Advisory {
                pump_id: pump.to_string(),
                status: PumpStatus::Warning,
                triggered_rule: "warning/any/vibration".to_string(),
                triggering_signal: Signal::Vibration,
                justification: "vibration at 5.00 mm/s, mean 4.80".to_string(),
                recommended_action: "Schedule a vibration survey and alignment check".to_string(),
                urgency_hours: 48,
            },
            emitted_at: ts,
            kind: EventKind::Transition,
        }
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut h = EventHistory::new(3);
        for ts in 0..5u64 {
            h.record(event(ts, "P-1"));
        }
        assert_eq!(h.len(), 3);
        let recent = h.recent(10);
        assert_eq!(recent[0].emitted_at, 4);
        assert_eq!(recent[2].emitted_at, 2);
    }

    #[test]
    fn range_is_inclusive() {
        let mut h = EventHistory::new(16);
        for ts in [10u64, 20, 30, 40] {
            h.record(event(ts, "P-1"));
        }
        let hits = h.range(20, 30);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn csv_quotes_fields_with_commas() {
        let mut h = EventHistory::new(4);
        h.record(event(1_700_000_000, "P-1"));
        let csv = h.to_csv();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("emitted_at,"));
        let row = lines.next().unwrap();
        // Justification contains a comma and must be quoted.
        assert!(row.contains("\"vibration at 5.00 mm/s, mean 4.80\""));
        assert!(row.contains("transition"));
        assert!(row.contains("WARNING"));
    }
}
