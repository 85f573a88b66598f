//! Event Emitter — bounded output queue with heartbeat-first eviction.
//!
//! Emitted records queue here until the consumer drains them. On overflow
//! the oldest heartbeat record is evicted first; transition and
//! acknowledgement records are never silently discarded — if no heartbeat
//! is available to evict, the queue temporarily exceeds capacity and the
//! overflow is logged.

use std::collections::VecDeque;

use tracing::warn;

use crate::config::EmitterConfig;
use crate::types::{EventKind, HealthEvent};

#[derive(Debug)]
pub struct EventEmitter {
    queue: VecDeque<HealthEvent>,
    capacity: usize,
    heartbeat_secs: u64,
    dropped_heartbeats: u64,
}

impl EventEmitter {
    pub fn new(cfg: EmitterConfig) -> Self {
        Self {
            queue: VecDeque::with_capacity(cfg.queue_capacity),
            capacity: cfg.queue_capacity,
            heartbeat_secs: cfg.heartbeat_secs,
            dropped_heartbeats: 0,
        }
    }

    /// Whether a heartbeat is due for a pump, judged on reading timestamps.
    /// A pump that has never emitted is always due (downstream reporting
    /// should have a snapshot from the first reading on).
    pub fn heartbeat_due(&self, last_emit: Option<u64>, now: u64) -> bool {
        match last_emit {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.heartbeat_secs,
        }
    }

    /// Enqueue an event, applying the overflow policy.
    pub fn push(&mut self, event: HealthEvent) {
        if self.queue.len() >= self.capacity {
            if let Some(pos) = self
                .queue
                .iter()
                .position(|e| e.kind == EventKind::Heartbeat)
            {
                let dropped = self.queue.remove(pos);
                self.dropped_heartbeats += 1;
                if let Some(d) = dropped {
                    warn!(
                        pump_id = %d.pump_id,
                        emitted_at = d.emitted_at,
                        "Event queue full — dropped oldest heartbeat"
                    );
                }
            } else {
                warn!(
                    capacity = self.capacity,
                    len = self.queue.len(),
                    "Event queue over capacity with no heartbeat to evict — keeping transition event"
                );
            }
        }
        self.queue.push_back(event);
    }

    /// Remove and return all queued events in emission order.
    pub fn drain(&mut self) -> Vec<HealthEvent> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Heartbeats evicted by the overflow policy since startup.
    pub fn dropped_heartbeats(&self) -> u64 {
        self.dropped_heartbeats
    }
}
