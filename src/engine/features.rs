//! Feature Extractor — rolling windows and summary statistics.
//!
//! One `FeatureWindow` exists per (pump, signal). Inserts evict the oldest
//! sample FIFO once the window is at capacity; statistics are recomputed
//! from the retained samples on demand. Below `min_samples` the features
//! are reported but flagged insufficient — downstream treats that as
//! Healthy-with-low-confidence, never as an error.

use std::collections::VecDeque;

use statrs::statistics::Statistics;

use crate::types::Signal;

// ============================================================================
// Feature Window
// ============================================================================

/// Bounded rolling history of timestamped samples for one signal.
#[derive(Debug, Clone)]
pub struct FeatureWindow {
    capacity: usize,
    samples: VecDeque<(u64, f64)>,
}

impl FeatureWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Insert a sample, evicting the oldest if at capacity.
    pub fn insert(&mut self, timestamp: u64, value: f64) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back((timestamp, value));
    }

    /// Discard all history (stale-gap reset).
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample value.
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().map(|&(_, v)| v)
    }

    /// Arithmetic mean of the retained values.
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|&(_, v)| v).mean()
    }

    /// Sample standard deviation of the retained values (0 below 2 samples).
    pub fn std_dev(&self) -> f64 {
        if self.samples.len() < 2 {
            return 0.0;
        }
        self.samples.iter().map(|&(_, v)| v).std_dev()
    }

    /// Least-squares slope of value against time, in signal units per second.
    ///
    /// Returns 0 when fewer than two samples exist or all timestamps
    /// coincide (degenerate fit).
    pub fn slope(&self) -> f64 {
        let n = self.samples.len();
        if n < 2 {
            return 0.0;
        }
        let t_mean = self.samples.iter().map(|&(t, _)| t as f64).sum::<f64>() / n as f64;
        let v_mean = self.samples.iter().map(|&(_, v)| v).sum::<f64>() / n as f64;

        let mut num = 0.0;
        let mut den = 0.0;
        for &(t, v) in &self.samples {
            let dt = t as f64 - t_mean;
            num += dt * (v - v_mean);
            den += dt * dt;
        }
        if den == 0.0 {
            0.0
        } else {
            num / den
        }
    }
}

// ============================================================================
// Per-Reading Feature Snapshot
// ============================================================================

/// Summary statistics for one signal at one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalFeatures {
    pub signal: Signal,
    /// Samples currently in the window
    pub samples: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// Raw slope in signal units per second
    pub slope: f64,
    /// Most recent value
    pub latest: f64,
    /// Whether the window holds at least the configured minimum samples
    pub sufficient: bool,
}

// ============================================================================
// Per-Pump Window Set
// ============================================================================

/// All three signal windows for one pump.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    windows: [FeatureWindow; 3],
}

impl FeatureSet {
    pub fn new(window_size: usize) -> Self {
        Self {
            windows: [
                FeatureWindow::new(window_size),
                FeatureWindow::new(window_size),
                FeatureWindow::new(window_size),
            ],
        }
    }

    fn index(signal: Signal) -> usize {
        match signal {
            Signal::Vibration => 0,
            Signal::MotorCurrent => 1,
            Signal::Temperature => 2,
        }
    }

    pub fn window(&self, signal: Signal) -> &FeatureWindow {
        &self.windows[Self::index(signal)]
    }

    pub fn window_mut(&mut self, signal: Signal) -> &mut FeatureWindow {
        &mut self.windows[Self::index(signal)]
    }

    /// Reset every signal window (stale-gap handling is pump-wide: the gap
    /// applies to the reading, not to one signal).
    pub fn reset_all(&mut self) {
        for w in &mut self.windows {
            w.reset();
        }
    }

    /// Current feature snapshot for one signal.
    pub fn features(&self, signal: Signal, min_samples: usize) -> SignalFeatures {
        let w = self.window(signal);
        SignalFeatures {
            signal,
            samples: w.len(),
            mean: w.mean(),
            std_dev: w.std_dev(),
            slope: w.slope(),
            latest: w.latest().unwrap_or(0.0),
            sufficient: w.len() >= min_samples,
        }
    }
}
