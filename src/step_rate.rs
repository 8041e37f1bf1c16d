//! Step rate over a trailing time window.
//!
//! Keeps the timestamps of recent confirmed steps and extrapolates the
//! count inside the window to steps per minute. Entries older than the
//! window are pruned on every call, so memory is bounded by the window and
//! by a hard capacity.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Window and memory bounds for rate estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepRateConfig {
    /// Trailing window length in seconds.
    pub window_secs: f64,
    /// Hard cap on retained timestamps; the oldest is dropped when full.
    pub history_capacity: usize,
}

impl Default for StepRateConfig {
    fn default() -> Self {
        Self {
            window_secs: 60.0,
            history_capacity: 256, // 60s at the debounce-limited ~3.3 steps/sec is 200
        }
    }
}

/// Sliding-window steps-per-minute estimator.
#[derive(Debug, Clone)]
pub struct StepRateEstimator {
    history: VecDeque<u64>,
    window_ms: u64,
    per_minute_scale: f64,
    capacity: usize,
}

impl StepRateEstimator {
    pub fn new(config: StepRateConfig) -> Self {
        let window_ms = (config.window_secs * 1000.0).round().max(1.0) as u64;
        Self {
            history: VecDeque::with_capacity(config.history_capacity),
            window_ms,
            per_minute_scale: 60_000.0 / window_ms as f64,
            capacity: config.history_capacity.max(2),
        }
    }

    /// Record a confirmed step.
    pub fn record(&mut self, timestamp_ms: u64) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(timestamp_ms);
    }

    /// Prune and compute the rate at `now_ms`.
    ///
    /// Returns 0.0 when fewer than two steps remain in the window; a single
    /// step has no rate. Entries stamped after `now_ms` predate a backwards
    /// clock jump and are discarded.
    pub fn rate(&mut self, now_ms: u64) -> f64 {
        self.history.retain(|&t| t <= now_ms);
        while let Some(&oldest) = self.history.front() {
            if now_ms - oldest > self.window_ms {
                self.history.pop_front();
            } else {
                break;
            }
        }

        if self.history.len() < 2 {
            return 0.0;
        }
        self.history.len() as f64 * self.per_minute_scale
    }

    /// Timestamps currently retained, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &u64> + '_ {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
