//! Bounded, time-ordered window of recent samples.
//!
//! The buffer is shared by the feature extractor (variance over the window)
//! and by the engine (last timestamp for synthetic input). Capacity is fixed
//! at construction; pushes past capacity evict the oldest sample.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::types::InertialSample;

/// Sizing of the sample window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Maximum number of samples retained. Should cover one to two seconds
    /// of motion at the device's sample rate.
    pub capacity: usize,

    /// Number of most recent samples the feature extractor looks at.
    /// Must not exceed `capacity`.
    pub window_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: 50,    // 1s at 50Hz
            window_size: 50,
        }
    }
}

/// Fixed-capacity FIFO of inertial samples.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<InertialSample>,
    capacity: usize,
}

impl SampleBuffer {
    /// Creates an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample, evicting the oldest one when full. O(1).
    pub fn push(&mut self, sample: InertialSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// The most recent `n` samples (or all of them, if fewer are buffered),
    /// oldest first.
    pub fn window(&self, n: usize) -> impl Iterator<Item = &InertialSample> + '_ {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip)
    }

    pub fn latest(&self) -> Option<&InertialSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
