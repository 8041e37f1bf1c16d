//! Synthetic step input for test tooling.
//!
//! Produces a deterministic sample sequence that drives the step automaton
//! through exactly one full cycle per requested step: a peak above the
//! rising threshold, then a rest sample below the falling threshold shortly
//! after it. The samples go through the same `process` path
//! as live input, so injected and real steps obey identical rules
//! (including the debounce).

use crate::error::{EngineError, Result};
use crate::signal::SanitizerConfig;
use crate::step_detection::StepDetectorConfig;
use crate::types::InertialSample;

/// Upper bound on a single injection, keeping the call prompt.
pub const MAX_INJECTED_STEPS: i64 = 10_000;

/// Longest accepted gap between injected steps, one hour.
pub const MAX_INJECTED_INTERVAL_SECS: f64 = 3_600.0;

/// Upper bound on the gap between a synthetic peak and its rest sample.
/// The debounce is measured from the rest sample, so a short gap keeps
/// fast cadences countable.
const MAX_REST_OFFSET_MS: u64 = 20;

/// A validated injection request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInjection {
    steps: u64,
    interval_ms: u64,
}

impl StepInjection {
    /// Validate raw control-surface parameters.
    ///
    /// Rejects negative or excessive counts, and intervals that are not
    /// finite or fall outside `(0, MAX_INJECTED_INTERVAL_SECS]`. Zero steps
    /// is a valid no-op.
    pub fn new(num_steps: i64, interval_secs: f64) -> Result<Self> {
        if !(0..=MAX_INJECTED_STEPS).contains(&num_steps) {
            return Err(EngineError::InvalidStepCount(num_steps));
        }
        if !(interval_secs.is_finite()
            && interval_secs > 0.0
            && interval_secs <= MAX_INJECTED_INTERVAL_SECS)
        {
            return Err(EngineError::InvalidInterval(interval_secs));
        }

        Ok(Self {
            steps: num_steps as u64,
            interval_ms: ((interval_secs * 1000.0).round() as u64).max(1),
        })
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

/// Peak and rest accelerometer levels that are guaranteed to cross the
/// detector's thresholds while staying inside the sanitizer's range.
fn step_levels(detector: &StepDetectorConfig, sanitizer: &SanitizerConfig) -> (i32, i32) {
    let band = detector.rising_threshold - detector.falling_threshold;
    let max = sanitizer.max_abs_count as f64;

    let peak = (detector.rising_threshold + band).min(max).ceil();
    let rest = (detector.falling_threshold - band)
        .max(detector.falling_threshold / 2.0)
        .floor();

    (peak as i32, rest as i32)
}

/// The sample sequence for `injection`, with the first peak at `start_ms`.
///
/// Timestamps saturate at `u64::MAX` rather than wrap, so the sequence
/// never runs backwards.
pub fn synthesize_steps(
    injection: StepInjection,
    detector: &StepDetectorConfig,
    sanitizer: &SanitizerConfig,
    start_ms: u64,
) -> impl Iterator<Item = InertialSample> {
    let (peak, rest) = step_levels(detector, sanitizer);
    let interval = injection.interval_ms;
    let rest_offset = (interval / 4).clamp(1, MAX_REST_OFFSET_MS);

    (0..injection.steps).flat_map(move |k| {
        let t = start_ms.saturating_add(k.saturating_mul(interval));
        [
            InertialSample::new(t, [0, 0, peak], [0, 0, 0]),
            InertialSample::new(t.saturating_add(rest_offset), [0, 0, rest], [0, 0, 0]),
        ]
    })
}
