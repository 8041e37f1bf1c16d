//! Step detection.
//!
//! A two-state automaton over the acceleration magnitude with hysteresis
//! and a debounce timer:
//!
//! ```text
//!                 magnitude > rising AND debounce elapsed
//!   BelowThreshold ---------------------------------------> AboveThreshold
//!         ^                                                        |
//!         +----------------- magnitude < falling ------------------+
//!                          (confirms one step)
//! ```
//!
//! The rising edge only arms the detector; the step is confirmed on the
//! falling edge. Two thresholds keep a signal dithering around one level
//! from double counting, and the debounce rejects cadences faster than a
//! person can step. The detector ignores mode and activity label entirely.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::StepEvent;

/// Thresholds and timing for the step automaton, in raw counts.
///
/// Defaults assume a ±2 g accelerometer (16384 counts/g): rising at 1.2 g,
/// falling at 1.1 g. Recalibrate per device revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepDetectorConfig {
    /// Magnitude the signal must exceed to arm a step (counts).
    pub rising_threshold: f64,
    /// Magnitude the signal must drop under to confirm it (counts).
    /// Must be below `rising_threshold`.
    pub falling_threshold: f64,
    /// Minimum time between a confirmed step and the next rising edge.
    pub debounce_ms: u64,
}

impl Default for StepDetectorConfig {
    fn default() -> Self {
        Self {
            rising_threshold: 19_661.0,  // 1.2 g
            falling_threshold: 18_022.0, // 1.1 g
            debounce_ms: 300,            // Max ~3.3 steps/sec
        }
    }
}

/// Detector states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorState {
    BelowThreshold,
    AboveThreshold,
}

/// Outcome of evaluating the guards for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// BelowThreshold -> AboveThreshold.
    Arm,
    /// AboveThreshold -> BelowThreshold, counts a step.
    Confirm,
    /// No state change.
    Hold,
}

/// Hysteresis step counter.
#[derive(Debug, Clone)]
pub struct StepDetector {
    config: StepDetectorConfig,
    state: DetectorState,
    count: u64,
    last_step_ms: Option<u64>,
    last_sample_ms: Option<u64>,
    // Highest magnitude seen since arming.
    peak: f64,
}

impl StepDetector {
    pub fn new(config: StepDetectorConfig) -> Self {
        Self {
            config,
            state: DetectorState::BelowThreshold,
            count: 0,
            last_step_ms: None,
            last_sample_ms: None,
            peak: 0.0,
        }
    }

    /// Advance the automaton by one sample.
    ///
    /// Returns the step event on the sample that confirms a step, `None`
    /// on every other sample.
    pub fn process(&mut self, magnitude: f64, timestamp_ms: u64) -> Option<StepEvent> {
        self.track_clock(timestamp_ms);

        match self.next_transition(magnitude, timestamp_ms) {
            Transition::Arm => {
                self.state = DetectorState::AboveThreshold;
                self.peak = magnitude;
                None
            }
            Transition::Confirm => {
                self.state = DetectorState::BelowThreshold;
                self.count += 1;
                self.last_step_ms = Some(timestamp_ms);

                let event = StepEvent {
                    timestamp_ms,
                    count: self.count,
                    peak_magnitude: self.peak,
                };
                self.peak = 0.0;
                debug!(count = self.count, timestamp_ms, peak = event.peak_magnitude, "step confirmed");
                Some(event)
            }
            Transition::Hold => {
                if self.state == DetectorState::AboveThreshold {
                    self.peak = self.peak.max(magnitude);
                }
                None
            }
        }
    }

    /// Back to `BelowThreshold` with no steps and no step history.
    pub fn reset(&mut self) {
        self.state = DetectorState::BelowThreshold;
        self.count = 0;
        self.last_step_ms = None;
        self.peak = 0.0;
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn last_step_timestamp(&self) -> Option<u64> {
        self.last_step_ms
    }

    pub fn config(&self) -> &StepDetectorConfig {
        &self.config
    }

    // =========================================================================
    // PRIVATE METHODS
    // =========================================================================

    fn next_transition(&self, magnitude: f64, now_ms: u64) -> Transition {
        match self.state {
            DetectorState::BelowThreshold
                if magnitude > self.config.rising_threshold && self.debounce_elapsed(now_ms) =>
            {
                Transition::Arm
            }
            DetectorState::AboveThreshold if magnitude < self.config.falling_threshold => {
                Transition::Confirm
            }
            _ => Transition::Hold,
        }
    }

    fn debounce_elapsed(&self, now_ms: u64) -> bool {
        match self.last_step_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.config.debounce_ms,
            None => true,
        }
    }

    /// On a backwards clock jump, re-anchor the debounce reference so the
    /// detector is not locked out until the clock catches up.
    fn track_clock(&mut self, timestamp_ms: u64) {
        if let Some(previous) = self.last_sample_ms {
            if timestamp_ms < previous {
                warn!(previous, timestamp_ms, "sample timestamp went backwards");
                if self.last_step_ms.is_some_and(|last| last > timestamp_ms) {
                    self.last_step_ms = Some(timestamp_ms);
                }
            }
        }
        self.last_sample_ms = Some(timestamp_ms);
    }
}

impl Default for StepDetector {
    fn default() -> Self {
        Self::new(StepDetectorConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HIGH: f64 = 22_000.0;
    const LOW: f64 = 16_384.0;
    const BAND: f64 = 19_000.0; // between falling and rising

    fn feed(detector: &mut StepDetector, signal: &[(f64, u64)]) -> Vec<StepEvent> {
        signal
            .iter()
            .filter_map(|&(m, t)| detector.process(m, t))
            .collect()
    }

    #[test]
    fn test_step_detector_creation() {
        let detector = StepDetector::default();
        assert_eq!(detector.count(), 0);
        assert_eq!(detector.state(), DetectorState::BelowThreshold);
        assert_eq!(detector.last_step_timestamp(), None);
    }

    #[test]
    fn test_rise_arms_without_counting() {
        let mut detector = StepDetector::default();
        assert!(detector.process(HIGH, 0).is_none());
        assert_eq!(detector.state(), DetectorState::AboveThreshold);
        assert_eq!(detector.count(), 0);
    }

    #[test]
    fn test_fall_confirms_step() {
        let mut detector = StepDetector::default();
        detector.process(HIGH, 0);
        detector.process(HIGH + 500.0, 50);
        let event = detector.process(LOW, 100).expect("step should be confirmed");

        assert_eq!(event.count, 1);
        assert_eq!(event.timestamp_ms, 100);
        assert_eq!(event.peak_magnitude, HIGH + 500.0);
        assert_eq!(detector.last_step_timestamp(), Some(100));
        assert_eq!(detector.state(), DetectorState::BelowThreshold);
    }

    #[test]
    fn test_detected_only_on_confirming_sample() {
        let mut detector = StepDetector::default();
        let flags: Vec<bool> = [(LOW, 0), (HIGH, 100), (HIGH, 200), (LOW, 300), (LOW, 400)]
            .iter()
            .map(|&(m, t)| detector.process(m, t).is_some())
            .collect();
        assert_eq!(flags, vec![false, false, false, true, false]);
    }

    #[test]
    fn test_hysteresis_rejects_dithering() {
        let mut detector = StepDetector::default();
        // Dither inside the band after arming, then dither around the rising threshold.
        let signal = [
            (HIGH, 0),
            (BAND, 20),
            (HIGH, 40),
            (BAND, 60),
            (HIGH, 80),
            (LOW, 100),
        ];
        let steps = feed(&mut detector, &signal);
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn test_band_values_never_arm() {
        let mut detector = StepDetector::default();
        let signal: Vec<(f64, u64)> = (0..20).map(|i| (BAND, i * 100)).collect();
        assert!(feed(&mut detector, &signal).is_empty());
        assert_eq!(detector.state(), DetectorState::BelowThreshold);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let config = StepDetectorConfig::default();
        let mut detector = StepDetector::new(config.clone());
        detector.process(config.rising_threshold, 0);
        assert_eq!(detector.state(), DetectorState::BelowThreshold);

        detector.process(config.rising_threshold + 1.0, 10);
        detector.process(config.falling_threshold, 20);
        assert_eq!(detector.state(), DetectorState::AboveThreshold);
    }

    #[test]
    fn test_debounce_blocks_fast_rise() {
        let mut detector = StepDetector::default();
        let signal = [
            (HIGH, 0),
            (LOW, 100),  // step at 100
            (HIGH, 200), // only 100ms later, ignored
            (LOW, 250),
            (HIGH, 400), // 300ms after the step, accepted
            (LOW, 450),
        ];
        let steps = feed(&mut detector, &signal);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].timestamp_ms, 450);
    }

    #[test]
    fn test_minimum_step_interval() {
        let mut detector = StepDetector::default();
        // Peaks every 40ms (25 Hz) are physically impossible.
        let signal: Vec<(f64, u64)> = (0..50)
            .map(|i| (if i % 2 == 0 { HIGH } else { LOW }, i as u64 * 20))
            .collect();
        let steps = feed(&mut detector, &signal);
        // 1000ms of signal allows at most one step per 300ms debounce.
        assert!(steps.len() <= 4, "got {}", steps.len());
        assert!(!steps.is_empty());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut detector = StepDetector::default();
        feed(&mut detector, &[(HIGH, 0), (LOW, 100), (HIGH, 500)]);
        assert_eq!(detector.count(), 1);
        assert_eq!(detector.state(), DetectorState::AboveThreshold);

        detector.reset();

        assert_eq!(detector.count(), 0);
        assert_eq!(detector.state(), DetectorState::BelowThreshold);
        assert_eq!(detector.last_step_timestamp(), None);

        // No debounce carried over from before the reset.
        assert!(detector.process(HIGH, 510).is_none());
        assert!(detector.process(LOW, 520).is_some());
    }

    #[test]
    fn test_clock_jump_backwards_reanchors_debounce() {
        let mut detector = StepDetector::default();
        feed(&mut detector, &[(HIGH, 10_000), (LOW, 10_100)]);

        // Clock restarts near zero.
        assert!(detector.process(LOW, 50).is_none());
        assert_eq!(detector.last_step_timestamp(), Some(50));

        // Still inside the debounce measured from the jump.
        detector.process(HIGH, 200);
        assert_eq!(detector.state(), DetectorState::BelowThreshold);

        detector.process(HIGH, 400);
        assert!(detector.process(LOW, 450).is_some());
        assert_eq!(detector.count(), 2);
    }

    proptest! {
        #[test]
        fn prop_count_matches_events_and_never_decreases(
            signal in proptest::collection::vec((10_000.0f64..30_000.0, 0u64..400), 1..200)
        ) {
            let mut detector = StepDetector::default();
            let mut t = 0u64;
            let mut previous = 0u64;
            let mut events = 0u64;

            for (magnitude, dt) in signal {
                t += dt;
                if let Some(event) = detector.process(magnitude, t) {
                    events += 1;
                    prop_assert_eq!(event.count, events);
                }
                prop_assert!(detector.count() >= previous);
                previous = detector.count();
            }
            prop_assert_eq!(detector.count(), events);
        }
    }
}
