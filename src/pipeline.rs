//! Activity engine: the per-session facade over the processing stages.
//!
//! This module orchestrates the full data flow from a raw inertial sample
//! to the combined activity and step result.
//!
//! # Architecture
//!
//! 1. **Buffering**: push the sample into the bounded window
//! 2. **Feature extraction**: magnitude, magnitude variance, gyro magnitude
//! 3. **Classification**: threshold cascade, overridden in workout mode
//! 4. **Step detection**: hysteresis automaton on the magnitude (mode-blind)
//! 5. **Rate estimation**: steps per minute over the trailing window
//!
//! The engine owns all mutable session state. Every mutation goes through
//! `process`, `set_mode`, `reset_steps` or `inject_steps`; mode changes and
//! resets apply from the next processed sample onward, never retroactively.
//!
//! # Performance
//! - O(window size) per sample, fixed memory
//! - No I/O and no blocking

use tracing::{info, warn};

use crate::buffer::SampleBuffer;
use crate::classifier::ActivityClassifier;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::signal::{FeatureExtractor, SampleSanitizer};
use crate::step_detection::StepDetector;
use crate::step_rate::StepRateEstimator;
use crate::synthetic::{synthesize_steps, StepInjection};
use crate::types::{EngineOutput, EngineStatus, InertialSample, Mode};

/// Activity classification and step counting for one device session.
#[derive(Debug, Clone)]
pub struct ActivityEngine {
    config: EngineConfig,

    // Processing stages
    buffer: SampleBuffer,
    extractor: FeatureExtractor,
    classifier: ActivityClassifier,
    step_detector: StepDetector,
    step_rate: StepRateEstimator,

    // Session state
    mode: Mode,
    samples_processed: u64,
    last_timestamp_ms: Option<u64>,
    last_output: Option<EngineOutput>,
}

impl ActivityEngine {
    /// Creates an engine after validating `config`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        let sanitizer = SampleSanitizer::new(config.sanitizer.clone());
        Self {
            buffer: SampleBuffer::new(config.buffer.capacity),
            extractor: FeatureExtractor::new(sanitizer, config.buffer.window_size),
            classifier: ActivityClassifier::new(config.classifier.clone()),
            step_detector: StepDetector::new(config.step_detector.clone()),
            step_rate: StepRateEstimator::new(config.step_rate.clone()),
            config,
            mode: Mode::Normal,
            samples_processed: 0,
            last_timestamp_ms: None,
            last_output: None,
        }
    }

    /// Processes a single sample through every stage.
    ///
    /// Never fails: insufficient or malformed input yields a best-effort
    /// result (Unknown activity, no step).
    pub fn process(&mut self, sample: InertialSample) -> EngineOutput {
        let now_ms = sample.timestamp_ms;

        // Stage 1: Buffering
        self.buffer.push(sample);

        // Stage 2: Feature extraction
        let features = self.extractor.extract(&self.buffer);

        // Stage 3: Classification
        let classification = self.classifier.classify(&features, self.mode);

        // Stage 4: Step detection
        let step = self.step_detector.process(features.magnitude, now_ms);
        if let Some(event) = &step {
            self.step_rate.record(event.timestamp_ms);
        }

        // Stage 5: Rate estimation
        let rate = self.step_rate.rate(now_ms);

        let output = EngineOutput::assemble(
            classification,
            self.step_detector.count(),
            rate,
            step.is_some(),
            self.mode,
        );

        self.samples_processed += 1;
        self.last_timestamp_ms = Some(now_ms);
        self.last_output = Some(output);
        output
    }

    /// Processes samples in order and returns every output.
    pub fn process_batch(&mut self, samples: &[InertialSample]) -> Vec<EngineOutput> {
        samples.iter().map(|s| self.process(*s)).collect()
    }

    /// Switches mode from the next processed sample onward. Setting the
    /// current mode again is a no-op.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            info!(from = %self.mode, to = %mode, "mode changed");
            self.mode = mode;
        }
    }

    /// Parses and applies a mode name. On error the current mode is kept.
    pub fn set_mode_name(&mut self, name: &str) -> Result<Mode> {
        let mode = name.parse::<Mode>().map_err(|err| {
            warn!(requested = name, "rejected mode change");
            err
        })?;
        self.set_mode(mode);
        Ok(mode)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Zeroes the step count and forgets step history.
    pub fn reset_steps(&mut self) {
        info!(previous_count = self.step_detector.count(), "step counter reset");
        self.step_detector.reset();
        self.step_rate.clear();
    }

    /// Feeds `num_steps` synthetic steps, `interval_secs` apart, through
    /// [`process`](Self::process) and returns the outputs in order.
    ///
    /// The first synthetic peak lands one interval after the last processed
    /// sample. Invalid parameters are rejected before any state changes.
    pub fn inject_steps(&mut self, num_steps: i64, interval_secs: f64) -> Result<Vec<EngineOutput>> {
        let injection = StepInjection::new(num_steps, interval_secs).map_err(|err| {
            warn!(num_steps, interval_secs, "rejected step injection");
            err
        })?;

        let start_ms = self
            .last_timestamp_ms
            .map_or(0, |t| t.saturating_add(injection.interval_ms()));
        info!(steps = injection.steps(), interval_ms = injection.interval_ms(), start_ms, "injecting synthetic steps");

        let samples: Vec<InertialSample> = synthesize_steps(
            injection,
            &self.config.step_detector,
            &self.config.sanitizer,
            start_ms,
        )
        .collect();

        Ok(self.process_batch(&samples))
    }

    pub fn step_count(&self) -> u64 {
        self.step_detector.count()
    }

    pub fn samples_processed(&self) -> u64 {
        self.samples_processed
    }

    pub fn last_output(&self) -> Option<EngineOutput> {
        self.last_output
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A read-only snapshot of the session.
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            mode: self.mode,
            step_count: self.step_detector.count(),
            last_step_timestamp: self.step_detector.last_step_timestamp(),
            samples_processed: self.samples_processed,
            buffered_samples: self.buffer.len(),
            last_output: self.last_output,
        }
    }
}

impl Default for ActivityEngine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}
