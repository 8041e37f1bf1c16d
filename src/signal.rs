//! Sample sanitization and feature extraction.
//!
//! This module turns the raw sample window into the feature vector that
//! both the activity classifier and the step detector consume:
//! - Out-of-range axis rejection (a single bad reading must not abort a session)
//! - Acceleration magnitude of the latest sample
//! - Population variance of acceleration magnitude over the window
//! - Gyroscope magnitude of the latest sample
//!
//! Design note: extraction is O(window size) per sample with no allocation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::buffer::SampleBuffer;
use crate::types::{magnitude, InertialSample};

/// Fewer samples than this and the classifier reports Unknown.
pub const MIN_SAMPLES_FOR_FEATURES: usize = 2;

/// Limits for accepting raw axis values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Largest absolute raw count accepted on any axis. Readings beyond
    /// this are physically impossible for the sensor's full-scale range
    /// and are ignored for feature computation.
    /// Typical: 32768 for a 16-bit sensor.
    pub max_abs_count: i32,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            max_abs_count: 32_768,
        }
    }
}

/// How trustworthy the latest sample was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleQuality {
    /// All axes within range.
    Clean,
    /// One or more axes were out of range and ignored.
    Clamped,
    /// No usable acceleration signal (all accelerometer axes zero).
    Degenerate,
}

/// A sample with out-of-range axes zeroed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SanitizedSample {
    pub accel: [i32; 3],
    pub gyro: [i32; 3],
    pub quality: SampleQuality,
}

impl SanitizedSample {
    pub fn accel_magnitude(&self) -> f64 {
        magnitude(self.accel)
    }

    pub fn gyro_magnitude(&self) -> f64 {
        magnitude(self.gyro)
    }
}

/// Rejects axis values outside the sensor's range.
#[derive(Debug, Clone)]
pub struct SampleSanitizer {
    config: SanitizerConfig,
}

impl SampleSanitizer {
    pub fn new(config: SanitizerConfig) -> Self {
        Self { config }
    }

    /// Zero every axis whose magnitude exceeds the limit.
    ///
    /// Pure: logging of bad readings is left to [`FeatureExtractor::extract`]
    /// so that each sample is reported once, not once per window it sits in.
    pub fn sanitize(&self, sample: &InertialSample) -> SanitizedSample {
        let mut clamped = false;
        let mut check = |v: i32| -> i32 {
            if v.unsigned_abs() > self.config.max_abs_count.unsigned_abs() {
                clamped = true;
                0
            } else {
                v
            }
        };

        let accel = [check(sample.ax), check(sample.ay), check(sample.az)];
        let gyro = [check(sample.gx), check(sample.gy), check(sample.gz)];

        let quality = if accel == [0, 0, 0] {
            SampleQuality::Degenerate
        } else if clamped {
            SampleQuality::Clamped
        } else {
            SampleQuality::Clean
        };

        SanitizedSample {
            accel,
            gyro,
            quality,
        }
    }
}

/// Features derived from the current window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    /// Acceleration magnitude of the latest sample (counts).
    pub magnitude: f64,
    /// Population variance of acceleration magnitude over the window (counts²).
    pub magnitude_variance: f64,
    /// Gyroscope magnitude of the latest sample (counts).
    pub gyro_magnitude: f64,
    /// Number of samples the window actually held.
    pub sample_count: usize,
    /// Quality of the latest sample.
    pub quality: SampleQuality,
}

impl FeatureVector {
    /// The vector reported for an empty buffer.
    pub fn empty() -> Self {
        Self {
            magnitude: 0.0,
            magnitude_variance: 0.0,
            gyro_magnitude: 0.0,
            sample_count: 0,
            quality: SampleQuality::Degenerate,
        }
    }

    /// False when there are too few samples or the latest one is degenerate.
    /// The classifier must then report Unknown.
    pub fn is_sufficient(&self) -> bool {
        self.sample_count >= MIN_SAMPLES_FOR_FEATURES && self.quality != SampleQuality::Degenerate
    }
}

/// Computes [`FeatureVector`]s over the most recent samples of a buffer.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    sanitizer: SampleSanitizer,
    window_size: usize,
}

impl FeatureExtractor {
    pub fn new(sanitizer: SampleSanitizer, window_size: usize) -> Self {
        Self {
            sanitizer,
            window_size,
        }
    }

    /// Extract features from the buffer's current window.
    pub fn extract(&self, buffer: &SampleBuffer) -> FeatureVector {
        let latest = match buffer.latest() {
            Some(sample) => sample,
            None => return FeatureVector::empty(),
        };

        let current = self.sanitizer.sanitize(latest);
        if current.quality != SampleQuality::Clean {
            warn!(
                timestamp_ms = latest.timestamp_ms,
                quality = ?current.quality,
                "malformed sample, affected axes ignored"
            );
        }

        // Two passes over the window: mean, then squared deviations.
        let mut count = 0usize;
        let mut sum = 0.0;
        for sample in buffer.window(self.window_size) {
            sum += self.sanitizer.sanitize(sample).accel_magnitude();
            count += 1;
        }

        let magnitude_variance = if count < MIN_SAMPLES_FOR_FEATURES {
            0.0
        } else {
            let mean = sum / count as f64;
            let sum_sq_dev: f64 = buffer
                .window(self.window_size)
                .map(|s| {
                    let dev = self.sanitizer.sanitize(s).accel_magnitude() - mean;
                    dev * dev
                })
                .sum();
            sum_sq_dev / count as f64
        };

        FeatureVector {
            magnitude: current.accel_magnitude(),
            magnitude_variance,
            gyro_magnitude: current.gyro_magnitude(),
            sample_count: count,
            quality: current.quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(window: usize) -> FeatureExtractor {
        FeatureExtractor::new(SampleSanitizer::new(SanitizerConfig::default()), window)
    }

    fn buffer_with(samples: &[InertialSample]) -> SampleBuffer {
        let mut buffer = SampleBuffer::new(16);
        for s in samples {
            buffer.push(*s);
        }
        buffer
    }

    #[test]
    fn test_empty_buffer_is_insufficient() {
        let features = extractor(8).extract(&SampleBuffer::new(4));
        assert!(!features.is_sufficient());
        assert_eq!(features.sample_count, 0);
    }

    #[test]
    fn test_single_sample_has_zero_variance() {
        let buffer = buffer_with(&[InertialSample::new(0, [3, 4, 0], [0, 0, 0])]);
        let features = extractor(8).extract(&buffer);

        assert_eq!(features.magnitude_variance, 0.0);
        assert!((features.magnitude - 5.0).abs() < 1e-9);
        assert!(!features.is_sufficient());
    }

    #[test]
    fn test_population_variance() {
        // Magnitudes 10 and 20: mean 15, population variance 25.
        let buffer = buffer_with(&[
            InertialSample::new(0, [0, 0, 10], [0, 0, 0]),
            InertialSample::new(20, [0, 0, 20], [0, 0, 0]),
        ]);
        let features = extractor(8).extract(&buffer);

        assert!((features.magnitude_variance - 25.0).abs() < 1e-9);
        assert!(features.is_sufficient());
    }

    #[test]
    fn test_window_limits_variance_scope() {
        let buffer = buffer_with(&[
            InertialSample::new(0, [0, 0, 1000], [0, 0, 0]),
            InertialSample::new(20, [0, 0, 50], [0, 0, 0]),
            InertialSample::new(40, [0, 0, 50], [0, 0, 0]),
        ]);
        let features = extractor(2).extract(&buffer);

        assert_eq!(features.sample_count, 2);
        assert_eq!(features.magnitude_variance, 0.0);
    }

    #[test]
    fn test_gyro_magnitude_uses_latest() {
        let buffer = buffer_with(&[
            InertialSample::new(0, [0, 0, 100], [500, 0, 0]),
            InertialSample::new(20, [0, 0, 100], [0, 6, 8]),
        ]);
        let features = extractor(8).extract(&buffer);
        assert!((features.gyro_magnitude - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_axis_is_ignored() {
        let sanitizer = SampleSanitizer::new(SanitizerConfig { max_abs_count: 1000 });
        let sanitized = sanitizer.sanitize(&InertialSample::new(0, [600, i32::MAX, 800], [0, -5000, 3]));

        assert_eq!(sanitized.accel, [600, 0, 800]);
        assert_eq!(sanitized.gyro, [0, 0, 3]);
        assert_eq!(sanitized.quality, SampleQuality::Clamped);
        assert!((sanitized.accel_magnitude() - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_i32_min_is_rejected_without_overflow() {
        let sanitizer = SampleSanitizer::new(SanitizerConfig::default());
        let sanitized = sanitizer.sanitize(&InertialSample::new(0, [i32::MIN, 10, 0], [0, 0, 0]));
        assert_eq!(sanitized.accel, [0, 10, 0]);
    }

    #[test]
    fn test_all_zero_sample_is_degenerate() {
        let buffer = buffer_with(&[
            InertialSample::new(0, [0, 0, 16384], [0, 0, 0]),
            InertialSample::new(20, [0, 0, 0], [0, 0, 0]),
        ]);
        let features = extractor(8).extract(&buffer);

        assert_eq!(features.quality, SampleQuality::Degenerate);
        assert!(!features.is_sufficient());
    }
}
