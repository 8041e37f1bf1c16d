//! Core data types for the activity engine.
//!
//! Everything that crosses the engine boundary is defined here: the raw
//! inertial sample coming in, the mode and activity vocabularies, and the
//! per-sample output read by the dashboard.
//!
//! Design principle: if a concept exists, it gets a type. The dashboard
//! reads [`EngineOutput`] by field name, so its serialized names are part of
//! the wire contract and must not change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// A single raw 6-axis inertial sample.
///
/// Values are raw sensor counts exactly as the device reports them; scale
/// factors differ between device revisions, so nothing here is converted to
/// physical units. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InertialSample {
    /// Monotonic timestamp in milliseconds.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,

    /// Accelerometer counts.
    pub ax: i32,
    pub ay: i32,
    pub az: i32,

    /// Gyroscope counts.
    pub gx: i32,
    pub gy: i32,
    pub gz: i32,
}

impl InertialSample {
    /// Creates a sample from accelerometer and gyroscope triples.
    pub fn new(timestamp_ms: u64, accel: [i32; 3], gyro: [i32; 3]) -> Self {
        Self {
            timestamp_ms,
            ax: accel[0],
            ay: accel[1],
            az: accel[2],
            gx: gyro[0],
            gy: gyro[1],
            gz: gyro[2],
        }
    }

    pub fn accel(&self) -> [i32; 3] {
        [self.ax, self.ay, self.az]
    }

    pub fn gyro(&self) -> [i32; 3] {
        [self.gx, self.gy, self.gz]
    }

    /// Euclidean norm of the raw accelerometer triple, in counts.
    pub fn accel_magnitude(&self) -> f64 {
        magnitude(self.accel())
    }

    /// Euclidean norm of the raw gyroscope triple, in counts.
    pub fn gyro_magnitude(&self) -> f64 {
        magnitude(self.gyro())
    }
}

/// Euclidean norm of an integer triple, computed in f64 so that full-scale
/// 32-bit counts cannot overflow.
pub fn magnitude(v: [i32; 3]) -> f64 {
    let x = v[0] as f64;
    let y = v[1] as f64;
    let z = v[2] as f64;
    (x * x + y * y + z * z).sqrt()
}

/// How the activity label is derived.
///
/// `Workout` overrides the classifier's label; step detection is unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Normal,
    Workout,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Workout => "workout",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Mode::Normal),
            "workout" => Ok(Mode::Workout),
            _ => Err(EngineError::InvalidMode(s.to_string())),
        }
    }
}

/// Closed vocabulary of activity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLabel {
    Sitting,
    Standing,
    Walking,
    Workout,
    /// Not enough data, or the latest sample was degenerate.
    #[default]
    Unknown,
}

impl ActivityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLabel::Sitting => "sitting",
            ActivityLabel::Standing => "standing",
            ActivityLabel::Walking => "walking",
            ActivityLabel::Workout => "workout",
            ActivityLabel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ActivityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// An activity label with a heuristic confidence in [0.0, 1.0].
///
/// The confidence describes how decisively the features sit inside the
/// label's expected range. It is not a calibrated probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub activity: ActivityLabel,
    pub confidence: f64,
}

impl ClassificationResult {
    /// Creates a result, clamping confidence into [0.0, 1.0].
    pub fn new(activity: ActivityLabel, confidence: f64) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            activity,
            confidence,
        }
    }

    /// The result reported when features are insufficient.
    pub fn unknown() -> Self {
        Self {
            activity: ActivityLabel::Unknown,
            confidence: 0.0,
        }
    }
}

/// A confirmed step, emitted by the step detector on the falling edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEvent {
    /// Timestamp of the sample that confirmed the step.
    pub timestamp_ms: u64,
    /// Running count including this step.
    pub count: u64,
    /// Highest magnitude seen while above the rising threshold.
    pub peak_magnitude: f64,
}

/// The combined per-sample result.
///
/// Serialized field names are the dashboard wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineOutput {
    pub activity: ActivityLabel,
    pub activity_confidence: f64,
    pub step_count: u64,
    pub step_rate: f64,
    pub step_detected: bool,
    pub mode: Mode,
}

impl EngineOutput {
    pub(crate) fn assemble(
        classification: ClassificationResult,
        step_count: u64,
        step_rate: f64,
        step_detected: bool,
        mode: Mode,
    ) -> Self {
        Self {
            activity: classification.activity,
            activity_confidence: classification.confidence,
            step_count,
            step_rate,
            step_detected,
            mode,
        }
    }
}

/// Read-only snapshot of a session, for status polling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub mode: Mode,
    pub step_count: u64,
    pub last_step_timestamp: Option<u64>,
    pub samples_processed: u64,
    pub buffered_samples: usize,
    pub last_output: Option<EngineOutput>,
}
