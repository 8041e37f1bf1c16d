//! Activity classification.
//!
//! A deterministic threshold cascade over the window features. The cascade
//! is data: an ordered table of rules, each a predicate, a label and a
//! confidence function. The first rule whose predicate matches wins.
//!
//! Order:
//! 1. Workout mode overrides everything.
//! 2. Insufficient data reports Unknown.
//! 3. Low variance and low rotation is Sitting.
//! 4. Moderate variance is Standing.
//! 5. Everything else is Walking.
//!
//! Conservative: confidences are floored at 0.5 for a matched label and
//! only approach 1.0 when the features sit deep inside the label's range.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::signal::FeatureVector;
use crate::types::{ActivityLabel, ClassificationResult, Mode};

/// Confidence reported for every sample while in workout mode.
pub const WORKOUT_CONFIDENCE: f64 = 0.95;

/// Classification thresholds, in raw sensor counts.
///
/// Defaults are a starting calibration for a ±2 g accelerometer
/// (16384 counts/g) and a ±250 °/s gyroscope (131 counts per °/s).
/// Other device revisions need their own values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Magnitude variance below which the wearer may be sitting (counts²).
    /// Typical: 10_000 (std dev of ~100 counts).
    pub variance_low: f64,

    /// Magnitude variance below which the wearer is standing (counts²).
    /// Typical: 250_000 (std dev of ~500 counts).
    pub variance_mid: f64,

    /// Gyroscope magnitude below which the wearer may be sitting (counts).
    /// Typical: 1000 (~7.6 °/s).
    pub gyro_low: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            variance_low: 10_000.0,
            variance_mid: 250_000.0,
            gyro_low: 1_000.0,
        }
    }
}

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub features: &'a FeatureVector,
    pub mode: Mode,
    pub config: &'a ClassifierConfig,
}

/// One step of the cascade.
#[derive(Clone, Copy)]
pub struct ClassificationRule {
    pub name: &'static str,
    pub label: ActivityLabel,
    pub matches: fn(&RuleInput<'_>) -> bool,
    pub confidence: fn(&RuleInput<'_>) -> f64,
}

impl std::fmt::Debug for ClassificationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationRule")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish()
    }
}

/// The cascade, in evaluation order.
pub const CASCADE: [ClassificationRule; 5] = [
    ClassificationRule {
        name: "workout_mode",
        label: ActivityLabel::Workout,
        matches: is_workout_mode,
        confidence: workout_confidence,
    },
    ClassificationRule {
        name: "insufficient_data",
        label: ActivityLabel::Unknown,
        matches: is_insufficient,
        confidence: no_confidence,
    },
    ClassificationRule {
        name: "sitting",
        label: ActivityLabel::Sitting,
        matches: is_sitting,
        confidence: sitting_confidence,
    },
    ClassificationRule {
        name: "standing",
        label: ActivityLabel::Standing,
        matches: is_standing,
        confidence: standing_confidence,
    },
    ClassificationRule {
        name: "walking",
        label: ActivityLabel::Walking,
        matches: always,
        confidence: walking_confidence,
    },
];

fn is_workout_mode(input: &RuleInput<'_>) -> bool {
    input.mode == Mode::Workout
}

fn workout_confidence(_: &RuleInput<'_>) -> f64 {
    WORKOUT_CONFIDENCE
}

fn is_insufficient(input: &RuleInput<'_>) -> bool {
    !input.features.is_sufficient()
}

fn no_confidence(_: &RuleInput<'_>) -> f64 {
    0.0
}

fn is_sitting(input: &RuleInput<'_>) -> bool {
    input.features.magnitude_variance < input.config.variance_low
        && input.features.gyro_magnitude < input.config.gyro_low
}

/// 1.0 at zero variance, falling linearly to 0.5 at `variance_low`.
fn sitting_confidence(input: &RuleInput<'_>) -> f64 {
    let ratio = input.features.magnitude_variance / input.config.variance_low;
    (1.0 - 0.5 * ratio).clamp(0.5, 1.0)
}

fn is_standing(input: &RuleInput<'_>) -> bool {
    input.features.magnitude_variance < input.config.variance_mid
}

/// 0.5 at the sitting/standing boundary, rising to 0.9 at `variance_mid`.
/// Low-variance samples that only missed Sitting on rotation stay at 0.5.
fn standing_confidence(input: &RuleInput<'_>) -> f64 {
    let span = input.config.variance_mid - input.config.variance_low;
    let distance = (input.features.magnitude_variance - input.config.variance_low) / span;
    (0.5 + 0.4 * distance.clamp(0.0, 1.0)).clamp(0.5, 0.9)
}

fn always(_: &RuleInput<'_>) -> bool {
    true
}

/// 0.5 at `variance_mid`, reaching 1.0 at twice `variance_mid`.
fn walking_confidence(input: &RuleInput<'_>) -> f64 {
    let excess = (input.features.magnitude_variance - input.config.variance_mid) / input.config.variance_mid;
    (0.5 + 0.5 * excess).clamp(0.5, 1.0)
}

/// Maps features and mode to an activity label. Stateless.
#[derive(Debug, Clone)]
pub struct ActivityClassifier {
    config: ClassifierConfig,
}

impl ActivityClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Evaluate the cascade; the first matching rule decides.
    pub fn classify(&self, features: &FeatureVector, mode: Mode) -> ClassificationResult {
        let input = RuleInput {
            features,
            mode,
            config: &self.config,
        };

        match CASCADE.iter().find(|rule| (rule.matches)(&input)) {
            Some(rule) => {
                let result = ClassificationResult::new(rule.label, (rule.confidence)(&input));
                debug!(
                    rule = rule.name,
                    variance = features.magnitude_variance,
                    gyro = features.gyro_magnitude,
                    confidence = result.confidence,
                    "classified"
                );
                result
            }
            None => ClassificationResult::unknown(),
        }
    }
}
