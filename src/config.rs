//! Engine configuration.
//!
//! Bundles the per-component configurations into one document that can be
//! loaded from TOML or JSON. Every section is optional: missing fields take
//! their defaults, so a calibration file only needs the thresholds that
//! differ for a given device revision.
//!
//! ```toml
//! [classifier]
//! variance_low = 8000.0
//!
//! [step_detector]
//! rising_threshold = 20500.0
//! falling_threshold = 18500.0
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::buffer::BufferConfig;
use crate::classifier::ClassifierConfig;
use crate::error::{EngineError, Result};
use crate::signal::{SanitizerConfig, MIN_SAMPLES_FOR_FEATURES};
use crate::step_detection::StepDetectorConfig;
use crate::step_rate::StepRateConfig;

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub buffer: BufferConfig,
    pub sanitizer: SanitizerConfig,
    pub classifier: ClassifierConfig,
    pub step_detector: StepDetectorConfig,
    pub step_rate: StepRateConfig,
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let parse: fn(&str) -> Result<Self> = match extension.as_deref() {
            Some("toml") => Self::from_toml_str,
            Some("json") => Self::from_json_str,
            _ => {
                return Err(EngineError::UnsupportedConfigFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        let content = fs::read_to_string(path).map_err(|source| EngineError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&content)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        let buffer = &self.buffer;
        if buffer.window_size < MIN_SAMPLES_FOR_FEATURES {
            return invalid(format!(
                "buffer.window_size must be at least {MIN_SAMPLES_FOR_FEATURES}, got {}",
                buffer.window_size
            ));
        }
        if buffer.window_size > buffer.capacity {
            return invalid(format!(
                "buffer.window_size ({}) exceeds buffer.capacity ({})",
                buffer.window_size, buffer.capacity
            ));
        }

        if self.sanitizer.max_abs_count <= 0 {
            return invalid("sanitizer.max_abs_count must be positive".to_string());
        }

        let classifier = &self.classifier;
        check_threshold("classifier.variance_low", classifier.variance_low)?;
        check_threshold("classifier.variance_mid", classifier.variance_mid)?;
        check_threshold("classifier.gyro_low", classifier.gyro_low)?;
        if classifier.variance_low >= classifier.variance_mid {
            return invalid(format!(
                "classifier.variance_low ({}) must be below classifier.variance_mid ({})",
                classifier.variance_low, classifier.variance_mid
            ));
        }

        let step = &self.step_detector;
        check_threshold("step_detector.rising_threshold", step.rising_threshold)?;
        check_threshold("step_detector.falling_threshold", step.falling_threshold)?;
        if step.falling_threshold >= step.rising_threshold {
            return invalid(format!(
                "step_detector.falling_threshold ({}) must be below step_detector.rising_threshold ({})",
                step.falling_threshold, step.rising_threshold
            ));
        }
        if step.rising_threshold >= self.sanitizer.max_abs_count as f64 {
            return invalid(format!(
                "step_detector.rising_threshold ({}) must be below sanitizer.max_abs_count ({})",
                step.rising_threshold, self.sanitizer.max_abs_count
            ));
        }
        if step.debounce_ms == 0 {
            return invalid("step_detector.debounce_ms must be positive".to_string());
        }

        let rate = &self.step_rate;
        if !(rate.window_secs.is_finite() && rate.window_secs > 0.0) {
            return invalid(format!(
                "step_rate.window_secs must be positive, got {}",
                rate.window_secs
            ));
        }
        if rate.history_capacity < 2 {
            return invalid("step_rate.history_capacity must be at least 2".to_string());
        }

        Ok(())
    }
}

fn invalid(message: String) -> Result<()> {
    Err(EngineError::InvalidConfig(message))
}

fn check_threshold(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        invalid(format!("{name} must be a positive finite number, got {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [step_detector]
            rising_threshold = 21000.0
            "#,
        )
        .unwrap();

        assert_eq!(config.step_detector.rising_threshold, 21_000.0);
        assert_eq!(config.step_detector.falling_threshold, StepDetectorConfig::default().falling_threshold);
        assert_eq!(config.classifier, ClassifierConfig::default());
    }

    #[test]
    fn test_json_config() {
        let config = EngineConfig::from_json_str(r#"{"classifier": {"gyro_low": 700.0}}"#).unwrap();
        assert_eq!(config.classifier.gyro_low, 700.0);
    }

    #[test]
    fn test_inverted_hysteresis_rejected() {
        let result = EngineConfig::from_toml_str(
            r#"
            [step_detector]
            rising_threshold = 18000.0
            falling_threshold = 19000.0
            "#,
        );
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_inverted_variance_thresholds_rejected() {
        let mut config = EngineConfig::default();
        config.classifier.variance_low = 300_000.0;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_window_bounds_rejected() {
        let mut config = EngineConfig::default();
        config.buffer.window_size = 1;
        assert!(config.validate().is_err());

        config.buffer.window_size = config.buffer.capacity + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_threshold_rejected() {
        let mut config = EngineConfig::default();
        config.classifier.gyro_low = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.step_rate.window_secs = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let mut config = EngineConfig::default();
        config.classifier.variance_low = 0.0;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(msg)) if msg.contains("variance_low")));

        let mut config = EngineConfig::default();
        config.step_detector.falling_threshold = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let result = EngineConfig::from_toml_str("[classifier\nvariance_low = ");
        assert!(matches!(result, Err(EngineError::TomlParse(_))));
    }

    #[test]
    fn test_from_path_dispatches_on_extension() {
        let dir = std::env::temp_dir().join(format!("fitsense-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let toml_path = dir.join("device.toml");
        let mut file = fs::File::create(&toml_path).unwrap();
        writeln!(file, "[step_detector]\ndebounce_ms = 250").unwrap();
        let config = EngineConfig::from_path(&toml_path).unwrap();
        assert_eq!(config.step_detector.debounce_ms, 250);

        let yaml_path = dir.join("device.yaml");
        assert!(matches!(
            EngineConfig::from_path(&yaml_path),
            Err(EngineError::UnsupportedConfigFormat { .. })
        ));

        let missing = dir.join("missing.json");
        assert!(matches!(
            EngineConfig::from_path(&missing),
            Err(EngineError::ConfigRead { .. })
        ));

        fs::remove_dir_all(&dir).ok();
    }
}
