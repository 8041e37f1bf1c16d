//! Error types for the activity engine.
//!
//! Only configuration and control-surface operations can fail. Per-sample
//! processing never returns an error: degraded input degrades the result
//! instead (see [`crate::signal::SampleQuality`]).

use std::path::PathBuf;

/// Common result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Unified error type for the engine and its configuration layer.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Mode name did not match any known mode. The previous mode is kept.
    #[error("Invalid mode '{0}': expected 'normal' or 'workout'")]
    InvalidMode(String),

    /// Step injection requested a negative or excessive number of steps.
    #[error("Invalid step count {0}: must be between 0 and {max}", max = crate::synthetic::MAX_INJECTED_STEPS)]
    InvalidStepCount(i64),

    /// Step injection interval was non-positive, non-finite or too long.
    #[error("Invalid step interval {0}s: must be positive and at most {max}s", max = crate::synthetic::MAX_INJECTED_INTERVAL_SECS)]
    InvalidInterval(f64),

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("Failed to read configuration file at '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file has an extension we do not parse.
    #[error("Unsupported configuration file format for path: {path}")]
    UnsupportedConfigFormat { path: PathBuf },

    #[error("Failed to parse TOML configuration: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}
