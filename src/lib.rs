//! FitSense Activity Engine Library
//!
//! Turns a continuous stream of raw 6-axis inertial samples from a wearable
//! into, per sample, an activity label with a confidence score plus a running
//! step count, a step-detected flag and a steps-per-minute estimate.
//!
//! # Design Philosophy
//!
//! - **Deterministic and explainable**: a threshold cascade and a two-state
//!   step automaton, no trained model. Every threshold is configuration.
//! - **Best effort, never fatal**: a bad reading degrades one result; it
//!   never aborts a session.
//! - **One owner per session**: all mutable state lives in an
//!   [`ActivityEngine`]; [`SharedEngine`] serializes access across threads.
//! - **Bounded cost**: O(window) per sample with fixed memory.
//!
//! # Example
//!
//! ```
//! use fitsense::{ActivityEngine, ActivityLabel, InertialSample, Mode};
//!
//! let mut engine = ActivityEngine::default();
//!
//! for i in 0..5u64 {
//!     let output = engine.process(InertialSample::new(i * 20, [950, 0, 17_500], [0, 0, 0]));
//!     if i > 0 {
//!         assert_eq!(output.activity, ActivityLabel::Sitting);
//!     }
//! }
//!
//! engine.set_mode(Mode::Workout);
//! let output = engine.process(InertialSample::new(100, [950, 0, 17_500], [0, 0, 0]));
//! assert_eq!(output.activity, ActivityLabel::Workout);
//! ```

pub mod buffer;
pub mod classifier;
pub mod config;
pub mod control;
pub mod error;
pub mod pipeline;
pub mod session;
pub mod signal;
pub mod step_detection;
pub mod step_rate;
pub mod synthetic;
pub mod types;


// Re-export commonly used types
pub use classifier::{ActivityClassifier, ClassifierConfig};
pub use config::EngineConfig;
pub use control::{ControlCommand, ControlReply, StreamRecord};
pub use error::{EngineError, Result};
pub use pipeline::ActivityEngine;
pub use session::SharedEngine;
pub use step_detection::{StepDetector, StepDetectorConfig};
pub use types::{
    ActivityLabel, ClassificationResult, EngineOutput, EngineStatus, InertialSample, Mode,
    StepEvent,
};
