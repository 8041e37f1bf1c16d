//! Thread-safe session handle.
//!
//! Transport, dashboard and test-injection paths may run on different
//! threads. They share one [`ActivityEngine`] through a [`SharedEngine`],
//! which serializes every operation behind a single mutex. Each call takes
//! the lock exactly once, so a whole injection is atomic with respect to
//! concurrently arriving samples.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::control::{ControlCommand, ControlReply};
use crate::error::Result;
use crate::pipeline::ActivityEngine;
use crate::types::{EngineOutput, EngineStatus, InertialSample, Mode};

/// Cloneable, lock-serialized handle to one engine session.
#[derive(Debug, Clone, Default)]
pub struct SharedEngine {
    inner: Arc<Mutex<ActivityEngine>>,
}

impl SharedEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Self::from_engine(ActivityEngine::new(config)?))
    }

    pub fn from_engine(engine: ActivityEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn process(&self, sample: InertialSample) -> EngineOutput {
        self.inner.lock().process(sample)
    }

    pub fn set_mode(&self, mode: Mode) {
        self.inner.lock().set_mode(mode);
    }

    pub fn set_mode_name(&self, name: &str) -> Result<Mode> {
        self.inner.lock().set_mode_name(name)
    }

    pub fn mode(&self) -> Mode {
        self.inner.lock().mode()
    }

    pub fn reset_steps(&self) {
        self.inner.lock().reset_steps();
    }

    pub fn inject_steps(&self, num_steps: i64, interval_secs: f64) -> Result<Vec<EngineOutput>> {
        self.inner.lock().inject_steps(num_steps, interval_secs)
    }

    pub fn status(&self) -> EngineStatus {
        self.inner.lock().status()
    }

    /// Runs a control command under a single lock acquisition.
    pub fn apply(&self, command: &ControlCommand) -> ControlReply {
        command.apply(&mut self.inner.lock())
    }

    /// Runs `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut ActivityEngine) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityLabel;
    use std::thread;

    #[test]
    fn test_clones_share_state() {
        let a = SharedEngine::default();
        let b = a.clone();

        a.set_mode(Mode::Workout);
        assert_eq!(b.mode(), Mode::Workout);

        b.inject_steps(3, 0.5).unwrap();
        assert_eq!(a.status().step_count, 3);
    }

    #[test]
    fn test_concurrent_transport_and_injection() {
        let engine = SharedEngine::default();

        let transport = {
            let engine = engine.clone();
            thread::spawn(move || {
                for i in 0..500u64 {
                    engine.process(InertialSample::new(i * 20, [0, 0, 16_384], [0, 0, 0]));
                }
            })
        };
        let tooling = {
            let engine = engine.clone();
            thread::spawn(move || engine.inject_steps(5, 0.6).unwrap())
        };

        transport.join().unwrap();
        let outputs = tooling.join().unwrap();

        // The injection held the lock throughout, so its own outputs are contiguous.
        assert_eq!(outputs.len(), 10);
        assert_eq!(engine.status().samples_processed, 510);
    }

    #[test]
    fn test_with_engine() {
        let engine = SharedEngine::default();
        let output = engine.with_engine(|e| {
            e.process(InertialSample::new(0, [0, 0, 16_384], [0, 0, 0]));
            e.process(InertialSample::new(20, [0, 0, 16_384], [0, 0, 0]))
        });
        assert_eq!(output.activity, ActivityLabel::Sitting);
    }
}
