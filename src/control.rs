//! Control-surface commands.
//!
//! The dashboard and test tooling send JSON commands tagged by `command`:
//!
//! ```json
//! {"command": "set_mode", "mode": "workout"}
//! {"command": "reset_steps"}
//! {"command": "test_steps", "num_steps": 10, "interval": 0.6}
//! {"command": "status"}
//! ```
//!
//! Parameters arrive unvalidated (a mode is any string, a step count any
//! integer) and are checked by the engine, so a bad command is answered
//! with a rejection instead of failing to parse.

use serde::{Deserialize, Serialize};

use crate::pipeline::ActivityEngine;
use crate::types::{EngineStatus, InertialSample, Mode};

/// A command from the control surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    SetMode { mode: String },
    ResetSteps,
    TestSteps { num_steps: i64, interval: f64 },
    Status,
}

/// The answer to a [`ControlCommand`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum ControlReply {
    ModeSet {
        mode: Mode,
    },
    StepsReset,
    #[serde(rename_all = "camelCase")]
    StepsInjected {
        requested: i64,
        detected: usize,
        step_count: u64,
    },
    Status(EngineStatus),
    Rejected {
        error: String,
    },
}

impl ControlCommand {
    /// Executes the command. Failures become [`ControlReply::Rejected`]
    /// and leave the engine unchanged.
    pub fn apply(&self, engine: &mut ActivityEngine) -> ControlReply {
        match self {
            ControlCommand::SetMode { mode } => match engine.set_mode_name(mode) {
                Ok(mode) => ControlReply::ModeSet { mode },
                Err(err) => ControlReply::Rejected {
                    error: err.to_string(),
                },
            },
            ControlCommand::ResetSteps => {
                engine.reset_steps();
                ControlReply::StepsReset
            }
            ControlCommand::TestSteps {
                num_steps,
                interval,
            } => match engine.inject_steps(*num_steps, *interval) {
                Ok(outputs) => ControlReply::StepsInjected {
                    requested: *num_steps,
                    detected: outputs.iter().filter(|o| o.step_detected).count(),
                    step_count: engine.step_count(),
                },
                Err(err) => ControlReply::Rejected {
                    error: err.to_string(),
                },
            },
            ControlCommand::Status => ControlReply::Status(engine.status()),
        }
    }
}

/// One line of a replay stream: a command or a sample.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StreamRecord {
    Command(ControlCommand),
    Sample(InertialSample),
}
