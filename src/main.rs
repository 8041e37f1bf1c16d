//! FitSense replay tool.
//!
//! Replays a JSON-lines stream of inertial samples and control commands
//! through one engine session and writes one JSON result per line to
//! stdout. Logs go to stderr.
//!
//! ```text
//! fitsense-replay --input session.jsonl --config device.toml
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use fitsense::{ActivityEngine, EngineConfig, Mode, StreamRecord};

/// Arguments for the `fitsense-replay` binary.
#[derive(Parser, Debug)]
#[command(
    name = "fitsense-replay",
    version,
    about = "Replay IMU samples and control commands through the activity engine",
    long_about = None,
)]
struct Args {
    /// JSON-lines input file. Reads stdin when omitted.
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Calibration file (.toml or .json).
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Initial mode: normal or workout.
    #[arg(long, default_value = "normal")]
    mode: String,

    /// Log level: trace, debug, info, warn, error.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(
            args.log_level
                .parse::<tracing_subscriber::filter::LevelFilter>()
                .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading calibration from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let mut engine = ActivityEngine::new(config)?;
    engine.set_mode(args.mode.parse::<Mode>()?);

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let mut out = BufWriter::new(io::stdout().lock());

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<StreamRecord>(line) {
            Ok(StreamRecord::Sample(sample)) => {
                let output = engine.process(sample);
                serde_json::to_writer(&mut out, &output)?;
            }
            Ok(StreamRecord::Command(command)) => {
                let reply = command.apply(&mut engine);
                serde_json::to_writer(&mut out, &reply)?;
            }
            Err(err) => {
                warn!(line = index + 1, error = %err, "skipping unparseable record");
                continue;
            }
        }
        out.write_all(b"\n")?;
    }
    out.flush()?;

    info!(
        samples = engine.samples_processed(),
        steps = engine.step_count(),
        mode = %engine.mode(),
        "replay complete"
    );
    Ok(())
}
