/// Basic usage example: feed IMU samples, read activity and steps
use fitsense::{ActivityEngine, EngineOutput, InertialSample, Mode};

fn main() {
    println!("=== FitSense Activity Engine: Basic Example ===\n");

    let mut engine = ActivityEngine::default();

    // Simulated stream at 50Hz: resting, then walking at two steps per second.
    let mut samples = Vec::new();
    for i in 0..100u64 {
        samples.push(InertialSample::new(i * 20, [950, 120, 17_500], [-15, 29, -3]));
    }
    for i in 100..400u64 {
        let az = if (i % 25) < 5 { 22_000 } else { 16_400 };
        samples.push(InertialSample::new(i * 20, [400, -300, az], [900, 1_400, 250]));
    }

    println!("Processing {} samples...\n", samples.len());

    for (i, sample) in samples.iter().enumerate() {
        let output = engine.process(*sample);
        if output.step_detected || i % 50 == 0 {
            print_output(sample.timestamp_ms, &output);
        }
    }

    engine.set_mode(Mode::Workout);
    let output = engine.process(InertialSample::new(8_000, [950, 120, 17_500], [0, 0, 0]));
    println!("\nAfter switching to workout mode:");
    print_output(8_000, &output);

    println!("\n=== Summary ===");
    println!("Total steps: {}", engine.step_count());
    println!("Samples processed: {}", engine.samples_processed());
}

fn print_output(t: u64, output: &EngineOutput) {
    println!(
        "t={:>5}ms activity={:<8} confidence={:.2} steps={:>3} rate={:>5.1}/min{}",
        t,
        output.activity,
        output.activity_confidence,
        output.step_count,
        output.step_rate,
        if output.step_detected { "  <- step" } else { "" }
    );
}
