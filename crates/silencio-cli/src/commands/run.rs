//! Live pipeline command.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Args;
use silencio_core::params;
use silencio_pipeline::{
    Blinker, CpalSink, CpalSource, Pipeline, PipelineConfig, ToneGenerator, default_device,
};

use crate::term::TerminalIndicator;

#[derive(Args)]
pub struct RunArgs {
    /// Input device name (default: system default)
    #[arg(short, long)]
    input: Option<String>,

    /// Output device name (default: system default)
    #[arg(short, long)]
    output: Option<String>,

    /// Replace the microphones with a synthetic test tone
    #[arg(long)]
    tone: bool,

    /// Test tone frequency in Hz
    #[arg(long, default_value = "1000")]
    tone_frequency: u32,

    /// Test tone amplitude (0..1)
    #[arg(long, default_value = "0.05")]
    tone_amplitude: f32,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = PipelineConfig::default();

    let (default_in, default_out) = default_device()?;
    let input_name = match (&args.input, args.tone) {
        (_, true) => format!("{} Hz test tone", args.tone_frequency),
        (Some(name), _) => name.clone(),
        (None, _) => default_in
            .map(|d| d.name)
            .unwrap_or_else(|| "none".to_string()),
    };
    let output_name = args.output.clone().unwrap_or_else(|| {
        default_out
            .map(|d| d.name)
            .unwrap_or_else(|| "none".to_string())
    });

    println!("Adaptive noise cancellation");
    println!("  Input:  {input_name}");
    println!("  Output: {output_name}");
    println!("  Sample rate:   {} Hz", params::SAMPLE_RATE);
    println!("  Block size:    {} samples", config.block_size);
    println!("  Filter length: {} taps", config.filter_taps);
    println!("\nPress Ctrl+C to stop...\n");

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    // The cpal stream guards stay on this thread while the adapters move
    // into the tasks; dropping them is what shuts the buses down later.
    let mut guards = Vec::new();

    let (sink, guard) = CpalSink::open(args.output.as_deref())?;
    guards.push(guard);

    let pipeline = Pipeline::new(config)?;

    // Boot pattern: one slow-green cycle before the SNR ramp takes over.
    let mut indicator = TerminalIndicator::new();
    let blinker = Blinker::new();
    blinker.blink_cycle(&mut indicator)?;

    let handles = if args.tone {
        let source = ToneGenerator::new(params::SAMPLE_RATE, args.tone_frequency, args.tone_amplitude);
        pipeline.spawn(source, sink, indicator)?
    } else {
        let (source, guard) = CpalSource::open(args.input.as_deref())?;
        guards.push(guard);
        pipeline.spawn(source, sink, indicator)?
    };

    // Park here while the tasks run the audio path.
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    // Dropping the stream guards closes the devices; the buses report
    // closure and the tasks drain out in pipeline order.
    drop(guards);
    handles.join();

    println!("Done!");
    Ok(())
}
