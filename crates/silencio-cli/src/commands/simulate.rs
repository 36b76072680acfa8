//! Offline scenario driver.
//!
//! Runs the processing stage frame by frame over synthesized input and
//! prints the convergence trajectory: the acceptance scenarios, operable
//! by hand without audio hardware.

use clap::{Args, ValueEnum};
use silencio_core::{params, rms};
use silencio_pipeline::{FrameBuffer, PipelineConfig, ProcessingStage};

#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario to run
    #[arg(short, long, value_enum, default_value_t = Scenario::Noise)]
    scenario: Scenario,

    /// Simulated duration in seconds
    #[arg(long, default_value = "5.0")]
    seconds: f32,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Scenario {
    /// Both channels silent: output must stay zero
    Silence,
    /// Reference noise, primary = 0.5x the same noise
    Noise,
    /// 440 Hz tone plus correlated noise on the primary
    Tone,
    /// Near-silent primary: AGC rides its ceiling
    Quiet,
}

/// Simple reproducible PRNG (Park–Miller style).
fn next_rand(state: &mut u32) -> f32 {
    *state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
    (*state as i32 as f32) / (i32::MAX as f32)
}

fn encode_frame(left: &[f32], right: &[f32], frame: &mut FrameBuffer) {
    let samples = frame.samples_mut();
    for i in 0..left.len() {
        samples[2 * i] = ((left[i] * 8_388_608.0) as i32) << 8;
        samples[2 * i + 1] = ((right[i] * 8_388_608.0) as i32) << 8;
    }
}

pub fn run(args: SimulateArgs) -> anyhow::Result<()> {
    let config = PipelineConfig::default();
    let block = config.block_size;
    let frames = ((args.seconds * params::SAMPLE_RATE as f32) / block as f32).ceil() as usize;
    let frames_per_second = params::SAMPLE_RATE as usize / block;

    println!("Scenario: {:?}", args.scenario);
    println!(
        "  {} frames of {} samples ({:.1} s at {} Hz)\n",
        frames,
        block,
        args.seconds,
        params::SAMPLE_RATE
    );

    let mut stage = ProcessingStage::new(&config);
    let mut frame = FrameBuffer::new(block);
    let mut left = vec![0.0f32; block];
    let mut right = vec![0.0f32; block];
    let mut state = 0x5117u32;
    let mut sample_index = 0usize;

    let mut primary_rms_sum = 0.0f64;
    let mut residual_rms_sum = 0.0f64;

    for n in 0..frames {
        for i in 0..block {
            let (l, r) = match args.scenario {
                Scenario::Silence => (0.0, 0.0),
                Scenario::Noise => {
                    let noise = 0.3 * next_rand(&mut state);
                    (noise, 0.5 * noise)
                }
                Scenario::Tone => {
                    let noise = 0.3 * next_rand(&mut state);
                    let phase = core::f32::consts::TAU * 440.0 * sample_index as f32
                        / params::SAMPLE_RATE as f32;
                    let tone = 0.2 * phase.sin();
                    (noise, tone + noise)
                }
                Scenario::Quiet => (0.0, 1e-5),
            };
            left[i] = l;
            right[i] = r;
            sample_index += 1;
        }
        encode_frame(&left, &right, &mut frame);
        primary_rms_sum += f64::from(rms(&right));

        stage.process_frame(&mut frame);

        // Residual level before packing is not observable from outside;
        // recover it from the emitted frame instead.
        let emitted: Vec<f32> = frame
            .samples()
            .chunks_exact(2)
            .map(|pair| pair[0] as f32 / (params::PEAK_HEADROOM * 2_147_483_648.0))
            .collect();
        residual_rms_sum += f64::from(rms(&emitted));

        if (n + 1) % frames_per_second == 0 {
            println!(
                "  t={:>2}s  snr={:>6.2} dB  gain={:>7.3}",
                (n + 1) / frames_per_second,
                stage.snr_db(),
                stage.gain(),
            );
        }
    }

    let primary_rms = primary_rms_sum / frames as f64;
    let residual_rms = residual_rms_sum / frames as f64;
    println!("\nSummary");
    println!("  mean primary RMS:  {primary_rms:.6}");
    println!("  mean emitted RMS:  {residual_rms:.6}");
    println!("  smoothed SNR:      {:.2} dB", stage.snr_db());
    println!("  smoothed gain:     {:.3}", stage.gain());
    let weights = stage.engine().weights();
    let leading: Vec<String> = weights.iter().take(4).map(|w| format!("{w:+.4}")).collect();
    println!("  leading taps:      [{}]", leading.join(", "));

    Ok(())
}
