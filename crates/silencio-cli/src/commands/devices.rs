//! Audio device listing command.

use clap::Args;
use silencio_pipeline::{default_device, list_devices};

#[derive(Args)]
pub struct DevicesArgs {}

pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let devices = list_devices()?;

    if devices.is_empty() {
        println!("No audio devices found.");
        return Ok(());
    }

    let inputs: Vec<_> = devices.iter().filter(|d| d.is_input).collect();
    if !inputs.is_empty() {
        println!("Input devices:");
        for device in &inputs {
            let also = if device.is_output { " (also output)" } else { "" };
            println!(
                "  {} ({} Hz){}",
                device.name, device.default_sample_rate, also
            );
        }
        println!();
    }

    let outputs: Vec<_> = devices.iter().filter(|d| d.is_output).collect();
    if !outputs.is_empty() {
        println!("Output devices:");
        for device in &outputs {
            let also = if device.is_input { " (also input)" } else { "" };
            println!(
                "  {} ({} Hz){}",
                device.name, device.default_sample_rate, also
            );
        }
        println!();
    }

    let (default_in, default_out) = default_device()?;
    if let Some(d) = default_in {
        println!("Default input:  {}", d.name);
    }
    if let Some(d) = default_out {
        println!("Default output: {}", d.name);
    }

    Ok(())
}
