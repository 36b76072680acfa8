//! Silencio CLI - drive the adaptive noise-cancellation pipeline.

mod commands;
mod term;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "silencio")]
#[command(author, version, about = "Two-channel adaptive noise cancellation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live pipeline on audio devices
    Run(commands::run::RunArgs),

    /// Run a canned scenario offline and report convergence
    Simulate(commands::simulate::SimulateArgs),

    /// List available audio devices
    Devices(commands::devices::DevicesArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Devices(args) => commands::devices::run(args),
    }
}
