//! CLI subcommand implementations.

pub mod devices;
pub mod run;
pub mod simulate;
