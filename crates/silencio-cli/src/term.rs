//! Terminal indicator: a single ANSI-colored block standing in for the
//! RGB pixel.

use std::io::Write;

use silencio_pipeline::{Error, Indicator};

/// Renders the indicator pixel as a truecolor block on stdout.
///
/// The pipeline stages dimmed (>>3) intensities; the terminal scales them
/// back up so the block is actually visible.
pub struct TerminalIndicator {
    staged: (u8, u8, u8),
}

impl TerminalIndicator {
    pub fn new() -> Self {
        Self { staged: (0, 0, 0) }
    }
}

impl Indicator for TerminalIndicator {
    fn set_color(&mut self, index: usize, r: u8, g: u8, b: u8) -> silencio_pipeline::Result<()> {
        if index == 0 {
            self.staged = (r, g, b);
        }
        Ok(())
    }

    fn refresh(&mut self) -> silencio_pipeline::Result<()> {
        let (r, g, b) = self.staged;
        let mut stdout = std::io::stdout().lock();
        write!(
            stdout,
            "\r\x1b[48;2;{};{};{}m  \x1b[0m snr indicator",
            r.saturating_mul(8),
            g.saturating_mul(8),
            b.saturating_mul(8),
        )
        .and_then(|()| stdout.flush())
        .map_err(|e| Error::Indicator(e.to_string()))
    }

    fn clear(&mut self) -> silencio_pipeline::Result<()> {
        self.staged = (0, 0, 0);
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout).map_err(|e| Error::Indicator(e.to_string()))
    }
}

impl Default for TerminalIndicator {
    fn default() -> Self {
        Self::new()
    }
}
