//! SNR indicator: color ramp and blink modes.
//!
//! Steady state drives a single RGB pixel along a red→green ramp from the
//! smoothed SNR. Boot and fault states use blink modes instead; the
//! default mode at init is slow green.

use crate::Result;
use std::time::Duration;

use silencio_core::params::{SNR_MAX, SNR_MIN};

/// Single-pixel RGB indicator device.
pub trait Indicator: Send {
    /// Set the color of one pixel. Takes effect at the next `refresh`.
    fn set_color(&mut self, index: usize, r: u8, g: u8, b: u8) -> Result<()>;

    /// Push the staged colors to the device.
    fn refresh(&mut self) -> Result<()>;

    /// Turn every pixel off.
    fn clear(&mut self) -> Result<()>;
}

/// Map a smoothed SNR in dB to an RGB color.
///
/// Pure red at or below [`SNR_MIN`], pure green at or above [`SNR_MAX`],
/// a linear blend in between. The `>> 3` divides intensity by 8 to keep
/// the pixel from being blinding.
pub fn snr_color(snr_db: f32) -> (u8, u8, u8) {
    let ratio = ((snr_db - SNR_MIN) / (SNR_MAX - SNR_MIN)).clamp(0.0, 1.0);
    let r = (255.0 * (1.0 - ratio)) as u8 >> 3;
    let g = (255.0 * ratio) as u8 >> 3;
    (r, g, 0)
}

/// Blink modes for boot and fault states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkMode {
    /// Booting / healthy idle.
    SlowGreen,
    /// Degraded but operating.
    SlowYellow,
    /// Attention required.
    FastYellow,
    /// Fault.
    FastRed,
    /// Indicator disabled.
    Off,
}

impl BlinkMode {
    /// Color and half-period for one blink cycle, or `None` when off.
    pub fn pattern(self) -> Option<((u8, u8, u8), Duration)> {
        match self {
            Self::SlowGreen => Some(((0, 255, 0), Duration::from_millis(500))),
            Self::SlowYellow => Some(((255, 255, 0), Duration::from_millis(500))),
            Self::FastYellow => Some(((255, 255, 0), Duration::from_millis(200))),
            Self::FastRed => Some(((255, 0, 0), Duration::from_millis(200))),
            Self::Off => None,
        }
    }
}

/// Blink-mode state machine with previous-mode memory.
///
/// Remembers the mode active before the last change so a transient state
/// (e.g. a fault flash) can restore what was showing before.
#[derive(Debug)]
pub struct Blinker {
    current: BlinkMode,
    previous: BlinkMode,
}

impl Blinker {
    /// Start in the boot default, slow green.
    pub fn new() -> Self {
        Self {
            current: BlinkMode::SlowGreen,
            previous: BlinkMode::SlowGreen,
        }
    }

    /// Switch modes, remembering the one being replaced.
    pub fn set_mode(&mut self, mode: BlinkMode) {
        if self.current != mode {
            self.previous = self.current;
        }
        self.current = mode;
    }

    /// The active mode.
    pub fn mode(&self) -> BlinkMode {
        self.current
    }

    /// The mode that was active before the last change.
    pub fn previous(&self) -> BlinkMode {
        self.previous
    }

    /// Restore the mode active before the last change.
    pub fn restore_previous(&mut self) {
        self.current = self.previous;
    }

    /// Run one on/off cycle of the active mode on the device.
    ///
    /// Blocks for the full cycle duration. `Off` clears the pixel and
    /// idles for a second.
    pub fn blink_cycle<I: Indicator>(&self, strip: &mut I) -> Result<()> {
        match self.current.pattern() {
            Some(((r, g, b), half_period)) => {
                strip.set_color(0, r, g, b)?;
                strip.refresh()?;
                std::thread::sleep(half_period);
                strip.set_color(0, 0, 0, 0)?;
                strip.refresh()?;
                std::thread::sleep(half_period);
            }
            None => {
                strip.clear()?;
                std::thread::sleep(Duration::from_millis(1000));
            }
        }
        Ok(())
    }
}

impl Default for Blinker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_endpoints_and_midpoint() {
        // Low and negative SNR are full red (after the >>3 dimming).
        assert_eq!(snr_color(-5.0), (31, 0, 0));
        assert_eq!(snr_color(0.0), (31, 0, 0));
        // Midpoint blends.
        assert_eq!(snr_color(3.5), (15, 15, 0));
        // High SNR is full green, clamped beyond the ramp.
        assert_eq!(snr_color(7.0), (0, 31, 0));
        assert_eq!(snr_color(20.0), (0, 31, 0));
    }

    #[test]
    fn blue_channel_stays_dark() {
        for snr in [-10.0, 0.0, 3.0, 7.0, 50.0] {
            let (_, _, b) = snr_color(snr);
            assert_eq!(b, 0);
        }
    }

    #[test]
    fn default_mode_is_slow_green() {
        let blinker = Blinker::new();
        assert_eq!(blinker.mode(), BlinkMode::SlowGreen);
    }

    #[test]
    fn previous_mode_is_remembered() {
        let mut blinker = Blinker::new();
        blinker.set_mode(BlinkMode::FastRed);
        assert_eq!(blinker.previous(), BlinkMode::SlowGreen);
        blinker.restore_previous();
        assert_eq!(blinker.mode(), BlinkMode::SlowGreen);
    }

    #[test]
    fn same_mode_does_not_clobber_previous() {
        let mut blinker = Blinker::new();
        blinker.set_mode(BlinkMode::SlowYellow);
        blinker.set_mode(BlinkMode::SlowYellow);
        assert_eq!(blinker.previous(), BlinkMode::SlowGreen);
    }

    #[test]
    fn fast_modes_are_faster() {
        let (_, slow) = BlinkMode::SlowGreen.pattern().unwrap();
        let (_, fast) = BlinkMode::FastRed.pattern().unwrap();
        assert!(fast < slow);
        assert!(BlinkMode::Off.pattern().is_none());
    }
}
