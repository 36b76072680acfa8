//! Smoothed noise-reduction estimate.
//!
//! Reports `20·log10(rms_noisy / rms_denoised)` with exponential smoothing.
//! This is an attenuation figure rather than a true SNR: it measures how
//! much the adaptive filter removed from the primary channel, which tracks
//! the real improvement when the desired signal is small next to the noise.

use libm::log10f;

/// Exponentially smoothed noisy-vs-denoised level ratio in dB.
///
/// Both the numerator and denominator are regularized, so silence on both
/// inputs reads as exactly 0 dB instead of diverging.
#[derive(Debug, Clone)]
pub struct SnrEstimator {
    alpha: f32,
    regularization: f32,
    smoothed: f32,
}

impl SnrEstimator {
    /// Create a new estimator.
    ///
    /// # Arguments
    ///
    /// * `alpha` — EMA coefficient in (0, 1); closer to 1.0 is slower
    /// * `regularization` — added to both RMS values before the ratio
    pub fn new(alpha: f32, regularization: f32) -> Self {
        Self {
            alpha,
            regularization,
            smoothed: 0.0,
        }
    }

    /// Fold one block's levels into the smoothed estimate.
    ///
    /// Returns the updated smoothed value in dB.
    pub fn update(&mut self, rms_noisy: f32, rms_denoised: f32) -> f32 {
        let ratio = (rms_noisy + self.regularization) / (rms_denoised + self.regularization);
        let snr_db = 20.0 * log10f(ratio);
        self.smoothed = self.alpha * self.smoothed + (1.0 - self.alpha) * snr_db;
        self.smoothed
    }

    /// Current smoothed estimate in dB.
    pub fn snr_db(&self) -> f32 {
        self.smoothed
    }

    /// Reset the smoothed estimate to 0 dB.
    pub fn reset(&mut self) {
        self.smoothed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_reads_zero() {
        let mut snr = SnrEstimator::new(0.9, 1e-6);
        for _ in 0..100 {
            assert_eq!(snr.update(0.0, 0.0), 0.0);
        }
    }

    #[test]
    fn strong_cancellation_reads_positive() {
        let mut snr = SnrEstimator::new(0.9, 1e-6);
        // 10x attenuation = 20 dB
        let mut last = 0.0;
        for _ in 0..200 {
            last = snr.update(0.5, 0.05);
        }
        assert!((last - 20.0).abs() < 0.5, "expected ~20 dB, got {last}");
    }

    #[test]
    fn smoothing_lags_instantaneous_value() {
        let mut snr = SnrEstimator::new(0.9, 1e-6);
        let first = snr.update(0.5, 0.05);
        // One step covers 10% of the distance from 0 toward 20 dB.
        assert!((first - 2.0).abs() < 0.1, "first step = {first}");
    }

    #[test]
    fn no_cancellation_reads_zero() {
        let mut snr = SnrEstimator::new(0.5, 1e-6);
        let mut last = 1.0;
        for _ in 0..100 {
            last = snr.update(0.3, 0.3);
        }
        assert!(last.abs() < 1e-3, "equal levels should read 0 dB, got {last}");
    }
}
