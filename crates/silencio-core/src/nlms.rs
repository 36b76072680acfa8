//! Streaming NLMS adaptive filter with incremental energy tracking.
//!
//! The engine estimates the acoustic path from a reference input (noise
//! only) to a primary input (signal plus noise) and returns the residual
//! after subtracting the estimate. Minimizing the residual energy makes it
//! converge on the noise component, so the residual approaches the clean
//! signal.
//!
//! # Algorithm
//!
//! Per sample, with `x` the reference and `d` the primary:
//!
//! ```text
//! norm  += x² − x_out²                (x_out = oldest history sample)
//! y      = Σ w[k] · x[n−k]            (filter output)
//! e      = d − y                      (residual / denoised sample)
//! w[k]  += (μ / (norm + δ)) · e · x[n−k]
//! ```
//!
//! Stability is guaranteed for `0 < μ < 2` independent of signal power; the
//! regularization term `δ` prevents division by zero on silent input.
//!
//! Unlike the textbook formulation that recomputes `x^T x` with an O(M)
//! pass every sample, `norm` is carried incrementally: subtract the square
//! of the sample leaving the history, add the square of the one entering.
//! Floating-point rounding makes the running value drift over hours of
//! audio, so [`NlmsEngine::resync_norm`] recomputes it from the history;
//! callers run it on a coarse frame cadence where the O(M) cost is noise.
//!
//! # Update ordering
//!
//! Convergence depends on the exact sequencing inside
//! [`process_sample`](NlmsEngine::process_sample): update `norm`, write the
//! new sample into the history, compute `y`, then update the weights. Both
//! the output sum and the weight update index the history as
//! `(pos + M − k) % M`, so tap `k = 0` always multiplies the sample written
//! this step. Reordering any of these changes what the filter converges to.
//!
//! # References
//!
//! - Haykin, "Adaptive Filter Theory" (5th ed.), chapter 6 (NLMS).
//! - Widrow & Stearns, "Adaptive Signal Processing" (1985), chapter 6.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Normalized LMS adaptive filter with a running input-energy norm.
///
/// ## Parameters
/// - `taps`: filter length M (the impulse-response length it can model)
/// - `step_size`: μ, in (0.0, 2.0) for guaranteed stability
/// - `regularization`: δ added to the energy denominator (default 1e-6)
///
/// Weights are deliberately never clamped; the normalized step size bounds
/// their growth.
#[derive(Debug, Clone)]
pub struct NlmsEngine {
    weights: Vec<f32>,
    history: Vec<f32>,
    pos: usize,
    norm: f32,
    step_size: f32,
    regularization: f32,
    taps: usize,
}

impl NlmsEngine {
    /// Create a new engine with default regularization (δ = 1e-6).
    ///
    /// Weights and history are initialized to zero, so the first output of
    /// a silent-history filter is exactly the primary input.
    pub fn new(taps: usize, step_size: f32) -> Self {
        Self::with_regularization(taps, step_size, 1e-6)
    }

    /// Create a new engine with explicit regularization.
    ///
    /// # Arguments
    ///
    /// * `taps` — number of filter taps
    /// * `step_size` — μ in range (0.0, 2.0)
    /// * `regularization` — δ preventing divide-by-zero on silent input.
    ///   Typical: 1e-8 (tight) to 1e-4 (more stable with low-power input).
    pub fn with_regularization(taps: usize, step_size: f32, regularization: f32) -> Self {
        assert!(taps > 0, "filter must have at least one tap");
        Self {
            weights: vec![0.0; taps],
            history: vec![0.0; taps],
            pos: 0,
            norm: 0.0,
            step_size,
            regularization,
            taps,
        }
    }

    /// Process a single sample pair.
    ///
    /// # Arguments
    ///
    /// * `reference` — reference-channel sample x\[n\] (noise only)
    /// * `primary` — primary-channel sample d\[n\] (signal + noise)
    ///
    /// # Returns
    ///
    /// The residual e\[n\] = d\[n\] − y\[n\]: the denoised sample.
    #[inline]
    pub fn process_sample(&mut self, reference: f32, primary: f32) -> f32 {
        // Incremental norm: the sample at `pos` is about to be overwritten,
        // its energy leaves the window before the new sample's enters.
        let leaving = self.history[self.pos];
        self.norm -= leaving * leaving;
        self.norm += reference * reference;

        self.history[self.pos] = reference;

        // Filter output: y[n] = w^T x[n], tap 0 is the newest sample.
        let mut estimate = 0.0f32;
        for k in 0..self.taps {
            let idx = (self.pos + self.taps - k) % self.taps;
            estimate += self.weights[k] * self.history[idx];
        }

        let residual = primary - estimate;

        // Normalized update: w[k] += (μ / (norm + δ)) · e · x[n−k]
        let scale = residual * self.step_size / (self.norm + self.regularization);
        for k in 0..self.taps {
            let idx = (self.pos + self.taps - k) % self.taps;
            self.weights[k] += scale * self.history[idx];
        }

        self.pos = (self.pos + 1) % self.taps;

        residual
    }

    /// Process a block of sample pairs, writing residuals into `denoised`.
    ///
    /// Equivalent to calling [`process_sample`](Self::process_sample) for
    /// each index in order. All slices must have the same length.
    pub fn process_block(&mut self, reference: &[f32], primary: &[f32], denoised: &mut [f32]) {
        debug_assert_eq!(reference.len(), primary.len());
        debug_assert_eq!(reference.len(), denoised.len());
        for i in 0..reference.len() {
            denoised[i] = self.process_sample(reference[i], primary[i]);
        }
    }

    /// Recompute the running norm from the history buffer.
    ///
    /// Bounds incremental floating-point drift; run on a coarse cadence
    /// (e.g. every [`params::NORM_RESYNC_FRAMES`](crate::params::NORM_RESYNC_FRAMES)
    /// frames).
    pub fn resync_norm(&mut self) {
        self.norm = self.history.iter().map(|&x| x * x).sum();
    }

    /// Current running input-energy norm.
    pub fn norm(&self) -> f32 {
        self.norm
    }

    /// Number of filter taps.
    pub fn taps(&self) -> usize {
        self.taps
    }

    /// Current filter weight vector.
    ///
    /// Tap `k = 0` multiplies the most recent reference sample.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Reset to the initial state.
    ///
    /// Zeroes weights, history and the norm. Step size and regularization
    /// are preserved.
    pub fn reset(&mut self) {
        self.weights.fill(0.0);
        self.history.fill(0.0);
        self.pos = 0;
        self.norm = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Simple reproducible PRNG (Park–Miller style) for test determinism.
    fn next_rand(state: &mut u32) -> f32 {
        *state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        // Map to [-1, 1]
        (*state as i32 as f32) / (i32::MAX as f32)
    }

    /// Apply a fixed 3-tap FIR [0.5, -0.3, 0.1] to a signal.
    fn apply_fir(signal: &[f32]) -> Vec<f32> {
        let taps = [0.5f32, -0.3, 0.1];
        let mut out = vec![0.0f32; signal.len()];
        for n in 0..signal.len() {
            let mut y = 0.0;
            for (k, &tap) in taps.iter().enumerate() {
                if n >= k {
                    y += tap * signal[n - k];
                }
            }
            out[n] = y;
        }
        out
    }

    #[test]
    fn converges_to_known_filter() {
        let target_taps = [0.5f32, -0.3, 0.1];
        let n_samples = 2000;

        let mut noise = vec![0.0f32; n_samples];
        let mut st = 7u32;
        for s in &mut noise {
            *s = next_rand(&mut st);
        }
        let primary = apply_fir(&noise);

        let mut engine = NlmsEngine::new(3, 0.5);
        let mut out = vec![0.0f32; n_samples];
        engine.process_block(&noise, &primary, &mut out);

        for (k, &tap) in target_taps.iter().enumerate() {
            let w = engine.weights()[k];
            assert!(
                (w - tap).abs() < 0.05,
                "weight[{k}] = {w:.4}, expected {tap:.4} after {n_samples} samples"
            );
        }
    }

    #[test]
    fn identical_channels_converge_to_unit_tap() {
        // left == right: the path is an identity, so w[0] -> 1 and the
        // residual energy collapses.
        let mut engine = NlmsEngine::new(8, 0.5);
        let mut st = 42u32;
        let mut late_residual = 0.0f32;
        for i in 0..8000 {
            let x = 0.3 * next_rand(&mut st);
            let e = engine.process_sample(x, x);
            if i >= 7000 {
                late_residual += e * e;
            }
        }
        assert!(
            (engine.weights()[0] - 1.0).abs() < 0.05,
            "w[0] should approach 1, got {}",
            engine.weights()[0]
        );
        for (k, &w) in engine.weights().iter().enumerate().skip(1) {
            assert!(w.abs() < 0.05, "w[{k}] should approach 0, got {w}");
        }
        assert!(
            late_residual / 1000.0 < 1e-4,
            "residual energy should collapse, got {late_residual}"
        );
    }

    #[test]
    fn zero_input_keeps_weights_zero() {
        let mut engine = NlmsEngine::new(16, 0.5);
        for _ in 0..1000 {
            let e = engine.process_sample(0.0, 0.0);
            assert_eq!(e, 0.0);
        }
        assert!(engine.weights().iter().all(|&w| w == 0.0));
        assert_eq!(engine.norm(), 0.0);
    }

    #[test]
    fn zero_reference_never_adapts() {
        // With no reference energy the update scale multiplies a zero
        // history, so the primary passes through untouched.
        let mut engine = NlmsEngine::new(8, 0.5);
        let mut st = 9u32;
        for _ in 0..500 {
            let d = next_rand(&mut st);
            let e = engine.process_sample(0.0, d);
            assert_eq!(e, d);
        }
        assert!(engine.weights().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn silent_input_stays_finite() {
        let mut engine = NlmsEngine::with_regularization(8, 0.5, 1e-6);
        for _ in 0..100 {
            let e = engine.process_sample(0.0, 0.5);
            assert!(e.is_finite());
        }
        for (k, &w) in engine.weights().iter().enumerate() {
            assert!(w.is_finite(), "weight[{k}] is not finite: {w}");
        }
    }

    #[test]
    fn incremental_norm_tracks_history_energy() {
        let mut engine = NlmsEngine::new(32, 0.1);
        let mut st = 1234u32;
        for _ in 0..5000 {
            let x = next_rand(&mut st);
            let d = next_rand(&mut st);
            engine.process_sample(x, d);
        }
        let direct: f32 = engine.history.iter().map(|&x| x * x).sum();
        let drift = (engine.norm() - direct).abs();
        assert!(
            drift < 1e-3 * direct.max(1e-6),
            "norm drifted {drift} from direct value {direct}"
        );
    }

    #[test]
    fn resync_norm_matches_direct_sum() {
        let mut engine = NlmsEngine::new(16, 0.1);
        let mut st = 55u32;
        for _ in 0..300 {
            let x = next_rand(&mut st);
            engine.process_sample(x, 0.5 * x);
        }
        engine.resync_norm();
        let direct: f32 = engine.history.iter().map(|&x| x * x).sum();
        assert_eq!(engine.norm(), direct);
    }

    #[test]
    fn reset_clears_state() {
        let mut engine = NlmsEngine::new(4, 0.5);
        let mut st = 3u32;
        for _ in 0..200 {
            let x = next_rand(&mut st);
            engine.process_sample(x, x * 0.5);
        }
        engine.reset();
        assert!(engine.weights().iter().all(|&w| w == 0.0));
        assert_eq!(engine.norm(), 0.0);
        let e = engine.process_sample(0.0, 0.0);
        assert_eq!(e, 0.0);
    }
}
