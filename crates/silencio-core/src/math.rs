//! Level measurement helpers.
//!
//! Allocation-free, `no_std`-compatible math used across the pipeline.

use libm::{log10f, sqrtf};

/// Root-mean-square level of a block.
///
/// Returns 0.0 for an empty block.
///
/// # Example
/// ```rust
/// use silencio_core::rms;
///
/// let block = [0.5f32, -0.5, 0.5, -0.5];
/// assert!((rms(&block) - 0.5).abs() < 1e-6);
/// ```
#[inline]
pub fn rms(block: &[f32]) -> f32 {
    if block.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = block.iter().map(|&s| s * s).sum();
    sqrtf(sum_sq / block.len() as f32)
}

/// Convert a linear amplitude ratio to decibels.
///
/// The input is floored at 1e-10 so silence maps to a large negative number
/// instead of −∞.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    20.0 * log10f(linear.max(1e-10))
}
