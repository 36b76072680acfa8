//! Build-time tuning constants for the silencio pipeline.
//!
//! Every knob in the system lives here. The values are compile-time
//! constants: the pipeline has no runtime configuration surface, and the
//! DSP types take their tunables at construction so tests can drive them
//! with other values.
//!
//! Changing a constant here retunes the whole pipeline at the next build.

/// Audio sample rate in Hz.
pub const SAMPLE_RATE: u32 = 48_000;

/// Samples per channel per frame. One frame is `2 * BLOCK_SIZE` interleaved
/// stereo samples.
pub const BLOCK_SIZE: usize = 1024;

/// Number of adaptive filter taps. Equals the impulse-response length the
/// filter can model; longer filters track longer acoustic paths but
/// converge more slowly and cost more per sample.
pub const FILTER_LENGTH: usize = 64;

/// NLMS step size μ. The normalized update keeps the stable range at
/// 0 < μ < 2 independent of signal power; 0.1 trades convergence speed for
/// a low steady-state misadjustment.
pub const MU: f32 = 0.1;

/// Regularization added to every division by a signal energy or RMS.
pub const EPSILON: f32 = 1e-6;

/// Scale factor taking a 24-bit sample (after the `>> 8` shift out of its
/// 32-bit container) to approximately ±1.0.
pub const NORMALIZE_FACTOR: f32 = 1.0 / 8_388_608.0;

/// AGC level target: the smoothed gain pulls the denoised RMS toward this.
pub const COEFF_GAIN: f32 = 0.3;

/// Hard ceiling on the smoothed AGC gain.
pub const GAIN_MAX: f32 = 50.0;

/// EMA coefficient for AGC gain smoothing (closer to 1.0 = slower).
pub const ALPHA_GAIN: f32 = 0.99;

/// EMA coefficient for SNR smoothing.
pub const ALPHA_SNR: f32 = 0.9;

/// Publish every Nth smoothed SNR value to the indicator.
pub const SNR_DECIMATION: u32 = 10;

/// Indicator color ramp lower bound in dB (full red at or below).
pub const SNR_MIN: f32 = 0.0;

/// Indicator color ramp upper bound in dB (full green at or above).
pub const SNR_MAX: f32 = 7.0;

/// Fraction of full scale used when converting back to fixed point,
/// leaving ~3 dB of headroom below the 32-bit limit.
pub const PEAK_HEADROOM: f32 = 0.7;

/// Recompute the NLMS running norm from the history every this many frames
/// to bound incremental floating-point drift.
pub const NORM_RESYNC_FRAMES: u32 = 64;
