//! Silencio Core - DSP primitives for adaptive noise cancellation
//!
//! This crate provides the signal-processing half of the silencio pipeline:
//! everything that touches samples, and nothing that touches threads or
//! devices. All processing is allocation-free after construction and safe to
//! run inside a real-time audio path.
//!
//! # Core Abstractions
//!
//! ## Adaptive Filtering
//!
//! - [`NlmsEngine`] - Normalized LMS adaptive filter with an incrementally
//!   maintained input-energy norm, sized for streaming one stereo block at
//!   a time
//!
//! ## Level Tracking & Gain
//!
//! - [`AutoGain`] - Inverse-RMS automatic gain with exponential smoothing
//!   and a hard ceiling
//! - [`SnrEstimator`] - Smoothed noisy-vs-denoised level ratio in dB
//!
//! ## Sample Conversion
//!
//! - [`unpack_frame`] / [`pack_frame`] - 24-bit-in-32 PCM to normalized
//!   `f32` and back, with headroom scaling and channel duplication
//!
//! ## Utilities
//!
//! - [`rms`], [`linear_to_db`] - level measurement helpers
//! - [`params`] - build-time tuning constants for the whole pipeline
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded targets. Disable the
//! default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! silencio-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use silencio_core::{NlmsEngine, params};
//!
//! let mut engine = NlmsEngine::new(params::FILTER_LENGTH, params::MU);
//!
//! // reference carries noise only, primary carries signal + noise
//! let denoised = engine.process_sample(0.1, 0.25);
//! assert!(denoised.is_finite());
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: no allocations after construction
//! - **No dependency on std**: pure `no_std` with `libm` for math
//! - **Single-precision**: all intermediate arithmetic is `f32`

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod agc;
pub mod frame;
pub mod math;
pub mod nlms;
pub mod params;
pub mod snr;

// Re-export main types at crate root
pub use agc::AutoGain;
pub use frame::{pack_frame, unpack_frame};
pub use math::{linear_to_db, rms};
pub use nlms::NlmsEngine;
pub use snr::SnrEstimator;
