//! Real-time pipeline runtime for silencio.
//!
//! This crate wires the DSP primitives from `silencio-core` into a
//! three-stage streaming pipeline plus an indicator sidecar:
//!
//! ```text
//! Acquisition ──Q1──► Processing ──Q2──► Output
//!                          │
//!                          └───Q3───► Indicator
//! ```
//!
//! Frames travel as owned [`FrameBuffer`] values through bounded FIFO
//! queues; a free-buffer queue from the output task back to acquisition
//! closes the loop, so exactly two buffers circulate and a stalled
//! consumer back-pressures all the way to the input bus. See
//! [`Pipeline`] for the wiring and [`ProcessingStage`] for the per-frame
//! math.
//!
//! Device access goes through the [`PcmSource`] / [`PcmSink`] traits; the
//! [`cpal_bus`] module adapts the host's audio devices, and
//! [`ToneGenerator`] provides a synthetic source for bring-up.

pub mod buffer;
pub mod bus;
pub mod cpal_bus;
pub mod indicator;
pub mod pipeline;
pub mod tone;

pub use buffer::{FrameBuffer, FramePool};
pub use bus::{PcmSink, PcmSource};
pub use cpal_bus::{AudioDevice, CpalSink, CpalSource, default_device, list_devices};
pub use indicator::{BlinkMode, Blinker, Indicator, snr_color};
pub use pipeline::{Pipeline, PipelineConfig, PipelineHandles, ProcessingStage};
pub use tone::ToneGenerator;

/// Error types for pipeline and device operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Audio stream setup or runtime error.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("no audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// A bus transfer failed mid-stream.
    #[error("bus transfer failed: {0}")]
    Bus(String),

    /// A pipeline queue disconnected (peer task exited).
    #[error("pipeline channel closed")]
    ChannelClosed,

    /// The indicator device rejected a command.
    #[error("indicator error: {0}")]
    Indicator(String),
}

/// Convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
