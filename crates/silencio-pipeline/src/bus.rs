//! Stereo PCM bus interfaces.
//!
//! The pipeline talks to the outside world through these two traits. A
//! source fills a frame with interleaved stereo samples (reference
//! microphone on the left slots, primary on the right) and a sink drains
//! a processed frame. Both calls block until the full frame has moved,
//! which is what gives the pipeline its natural back-pressure: a stalled
//! sink eventually stalls the source through the buffer loop.
//!
//! Errors are values. A transient mid-stream failure is reported to the
//! caller, who logs it and retries with the same buffer; it never tears
//! the pipeline down. The one terminal error is
//! [`Error::ChannelClosed`](crate::Error::ChannelClosed): a bus reporting
//! it is gone for good, and the owning task exits so the pipeline can
//! drain and join.

use crate::Result;
use crate::buffer::FrameBuffer;

/// Blocking stereo PCM frame source.
pub trait PcmSource: Send {
    /// Fill the frame with the next `block_size` stereo sample pairs.
    ///
    /// Blocks until the full frame is available. On error the frame's
    /// contents are unspecified and the caller should retry with the same
    /// buffer.
    fn read_frame(&mut self, frame: &mut FrameBuffer) -> Result<()>;
}

/// Blocking stereo PCM frame sink.
pub trait PcmSink: Send {
    /// Write the full frame to the output bus.
    ///
    /// Blocks until the device has accepted all `2 * block_size` samples.
    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<()>;
}
