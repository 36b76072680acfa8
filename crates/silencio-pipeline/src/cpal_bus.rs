//! cpal-backed PCM bus.
//!
//! Adapts the host's default audio devices to the [`PcmSource`] /
//! [`PcmSink`] traits. Each direction is split in two: the cpal stream
//! itself (not `Send`, it stays on the thread that opened it, wrapped in a
//! [`StreamGuard`]) and a channel-fed adapter that moves into the pipeline
//! task.
//!
//! The bounded channels between callback and adapter play the role the
//! DMA rings play on hardware: the input side drops on overrun, the
//! output side blocks the writer, which is exactly the back-pressure the
//! pipeline is designed around.

use std::sync::mpsc::{Receiver, SyncSender, sync_channel};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host};

use crate::buffer::FrameBuffer;
use crate::bus::{PcmSink, PcmSource};
use crate::{Error, Result};

/// Channel slots between the input callback and the reader (DMA-ring analogue).
const INPUT_QUEUE_DEPTH: usize = 4;

/// Channel slots between the writer and the output callback.
const OUTPUT_QUEUE_DEPTH: usize = 8;

const FULL_SCALE: f32 = 2_147_483_648.0;

/// Audio device information.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Device supports capture.
    pub is_input: bool,
    /// Device supports playback.
    pub is_output: bool,
    /// The device's preferred sample rate.
    pub default_sample_rate: u32,
}

/// Which way audio flows through a device.
#[derive(Debug, Clone, Copy)]
enum Direction {
    Capture,
    Playback,
}

/// Probe one device for the capabilities the pipeline cares about.
///
/// Returns `None` for devices that expose neither a capture nor a
/// playback configuration, or that refuse to report a name.
fn probe(device: &Device) -> Option<AudioDevice> {
    let name = device.name().ok()?;
    let capture_rate = device.default_input_config().ok().map(|c| c.sample_rate());
    let playback_rate = device
        .default_output_config()
        .ok()
        .map(|c| c.sample_rate());
    let default_sample_rate = capture_rate.or(playback_rate)?;
    Some(AudioDevice {
        name,
        is_input: capture_rate.is_some(),
        is_output: playback_rate.is_some(),
        default_sample_rate,
    })
}

/// List every usable audio device, capture and playback merged.
///
/// Duplex devices show up in both of cpal's enumerations; each is probed
/// once and reported a single time with both capability flags set.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let candidates = host
        .input_devices()
        .into_iter()
        .flatten()
        .chain(host.output_devices().into_iter().flatten());

    let mut found: Vec<AudioDevice> = Vec::new();
    for device in candidates {
        if let Some(info) = probe(&device) {
            if !found.iter().any(|d| d.name == info.name) {
                found.push(info);
            }
        }
    }
    Ok(found)
}

/// The devices the host would pick by default for each direction.
pub fn default_device() -> Result<(Option<AudioDevice>, Option<AudioDevice>)> {
    let host = cpal::default_host();
    let capture = host.default_input_device().and_then(|d| probe(&d));
    let playback = host.default_output_device().and_then(|d| probe(&d));
    Ok((capture, playback))
}

/// Keeps a cpal stream alive.
///
/// cpal streams are not `Send`; the thread that opens a device keeps this
/// guard for as long as audio should flow. Dropping it stops the stream.
pub struct StreamGuard {
    _stream: cpal::Stream,
}

/// Capture side of the cpal bus.
///
/// Reassembles the callback's arbitrary-size chunks into full frames.
/// Device channel 0 feeds the reference (left) slots; channel 1 (channel
/// 0 again on mono devices) feeds the primary (right) slots.
pub struct CpalSource {
    rx: Receiver<Vec<f32>>,
    pending: Vec<f32>,
    channels: usize,
}

impl CpalSource {
    /// Open an input device and start capturing.
    ///
    /// Returns the adapter (give it to the pipeline) and the stream guard
    /// (keep it on this thread).
    pub fn open(device_name: Option<&str>) -> Result<(Self, StreamGuard)> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => find_device(&host, name, Direction::Capture)?,
            None => host.default_input_device().ok_or(Error::NoDevice)?,
        };

        let config = device
            .default_input_config()
            .map_err(|e| Error::Stream(e.to_string()))?;
        let channels = usize::from(config.channels());

        let (tx, rx) = sync_channel::<Vec<f32>>(INPUT_QUEUE_DEPTH);

        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Overrun behaves like a DMA overrun: the chunk is lost.
                    let _ = tx.try_send(data.to_vec());
                },
                |err| tracing::error!(error = %err, "input stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;
        stream.play().map_err(|e| Error::Stream(e.to_string()))?;

        Ok((
            Self {
                rx,
                pending: Vec::new(),
                channels,
            },
            StreamGuard { _stream: stream },
        ))
    }
}

impl PcmSource for CpalSource {
    fn read_frame(&mut self, frame: &mut FrameBuffer) -> Result<()> {
        let block = frame.block_size();
        let needed = block * self.channels;
        while self.pending.len() < needed {
            let chunk = self.rx.recv().map_err(|_| Error::ChannelClosed)?;
            self.pending.extend(chunk);
        }

        let right_offset = usize::from(self.channels > 1);
        let samples = frame.samples_mut();
        for i in 0..block {
            let base = i * self.channels;
            let left = self.pending[base];
            let right = self.pending[base + right_offset];
            samples[2 * i] = (left.clamp(-1.0, 1.0) * FULL_SCALE) as i32;
            samples[2 * i + 1] = (right.clamp(-1.0, 1.0) * FULL_SCALE) as i32;
        }
        self.pending.drain(..needed);
        Ok(())
    }
}

/// Playback side of the cpal bus.
///
/// The denoised mono signal (identical in both frame channels) is fanned
/// out to every device channel. `write_frame` blocks when the device
/// falls behind, which is the sink's contribution to back-pressure.
pub struct CpalSink {
    tx: SyncSender<Vec<f32>>,
    channels: usize,
}

impl CpalSink {
    /// Open an output device and start playback.
    pub fn open(device_name: Option<&str>) -> Result<(Self, StreamGuard)> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => find_device(&host, name, Direction::Playback)?,
            None => host.default_output_device().ok_or(Error::NoDevice)?,
        };

        let config = device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?;
        let channels = usize::from(config.channels());

        let (tx, rx) = sync_channel::<Vec<f32>>(OUTPUT_QUEUE_DEPTH);
        let mut pending: Vec<f32> = Vec::new();

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    while pending.len() < data.len() {
                        match rx.try_recv() {
                            Ok(chunk) => pending.extend(chunk),
                            Err(_) => break,
                        }
                    }
                    if pending.len() >= data.len() {
                        data.copy_from_slice(&pending[..data.len()]);
                        pending.drain(..data.len());
                    } else {
                        // Starved: emit silence rather than stale samples.
                        data.fill(0.0);
                    }
                },
                |err| tracing::error!(error = %err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;
        stream.play().map_err(|e| Error::Stream(e.to_string()))?;

        Ok((Self { tx, channels }, StreamGuard { _stream: stream }))
    }
}

impl PcmSink for CpalSink {
    fn write_frame(&mut self, frame: &FrameBuffer) -> Result<()> {
        let samples = frame.samples();
        let mut out = Vec::with_capacity(frame.block_size() * self.channels);
        for pair in samples.chunks_exact(2) {
            let value = pair[0] as f32 / FULL_SCALE;
            for _ in 0..self.channels {
                out.push(value);
            }
        }
        self.tx.send(out).map_err(|_| Error::ChannelClosed)
    }
}

/// Look a device up by exact name in the scan for one direction.
fn find_device(host: &Host, name: &str, direction: Direction) -> Result<Device> {
    let mut scan: Box<dyn Iterator<Item = Device>> = match direction {
        Direction::Capture => Box::new(
            host.input_devices()
                .map_err(|e| Error::Stream(e.to_string()))?,
        ),
        Direction::Playback => Box::new(
            host.output_devices()
                .map_err(|e| Error::Stream(e.to_string()))?,
        ),
    };
    scan.find(|d| d.name().is_ok_and(|n| n == name))
        .ok_or_else(|| Error::DeviceNotFound(name.to_string()))
}
