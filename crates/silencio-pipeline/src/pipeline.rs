//! Pipeline wiring and task bodies.
//!
//! [`Pipeline`] owns the bounded queues and the two-buffer pool;
//! [`Pipeline::spawn`] starts the four long-lived tasks. All audio-path
//! queue operations block indefinitely: a stalled output bus fills Q2,
//! which parks the processing task, which fills Q1, which parks
//! acquisition once no free buffer returns; at that point the input bus
//! itself holds the data in its DMA buffers. Nothing on the audio path
//! is ever dropped.
//!
//! The indicator path is the exception: Q3 sends never block, and a full
//! queue drops the sample with a warning. Losing an SNR update is
//! preferable to stalling audio.

use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::thread::{self, JoinHandle};

use silencio_core::{AutoGain, NlmsEngine, SnrEstimator, pack_frame, params, rms, unpack_frame};

use crate::buffer::{FrameBuffer, FramePool};
use crate::bus::{PcmSink, PcmSource};
use crate::indicator::{Indicator, snr_color};
use crate::{Error, Result};

/// Queue depth on the audio path (frames in flight).
const AUDIO_QUEUE_DEPTH: usize = 2;

/// Queue depth on the indicator path.
const SNR_QUEUE_DEPTH: usize = 4;

/// Build-time tunables gathered for construction.
///
/// Defaults come from [`silencio_core::params`]; tests substitute their
/// own values.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Samples per channel per frame.
    pub block_size: usize,
    /// Adaptive filter length M.
    pub filter_taps: usize,
    /// NLMS step size μ.
    pub step_size: f32,
    /// Regularization for every energy/RMS division.
    pub regularization: f32,
    /// AGC level target.
    pub gain_target: f32,
    /// AGC gain ceiling.
    pub gain_ceiling: f32,
    /// AGC EMA coefficient.
    pub gain_alpha: f32,
    /// SNR EMA coefficient.
    pub snr_alpha: f32,
    /// Publish every Nth SNR value to the indicator.
    pub snr_decimation: u32,
    /// Recompute the NLMS norm every this many frames.
    pub norm_resync_frames: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            block_size: params::BLOCK_SIZE,
            filter_taps: params::FILTER_LENGTH,
            step_size: params::MU,
            regularization: params::EPSILON,
            gain_target: params::COEFF_GAIN,
            gain_ceiling: params::GAIN_MAX,
            gain_alpha: params::ALPHA_GAIN,
            snr_alpha: params::ALPHA_SNR,
            snr_decimation: params::SNR_DECIMATION,
            norm_resync_frames: params::NORM_RESYNC_FRAMES,
        }
    }
}

/// Per-frame processing state: the NLMS engine, level estimators, AGC and
/// scratch channels.
///
/// Owned exclusively by the processing task; nothing here needs locking.
/// Also usable standalone (without threads) for offline simulation.
pub struct ProcessingStage {
    engine: NlmsEngine,
    agc: AutoGain,
    snr: SnrEstimator,
    left: Vec<f32>,
    right: Vec<f32>,
    filtered: Vec<f32>,
    snr_decimation: u32,
    led_counter: u32,
    norm_resync_frames: u32,
    frame_counter: u32,
}

impl ProcessingStage {
    /// Create the stage from the pipeline tunables.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            engine: NlmsEngine::with_regularization(
                config.filter_taps,
                config.step_size,
                config.regularization,
            ),
            agc: AutoGain::new(
                config.gain_target,
                config.gain_ceiling,
                config.gain_alpha,
                config.regularization,
            ),
            snr: SnrEstimator::new(config.snr_alpha, config.regularization),
            left: vec![0.0; config.block_size],
            right: vec![0.0; config.block_size],
            filtered: vec![0.0; config.block_size],
            snr_decimation: config.snr_decimation,
            led_counter: 0,
            norm_resync_frames: config.norm_resync_frames,
            frame_counter: 0,
        }
    }

    /// Run one frame through the canceller, in place.
    ///
    /// Unpacks the stereo frame, runs the per-sample NLMS loop, updates
    /// the SNR estimate and the AGC, and packs the denoised result back
    /// into both channels of the frame.
    ///
    /// Returns `Some(snr_db)` every `snr_decimation`-th frame (the value
    /// to publish to the indicator), `None` otherwise.
    pub fn process_frame(&mut self, frame: &mut FrameBuffer) -> Option<f32> {
        let block = self.left.len();
        debug_assert_eq!(frame.block_size(), block);
        let samples = frame.samples_mut();

        unpack_frame(samples, &mut self.left, &mut self.right);

        let rms_noisy = rms(&self.right);

        // Per-sample adaptation; the update must see the history up to
        // sample i when computing output i, so there is no per-block
        // shortcut here.
        let yield_point = block / 2;
        for i in 0..block {
            self.filtered[i] = self.engine.process_sample(self.left[i], self.right[i]);
            if i == yield_point {
                // Keep lower-priority tasks serviced mid-block.
                thread::yield_now();
            }
        }

        let rms_denoised = rms(&self.filtered);
        let snr_db = self.snr.update(rms_noisy, rms_denoised);

        self.frame_counter += 1;
        if self.frame_counter == self.norm_resync_frames {
            self.frame_counter = 0;
            self.engine.resync_norm();
        }

        self.led_counter += 1;
        let publish = self.led_counter == self.snr_decimation;
        if publish {
            self.led_counter = 0;
        }

        self.agc.update(rms_denoised);
        self.agc.apply(&mut self.filtered);

        pack_frame(&self.filtered, samples);

        publish.then_some(snr_db)
    }

    /// The adaptive filter, for inspection.
    pub fn engine(&self) -> &NlmsEngine {
        &self.engine
    }

    /// Current smoothed AGC gain.
    pub fn gain(&self) -> f32 {
        self.agc.gain()
    }

    /// Current smoothed SNR in dB.
    pub fn snr_db(&self) -> f32 {
        self.snr.snr_db()
    }
}

/// The assembled pipeline: queues, pool, and tunables.
///
/// Construct with [`Pipeline::new`], then hand devices to
/// [`Pipeline::spawn`]. Queue handles and the buffer pool live here
/// explicitly; there are no process-global singletons.
pub struct Pipeline {
    config: PipelineConfig,
    q1_tx: SyncSender<FrameBuffer>,
    q1_rx: Receiver<FrameBuffer>,
    q2_tx: SyncSender<FrameBuffer>,
    q2_rx: Receiver<FrameBuffer>,
    q3_tx: SyncSender<f32>,
    q3_rx: Receiver<f32>,
    free_tx: SyncSender<FrameBuffer>,
    free_rx: Receiver<FrameBuffer>,
}

impl Pipeline {
    /// Create the queues and seed the free list with the buffer pair.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let (q1_tx, q1_rx) = sync_channel(AUDIO_QUEUE_DEPTH);
        let (q2_tx, q2_rx) = sync_channel(AUDIO_QUEUE_DEPTH);
        let (q3_tx, q3_rx) = sync_channel(SNR_QUEUE_DEPTH);
        let (free_tx, free_rx) = sync_channel(AUDIO_QUEUE_DEPTH);

        for buffer in FramePool::pair(config.block_size) {
            free_tx.send(buffer).map_err(|_| Error::ChannelClosed)?;
        }

        Ok(Self {
            config,
            q1_tx,
            q1_rx,
            q2_tx,
            q2_rx,
            q3_tx,
            q3_rx,
            free_tx,
            free_rx,
        })
    }

    /// The tunables this pipeline was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Start the four tasks and hand each its queue endpoints.
    ///
    /// Thread priorities are the host scheduler's business; the task split
    /// keeps the CPU-bound work preemptible by the I/O-bound tasks.
    pub fn spawn<Src, Snk, Ind>(
        self,
        source: Src,
        sink: Snk,
        indicator: Ind,
    ) -> Result<PipelineHandles>
    where
        Src: PcmSource + 'static,
        Snk: PcmSink + 'static,
        Ind: Indicator + 'static,
    {
        let stage = ProcessingStage::new(&self.config);

        let Self {
            q1_tx,
            q1_rx,
            q2_tx,
            q2_rx,
            q3_tx,
            q3_rx,
            free_tx,
            free_rx,
            ..
        } = self;

        let acquisition = spawn_task("acquisition", move || {
            acquisition_loop(source, &free_rx, &q1_tx);
        })?;
        let processing = spawn_task("processing", move || {
            processing_loop(stage, &q1_rx, &q2_tx, &q3_tx);
        })?;
        let output = spawn_task("output", move || {
            output_loop(sink, &q2_rx, &free_tx);
        })?;
        let indicator = spawn_task("indicator", move || {
            indicator_loop(indicator, &q3_rx);
        })?;

        Ok(PipelineHandles {
            acquisition,
            processing,
            output,
            indicator,
        })
    }
}

/// Join handles for the four pipeline tasks.
pub struct PipelineHandles {
    acquisition: JoinHandle<()>,
    processing: JoinHandle<()>,
    output: JoinHandle<()>,
    indicator: JoinHandle<()>,
}

impl PipelineHandles {
    /// Block until every task has exited.
    ///
    /// Tasks exit when a bus reports closure or their queues disconnect;
    /// in steady state that is never. Closing the devices (dropping their
    /// stream guards) is the supported way to make this return.
    pub fn join(self) {
        for handle in [
            self.acquisition,
            self.processing,
            self.output,
            self.indicator,
        ] {
            if handle.join().is_err() {
                tracing::error!("pipeline task panicked");
            }
        }
    }
}

fn spawn_task<F>(name: &str, body: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .map_err(|e| Error::Stream(format!("failed to spawn {name} task: {e}")))
}

/// Acquisition task: free buffer → bus read → Q1.
///
/// A read error keeps the current buffer and retries, so no half-filled
/// frame ever enters the pipeline. A closed bus is not a glitch: the
/// task exits, and the queue disconnects drain the rest of the pipeline.
fn acquisition_loop<S: PcmSource>(
    mut source: S,
    free_rx: &Receiver<FrameBuffer>,
    q1_tx: &SyncSender<FrameBuffer>,
) {
    tracing::debug!("acquisition task running");
    'frames: while let Ok(mut frame) = free_rx.recv() {
        loop {
            match source.read_frame(&mut frame) {
                Ok(()) => break,
                Err(Error::ChannelClosed) => {
                    tracing::debug!("input bus closed, acquisition stopping");
                    break 'frames;
                }
                Err(e) => tracing::error!(error = %e, "input bus read failed, retrying"),
            }
        }
        if q1_tx.send(frame).is_err() {
            break;
        }
    }
    tracing::debug!("acquisition task exiting");
}

/// Processing task: Q1 → NLMS + AGC → Q2, SNR → Q3.
fn processing_loop(
    mut stage: ProcessingStage,
    q1_rx: &Receiver<FrameBuffer>,
    q2_tx: &SyncSender<FrameBuffer>,
    q3_tx: &SyncSender<f32>,
) {
    tracing::debug!("processing task running");
    while let Ok(mut frame) = q1_rx.recv() {
        if let Some(snr_db) = stage.process_frame(&mut frame) {
            match q3_tx.try_send(snr_db) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(snr_db, "indicator queue full, dropping SNR sample");
                }
            }
        }
        if q2_tx.send(frame).is_err() {
            break;
        }
    }
    tracing::debug!("processing task exiting");
}

/// Output task: Q2 → bus write → free list.
///
/// A write error is logged and the frame is still recycled; the stream
/// keeps its cadence and the glitch stays local. A closed bus ends the
/// task, and with it the free-buffer supply upstream.
fn output_loop<K: PcmSink>(
    mut sink: K,
    q2_rx: &Receiver<FrameBuffer>,
    free_tx: &SyncSender<FrameBuffer>,
) {
    tracing::debug!("output task running");
    while let Ok(frame) = q2_rx.recv() {
        match sink.write_frame(&frame) {
            Ok(()) => {}
            Err(Error::ChannelClosed) => {
                tracing::debug!("output bus closed, output stopping");
                break;
            }
            Err(e) => tracing::error!(error = %e, "output bus write failed"),
        }
        if free_tx.send(frame).is_err() {
            break;
        }
    }
    tracing::debug!("output task exiting");
}

/// Indicator task: Q3 → color ramp → device.
fn indicator_loop<I: Indicator>(mut strip: I, q3_rx: &Receiver<f32>) {
    tracing::debug!("indicator task running");
    while let Ok(snr_db) = q3_rx.recv() {
        let (r, g, b) = snr_color(snr_db);
        let result = strip.set_color(0, r, g, b).and_then(|()| strip.refresh());
        if let Err(e) = result {
            tracing::warn!(error = %e, "indicator update failed");
        }
    }
    tracing::debug!("indicator task exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use silencio_core::frame::PACK_SCALE;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            block_size: 128,
            filter_taps: 16,
            ..PipelineConfig::default()
        }
    }

    /// Build a frame whose float channels are `left`/`right` in 24-bit
    /// fixed point.
    fn frame_from(left: &[f32], right: &[f32]) -> FrameBuffer {
        let mut frame = FrameBuffer::new(left.len());
        let samples = frame.samples_mut();
        for i in 0..left.len() {
            samples[2 * i] = ((left[i] * 8_388_608.0) as i32) << 8;
            samples[2 * i + 1] = ((right[i] * 8_388_608.0) as i32) << 8;
        }
        frame
    }

    #[test]
    fn silent_frames_stay_silent() {
        let mut stage = ProcessingStage::new(&test_config());
        for _ in 0..20 {
            let mut frame = FrameBuffer::new(128);
            stage.process_frame(&mut frame);
            assert!(frame.samples().iter().all(|&s| s == 0));
        }
        assert!(stage.engine().weights().iter().all(|&w| w == 0.0));
        assert_eq!(stage.snr_db(), 0.0);
    }

    #[test]
    fn snr_publishes_on_decimation_cadence() {
        let config = PipelineConfig {
            snr_decimation: 4,
            ..test_config()
        };
        let mut stage = ProcessingStage::new(&config);
        let mut published = Vec::new();
        for n in 1..=12 {
            let mut frame = FrameBuffer::new(128);
            if let Some(snr) = stage.process_frame(&mut frame) {
                published.push((n, snr));
            }
        }
        let cadence: Vec<u32> = published.iter().map(|&(n, _)| n).collect();
        assert_eq!(cadence, vec![4, 8, 12]);
    }

    #[test]
    fn output_channels_are_duplicated() {
        let mut stage = ProcessingStage::new(&test_config());
        let left: Vec<f32> = (0..128).map(|i| 0.1 * libm::sinf(i as f32 * 0.3)).collect();
        let right: Vec<f32> = (0..128).map(|i| 0.2 * libm::sinf(i as f32 * 0.17)).collect();
        let mut frame = frame_from(&left, &right);
        stage.process_frame(&mut frame);
        for pair in frame.samples().chunks_exact(2) {
            assert_eq!(pair[0], pair[1]);
        }
    }

    #[test]
    fn output_respects_headroom_bound() {
        // A hot primary with a silent reference passes straight through
        // the filter and must saturate at the packing bound.
        let mut stage = ProcessingStage::new(&test_config());
        let left = vec![0.0f32; 128];
        let right = vec![0.9f32; 128];
        let bound = PACK_SCALE as i32;
        for _ in 0..50 {
            let mut frame = frame_from(&left, &right);
            stage.process_frame(&mut frame);
            for &s in frame.samples() {
                assert!(s.abs() <= bound, "sample {s} outside headroom bound");
            }
        }
    }

    #[test]
    fn quiet_primary_drives_gain_to_ceiling_without_nan() {
        let config = PipelineConfig {
            gain_alpha: 0.5, // faster ramp to keep the test short
            ..test_config()
        };
        let mut stage = ProcessingStage::new(&config);
        let left = vec![0.0f32; 128];
        let right = vec![1e-5f32; 128];
        for _ in 0..200 {
            let mut frame = frame_from(&left, &right);
            stage.process_frame(&mut frame);
            assert!(stage.gain() > 0.0);
            assert!(stage.gain() <= config.gain_ceiling);
            let bound = PACK_SCALE as i32;
            assert!(frame.samples().iter().all(|&s| s.abs() <= bound));
        }
        assert!(
            (stage.gain() - config.gain_ceiling).abs() < 1e-3,
            "gain should ride the ceiling, got {}",
            stage.gain()
        );
    }

    #[test]
    fn pipeline_seeds_two_free_buffers() {
        let pipeline = Pipeline::new(test_config()).unwrap();
        let first = pipeline.free_rx.try_recv();
        let second = pipeline.free_rx.try_recv();
        let third = pipeline.free_rx.try_recv();
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert!(third.is_err(), "pool must hold exactly two buffers");
    }
}
