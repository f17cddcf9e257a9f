//! Frame processor: single-frame operations and their batch variants
//!
//! Every operation returns a [`ProcessedResult`]. Failures, panics included,
//! stay inside that result. Statistics count successes only.

use crate::batch::{isolate, run_batch};
use crate::config::{Operation, PreprocessConfig, ProcessorConfig};
use crate::encoder_pool::{EncoderPool, EncoderSlot, PoolStats};
use crate::result::{ProcessedFrame, ProcessedResult};
use crate::stats::{Statistics, StatsSnapshot};
use ow_frame::{bgr_to_rgb, normalize, resize, FrameError, Interpolation, PixelBuffer, Result};
use ow_jpeg::EncodeConfig;
use rayon::{ThreadPool, ThreadPoolBuilder};

pub struct FrameProcessor {
    /// Batch map workers; `None` runs batches on the caller's thread
    workers: Option<ThreadPool>,
    encoders: EncoderPool,
    stats: Statistics,
    num_threads: usize,
}

impl FrameProcessor {
    /// Create a processor.
    ///
    /// Fails with `ResourceInit` when the batch workers or the first encoder
    /// cannot be created.
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        let num_threads = config.resolved_threads();

        let workers = if num_threads > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .thread_name(|i| format!("ow-batch-{}", i))
                .build()
                .map_err(|e| {
                    FrameError::ResourceInit(format!("cannot start batch workers: {}", e))
                })?;
            Some(pool)
        } else {
            None
        };

        let encoders = EncoderPool::new(config.resolved_encoder_capacity())?;

        log::info!(
            "Frame processor ready: {} batch worker(s), encoder pool capacity {}",
            num_threads,
            encoders.stats().capacity
        );

        Ok(Self {
            workers,
            encoders,
            stats: Statistics::new(),
            num_threads,
        })
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn encoder_stats(&self) -> PoolStats {
        self.encoders.stats()
    }

    /// Resize only. Reports the geometry actually produced and fails if it
    /// differs from the requested size.
    pub fn resize_frame(
        &self,
        frame: &PixelBuffer,
        width: i32,
        height: i32,
        interpolation: Interpolation,
    ) -> ProcessedResult {
        self.process(
            frame,
            &Operation::Resize {
                width,
                height,
                interpolation,
            },
        )
    }

    /// Resize, BGR to RGB, normalize, per `config`
    pub fn preprocess_for_inference(
        &self,
        frame: &PixelBuffer,
        config: &PreprocessConfig,
    ) -> ProcessedResult {
        self.process(frame, &Operation::Preprocess(*config))
    }

    pub fn encode_jpeg(&self, frame: &PixelBuffer, config: &EncodeConfig) -> ProcessedResult {
        self.process(frame, &Operation::Encode(*config))
    }

    /// Preprocess then encode. A preprocessing failure is returned as is and
    /// nothing is encoded.
    pub fn preprocess_and_encode(
        &self,
        frame: &PixelBuffer,
        preprocess: &PreprocessConfig,
        encode: &EncodeConfig,
    ) -> ProcessedResult {
        self.process(frame, &Operation::PreprocessAndEncode(*preprocess, *encode))
    }

    /// Apply one operation to one frame
    pub fn process(&self, frame: &PixelBuffer, operation: &Operation) -> ProcessedResult {
        isolate(|| {
            let mut slot = EncoderSlot::new(&self.encoders);
            self.apply(frame, operation, &mut slot)
        })
    }

    pub fn batch_resize(
        &self,
        frames: &[PixelBuffer],
        width: i32,
        height: i32,
        interpolation: Interpolation,
    ) -> Vec<ProcessedResult> {
        self.batch(
            frames,
            &Operation::Resize {
                width,
                height,
                interpolation,
            },
        )
    }

    pub fn batch_preprocess(
        &self,
        frames: &[PixelBuffer],
        config: &PreprocessConfig,
    ) -> Vec<ProcessedResult> {
        self.batch(frames, &Operation::Preprocess(*config))
    }

    pub fn batch_encode_jpeg(
        &self,
        frames: &[PixelBuffer],
        config: &EncodeConfig,
    ) -> Vec<ProcessedResult> {
        self.batch(frames, &Operation::Encode(*config))
    }

    pub fn batch_preprocess_and_encode(
        &self,
        frames: &[PixelBuffer],
        preprocess: &PreprocessConfig,
        encode: &EncodeConfig,
    ) -> Vec<ProcessedResult> {
        self.batch(frames, &Operation::PreprocessAndEncode(*preprocess, *encode))
    }

    /// Apply one operation to every frame; result `i` belongs to frame `i`
    pub fn batch(&self, frames: &[PixelBuffer], operation: &Operation) -> Vec<ProcessedResult> {
        run_batch(
            self.workers.as_ref(),
            &self.encoders,
            frames,
            |frame, slot| self.apply(frame, operation, slot),
        )
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn frames_processed(&self) -> u64 {
        self.stats.frames_processed()
    }

    pub fn bytes_encoded(&self) -> u64 {
        self.stats.bytes_encoded()
    }

    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    fn apply(
        &self,
        frame: &PixelBuffer,
        operation: &Operation,
        slot: &mut EncoderSlot<'_>,
    ) -> ProcessedResult {
        match operation {
            Operation::Resize {
                width,
                height,
                interpolation,
            } => {
                let resized = resize_exact(frame, *width, *height, *interpolation)?;
                self.stats.record_frame();
                Ok(ProcessedFrame::from_buffer(resized))
            }
            Operation::Preprocess(config) => {
                let prepared = preprocess(frame, config)?;
                self.stats.record_frame();
                Ok(ProcessedFrame::from_buffer(prepared))
            }
            Operation::Encode(config) => {
                let codestream = slot.get()?.encode(frame, config)?;
                self.stats.record_encoded(codestream.len());
                Ok(ProcessedFrame::from_codestream(codestream))
            }
            Operation::PreprocessAndEncode(preprocess_config, encode_config) => {
                let prepared = preprocess(frame, preprocess_config)?;
                let codestream = slot.get()?.encode(&prepared, encode_config)?;
                self.stats.record_encoded(codestream.len());
                Ok(ProcessedFrame::from_codestream(codestream))
            }
        }
    }
}

fn resize_exact(
    frame: &PixelBuffer,
    width: i32,
    height: i32,
    interpolation: Interpolation,
) -> Result<PixelBuffer> {
    let resized = resize(frame, width, height, interpolation)?;

    // Dimensions were validated positive by resize
    if (resized.width(), resized.height()) != (width as u32, height as u32) {
        return Err(FrameError::Pipeline(format!(
            "resize produced {}x{}, requested {}x{}",
            resized.width(),
            resized.height(),
            width,
            height
        )));
    }

    Ok(resized)
}

/// Resize, color-convert and normalize per `config`. Stages that are
/// switched off are skipped; the output is always packed.
fn preprocess(frame: &PixelBuffer, config: &PreprocessConfig) -> Result<PixelBuffer> {
    config.validate()?;

    let mut current: Option<PixelBuffer> = None;

    if let Some(target) = config.target {
        current = Some(resize_exact(
            frame,
            target.width,
            target.height,
            config.interpolation,
        )?);
    }

    // 3-channel frames only; others pass through unchanged
    if config.rgb_conversion && frame.channels() == 3 {
        current = Some(bgr_to_rgb(current.as_ref().unwrap_or(frame)));
    }

    if config.normalize {
        current = Some(normalize(
            current.as_ref().unwrap_or(frame),
            &config.mean,
            &config.std,
        )?);
    }

    Ok(current.unwrap_or_else(|| frame.clone()))
}
