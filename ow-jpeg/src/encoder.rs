//! Baseline/progressive JPEG encoder over pixel buffers

use crate::config::{EncodeConfig, Subsampling};
use jpeg_encoder::{ColorType, Encoder, SamplingFactor};
use ow_frame::{bgr_to_gray, ElementType, FrameError, PixelBuffer, Result};

/// Scratch reserved up front: one packed 1080p BGR frame
pub const DEFAULT_SCRATCH_BYTES: usize = 1920 * 1080 * 3;

/// Largest width or height a JPEG frame header can carry
pub const MAX_DIMENSION: u32 = u16::MAX as u32;

/// Compressed output of one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codestream {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Channels actually encoded: 1 (gray) or 3 (color)
    pub channels: u32,
}

impl Codestream {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Codec resource holding the row-packing scratch reused across frames.
///
/// Not reentrant: `encode` takes `&mut self`, so one instance can only be
/// driven by one thread at a time. Concurrent callers each need their own.
pub struct JpegEncoder {
    scratch: Vec<u8>,
    frames_encoded: u64,
}

impl JpegEncoder {
    pub fn new() -> Result<Self> {
        Self::with_capacity(DEFAULT_SCRATCH_BYTES)
    }

    /// Fails with `ResourceInit` when the scratch allocation is refused
    pub fn with_capacity(scratch_bytes: usize) -> Result<Self> {
        let mut scratch = Vec::new();
        scratch.try_reserve_exact(scratch_bytes).map_err(|e| {
            FrameError::ResourceInit(format!(
                "cannot reserve {} bytes of encoder scratch: {}",
                scratch_bytes, e
            ))
        })?;

        Ok(Self {
            scratch,
            frames_encoded: 0,
        })
    }

    pub fn frames_encoded(&self) -> u64 {
        self.frames_encoded
    }

    /// Compress `buffer` into a JPEG codestream.
    ///
    /// 1 and 3 channel 8-bit frames are accepted, in BGR order for color.
    /// 4-channel frames are encoded without their alpha channel. Gray
    /// subsampling converts color input to luma first.
    pub fn encode(&mut self, buffer: &PixelBuffer, config: &EncodeConfig) -> Result<Codestream> {
        config.validate()?;

        if buffer.element() != ElementType::U8 {
            return Err(FrameError::UnsupportedFormat(
                "JPEG encoding needs 8-bit samples, got 32-bit float".to_string(),
            ));
        }

        let color = match buffer.channels() {
            1 => ColorType::Luma,
            3 => ColorType::Bgr,
            4 => ColorType::Bgra, // alpha is not encoded
            n => {
                return Err(FrameError::UnsupportedFormat(format!(
                    "unsupported channel count: {} (expected 1 or 3)",
                    n
                )))
            }
        };

        let (width, height) = (buffer.width(), buffer.height());
        if buffer.is_empty() {
            return Err(FrameError::Pipeline(format!(
                "cannot encode empty frame {}x{}",
                width, height
            )));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(FrameError::Pipeline(format!(
                "frame {}x{} exceeds JPEG limit of {} pixels per side",
                width, height, MAX_DIMENSION
            )));
        }

        let gray_output = config.subsampling == Subsampling::Gray && buffer.channels() != 1;
        let (color, channels) = if gray_output {
            let gray = bgr_to_gray(buffer)?;
            self.pack(&gray);
            (ColorType::Luma, 1)
        } else {
            self.pack(buffer);
            (color, if buffer.channels() == 1 { 1 } else { 3 })
        };

        let mut data = Vec::with_capacity(self.scratch.len() / 4);
        let mut encoder = Encoder::new(&mut data, config.codec_quality());
        encoder.set_sampling_factor(sampling_factor(config.subsampling));
        encoder.set_optimized_huffman_tables(config.optimize);
        encoder.set_progressive(config.progressive);
        encoder
            .encode(&self.scratch, width as u16, height as u16, color)
            .map_err(|e| FrameError::Pipeline(format!("JPEG compression failed: {}", e)))?;

        self.frames_encoded += 1;
        log::trace!(
            "encoded {}x{}x{} frame into {} bytes",
            width,
            height,
            channels,
            data.len()
        );

        Ok(Codestream {
            data,
            width,
            height,
            channels,
        })
    }

    /// Copy rows into the scratch without stride padding
    fn pack(&mut self, buffer: &PixelBuffer) {
        self.scratch.clear();
        for row in buffer.rows() {
            self.scratch.extend_from_slice(row);
        }
    }
}

fn sampling_factor(subsampling: Subsampling) -> SamplingFactor {
    match subsampling {
        Subsampling::S444 | Subsampling::Gray => SamplingFactor::R_4_4_4,
        Subsampling::S422 => SamplingFactor::R_4_2_2,
        Subsampling::S420 => SamplingFactor::R_4_2_0,
        Subsampling::S440 => SamplingFactor::R_4_4_0,
        Subsampling::S411 => SamplingFactor::R_4_1_1,
    }
}
