//! JPEG encoding configuration

use ow_frame::{FrameError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Chroma subsampling mode
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Subsampling {
    S444 = 0, // No chroma reduction
    S422 = 1, // Half horizontal chroma
    #[default]
    S420 = 2, // Half horizontal and vertical chroma
    Gray = 3, // Luma only
    S440 = 4, // Half vertical chroma
    S411 = 5, // Quarter horizontal chroma
}

/// Accepts the classic codec constants (0 = 4:4:4 ... 5 = 4:1:1)
impl TryFrom<i32> for Subsampling {
    type Error = FrameError;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Subsampling::S444),
            1 => Ok(Subsampling::S422),
            2 => Ok(Subsampling::S420),
            3 => Ok(Subsampling::Gray),
            4 => Ok(Subsampling::S440),
            5 => Ok(Subsampling::S411),
            other => Err(FrameError::Configuration(format!(
                "unknown subsampling mode: {}",
                other
            ))),
        }
    }
}

pub const MAX_QUALITY: u8 = 100;

/// Encoder settings for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EncodeConfig {
    /// 0-100; 0 encodes at the codec's lowest quality (1)
    pub quality: u8,
    pub subsampling: Subsampling,
    /// Optimized Huffman tables (smaller output, slower encode)
    pub optimize: bool,
    /// Progressive scans instead of baseline
    pub progressive: bool,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            quality: 85,
            subsampling: Subsampling::S420,
            optimize: true,
            progressive: false,
        }
    }
}

impl EncodeConfig {
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.quality > MAX_QUALITY {
            return Err(FrameError::Configuration(format!(
                "quality must be within 0-{}, got {}",
                MAX_QUALITY, self.quality
            )));
        }
        Ok(())
    }

    /// Quality as passed to the codec
    pub(crate) fn codec_quality(&self) -> u8 {
        self.quality.clamp(1, MAX_QUALITY)
    }
}
