//! Sample and geometry types

use crate::error::{FrameError, Result};
use image::imageops::FilterType;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sample element type
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ElementType {
    #[default]
    U8 = 0,  // 8-bit unsigned integer
    F32 = 1, // 32-bit float (normalized output)
}

impl ElementType {
    /// Returns bytes per sample
    pub fn size(self) -> usize {
        match self {
            ElementType::U8 => 1,
            ElementType::F32 => 4,
        }
    }
}

/// Interpolation mode for geometry-changing transforms.
///
/// Discriminants 0-4 are the codes host vision libraries use. `Gaussian` has
/// no host equivalent and sits after them.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Interpolation {
    Nearest = 0,
    #[default]
    Linear = 1,
    Cubic = 2,
    Area = 3, // Pixel-area averaging, for downscaling
    Lanczos = 4,
    Gaussian = 5,
}

impl Interpolation {
    pub(crate) fn filter(self) -> FilterType {
        match self {
            Interpolation::Nearest => FilterType::Nearest,
            Interpolation::Linear => FilterType::Triangle,
            Interpolation::Cubic => FilterType::CatmullRom,
            // The triangle kernel widens with the scale factor on downscale,
            // averaging over each output pixel's source footprint
            Interpolation::Area => FilterType::Triangle,
            Interpolation::Lanczos => FilterType::Lanczos3,
            Interpolation::Gaussian => FilterType::Gaussian,
        }
    }
}

/// Accepts every discriminant: the host codes (0 nearest, 1 linear,
/// 2 cubic, 3 area, 4 lanczos) and 5 for gaussian.
impl TryFrom<i32> for Interpolation {
    type Error = FrameError;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Interpolation::Nearest),
            1 => Ok(Interpolation::Linear),
            2 => Ok(Interpolation::Cubic),
            3 => Ok(Interpolation::Area),
            4 => Ok(Interpolation::Lanczos),
            5 => Ok(Interpolation::Gaussian),
            other => Err(FrameError::Configuration(format!(
                "unknown interpolation code: {}",
                other
            ))),
        }
    }
}

/// Requested output geometry. Signed so that negative requests coming from a
/// host can be reported instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Dimensions {
    pub width: i32,
    pub height: i32,
}

impl Dimensions {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Checked conversion to unsigned pixel counts
    pub fn validate(self) -> Result<(u32, u32)> {
        if self.width <= 0 || self.height <= 0 {
            return Err(FrameError::Configuration(format!(
                "target dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok((self.width as u32, self.height as u32))
    }
}
