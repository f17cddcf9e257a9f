//! Owned pixel buffer with explicit row stride

use crate::error::{FrameError, Result};
use crate::types::ElementType;

/// One frame of interleaved samples, row-major.
///
/// Invariants checked at construction:
/// - `data.len() == height * stride`
/// - `stride >= width * channels * element.size()`
///
/// Zero width or height is representable; stages that cannot consume an
/// empty frame reject it when they run.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u32,
    element: ElementType,
    stride: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(
        width: u32,
        height: u32,
        channels: u32,
        element: ElementType,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        let row_bytes = width as usize * channels as usize * element.size();
        if stride < row_bytes {
            return Err(FrameError::InvalidBuffer(format!(
                "stride {} is smaller than row size {}",
                stride, row_bytes
            )));
        }

        let expected = height as usize * stride;
        if data.len() != expected {
            return Err(FrameError::InvalidBuffer(format!(
                "data length {} does not match height {} x stride {}",
                data.len(),
                height,
                stride
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            element,
            stride,
            data,
        })
    }

    /// Tightly packed 8-bit frame
    pub fn from_packed(width: u32, height: u32, channels: u32, data: Vec<u8>) -> Result<Self> {
        let stride = width as usize * channels as usize;
        Self::new(width, height, channels, ElementType::U8, stride, data)
    }

    /// Tightly packed float frame
    pub fn from_f32(width: u32, height: u32, channels: u32, samples: &[f32]) -> Result<Self> {
        let stride = width as usize * channels as usize * ElementType::F32.size();
        let data = bytemuck::cast_slice::<f32, u8>(samples).to_vec();
        Self::new(width, height, channels, ElementType::F32, stride, data)
    }

    /// Packed buffer from a conversion whose output length follows from the
    /// geometry
    pub(crate) fn packed_unchecked(
        width: u32,
        height: u32,
        channels: u32,
        element: ElementType,
        data: Vec<u8>,
    ) -> Self {
        let stride = width as usize * channels as usize * element.size();
        debug_assert_eq!(data.len(), stride * height as usize);

        Self {
            width,
            height,
            channels,
            element,
            stride,
            data,
        }
    }

    /// 8-bit frame with every pixel set to `pixel`
    pub fn filled(width: u32, height: u32, pixel: &[u8]) -> Self {
        let channels = pixel.len() as u32;
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * pixel.len());
        for _ in 0..count {
            data.extend_from_slice(pixel);
        }

        Self {
            width,
            height,
            channels,
            element: ElementType::U8,
            stride: width as usize * pixel.len(),
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn element(&self) -> ElementType {
        self.element
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bytes of pixel data per row, excluding padding
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.channels as usize * self.element.size()
    }

    pub fn is_contiguous(&self) -> bool {
        self.stride == self.row_bytes()
    }

    /// Pixel data of row `y`, excluding padding
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_bytes()]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Row data with padding removed
    pub fn to_contiguous(&self) -> Vec<u8> {
        if self.is_contiguous() {
            return self.data.clone();
        }

        let mut packed = Vec::with_capacity(self.row_bytes() * self.height as usize);
        for row in self.rows() {
            packed.extend_from_slice(row);
        }
        packed
    }

    /// Copy of the samples as floats. Fails for 8-bit buffers.
    pub fn to_f32_samples(&self) -> Result<Vec<f32>> {
        if self.element != ElementType::F32 {
            return Err(FrameError::UnsupportedFormat(
                "buffer does not hold 32-bit float samples".to_string(),
            ));
        }
        Ok(samples_from_bytes(&self.to_contiguous()))
    }
}

/// Native-endian f32 samples from bytes. `Vec<u8>` storage carries no
/// alignment guarantee, so this copies instead of casting in place.
pub(crate) fn samples_from_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
