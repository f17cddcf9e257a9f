//! Channel-order and channel-count conversions
//!
//! All conversions allocate a new buffer; inputs are never modified.

use crate::buffer::PixelBuffer;
use crate::error::{FrameError, Result};
use crate::types::ElementType;

/// Swap the first and third channel (BGR <-> RGB).
///
/// Only 3-channel buffers are converted. Any other channel count is returned
/// unchanged, which is also what happens for 4-channel input: alpha-carrying
/// frames keep their order.
pub fn swap_channel_order(buffer: &PixelBuffer) -> PixelBuffer {
    if buffer.channels() != 3 {
        return buffer.clone();
    }

    let sample = buffer.element().size();
    let mut data = buffer.to_contiguous();

    for px in data.chunks_exact_mut(3 * sample) {
        let (first, rest) = px.split_at_mut(sample);
        first.swap_with_slice(&mut rest[sample..2 * sample]);
    }

    rebuild(buffer, buffer.channels(), data)
}

pub fn bgr_to_rgb(buffer: &PixelBuffer) -> PixelBuffer {
    swap_channel_order(buffer)
}

pub fn rgb_to_bgr(buffer: &PixelBuffer) -> PixelBuffer {
    swap_channel_order(buffer)
}

/// BGRA -> BGR. Buffers without four channels are an error.
pub fn drop_alpha(buffer: &PixelBuffer) -> Result<PixelBuffer> {
    if buffer.channels() != 4 {
        return Err(FrameError::UnsupportedFormat(format!(
            "alpha drop needs 4 channels, got {}",
            buffer.channels()
        )));
    }

    let sample = buffer.element().size();
    let pixels = buffer.width() as usize * buffer.height() as usize;
    let mut data = Vec::with_capacity(pixels * 3 * sample);

    for row in buffer.rows() {
        for px in row.chunks_exact(4 * sample) {
            data.extend_from_slice(&px[..3 * sample]);
        }
    }

    Ok(rebuild(buffer, 3, data))
}

/// 8-bit BGR/BGRA -> single-channel luma (ITU-R BT.601 weights)
pub fn bgr_to_gray(buffer: &PixelBuffer) -> Result<PixelBuffer> {
    if buffer.element() != ElementType::U8 {
        return Err(FrameError::UnsupportedFormat(
            "gray conversion needs 8-bit samples".to_string(),
        ));
    }

    let channels = buffer.channels() as usize;
    if channels == 1 {
        return Ok(rebuild(buffer, 1, buffer.to_contiguous()));
    }
    if channels != 3 && channels != 4 {
        return Err(FrameError::UnsupportedFormat(format!(
            "gray conversion needs 1, 3 or 4 channels, got {}",
            channels
        )));
    }

    let pixels = buffer.width() as usize * buffer.height() as usize;
    let mut data = Vec::with_capacity(pixels);

    for row in buffer.rows() {
        for px in row.chunks_exact(channels) {
            // Fixed point: 0.114 B + 0.587 G + 0.299 R, weights sum to 1 << 14
            let luma = 1868 * px[0] as u32 + 9617 * px[1] as u32 + 4899 * px[2] as u32;
            data.push(((luma + (1 << 13)) >> 14) as u8);
        }
    }

    Ok(rebuild(buffer, 1, data))
}

/// Packed buffer with the source geometry and a new channel count
fn rebuild(source: &PixelBuffer, channels: u32, data: Vec<u8>) -> PixelBuffer {
    PixelBuffer::packed_unchecked(
        source.width(),
        source.height(),
        channels,
        source.element(),
        data,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_three_channels() {
        let src = PixelBuffer::from_packed(2, 1, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let out = bgr_to_rgb(&src);

        assert_eq!(out.data(), &[3, 2, 1, 6, 5, 4]);
        // Input untouched
        assert_eq!(src.data(), &[1, 2, 3, 4, 5, 6]);
        // Round trip
        assert_eq!(rgb_to_bgr(&out).data(), src.data());
    }

    #[test]
    fn test_swap_is_noop_for_other_channel_counts() {
        let gray = PixelBuffer::filled(3, 3, &[9]);
        assert_eq!(swap_channel_order(&gray), gray);

        let bgra = PixelBuffer::filled(2, 2, &[1, 2, 3, 4]);
        assert_eq!(swap_channel_order(&bgra), bgra);
    }

    #[test]
    fn test_swap_float_samples() {
        let src = PixelBuffer::from_f32(1, 1, 3, &[0.1, 0.2, 0.3]).unwrap();
        let out = swap_channel_order(&src);
        assert_eq!(out.to_f32_samples().unwrap(), vec![0.3, 0.2, 0.1]);
    }

    #[test]
    fn test_swap_strips_padding() {
        let data = vec![1, 2, 3, 0, 4, 5, 6, 0];
        let src = PixelBuffer::new(1, 2, 3, ElementType::U8, 4, data).unwrap();
        let out = swap_channel_order(&src);

        assert!(out.is_contiguous());
        assert_eq!(out.data(), &[3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_drop_alpha() {
        let src = PixelBuffer::from_packed(2, 1, 4, vec![1, 2, 3, 255, 4, 5, 6, 128]).unwrap();
        let out = drop_alpha(&src).unwrap();

        assert_eq!(out.channels(), 3);
        assert_eq!(out.data(), &[1, 2, 3, 4, 5, 6]);

        assert!(drop_alpha(&out).is_err());
    }

    #[test]
    fn test_gray_conversion() {
        let src = PixelBuffer::from_packed(
            4,
            1,
            3,
            vec![0, 0, 0, 255, 255, 255, 255, 0, 0, 0, 0, 255],
        )
        .unwrap();
        let gray = bgr_to_gray(&src).unwrap();

        assert_eq!(gray.channels(), 1);
        assert_eq!(gray.data()[0], 0);
        assert_eq!(gray.data()[1], 255);
        // Pure blue is darker than pure red
        assert!(gray.data()[2] < gray.data()[3]);
        assert_eq!(gray.data()[2], 29);
        assert_eq!(gray.data()[3], 76);
    }
}
