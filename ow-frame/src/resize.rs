//! Geometric resampling
//!
//! The resampling kernels come from `image::imageops`; this module only maps
//! pixel buffers in and out of it. The output geometry is read back from the
//! resampled image rather than assumed from the request.
//!
//! The float resampler clamps to [0, 1], so float frames are mapped into that
//! interval by their own sample range first and mapped back afterwards.

use crate::buffer::{samples_from_bytes, PixelBuffer};
use crate::error::{FrameError, Result};
use crate::types::{Dimensions, ElementType, Interpolation};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, LumaA, Pixel, Rgb, Rgba};

/// Resize `buffer` to `width` x `height`.
///
/// Non-positive targets are a configuration error. Supports 1-4 channels of
/// either element type. Float samples keep their range; kernel overshoot
/// (cubic, lanczos) is limited to the source frame's min/max. Non-finite
/// float samples are a pipeline error.
pub fn resize(
    buffer: &PixelBuffer,
    width: i32,
    height: i32,
    interpolation: Interpolation,
) -> Result<PixelBuffer> {
    let (dst_width, dst_height) = Dimensions::new(width, height).validate()?;

    if buffer.is_empty() {
        return Err(FrameError::Pipeline(format!(
            "cannot resize empty frame {}x{}",
            buffer.width(),
            buffer.height()
        )));
    }

    let filter = interpolation.filter();
    let (src_width, src_height) = (buffer.width(), buffer.height());
    let channels = buffer.channels();
    let packed = buffer.to_contiguous();

    match buffer.element() {
        ElementType::U8 => {
            let (w, h, samples) = match channels {
                1 => resample::<Luma<u8>>(src_width, src_height, packed, dst_width, dst_height, filter)?,
                2 => resample::<LumaA<u8>>(src_width, src_height, packed, dst_width, dst_height, filter)?,
                3 => resample::<Rgb<u8>>(src_width, src_height, packed, dst_width, dst_height, filter)?,
                4 => resample::<Rgba<u8>>(src_width, src_height, packed, dst_width, dst_height, filter)?,
                n => return Err(unsupported_channels(n)),
            };
            PixelBuffer::from_packed(w, h, channels, samples)
        }
        ElementType::F32 => {
            let mut src = samples_from_bytes(&packed);
            let range = SampleRange::of(&src)?;
            range.compress(&mut src);

            let (w, h, mut samples) = match channels {
                1 => resample::<Luma<f32>>(src_width, src_height, src, dst_width, dst_height, filter)?,
                2 => resample::<LumaA<f32>>(src_width, src_height, src, dst_width, dst_height, filter)?,
                3 => resample::<Rgb<f32>>(src_width, src_height, src, dst_width, dst_height, filter)?,
                4 => resample::<Rgba<f32>>(src_width, src_height, src, dst_width, dst_height, filter)?,
                n => return Err(unsupported_channels(n)),
            };
            range.expand(&mut samples);
            PixelBuffer::from_f32(w, h, channels, &samples)
        }
    }
}

/// Affine map between a frame's sample range and [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
struct SampleRange {
    min: f32,
    span: f32,
}

impl SampleRange {
    fn of(samples: &[f32]) -> Result<Self> {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in samples {
            if !v.is_finite() {
                return Err(FrameError::Pipeline(
                    "cannot resize frame with non-finite samples".to_string(),
                ));
            }
            min = min.min(v);
            max = max.max(v);
        }

        // Uniform frames map to 0 and back to `min` exactly
        let span = max - min;
        let span = if span > 0.0 && span.is_finite() { span } else { 1.0 };
        Ok(Self { min, span })
    }

    fn compress(&self, samples: &mut [f32]) {
        for v in samples.iter_mut() {
            *v = (*v - self.min) / self.span;
        }
    }

    fn expand(&self, samples: &mut [f32]) {
        for v in samples.iter_mut() {
            *v = *v * self.span + self.min;
        }
    }
}

fn unsupported_channels(channels: u32) -> FrameError {
    FrameError::UnsupportedFormat(format!(
        "resize supports 1-4 channels, got {}",
        channels
    ))
}

/// Run the resampler over packed samples; returns the produced geometry
fn resample<P>(
    width: u32,
    height: u32,
    samples: Vec<P::Subpixel>,
    dst_width: u32,
    dst_height: u32,
    filter: FilterType,
) -> Result<(u32, u32, Vec<P::Subpixel>)>
where
    P: Pixel + 'static,
    P::Subpixel: 'static,
{
    let src: ImageBuffer<P, Vec<P::Subpixel>> = ImageBuffer::from_raw(width, height, samples)
        .ok_or_else(|| {
            FrameError::Pipeline(format!(
                "sample count does not match {}x{} frame",
                width, height
            ))
        })?;

    let resized = imageops::resize(&src, dst_width, dst_height, filter);
    let (out_width, out_height) = resized.dimensions();
    Ok((out_width, out_height, resized.into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32, channels: u32) -> PixelBuffer {
        let mut data = Vec::with_capacity((width * height * channels) as usize);
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    data.push(((x * 7 + y * 3 + c * 50) % 256) as u8);
                }
            }
        }
        PixelBuffer::from_packed(width, height, channels, data).unwrap()
    }

    #[test]
    fn test_reports_requested_geometry() {
        let src = gradient(64, 48, 3);

        for &(w, h) in &[(32, 32), (128, 96), (1, 1), (63, 17), (640, 2)] {
            for interpolation in [
                Interpolation::Nearest,
                Interpolation::Linear,
                Interpolation::Area,
                Interpolation::Cubic,
                Interpolation::Lanczos,
            ] {
                let out = resize(&src, w, h, interpolation).unwrap();
                assert_eq!(out.width(), w as u32);
                assert_eq!(out.height(), h as u32);
                assert_eq!(out.channels(), 3);
                assert_eq!(out.data().len(), (w * h * 3) as usize);
            }
        }
    }

    #[test]
    fn test_uniform_color_is_preserved() {
        let src = PixelBuffer::filled(40, 30, &[10, 120, 250]);
        let out = resize(&src, 17, 9, Interpolation::Linear).unwrap();

        for px in out.data().chunks_exact(3) {
            assert_eq!(px, &[10, 120, 250]);
        }
    }

    #[test]
    fn test_non_positive_dims_are_configuration_errors() {
        let src = gradient(8, 8, 1);

        for &(w, h) in &[(0, 8), (8, 0), (-4, 8), (8, -1)] {
            let err = resize(&src, w, h, Interpolation::Linear).unwrap_err();
            assert!(matches!(err, FrameError::Configuration(_)), "{}x{}", w, h);
        }
    }

    #[test]
    fn test_empty_source_fails() {
        let src = PixelBuffer::from_packed(0, 4, 3, Vec::new()).unwrap();
        let err = resize(&src, 4, 4, Interpolation::Linear).unwrap_err();
        assert!(matches!(err, FrameError::Pipeline(_)));
    }

    #[test]
    fn test_padded_source() {
        // 2x2 gray with 2 bytes of padding per row
        let data = vec![50, 50, 0, 0, 50, 50, 0, 0];
        let src = PixelBuffer::new(2, 2, 1, ElementType::U8, 4, data).unwrap();
        let out = resize(&src, 4, 4, Interpolation::Nearest).unwrap();

        assert!(out.is_contiguous());
        assert!(out.data().iter().all(|&v| v == 50));
    }

    #[test]
    fn test_float_buffers() {
        let src = PixelBuffer::from_f32(4, 4, 3, &[0.5f32; 48]).unwrap();
        let out = resize(&src, 2, 2, Interpolation::Linear).unwrap();

        assert_eq!(out.element(), ElementType::F32);
        assert_eq!(out.data().len(), 2 * 2 * 3 * 4);
        for v in out.to_f32_samples().unwrap() {
            assert!((v - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_float_range_is_kept() {
        let src = PixelBuffer::from_f32(4, 4, 1, &[-0.5f32; 16]).unwrap();
        let out = resize(&src, 4, 4, Interpolation::Linear).unwrap();
        assert!(out.to_f32_samples().unwrap().iter().all(|&v| v == -0.5));

        // Mean/std normalized pixel, well below zero
        let pixel = [-2.117904f32, -2.0357141, -1.8044444];
        let samples: Vec<f32> = pixel.iter().copied().cycle().take(8 * 8 * 3).collect();
        let src = PixelBuffer::from_f32(8, 8, 3, &samples).unwrap();

        for interpolation in [Interpolation::Nearest, Interpolation::Linear, Interpolation::Area] {
            let out = resize(&src, 4, 4, interpolation).unwrap();
            for px in out.to_f32_samples().unwrap().chunks_exact(3) {
                for (v, expected) in px.iter().zip(pixel) {
                    assert!((v - expected).abs() < 1e-5, "{:?}: {} vs {}", interpolation, v, expected);
                }
            }
        }
    }

    #[test]
    fn test_float_ramp_interpolates_beyond_unit_range() {
        // Columns 0, 10 upscaled: every output lies between them and the
        // edges keep the source values
        let src = PixelBuffer::from_f32(2, 1, 1, &[0.0, 10.0]).unwrap();
        let out = resize(&src, 4, 1, Interpolation::Linear).unwrap();
        let samples = out.to_f32_samples().unwrap();

        assert!(samples.iter().all(|&v| (0.0..=10.0).contains(&v)));
        assert!(samples.windows(2).all(|w| w[0] <= w[1]));
        assert!(samples[3] > 5.0);
    }

    #[test]
    fn test_non_finite_float_fails() {
        let src = PixelBuffer::from_f32(2, 1, 1, &[f32::NAN, 1.0]).unwrap();
        let err = resize(&src, 4, 4, Interpolation::Linear).unwrap_err();
        assert!(matches!(err, FrameError::Pipeline(_)));
    }

    #[test]
    fn test_too_many_channels() {
        let src = PixelBuffer::filled(4, 4, &[1, 2, 3, 4, 5]);
        let err = resize(&src, 2, 2, Interpolation::Linear).unwrap_err();
        assert!(matches!(err, FrameError::UnsupportedFormat(_)));
    }
}
