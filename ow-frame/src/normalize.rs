//! Sample normalization with AVX2 SIMD optimization
//!
//! Converts 8-bit samples to 32-bit floats in [0, 1], then applies optional
//! per-channel `(v - mean) / std`. AVX2 widens and scales 8 samples per
//! iteration; the scalar path performs the same single-precision multiply, so
//! both paths produce identical bits.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::buffer::{samples_from_bytes, PixelBuffer};
use crate::error::{FrameError, Result};
use crate::types::ElementType;

/// Multiplier applied to every sample
pub const SAMPLE_SCALE: f32 = 1.0 / 255.0;

pub const IDENTITY_MEAN: [f32; 3] = [0.0; 3];
pub const IDENTITY_STD: [f32; 3] = [1.0; 3];

/// Scale to [0, 1] and normalize per channel.
///
/// Mean/std apply to the first `min(3, channels)` channels; further channels
/// are only scaled. Returns a packed float buffer.
pub fn normalize(buffer: &PixelBuffer, mean: &[f32; 3], std: &[f32; 3]) -> Result<PixelBuffer> {
    validate_std(std)?;

    let packed = buffer.to_contiguous();
    let mut samples = match buffer.element() {
        ElementType::U8 => {
            let mut out = vec![0.0f32; packed.len()];
            scale_u8_to_f32(&packed, &mut out);
            out
        }
        ElementType::F32 => {
            let mut out = samples_from_bytes(&packed);
            out.iter_mut().for_each(|v| *v *= SAMPLE_SCALE);
            out
        }
    };

    // (v - 0) / 1 == v exactly for finite v, so skipping is bit-identical
    if !is_identity(mean, std) {
        apply_mean_std(&mut samples, buffer.channels() as usize, mean, std);
    }

    PixelBuffer::from_f32(buffer.width(), buffer.height(), buffer.channels(), &samples)
}

/// Std components must be finite and non-zero
pub fn validate_std(std: &[f32; 3]) -> Result<()> {
    for (i, &s) in std.iter().enumerate() {
        if s == 0.0 || !s.is_finite() {
            return Err(FrameError::Configuration(format!(
                "std[{}] must be finite and non-zero, got {}",
                i, s
            )));
        }
    }
    Ok(())
}

pub fn is_identity(mean: &[f32; 3], std: &[f32; 3]) -> bool {
    *mean == IDENTITY_MEAN && *std == IDENTITY_STD
}

fn apply_mean_std(samples: &mut [f32], channels: usize, mean: &[f32; 3], std: &[f32; 3]) {
    if channels == 0 {
        return;
    }
    let normalized = channels.min(3);

    for px in samples.chunks_exact_mut(channels) {
        for c in 0..normalized {
            px[c] = (px[c] - mean[c]) / std[c];
        }
    }
}

/// Widen and scale 8-bit samples with AVX2
///
/// # Safety
/// Requires AVX2 CPU support. `output` must be at least as long as `input`.
#[target_feature(enable = "avx2")]
#[cfg(target_arch = "x86_64")]
pub unsafe fn scale_u8_to_f32_avx2(input: &[u8], output: &mut [f32]) {
    debug_assert!(output.len() >= input.len());

    let scale = _mm256_set1_ps(SAMPLE_SCALE);
    let len = input.len();
    let mut i = 0;

    // Process 8 samples per iteration
    while i + 8 <= len {
        let bytes = _mm_loadl_epi64(input.as_ptr().add(i) as *const __m128i);
        let ints = _mm256_cvtepu8_epi32(bytes);
        let floats = _mm256_mul_ps(_mm256_cvtepi32_ps(ints), scale);
        _mm256_storeu_ps(output.as_mut_ptr().add(i), floats);
        i += 8;
    }

    // Tail (< 8)
    while i < len {
        *output.get_unchecked_mut(i) = *input.get_unchecked(i) as f32 * SAMPLE_SCALE;
        i += 1;
    }
}

/// Scalar fallback (portable)
pub fn scale_u8_to_f32_scalar(input: &[u8], output: &mut [f32]) {
    for (dst, &src) in output.iter_mut().zip(input) {
        *dst = src as f32 * SAMPLE_SCALE;
    }
}

/// Auto-dispatch with runtime CPU detection
pub fn scale_u8_to_f32(input: &[u8], output: &mut [f32]) {
    assert!(output.len() >= input.len(), "output shorter than input");

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            unsafe {
                scale_u8_to_f32_avx2(input, output);
            }
            return;
        }
    }

    scale_u8_to_f32_scalar(input, output);
}
