//! Bounded data-parallel map over frame batches
//!
//! Results are written index-for-index into a pre-sized vector, so result `i`
//! always belongs to frame `i` whatever order workers finish in. Each frame
//! runs behind its own unwind boundary: a panic becomes that slot's error and
//! siblings are unaffected.

use crate::encoder_pool::{EncoderPool, EncoderSlot};
use crate::result::ProcessedResult;
use ow_frame::{FrameError, PixelBuffer};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run `op` over every frame.
///
/// With `workers` the map is spread over that rayon pool; each rayon split
/// leases its own encoder through an [`EncoderSlot`]. Without workers the
/// frames run on the calling thread with a single slot.
pub(crate) fn run_batch<F>(
    workers: Option<&ThreadPool>,
    encoders: &EncoderPool,
    frames: &[PixelBuffer],
    op: F,
) -> Vec<ProcessedResult>
where
    F: Fn(&PixelBuffer, &mut EncoderSlot<'_>) -> ProcessedResult + Sync,
{
    if frames.is_empty() {
        return Vec::new();
    }

    let results = match workers {
        Some(pool) => pool.install(|| {
            let mut results = Vec::with_capacity(frames.len());
            frames
                .par_iter()
                .map_init(
                    || EncoderSlot::new(encoders),
                    |slot, frame| isolate(|| op(frame, slot)),
                )
                .collect_into_vec(&mut results);
            results
        }),
        None => {
            let mut slot = EncoderSlot::new(encoders);
            frames
                .iter()
                .map(|frame| isolate(|| op(frame, &mut slot)))
                .collect()
        }
    };

    for (index, result) in results.iter().enumerate() {
        if let Err(e) = result {
            log::debug!("Batch frame {} of {} failed: {}", index, frames.len(), e);
        }
    }

    results
}

/// Convert a panic inside `f` into a pipeline error
pub(crate) fn isolate<F>(f: F) -> ProcessedResult
where
    F: FnOnce() -> ProcessedResult,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(FrameError::Pipeline(format!(
            "frame operation panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ProcessedFrame;
    use rayon::ThreadPoolBuilder;

    fn tagged_frames(count: u8) -> Vec<PixelBuffer> {
        (0..count)
            .map(|i| PixelBuffer::filled(u32::from(i) + 1, 1, &[i]))
            .collect()
    }

    fn echo(frame: &PixelBuffer, _slot: &mut EncoderSlot<'_>) -> ProcessedResult {
        Ok(ProcessedFrame::from_buffer(frame.clone()))
    }

    #[test]
    fn test_order_is_preserved() {
        let workers = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        let encoders = EncoderPool::new(4).unwrap();
        let frames = tagged_frames(64);

        let results = run_batch(Some(&workers), &encoders, &frames, echo);

        assert_eq!(results.len(), 64);
        for (i, result) in results.iter().enumerate() {
            let frame = result.as_ref().unwrap();
            assert_eq!(frame.width, i as u32 + 1);
            assert_eq!(frame.data[0], i as u8);
        }
    }

    #[test]
    fn test_panic_is_isolated() {
        let workers = ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let encoders = EncoderPool::new(2).unwrap();
        let frames = tagged_frames(8);

        let results = run_batch(Some(&workers), &encoders, &frames, |frame, slot| {
            if frame.width() == 4 {
                panic!("bad frame");
            }
            echo(frame, slot)
        });

        assert_eq!(results.len(), 8);
        for (i, result) in results.iter().enumerate() {
            if i == 3 {
                let err = result.as_ref().unwrap_err();
                assert!(matches!(err, FrameError::Pipeline(_)));
                assert!(err.message().contains("bad frame"));
            } else {
                assert!(result.is_ok(), "frame {} should succeed", i);
            }
        }
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let workers = ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let encoders = EncoderPool::new(3).unwrap();
        let frames = tagged_frames(20);

        let parallel = run_batch(Some(&workers), &encoders, &frames, echo);
        let sequential = run_batch(None, &encoders, &frames, echo);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_empty_batch() {
        let encoders = EncoderPool::new(1).unwrap();
        assert!(run_batch(None, &encoders, &[], echo).is_empty());
    }

    #[test]
    fn test_encoders_are_not_taken_without_use() {
        let encoders = EncoderPool::new(1).unwrap();
        let frames = tagged_frames(4);

        run_batch(None, &encoders, &frames, echo);
        assert_eq!(encoders.stats().created, 1);
        assert_eq!(encoders.stats().idle, 1);
    }
}
