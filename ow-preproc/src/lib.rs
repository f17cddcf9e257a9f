//! Overwatch frame preprocessing
//!
//! Turns raw camera frames into inference tensors and JPEG codestreams,
//! one frame at a time or in batches.
//!
//! Key properties:
//! - Per-frame results: one bad frame never fails its batch
//! - Batch results keep input order
//! - One encoder per task, leased from a shared pool
//! - Rayon batch workers, or a FIFO worker pool for async submission

mod batch;
pub mod config;
pub mod encoder_pool;
pub mod error;
pub mod pool;
pub mod processor;
pub mod result;
pub mod stats;

pub use config::*;
pub use encoder_pool::{EncoderLease, EncoderPool, EncoderSlot, PoolStats};
pub use error::*;
pub use pool::*;
pub use processor::*;
pub use result::*;
pub use stats::*;

pub use ow_frame::{Dimensions, ElementType, ErrorKind, FrameError, Interpolation, PixelBuffer};
pub use ow_jpeg::{EncodeConfig, Subsampling};
