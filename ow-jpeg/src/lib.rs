//! Overwatch JPEG encoder
//!
//! Compresses 8-bit BGR/gray pixel buffers into JPEG codestreams with
//! configurable quality, chroma subsampling, Huffman optimization and
//! progressive scans.
//!
//! A [`JpegEncoder`] owns mutable scratch state and is driven through
//! `&mut self`; parallel callers must each hold their own instance.

pub mod config;
pub mod encoder;

pub use config::*;
pub use encoder::*;
