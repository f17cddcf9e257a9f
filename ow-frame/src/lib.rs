//! Overwatch frame primitives
//!
//! Pixel buffers and the stateless transforms applied to camera frames before
//! inference or encoding.
//!
//! Key properties:
//! - Every transform returns a new buffer; inputs are read-only
//! - Strided input rows, packed output rows
//! - AVX2 SIMD for 8-bit to float sample scaling

pub mod buffer;
pub mod color;
pub mod error;
pub mod normalize;
pub mod resize;
pub mod types;

pub use buffer::*;
pub use color::*;
pub use error::*;
pub use normalize::*;
pub use resize::*;
pub use types::*;
