//! Per-frame results handed back to the host

use ow_frame::{ElementType, FrameError, PixelBuffer, Result};
use ow_jpeg::Codestream;

/// Payload kind of a processed frame
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Raw = 0,  // Packed samples
    Jpeg = 1, // JPEG codestream
}

/// Output of one successful frame operation
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    /// Sample type of raw data (U8 for codestreams)
    pub element: ElementType,
    pub encoding: Encoding,
}

/// Outcome of one frame operation. `Ok` carries data, `Err` the reason.
pub type ProcessedResult = Result<ProcessedFrame>;

impl ProcessedFrame {
    /// Raw frame from a packed pixel buffer
    pub fn from_buffer(buffer: PixelBuffer) -> Self {
        let (width, height, channels, element) = (
            buffer.width(),
            buffer.height(),
            buffer.channels(),
            buffer.element(),
        );
        // Transforms emit packed buffers; repack defensively otherwise
        let data = if buffer.is_contiguous() {
            buffer.into_data()
        } else {
            buffer.to_contiguous()
        };

        Self {
            data,
            width,
            height,
            channels,
            element,
            encoding: Encoding::Raw,
        }
    }

    pub fn from_codestream(codestream: Codestream) -> Self {
        Self {
            data: codestream.data,
            width: codestream.width,
            height: codestream.height,
            channels: codestream.channels,
            element: ElementType::U8,
            encoding: Encoding::Jpeg,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Back into a pixel buffer for further processing. Codestreams are not
    /// pixel data and fail.
    pub fn into_buffer(self) -> Result<PixelBuffer> {
        if self.encoding != Encoding::Raw {
            return Err(FrameError::UnsupportedFormat(
                "encoded frame cannot be used as pixel data".to_string(),
            ));
        }

        let stride = self.width as usize * self.channels as usize * self.element.size();
        PixelBuffer::new(
            self.width,
            self.height,
            self.channels,
            self.element,
            stride,
            self.data,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_round_trip() {
        let buffer = PixelBuffer::filled(3, 2, &[1, 2, 3]);
        let frame = ProcessedFrame::from_buffer(buffer.clone());

        assert_eq!((frame.width, frame.height, frame.channels), (3, 2, 3));
        assert_eq!(frame.encoding, Encoding::Raw);
        assert_eq!(frame.into_buffer().unwrap(), buffer);
    }

    #[test]
    fn test_padded_buffer_is_packed() {
        let data = vec![7, 0, 8, 0];
        let buffer = PixelBuffer::new(1, 2, 1, ElementType::U8, 2, data).unwrap();
        let frame = ProcessedFrame::from_buffer(buffer);
        assert_eq!(frame.data, vec![7, 8]);
    }

    #[test]
    fn test_codestream_is_not_pixel_data() {
        let frame = ProcessedFrame::from_codestream(Codestream {
            data: vec![0xFF, 0xD8, 0xFF, 0xD9],
            width: 8,
            height: 8,
            channels: 3,
        });

        assert_eq!(frame.encoding, Encoding::Jpeg);
        assert_eq!(frame.len(), 4);
        assert!(matches!(
            frame.into_buffer(),
            Err(FrameError::UnsupportedFormat(_))
        ));
    }
}
