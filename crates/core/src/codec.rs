//! Seams to the external codecs the pipeline depends on.
//!
//! The core never links a compression or image library itself; callers hand
//! in implementations of these traits (the `pdf` crate ships flate2 and
//! `image` backed ones, tests use in-memory fakes).

use crate::error::CodecError;
use crate::types::PixelBuffer;

/// Inflate a deflate/zlib stream.
pub trait Inflate {
    /// Decompress `data`, producing at most `limit` bytes. Output past the
    /// limit is dropped, never buffered.
    fn inflate(&self, data: &[u8], limit: usize) -> Result<Vec<u8>, CodecError>;
}

/// Encode a reconstructed pixel buffer as a complete PNG file.
///
/// Implementations must reject buffers whose length disagrees with
/// `width * height * channels`.
pub trait PngEncode {
    fn encode(&self, pixels: &PixelBuffer) -> Result<Vec<u8>, CodecError>;
}

impl<T: Inflate + ?Sized> Inflate for &T {
    fn inflate(&self, data: &[u8], limit: usize) -> Result<Vec<u8>, CodecError> {
        (**self).inflate(data, limit)
    }
}

impl<T: PngEncode + ?Sized> PngEncode for &T {
    fn encode(&self, pixels: &PixelBuffer) -> Result<Vec<u8>, CodecError> {
        (**self).encode(pixels)
    }
}
