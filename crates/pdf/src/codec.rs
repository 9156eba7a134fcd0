//! flate2 and `image` implementations of the core codec traits.

use std::io::{Cursor, Read};

use flate2::read::ZlibDecoder;
use pdfimages_core::{CodecError, ColorLayout, Inflate, PixelBuffer, PngEncode};

/// `FlateDecode` streams are zlib-wrapped deflate data.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlateInflate;

impl Inflate for FlateInflate {
    fn inflate(&self, data: &[u8], limit: usize) -> Result<Vec<u8>, CodecError> {
        let mut decoder = ZlibDecoder::new(data).take(limit as u64);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| CodecError::new(format!("FlateDecode failed: {}", e)))?;
        Ok(decompressed)
    }
}

/// PNG encoder backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePngEncoder;

impl PngEncode for ImagePngEncoder {
    fn encode(&self, pixels: &PixelBuffer) -> Result<Vec<u8>, CodecError> {
        let expected = PixelBuffer::expected_len(pixels.layout, pixels.width, pixels.height)
            .ok_or_else(|| {
                CodecError::new(format!(
                    "{}x{} {} buffer is too large",
                    pixels.width, pixels.height, pixels.layout
                ))
            })?;
        if pixels.data.len() != expected {
            return Err(CodecError::new(format!(
                "{}x{} {} buffer needs {} bytes, got {}",
                pixels.width,
                pixels.height,
                pixels.layout,
                expected,
                pixels.data.len()
            )));
        }

        let (width, height) = (pixels.width, pixels.height);
        let data = pixels.data.clone();
        let dyn_image = match pixels.layout {
            ColorLayout::Grayscale => {
                image::GrayImage::from_raw(width, height, data).map(image::DynamicImage::ImageLuma8)
            }
            ColorLayout::GrayscaleAlpha => image::GrayAlphaImage::from_raw(width, height, data)
                .map(image::DynamicImage::ImageLumaA8),
            ColorLayout::Rgb => {
                image::RgbImage::from_raw(width, height, data).map(image::DynamicImage::ImageRgb8)
            }
            ColorLayout::RgbAlpha => {
                image::RgbaImage::from_raw(width, height, data).map(image::DynamicImage::ImageRgba8)
            }
        }
        .ok_or_else(|| CodecError::new("pixel buffer does not fit the image dimensions"))?;

        let mut buf = Vec::new();
        dyn_image
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| CodecError::new(format!("PNG encoding failed: {}", e)))?;
        Ok(buf)
    }
}
