//! Pixel reconstruction for deflate-compressed image streams.

use crate::codec::Inflate;
use crate::error::ExtractError;
use crate::types::{AlphaMask, ColorLayout, ColorSpace, ImageDescriptor, ObjectRef, PixelBuffer};

/// Decompress an image (and its linked mask) and interleave the samples into
/// a buffer laid out for the PNG encoder.
///
/// Each plane is inflated up to one byte past its expected length, so an
/// overlong stream still reads as a length mismatch without being buffered
/// in full.
pub fn reconstruct(
    image: &ImageDescriptor,
    inflate: &impl Inflate,
) -> Result<PixelBuffer, ExtractError> {
    let layout = select_layout(image, image.linked_alpha.is_some())?;
    check_addressable(image, layout)?;
    let expected = color_len(image, layout)?;

    let color = inflate
        .inflate(&image.payload, expected.saturating_add(1))
        .map_err(|source| ExtractError::DecompressionFailure {
            reference: image.reference,
            source,
        })?;

    let alpha = match &image.linked_alpha {
        Some(mask) => Some(alpha_samples(image, mask, inflate)?),
        None => None,
    };

    interleave(image, &color, alpha.as_deref())
}

/// Pick the output layout for an image.
pub fn select_layout(
    image: &ImageDescriptor,
    has_alpha: bool,
) -> Result<ColorLayout, ExtractError> {
    let unsupported = |detail: String| ExtractError::UnsupportedLayout {
        reference: image.reference,
        detail,
    };

    let gray = match (image.bits_per_component, image.color_space) {
        (8, ColorSpace::Gray) | (1, ColorSpace::Gray) => true,
        (8, ColorSpace::Rgb | ColorSpace::Unknown) => false,
        (1, _) => return Err(unsupported("1-bit samples require DeviceGray".into())),
        (bpc, _) => return Err(unsupported(format!("{bpc} bits per component"))),
    };

    Ok(match (gray, has_alpha) {
        (true, false) => ColorLayout::Grayscale,
        (true, true) => ColorLayout::GrayscaleAlpha,
        (false, false) => ColorLayout::Rgb,
        (false, true) => ColorLayout::RgbAlpha,
    })
}

/// Build the interleaved buffer from already-decompressed samples.
///
/// `alpha`, when present, holds one 8-bit sample per pixel in source order.
pub fn interleave(
    image: &ImageDescriptor,
    color: &[u8],
    alpha: Option<&[u8]>,
) -> Result<PixelBuffer, ExtractError> {
    let layout = select_layout(image, alpha.is_some())?;
    check_addressable(image, layout)?;
    let (width, height) = (image.width, image.height);

    if let Some(alpha) = alpha {
        let pixels = pixel_count(width, height)
            .ok_or_else(|| too_large(image.reference, width, height))?;
        check_len(image, pixels, alpha.len())?;
    }
    check_len(image, color_len(image, layout)?, color.len())?;

    let data = if image.bits_per_component == 1 {
        let samples = unpack_bits(color, width, height);
        fill_backward(&samples, alpha, layout)
    } else {
        fill_forward(color, source_channels(layout), alpha, layout)
    };

    Ok(PixelBuffer {
        layout,
        width,
        height,
        data,
    })
}

/// The interleaved output must fit in memory addressable by `usize`.
fn check_addressable(image: &ImageDescriptor, layout: ColorLayout) -> Result<(), ExtractError> {
    match PixelBuffer::expected_len(layout, image.width, image.height) {
        Some(_) => Ok(()),
        None => Err(too_large(image.reference, image.width, image.height)),
    }
}

/// Byte length of the decompressed color plane for `layout`.
fn color_len(image: &ImageDescriptor, layout: ColorLayout) -> Result<usize, ExtractError> {
    let len = if image.bits_per_component == 1 {
        packed_len(image.width, image.height)
    } else {
        pixel_count(image.width, image.height)
            .and_then(|n| n.checked_mul(source_channels(layout)))
    };
    len.ok_or_else(|| too_large(image.reference, image.width, image.height))
}

fn source_channels(layout: ColorLayout) -> usize {
    layout.channels() - usize::from(layout.has_alpha())
}

/// Row-major copy, `source_channels` bytes per pixel, alpha appended per pixel.
fn fill_forward(
    color: &[u8],
    source_channels: usize,
    alpha: Option<&[u8]>,
    layout: ColorLayout,
) -> Vec<u8> {
    let pixel_count = color.len() / source_channels;
    let mut out = Vec::with_capacity(pixel_count * layout.channels());

    for (k, pixel) in color.chunks_exact(source_channels).enumerate() {
        out.extend_from_slice(pixel);
        if let Some(alpha) = alpha {
            out.push(alpha[k]);
        }
    }

    out
}

/// 1-bit grayscale path. Samples are written from the end of the buffer
/// backward: pixel `k` lands in the slot starting at
/// `len - (k + 1) * channels`, with its alpha sample right after the gray
/// one.
fn fill_backward(samples: &[u8], alpha: Option<&[u8]>, layout: ColorLayout) -> Vec<u8> {
    let channels = layout.channels();
    let len = samples.len() * channels;
    let mut out = vec![0u8; len];

    for (k, &sample) in samples.iter().enumerate() {
        let write_cursor = (k + 1) * channels;
        let slot = len - write_cursor;
        out[slot] = sample;
        if let Some(alpha) = alpha {
            out[slot + 1] = alpha[k];
        }
    }

    out
}

/// Decompress a linked mask into one 8-bit alpha sample per pixel.
fn alpha_samples(
    owner: &ImageDescriptor,
    mask: &AlphaMask,
    inflate: &impl Inflate,
) -> Result<Vec<u8>, ExtractError> {
    let pixels = pixel_count(owner.width, owner.height)
        .ok_or_else(|| too_large(owner.reference, owner.width, owner.height))?;
    if (mask.width, mask.height) != (owner.width, owner.height) {
        return Err(ExtractError::BufferSizeMismatch {
            reference: mask.reference,
            expected: pixels,
            actual: (mask.width as usize).saturating_mul(mask.height as usize),
        });
    }

    let expected = match mask.bits_per_component {
        8 => pixels,
        1 => packed_len(mask.width, mask.height)
            .ok_or_else(|| too_large(mask.reference, mask.width, mask.height))?,
        bpc => {
            return Err(ExtractError::UnsupportedLayout {
                reference: mask.reference,
                detail: format!("{bpc}-bit soft mask"),
            })
        }
    };

    let raw = inflate
        .inflate(&mask.payload, expected.saturating_add(1))
        .map_err(|source| ExtractError::DecompressionFailure {
            reference: mask.reference,
            source,
        })?;

    if raw.len() != expected {
        return Err(ExtractError::BufferSizeMismatch {
            reference: mask.reference,
            expected,
            actual: raw.len(),
        });
    }

    Ok(match mask.bits_per_component {
        1 => unpack_bits(&raw, mask.width, mask.height),
        _ => raw,
    })
}

fn pixel_count(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)
}

fn too_large(reference: ObjectRef, width: u32, height: u32) -> ExtractError {
    ExtractError::MalformedInput {
        reference,
        detail: format!("{width}x{height} image is too large to address"),
    }
}

/// Byte length of a 1-bit plane whose rows are padded to whole bytes, or
/// `None` when it overflows `usize`.
pub fn packed_len(width: u32, height: u32) -> Option<usize> {
    (width as usize).div_ceil(8).checked_mul(height as usize)
}

/// Expand a 1-bit plane (MSB first, rows byte-aligned) to one byte per pixel:
/// 0 becomes 0x00, 1 becomes 0xFF.
pub fn unpack_bits(packed: &[u8], width: u32, height: u32) -> Vec<u8> {
    let width = width as usize;
    let bytes_per_row = width.div_ceil(8);
    let capacity = width
        .saturating_mul(height as usize)
        .min(packed.len().saturating_mul(8));
    let mut result = Vec::with_capacity(capacity);

    for row in packed.chunks_exact(bytes_per_row).take(height as usize) {
        for col in 0..width {
            let bit = (row[col / 8] >> (7 - col % 8)) & 1;
            result.push(if bit == 1 { 0xFF } else { 0x00 });
        }
    }

    result
}

fn check_len(image: &ImageDescriptor, expected: usize, actual: usize) -> Result<(), ExtractError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ExtractError::BufferSizeMismatch {
            reference: image.reference,
            expected,
            actual,
        })
    }
}
