use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

// ---------------------------------------------------------------------------
// Document objects
// ---------------------------------------------------------------------------

/// An indirect object identifier: (object number, generation number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub number: u32,
    pub generation: u16,
}

impl ObjectRef {
    pub fn new(number: u32, generation: u16) -> Self {
        ObjectRef { number, generation }
    }
}

impl From<(u32, u16)> for ObjectRef {
    fn from((number, generation): (u32, u16)) -> Self {
        ObjectRef { number, generation }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// A simplified, backend-independent representation of a dictionary value.
///
/// Indirect references to plain objects are expected to be resolved by the
/// backend; references to streams are kept so that cross-stream links such as
/// `SMask` survive.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f32),
    Name(String),
    Str(Vec<u8>),
    Array(Vec<AttrValue>),
    Dictionary(Attributes),
    Reference(ObjectRef),
}

impl AttrValue {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            AttrValue::Name(name) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Integer view of the value. Reals are accepted only when they carry no
    /// fractional part.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttrValue::Integer(i) => Some(*i),
            AttrValue::Real(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            AttrValue::Reference(r) => Some(*r),
            _ => None,
        }
    }
}

/// Stream dictionary with total, non-failing lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(BTreeMap<String, AttrValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) {
        self.0.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, AttrValue)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, AttrValue)>>(iter: T) -> Self {
        Attributes(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A binary stream object as handed over by the document backend.
#[derive(Debug, Clone)]
pub struct StreamObject {
    pub reference: ObjectRef,
    /// 1-based index of the object among every indirect object of the
    /// document. Only used to derive default image names.
    pub position: usize,
    pub attributes: Attributes,
    /// Raw stream bytes, still encoded with the stream's filter.
    pub payload: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Image descriptors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSpace {
    Gray,
    Rgb,
    /// No `ColorSpace` entry. Reconstructed as RGB.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    /// Deflate-compressed raw samples that need pixel reconstruction.
    RawDeflate,
    /// A complete JPEG stream, emitted as-is.
    JpegDct,
}

/// Snapshot of the mask descriptor an image was linked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    pub reference: ObjectRef,
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub payload: Vec<u8>,
}

/// Normalized view of one image stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub reference: ObjectRef,
    pub name: String,
    /// Zero only for JPEG streams that omit their dimensions.
    pub width: u32,
    pub height: u32,
    /// Zero only for JPEG streams that omit `BitsPerComponent`.
    pub bits_per_component: u8,
    pub color_space: ColorSpace,
    pub encoding: Encoding,
    pub payload: Vec<u8>,
    pub alpha_ref: Option<ObjectRef>,
    pub consumed_as_alpha: bool,
    pub linked_alpha: Option<AlphaMask>,
}

impl ImageDescriptor {
    pub fn as_alpha_mask(&self) -> AlphaMask {
        AlphaMask {
            reference: self.reference,
            width: self.width,
            height: self.height,
            bits_per_component: self.bits_per_component,
            payload: self.payload.clone(),
        }
    }
}

/// Result of classifying one image stream.
pub type Classified = Result<ImageDescriptor, ExtractError>;

// ---------------------------------------------------------------------------
// Pixel buffers
// ---------------------------------------------------------------------------

/// Channel arrangement of a reconstructed pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorLayout {
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    RgbAlpha,
}

impl ColorLayout {
    pub fn channels(&self) -> usize {
        match self {
            ColorLayout::Grayscale => 1,
            ColorLayout::GrayscaleAlpha => 2,
            ColorLayout::Rgb => 3,
            ColorLayout::RgbAlpha => 4,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, ColorLayout::GrayscaleAlpha | ColorLayout::RgbAlpha)
    }
}

impl fmt::Display for ColorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorLayout::Grayscale => write!(f, "grayscale"),
            ColorLayout::GrayscaleAlpha => write!(f, "grayscale+alpha"),
            ColorLayout::Rgb => write!(f, "rgb"),
            ColorLayout::RgbAlpha => write!(f, "rgb+alpha"),
        }
    }
}

/// Interleaved 8-bit samples ready for the PNG encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub layout: ColorLayout,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// `width * height * channels`, or `None` when that overflows `usize`.
    pub fn expected_len(layout: ColorLayout, width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(layout.channels())
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageKind::Png => write!(f, "png"),
            ImageKind::Jpeg => write!(f, "jpeg"),
        }
    }
}

/// One emitted output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedImage {
    pub file_name: String,
    pub kind: ImageKind,
    /// Object the image was built from.
    pub source: ObjectRef,
    pub name: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// An image that could not be produced under [`FailurePolicy::Skip`].
#[derive(Debug)]
pub struct ImageFailure {
    pub source: ObjectRef,
    pub name: Option<String>,
    pub error: ExtractError,
}

/// Everything one extraction run produced.
#[derive(Debug, Default)]
pub struct Extraction {
    pub images: Vec<ExtractedImage>,
    pub failures: Vec<ImageFailure>,
}

/// What to do when a single image fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing image and return its error.
    Abort,
    /// Record the failure and keep going with the remaining images.
    #[default]
    Skip,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ref_display() {
        assert_eq!(ObjectRef::new(12, 0).to_string(), "12 0 R");
    }

    #[test]
    fn integer_accepts_whole_reals() {
        assert_eq!(AttrValue::Integer(7).as_integer(), Some(7));
        assert_eq!(AttrValue::Real(640.0).as_integer(), Some(640));
        assert_eq!(AttrValue::Real(640.5).as_integer(), None);
        assert_eq!(AttrValue::Name("Width".into()).as_integer(), None);
    }

    #[test]
    fn attributes_missing_key_is_none() {
        let attrs: Attributes = [("Width", AttrValue::Integer(3))].into_iter().collect();
        assert_eq!(attrs.get("Width"), Some(&AttrValue::Integer(3)));
        assert!(attrs.get("Height").is_none());
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn layout_channels() {
        assert_eq!(ColorLayout::Grayscale.channels(), 1);
        assert_eq!(ColorLayout::GrayscaleAlpha.channels(), 2);
        assert_eq!(ColorLayout::Rgb.channels(), 3);
        assert_eq!(ColorLayout::RgbAlpha.channels(), 4);
    }

    #[test]
    fn kind_extensions() {
        assert_eq!(ImageKind::Png.extension(), "png");
        assert_eq!(ImageKind::Jpeg.extension(), "jpg");
    }

    #[test]
    fn default_policy_is_skip() {
        assert_eq!(FailurePolicy::default(), FailurePolicy::Skip);
    }
}
