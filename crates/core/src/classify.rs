//! Stream object classification.
//!
//! Turns the loosely-typed stream dictionaries handed over by the document
//! backend into [`ImageDescriptor`]s. Every attribute lookup is optional; the
//! only hard requirements are the dimensions and sample depth of images that
//! will later need pixel reconstruction.

use crate::error::ExtractError;
use crate::types::{
    AttrValue, Attributes, Classified, ColorSpace, Encoding, ImageDescriptor, StreamObject,
};

/// Classify every image stream in `objects`, preserving encounter order.
///
/// Streams whose `Subtype` is not `Image` (fonts, content streams, XMP
/// metadata, ...) are skipped. Each image yields either a descriptor or the
/// [`ExtractError::MalformedInput`] that prevents reconstructing it.
pub fn classify(objects: &[StreamObject]) -> Vec<Classified> {
    objects
        .iter()
        .filter(|obj| is_image(&obj.attributes))
        .map(describe)
        .collect()
}

/// Whether a stream dictionary declares `/Subtype /Image`.
pub fn is_image(attrs: &Attributes) -> bool {
    attrs
        .get("Subtype")
        .and_then(AttrValue::as_name)
        .is_some_and(|n| n == "Image")
}

/// Build the descriptor for a single image stream.
pub fn describe(obj: &StreamObject) -> Classified {
    let attrs = &obj.attributes;
    let encoding = encoding_from_filter(filter_name(attrs));
    let color_space = color_space_of(attrs);

    let name = attrs
        .get("Name")
        .and_then(|v| match v {
            AttrValue::Name(n) => Some(n.clone()),
            AttrValue::Str(s) => Some(String::from_utf8_lossy(s).into_owned()),
            _ => None,
        })
        .unwrap_or_else(|| format!("Object{}", obj.position));

    let alpha_ref = attrs.get("SMask").and_then(AttrValue::as_reference);

    let (width, height, bits_per_component) = match encoding {
        Encoding::RawDeflate => (
            required_dimension(obj, "Width")?,
            required_dimension(obj, "Height")?,
            required_depth(obj)?,
        ),
        // JPEG streams are passed through, their own headers carry the truth.
        Encoding::JpegDct => (
            optional_dimension(attrs, "Width").unwrap_or(0),
            optional_dimension(attrs, "Height").unwrap_or(0),
            attrs
                .get("BitsPerComponent")
                .and_then(AttrValue::as_integer)
                .and_then(|v| u8::try_from(v).ok())
                .unwrap_or(0),
        ),
    };

    Ok(ImageDescriptor {
        reference: obj.reference,
        name,
        width,
        height,
        bits_per_component,
        color_space,
        encoding,
        payload: obj.payload.clone(),
        alpha_ref,
        consumed_as_alpha: false,
        linked_alpha: None,
    })
}

/// Map a filter name to the descriptor encoding.
pub fn encoding_from_filter(filter: Option<&str>) -> Encoding {
    match filter {
        Some("DCTDecode") => Encoding::JpegDct,
        _ => Encoding::RawDeflate,
    }
}

/// Extract the first filter name from a stream dictionary.
///
/// The `Filter` entry can be a single `Name` or an `Array` of names.
fn filter_name(attrs: &Attributes) -> Option<&str> {
    match attrs.get("Filter")? {
        AttrValue::Name(name) => Some(name.as_str()),
        AttrValue::Array(arr) => arr.first().and_then(AttrValue::as_name),
        _ => None,
    }
}

fn color_space_of(attrs: &Attributes) -> ColorSpace {
    match attrs.get("ColorSpace") {
        None | Some(AttrValue::Null) => ColorSpace::Unknown,
        Some(AttrValue::Name(n)) if n == "DeviceGray" => ColorSpace::Gray,
        Some(_) => ColorSpace::Rgb,
    }
}

fn optional_dimension(attrs: &Attributes, key: &str) -> Option<u32> {
    attrs
        .get(key)
        .and_then(AttrValue::as_integer)
        .and_then(|v| u32::try_from(v).ok())
}

fn required_dimension(obj: &StreamObject, key: &str) -> Result<u32, ExtractError> {
    let malformed = |detail: String| ExtractError::MalformedInput {
        reference: obj.reference,
        detail,
    };

    let value = obj
        .attributes
        .get(key)
        .ok_or_else(|| malformed(format!("missing {key}")))?;

    let number = value
        .as_integer()
        .ok_or_else(|| malformed(format!("{key} is not an integer: {value:?}")))?;

    match u32::try_from(number) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(malformed(format!("{key} must be positive, got {number}"))),
    }
}

fn required_depth(obj: &StreamObject) -> Result<u8, ExtractError> {
    let malformed = |detail: String| ExtractError::MalformedInput {
        reference: obj.reference,
        detail,
    };

    let value = obj
        .attributes
        .get("BitsPerComponent")
        .ok_or_else(|| malformed("missing BitsPerComponent".to_string()))?;

    value
        .as_integer()
        .and_then(|v| u8::try_from(v).ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| malformed(format!("invalid BitsPerComponent: {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectRef;

    fn image_attrs() -> Attributes {
        let mut attrs = Attributes::new();
        attrs.set("Subtype", AttrValue::Name("Image".into()));
        attrs.set("Width", AttrValue::Integer(4));
        attrs.set("Height", AttrValue::Integer(2));
        attrs.set("BitsPerComponent", AttrValue::Integer(8));
        attrs.set("ColorSpace", AttrValue::Name("DeviceRGB".into()));
        attrs.set("Filter", AttrValue::Name("FlateDecode".into()));
        attrs
    }

    fn stream(number: u32, position: usize, attributes: Attributes) -> StreamObject {
        StreamObject {
            reference: ObjectRef::new(number, 0),
            position,
            attributes,
            payload: vec![1, 2, 3],
        }
    }

    #[test]
    fn skips_non_image_streams() {
        let mut font = Attributes::new();
        font.set("Subtype", AttrValue::Name("Type1C".into()));
        let content = Attributes::new();

        let objects = vec![
            stream(1, 1, font),
            stream(2, 2, content),
            stream(3, 3, image_attrs()),
        ];
        let batch = classify(&objects);

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].as_ref().unwrap().reference, ObjectRef::new(3, 0));
    }

    #[test]
    fn preserves_encounter_order() {
        let objects = vec![
            stream(7, 1, image_attrs()),
            stream(3, 2, image_attrs()),
            stream(5, 3, image_attrs()),
        ];
        let refs: Vec<u32> = classify(&objects)
            .into_iter()
            .map(|c| c.unwrap().reference.number)
            .collect();
        assert_eq!(refs, vec![7, 3, 5]);
    }

    #[test]
    fn describes_rgb_flate_image() {
        let desc = describe(&stream(3, 3, image_attrs())).unwrap();
        assert_eq!(desc.width, 4);
        assert_eq!(desc.height, 2);
        assert_eq!(desc.bits_per_component, 8);
        assert_eq!(desc.color_space, ColorSpace::Rgb);
        assert_eq!(desc.encoding, Encoding::RawDeflate);
        assert_eq!(desc.payload, vec![1, 2, 3]);
        assert!(desc.alpha_ref.is_none());
        assert!(!desc.consumed_as_alpha);
        assert!(desc.linked_alpha.is_none());
    }

    #[test]
    fn default_name_uses_position() {
        let desc = describe(&stream(3, 11, image_attrs())).unwrap();
        assert_eq!(desc.name, "Object11");
    }

    #[test]
    fn explicit_name_wins() {
        let mut attrs = image_attrs();
        attrs.set("Name", AttrValue::Name("Im0".into()));
        let desc = describe(&stream(3, 11, attrs)).unwrap();
        assert_eq!(desc.name, "Im0");
    }

    #[test]
    fn color_space_mapping() {
        let mut attrs = image_attrs();
        attrs.set("ColorSpace", AttrValue::Name("DeviceGray".into()));
        assert_eq!(describe(&stream(1, 1, attrs)).unwrap().color_space, ColorSpace::Gray);

        let mut attrs = image_attrs();
        attrs.set(
            "ColorSpace",
            AttrValue::Array(vec![
                AttrValue::Name("ICCBased".into()),
                AttrValue::Reference(ObjectRef::new(20, 0)),
            ]),
        );
        assert_eq!(describe(&stream(1, 1, attrs)).unwrap().color_space, ColorSpace::Rgb);

        let mut attrs: Attributes = image_attrs()
            .iter()
            .filter(|(k, _)| *k != "ColorSpace")
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        attrs.set("Name", AttrValue::Name("NoColorSpace".into()));
        assert_eq!(
            describe(&stream(1, 1, attrs)).unwrap().color_space,
            ColorSpace::Unknown
        );
    }

    #[test]
    fn filter_mapping() {
        assert_eq!(encoding_from_filter(Some("DCTDecode")), Encoding::JpegDct);
        assert_eq!(encoding_from_filter(Some("FlateDecode")), Encoding::RawDeflate);
        assert_eq!(encoding_from_filter(None), Encoding::RawDeflate);

        let mut attrs = image_attrs();
        attrs.set(
            "Filter",
            AttrValue::Array(vec![AttrValue::Name("DCTDecode".into())]),
        );
        assert_eq!(describe(&stream(1, 1, attrs)).unwrap().encoding, Encoding::JpegDct);
    }

    #[test]
    fn smask_reference_becomes_alpha_ref() {
        let mut attrs = image_attrs();
        attrs.set("SMask", AttrValue::Reference(ObjectRef::new(9, 0)));
        let desc = describe(&stream(1, 1, attrs)).unwrap();
        assert_eq!(desc.alpha_ref, Some(ObjectRef::new(9, 0)));
    }

    #[test]
    fn missing_width_is_malformed() {
        let attrs: Attributes = image_attrs()
            .iter()
            .filter(|(k, _)| *k != "Width")
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let err = describe(&stream(6, 1, attrs)).unwrap_err();
        assert_eq!(
            err,
            ExtractError::MalformedInput {
                reference: ObjectRef::new(6, 0),
                detail: "missing Width".into(),
            }
        );
    }

    #[test]
    fn zero_height_is_malformed() {
        let mut attrs = image_attrs();
        attrs.set("Height", AttrValue::Integer(0));
        assert!(matches!(
            describe(&stream(6, 1, attrs)),
            Err(ExtractError::MalformedInput { .. })
        ));
    }

    #[test]
    fn missing_depth_is_malformed() {
        let attrs: Attributes = image_attrs()
            .iter()
            .filter(|(k, _)| *k != "BitsPerComponent")
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        assert!(matches!(
            describe(&stream(6, 1, attrs)),
            Err(ExtractError::MalformedInput { .. })
        ));
    }

    #[test]
    fn jpeg_without_dimensions_is_accepted() {
        let mut attrs = Attributes::new();
        attrs.set("Subtype", AttrValue::Name("Image".into()));
        attrs.set("Filter", AttrValue::Name("DCTDecode".into()));
        let desc = describe(&stream(8, 1, attrs)).unwrap();
        assert_eq!(desc.encoding, Encoding::JpegDct);
        assert_eq!((desc.width, desc.height), (0, 0));
    }
}
