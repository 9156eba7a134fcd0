use pdfimages_core::{AttrValue, Attributes, ObjectRef, StreamObject};

use crate::PdfError;

/// Nesting limit when following indirect references inside a stream
/// dictionary. Guards against reference cycles.
const MAX_RESOLVE_DEPTH: usize = 8;

// ---------------------------------------------------------------------------
// Object conversion
// ---------------------------------------------------------------------------

/// Convert a `lopdf::Object` into an [`AttrValue`].
///
/// References to plain objects are resolved in place so the core sees
/// concrete values (an indirect `/Width 7 0 R` becomes an integer).
/// References to streams are preserved as `AttrValue::Reference`; this is how
/// `/SMask` links survive the conversion.
fn convert_at(doc: &lopdf::Document, obj: &lopdf::Object, depth: usize) -> AttrValue {
    match obj {
        lopdf::Object::Null => AttrValue::Null,
        lopdf::Object::Boolean(b) => AttrValue::Bool(*b),
        lopdf::Object::Integer(i) => AttrValue::Integer(*i),
        lopdf::Object::Real(f) => AttrValue::Real(*f),
        lopdf::Object::Name(n) => AttrValue::Name(String::from_utf8_lossy(n).into_owned()),
        lopdf::Object::String(s, _) => AttrValue::Str(s.clone()),
        lopdf::Object::Array(arr) => AttrValue::Array(
            arr.iter()
                .map(|item| convert_at(doc, item, depth))
                .collect(),
        ),
        lopdf::Object::Dictionary(dict) => AttrValue::Dictionary(convert_dict(doc, dict, depth)),
        lopdf::Object::Stream(stream) => {
            AttrValue::Dictionary(convert_dict(doc, &stream.dict, depth))
        }
        lopdf::Object::Reference(id) => resolve_reference(doc, *id, depth),
    }
}

fn convert_dict(doc: &lopdf::Document, dict: &lopdf::Dictionary, depth: usize) -> Attributes {
    dict.iter()
        .map(|(k, v)| {
            (
                String::from_utf8_lossy(k).into_owned(),
                convert_at(doc, v, depth),
            )
        })
        .collect()
}

fn resolve_reference(doc: &lopdf::Document, id: lopdf::ObjectId, depth: usize) -> AttrValue {
    if depth >= MAX_RESOLVE_DEPTH {
        log::debug!("reference {} {} R nested too deeply, left unresolved", id.0, id.1);
        return AttrValue::Reference(id.into());
    }

    match doc.objects.get(&id) {
        Some(lopdf::Object::Stream(_)) | None => AttrValue::Reference(id.into()),
        Some(target) => convert_at(doc, target, depth + 1),
    }
}

// ---------------------------------------------------------------------------
// PdfBackend trait
// ---------------------------------------------------------------------------

/// Abstraction over a PDF parsing backend (currently backed by `lopdf`).
///
/// The extraction pipeline only needs the document's binary stream objects,
/// so that is all a backend has to provide.
pub trait PdfBackend {
    /// Every stream object of the document, in ascending object-number order.
    fn stream_objects(&self) -> Vec<StreamObject>;
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] implementation backed by [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }
}

impl PdfBackend for LopdfBackend {
    fn stream_objects(&self) -> Vec<StreamObject> {
        self.doc
            .objects
            .iter()
            .enumerate()
            .filter_map(|(i, (id, obj))| match obj {
                lopdf::Object::Stream(stream) => Some(StreamObject {
                    reference: ObjectRef::from(*id),
                    position: i + 1,
                    attributes: convert_dict(&self.doc, &stream.dict, 0),
                    payload: stream.content.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
