//! Serializable summaries of an extraction run, shared by the CLI's `--json`
//! output and the HTTP response body.

use base64::Engine;
use serde::Serialize;

use pdfimages_core::{Extraction, ImageKind};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntry {
    pub file_name: String,
    pub kind: ImageKind,
    pub size: usize,
    pub source: String,
    pub name: String,
    /// Base64-encoded file contents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureEntry {
    pub source: String,
    pub name: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub images: Vec<ImageEntry>,
    pub failures: Vec<FailureEntry>,
}

impl Report {
    pub fn from_extraction(extraction: &Extraction, include_data: bool) -> Self {
        let images = extraction
            .images
            .iter()
            .map(|img| ImageEntry {
                file_name: img.file_name.clone(),
                kind: img.kind,
                size: img.bytes.len(),
                source: img.source.to_string(),
                name: img.name.clone(),
                data: include_data
                    .then(|| base64::engine::general_purpose::STANDARD.encode(&img.bytes)),
            })
            .collect();

        let failures = extraction
            .failures
            .iter()
            .map(|failure| FailureEntry {
                source: failure.source.to_string(),
                name: failure.name.clone(),
                error: failure.error.to_string(),
            })
            .collect();

        Report { images, failures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfimages_core::{ExtractError, ExtractedImage, ImageFailure, ObjectRef};

    fn extraction() -> Extraction {
        Extraction {
            images: vec![ExtractedImage {
                file_name: "out1.jpg".into(),
                kind: ImageKind::Jpeg,
                source: ObjectRef::new(5, 0),
                name: "Im0".into(),
                bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            }],
            failures: vec![ImageFailure {
                source: ObjectRef::new(9, 0),
                name: Some("Object9".into()),
                error: ExtractError::BufferSizeMismatch {
                    reference: ObjectRef::new(9, 0),
                    expected: 12,
                    actual: 11,
                },
            }],
        }
    }

    #[test]
    fn json_shape_matches_http_contract() {
        let report = Report::from_extraction(&extraction(), true);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(
            json["images"][0],
            serde_json::json!({
                "fileName": "out1.jpg",
                "kind": "jpeg",
                "size": 4,
                "source": "5 0 R",
                "name": "Im0",
                "data": "/9j/2Q==",
            })
        );
        assert_eq!(json["failures"][0]["source"], "9 0 R");
        assert_eq!(json["failures"][0]["name"], "Object9");
        assert_eq!(
            json["failures"][0]["error"],
            "buffer size mismatch for image 9 0 R: expected 12 bytes, got 11"
        );
    }

    #[test]
    fn data_is_omitted_on_request() {
        let report = Report::from_extraction(&extraction(), false);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["images"][0].get("data").is_none());
    }
}
