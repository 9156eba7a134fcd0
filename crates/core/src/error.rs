use thiserror::Error;

use crate::types::ObjectRef;

/// Failure raised by an external collaborator (inflate or PNG encoder).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CodecError(pub String);

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        CodecError(message.into())
    }
}

/// Per-image extraction error. Every variant names the offending object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("malformed image {reference}: {detail}")]
    MalformedInput { reference: ObjectRef, detail: String },

    #[error("unsupported color layout for image {reference}: {detail}")]
    UnsupportedLayout { reference: ObjectRef, detail: String },

    #[error("decompression failed for image {reference}: {source}")]
    DecompressionFailure {
        reference: ObjectRef,
        source: CodecError,
    },

    #[error("buffer size mismatch for image {reference}: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch {
        reference: ObjectRef,
        expected: usize,
        actual: usize,
    },

    #[error("PNG encoding failed for image {reference}: {source}")]
    EncodingFailure {
        reference: ObjectRef,
        source: CodecError,
    },
}

impl ExtractError {
    /// The object the error is about.
    pub fn reference(&self) -> ObjectRef {
        match self {
            ExtractError::MalformedInput { reference, .. }
            | ExtractError::UnsupportedLayout { reference, .. }
            | ExtractError::DecompressionFailure { reference, .. }
            | ExtractError::BufferSizeMismatch { reference, .. }
            | ExtractError::EncodingFailure { reference, .. } => *reference,
        }
    }
}
