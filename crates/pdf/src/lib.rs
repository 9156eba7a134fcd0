use serde::{Deserialize, Serialize};
use thiserror::Error;

use parser::backend::{LopdfBackend, PdfBackend};
use pdfimages_core::{ExtractError, Extraction, FailurePolicy};

pub mod codec;
pub mod parser;

pub use codec::{FlateInflate, ImagePngEncoder};

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Library-level extraction settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// What happens when a single image cannot be produced.
    pub policy: FailurePolicy,
}

impl ExtractOptions {
    pub fn with_policy(policy: FailurePolicy) -> Self {
        ExtractOptions { policy }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Extract every embedded image from a PDF held in memory.
///
/// Parses the document with lopdf, inflates with flate2 and encodes PNGs with
/// the `image` crate. Identical input always yields identical output.
pub fn extract_images(bytes: &[u8], options: &ExtractOptions) -> Result<Extraction, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    extract_from(&backend, options)
}

/// Run the pipeline over any [`PdfBackend`].
pub fn extract_from(
    backend: &impl PdfBackend,
    options: &ExtractOptions,
) -> Result<Extraction, PdfError> {
    let objects = backend.stream_objects();
    log::debug!("document has {} stream objects", objects.len());

    let extraction = pdfimages_core::extract(
        &objects,
        &FlateInflate,
        &ImagePngEncoder,
        options.policy,
    )?;

    log::debug!(
        "extracted {} images, {} failures",
        extraction.images.len(),
        extraction.failures.len()
    );
    Ok(extraction)
}
