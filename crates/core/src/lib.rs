//! Core library for pdfimages
//!
//! This crate implements the **Functional Core** of the pdfimages
//! application, following the Functional Core - Imperative Shell pattern.
//!
//! - **`pdfimages_core`** (this crate): classification, mask linking, pixel
//!   reconstruction and output assembly. No I/O, no codec libraries.
//! - **`pdf`**: lopdf document backend plus flate2/`image` codecs.
//! - **`pdfimages`**: CLI and HTTP shell.
//!
//! # Pipeline
//!
//! ```text
//! StreamObject[] --classify--> Classified[] --link_alpha_masks--> Classified[]
//!                --assemble (reconstruct + encode)--> Extraction
//! ```
//!
//! Codecs enter through the [`Inflate`] and [`PngEncode`] traits so every
//! stage can be tested with in-memory fakes.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use pdfimages_core::{extract, FailurePolicy};
//!
//! let extraction = extract(&objects, &inflate, &encoder, FailurePolicy::Skip)?;
//! for image in &extraction.images {
//!     std::fs::write(&image.file_name, &image.bytes)?;
//! }
//! ```

pub mod assemble;
pub mod classify;
pub mod codec;
pub mod error;
pub mod link;
pub mod reconstruct;
pub mod types;

pub use assemble::assemble;
pub use classify::classify;
pub use codec::{Inflate, PngEncode};
pub use error::{CodecError, ExtractError};
pub use link::link_alpha_masks;
pub use reconstruct::reconstruct;
pub use types::*;

/// Run the whole pipeline over the stream objects of one document.
///
/// Deterministic: identical objects and codecs give identical outputs.
pub fn extract(
    objects: &[StreamObject],
    inflate: &impl Inflate,
    encoder: &impl PngEncode,
    policy: FailurePolicy,
) -> Result<Extraction, ExtractError> {
    let mut batch = classify(objects);
    link_alpha_masks(&mut batch);
    assemble(&batch, inflate, encoder, policy)
}
