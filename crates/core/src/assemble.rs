//! Output assembly: turns the linked batch into named image files.

use crate::codec::{Inflate, PngEncode};
use crate::error::ExtractError;
use crate::reconstruct::reconstruct;
use crate::types::{
    Classified, Encoding, ExtractedImage, Extraction, FailurePolicy, ImageDescriptor,
    ImageFailure, ImageKind, ObjectRef,
};

/// Produce one output per image that was not consumed as a soft mask.
///
/// Outputs are named `out<N>.<ext>` where `N` counts emitted files only, so
/// consumed masks and skipped failures leave no gaps. Under
/// [`FailurePolicy::Abort`] the first failing image ends the run with its
/// error; under [`FailurePolicy::Skip`] it is recorded and the run continues.
pub fn assemble(
    batch: &[Classified],
    inflate: &impl Inflate,
    encoder: &impl PngEncode,
    policy: FailurePolicy,
) -> Result<Extraction, ExtractError> {
    let mut extraction = Extraction::default();

    for entry in batch {
        let image = match entry {
            Ok(image) if image.consumed_as_alpha => continue,
            Ok(image) => image,
            Err(err) => {
                record_failure(&mut extraction, policy, err.reference(), None, err.clone())?;
                continue;
            }
        };

        match render(image, inflate, encoder) {
            Ok((kind, bytes)) => {
                let file_name = format!("out{}.{}", extraction.images.len() + 1, kind.extension());
                log::debug!("image {} -> {file_name} ({} bytes)", image.reference, bytes.len());
                extraction.images.push(ExtractedImage {
                    file_name,
                    kind,
                    source: image.reference,
                    name: image.name.clone(),
                    bytes,
                });
            }
            Err(error) => record_failure(
                &mut extraction,
                policy,
                image.reference,
                Some(image.name.clone()),
                error,
            )?,
        }
    }

    Ok(extraction)
}

fn record_failure(
    extraction: &mut Extraction,
    policy: FailurePolicy,
    source: ObjectRef,
    name: Option<String>,
    error: ExtractError,
) -> Result<(), ExtractError> {
    if policy == FailurePolicy::Abort {
        return Err(error);
    }
    log::warn!("skipping image {source}: {error}");
    extraction.failures.push(ImageFailure {
        source,
        name,
        error,
    });
    Ok(())
}

/// Final bytes for one image: JPEG streams verbatim, everything else
/// reconstructed and PNG-encoded.
fn render(
    image: &ImageDescriptor,
    inflate: &impl Inflate,
    encoder: &impl PngEncode,
) -> Result<(ImageKind, Vec<u8>), ExtractError> {
    match image.encoding {
        Encoding::JpegDct => Ok((ImageKind::Jpeg, image.payload.clone())),
        Encoding::RawDeflate => {
            let pixels = reconstruct(image, inflate)?;
            let bytes = encoder
                .encode(&pixels)
                .map_err(|source| ExtractError::EncodingFailure {
                    reference: image.reference,
                    source,
                })?;
            Ok((ImageKind::Png, bytes))
        }
    }
}
