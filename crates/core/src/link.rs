//! Alpha-mask linking.
//!
//! A soft mask is a separate grayscale image stream referenced from its owner
//! through `/SMask`. Linking happens in place on the classified batch: the
//! mask is flagged as consumed so it is never emitted on its own, and the
//! owner receives an owned [`AlphaMask`](crate::types::AlphaMask) snapshot.

use std::collections::HashMap;

use crate::types::{Classified, Encoding, ObjectRef};

/// Attach every RawDeflate image to the mask named by its `alpha_ref`.
///
/// Unresolvable references (missing object, malformed mask, self reference)
/// degrade to "no alpha". A mask claimed by more than one owner stays linked
/// to all of them; the repeated claim is logged as an anomaly.
///
/// Running this more than once leaves the batch unchanged.
pub fn link_alpha_masks(batch: &mut [Classified]) {
    let index: HashMap<ObjectRef, usize> = batch
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| entry.as_ref().ok().map(|d| (d.reference, i)))
        .collect();

    for owner_idx in 0..batch.len() {
        let (owner_ref, alpha_ref) = match &batch[owner_idx] {
            Ok(d) if d.encoding == Encoding::RawDeflate && d.linked_alpha.is_none() => {
                match d.alpha_ref {
                    Some(alpha_ref) => (d.reference, alpha_ref),
                    None => continue,
                }
            }
            _ => continue,
        };

        let Some(&mask_idx) = index.get(&alpha_ref) else {
            log::debug!("image {owner_ref}: SMask {alpha_ref} not found, emitting without alpha");
            continue;
        };

        if mask_idx == owner_idx {
            log::debug!("image {owner_ref}: SMask points at itself, ignoring");
            continue;
        }

        let mask = match &mut batch[mask_idx] {
            Ok(mask) => mask,
            Err(_) => continue,
        };

        if mask.consumed_as_alpha {
            log::warn!(
                "image {owner_ref}: SMask {alpha_ref} is already claimed by another image, sharing it"
            );
        }
        mask.consumed_as_alpha = true;
        let snapshot = mask.as_alpha_mask();

        if let Ok(owner) = &mut batch[owner_idx] {
            owner.linked_alpha = Some(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::types::{ColorSpace, ImageDescriptor};

    fn descriptor(number: u32, alpha: Option<u32>) -> ImageDescriptor {
        ImageDescriptor {
            reference: ObjectRef::new(number, 0),
            name: format!("Im{number}"),
            width: 2,
            height: 2,
            bits_per_component: 8,
            color_space: ColorSpace::Rgb,
            encoding: Encoding::RawDeflate,
            payload: vec![number as u8],
            alpha_ref: alpha.map(|n| ObjectRef::new(n, 0)),
            consumed_as_alpha: false,
            linked_alpha: None,
        }
    }

    fn mask(number: u32) -> ImageDescriptor {
        ImageDescriptor {
            color_space: ColorSpace::Gray,
            ..descriptor(number, None)
        }
    }

    fn get(batch: &[Classified], i: usize) -> &ImageDescriptor {
        batch[i].as_ref().unwrap()
    }

    #[test]
    fn links_owner_to_mask() {
        let mut batch = vec![Ok(descriptor(1, Some(2))), Ok(mask(2))];
        link_alpha_masks(&mut batch);

        assert!(get(&batch, 1).consumed_as_alpha);
        assert!(!get(&batch, 0).consumed_as_alpha);
        let linked = get(&batch, 0).linked_alpha.as_ref().unwrap();
        assert_eq!(linked.reference, ObjectRef::new(2, 0));
        assert_eq!(linked.payload, vec![2]);
    }

    #[test]
    fn mask_before_owner_is_found() {
        let mut batch = vec![Ok(mask(2)), Ok(descriptor(1, Some(2)))];
        link_alpha_masks(&mut batch);

        assert!(get(&batch, 0).consumed_as_alpha);
        assert!(get(&batch, 1).linked_alpha.is_some());
    }

    #[test]
    fn unresolved_reference_means_no_alpha() {
        let mut batch = vec![Ok(descriptor(1, Some(42)))];
        link_alpha_masks(&mut batch);

        assert!(get(&batch, 0).linked_alpha.is_none());
        assert!(!get(&batch, 0).consumed_as_alpha);
    }

    #[test]
    fn malformed_mask_is_not_linked() {
        let mut batch = vec![
            Ok(descriptor(1, Some(2))),
            Err(ExtractError::MalformedInput {
                reference: ObjectRef::new(2, 0),
                detail: "missing Width".into(),
            }),
        ];
        link_alpha_masks(&mut batch);
        assert!(get(&batch, 0).linked_alpha.is_none());
    }

    #[test]
    fn self_reference_is_ignored() {
        let mut batch = vec![Ok(descriptor(1, Some(1)))];
        link_alpha_masks(&mut batch);

        assert!(get(&batch, 0).linked_alpha.is_none());
        assert!(!get(&batch, 0).consumed_as_alpha);
    }

    #[test]
    fn jpeg_owner_is_not_linked() {
        let mut owner = descriptor(1, Some(2));
        owner.encoding = Encoding::JpegDct;
        let mut batch = vec![Ok(owner), Ok(mask(2))];
        link_alpha_masks(&mut batch);

        assert!(get(&batch, 0).linked_alpha.is_none());
        assert!(!get(&batch, 1).consumed_as_alpha);
    }

    #[test]
    fn double_claimed_mask_is_shared() {
        let mut batch = vec![
            Ok(descriptor(1, Some(3))),
            Ok(descriptor(2, Some(3))),
            Ok(mask(3)),
        ];
        link_alpha_masks(&mut batch);

        assert!(get(&batch, 2).consumed_as_alpha);
        assert_eq!(
            get(&batch, 0).linked_alpha.as_ref().map(|m| m.reference),
            Some(ObjectRef::new(3, 0))
        );
        assert_eq!(
            get(&batch, 1).linked_alpha.as_ref().map(|m| m.reference),
            Some(ObjectRef::new(3, 0))
        );
    }

    #[test]
    fn linking_is_idempotent() {
        let mut once = vec![
            Ok(descriptor(1, Some(2))),
            Ok(mask(2)),
            Ok(descriptor(4, Some(9))),
        ];
        link_alpha_masks(&mut once);

        let mut twice = once.clone();
        link_alpha_masks(&mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn linking_is_order_independent() {
        let mut forward = vec![Ok(descriptor(1, Some(2))), Ok(mask(2))];
        let mut backward = vec![Ok(mask(2)), Ok(descriptor(1, Some(2)))];
        link_alpha_masks(&mut forward);
        link_alpha_masks(&mut backward);

        assert_eq!(get(&forward, 0), get(&backward, 1));
        assert_eq!(get(&forward, 1), get(&backward, 0));
    }
}
