use pix_blob::{FinalizeEvent, KeyStrategy};

/// Why a notification was dropped without side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Content type absent or not `image/*`.
    NotAnImage,
    /// The object is pipeline output; reprocessing it would loop.
    AlreadyDerived,
    /// The object is outside the original-upload namespace.
    OutsideOriginal,
    /// The backing object disappeared between notify and download.
    SourceMissing,
}

/// Filtering contract for incoming notifications. Returns the reason
/// to skip, or `None` when the event should be processed.
pub fn classify(event: &FinalizeEvent, keys: &dyn KeyStrategy) -> Option<SkipReason> {
    let is_image = event
        .content_type
        .as_deref()
        .map(|ct| ct.starts_with("image/"))
        .unwrap_or(false);
    if !is_image {
        return Some(SkipReason::NotAnImage);
    }
    if keys.is_derived(&event.name) {
        return Some(SkipReason::AlreadyDerived);
    }
    if !keys.is_original(&event.name) {
        return Some(SkipReason::OutsideOriginal);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pix_blob::DefaultKeyStrategy;

    fn event(name: &str, content_type: Option<&str>) -> FinalizeEvent {
        FinalizeEvent::new("media", name, content_type)
    }

    #[test]
    fn images_under_original_pass() {
        let keys = DefaultKeyStrategy;
        assert_eq!(
            classify(&event("original/42/cat.jpg", Some("image/jpeg")), &keys),
            None
        );
    }

    #[test]
    fn missing_or_non_image_content_types_are_skipped() {
        let keys = DefaultKeyStrategy;
        assert_eq!(
            classify(&event("original/42/notes.txt", Some("text/plain")), &keys),
            Some(SkipReason::NotAnImage)
        );
        assert_eq!(
            classify(&event("original/42/cat.jpg", None), &keys),
            Some(SkipReason::NotAnImage)
        );
    }

    #[test]
    fn own_output_is_never_reprocessed() {
        let keys = DefaultKeyStrategy;
        assert_eq!(
            classify(
                &event("derived/42/preview_cat.jpg", Some("image/jpeg")),
                &keys
            ),
            Some(SkipReason::AlreadyDerived)
        );
    }

    #[test]
    fn foreign_namespaces_are_skipped() {
        let keys = DefaultKeyStrategy;
        assert_eq!(
            classify(&event("avatars/cat.jpg", Some("image/jpeg")), &keys),
            Some(SkipReason::OutsideOriginal)
        );
    }
}
