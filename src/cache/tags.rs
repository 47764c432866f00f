//! Tag-composed cache keys.
//!
//! The effective key is the base key followed directly by the tag list joined
//! with [`TAG_SEPARATOR`], after [`MARKER_TAG`] has been appended to the list.
//! There is no separator between the base key and the first tag, so
//! `compose("k", ["a"])` yields `"ka,used"`.

/// Tag appended to every tag list before the key is derived.
pub const MARKER_TAG: &str = "used";

/// Separator placed between tags.
pub const TAG_SEPARATOR: &str = ",";

/// Appends the marker tag to the caller's list in place.
pub fn append_marker(tags: &mut Vec<String>) {
    tags.push(MARKER_TAG.to_string());
}

/// Concatenates `key` with the joined tags. The list is used as given.
pub fn derive_key(key: &str, tags: &[String]) -> String {
    let mut derived = String::with_capacity(key.len() + tags.len() * 8);
    derived.push_str(key);
    derived.push_str(&tags.join(TAG_SEPARATOR));
    derived
}

/// Appends the marker to `tags` and returns the derived key.
///
/// The caller observes the extra `"used"` element afterwards.
pub fn compose(key: &str, tags: &mut Vec<String>) -> String {
    append_marker(tags);
    derive_key(key, tags)
}

/// Same derivation as [`compose`] without touching the caller's list.
///
/// Returns the key and the tag list that produced it.
pub fn compose_pure(key: &str, tags: &[String]) -> (String, Vec<String>) {
    let mut owned = tags.to_vec();
    let derived = compose(key, &mut owned);
    (derived, owned)
}
