//! JSON-Pointer-style locations inside a spec document.
//!
//! Spec errors are located with `#`-rooted pointers (`#/rating/tuna-*`), and
//! the chain re-roots them under `#/<stage>/spec`. Spec keys routinely contain
//! `/`-free punctuation like `*`, `&` and `@`, which are kept verbatim; only
//! `~` and `/` are escaped (RFC 6901).

use std::borrow::Cow;

/// Escape a single key per RFC 6901 (`~` → `~0`, `/` → `~1`).
///
/// Returns `Cow::Borrowed` when no escaping is needed (the common case).
pub fn escape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') || segment.contains('/') {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Build a pointer by appending escaped segments to `parent`.
///
/// # Example
/// ```
/// use jolt_core::pointer::build_path;
/// assert_eq!(build_path("#", &["rating", "a/b"]), "#/rating/a~1b");
/// ```
pub fn build_path<S: AsRef<str>>(parent: &str, segments: &[S]) -> String {
    let mut path = parent.to_string();
    for segment in segments {
        path.push('/');
        path.push_str(&escape_pointer_segment(segment.as_ref()));
    }
    path
}

/// Pointer to the child `key` of the spec node at `parent`.
pub(crate) fn child_path(parent: &str, key: &str) -> String {
    build_path(parent, &[key])
}
