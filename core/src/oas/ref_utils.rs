#![deny(missing_docs)]

//! # Reference Utilities
//!
//! JSON Pointer helpers for local `$ref` targets. External documents are never
//! fetched; only `#/...` references address anything.

use percent_encoding::percent_decode_str;
use serde_json::Value;

/// Returns the JSON Pointer part of a local reference (`#/a/b` -> `/a/b`).
///
/// Returns `None` for references into other documents.
pub(crate) fn local_pointer(ref_str: &str) -> Option<&str> {
    let pointer = ref_str.strip_prefix('#')?;
    if pointer.is_empty() || pointer.starts_with('/') {
        Some(pointer)
    } else {
        None
    }
}

/// Decodes a JSON Pointer segment (handles `~1`, `~0` and percent-encoding).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Walks `root` along a decoded JSON Pointer.
pub(crate) fn lookup_pointer<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    if pointer.is_empty() {
        return Some(root);
    }

    pointer
        .trim_start_matches('/')
        .split('/')
        .map(decode_pointer_segment)
        .try_fold(root, |node, segment| match node {
            Value::Object(map) => map.get(&segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Extracts the simple name from a reference string.
/// e.g. `#/components/schemas/User` -> `User`
pub(crate) fn ref_name(ref_str: &str) -> String {
    ref_str
        .rsplit('/')
        .next()
        .map(decode_pointer_segment)
        .unwrap_or_default()
}
