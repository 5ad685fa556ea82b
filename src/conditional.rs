// ==============================================================================
// conditional.rs - Conditional GET Support
// ==============================================================================
// Description: Query fingerprints used as ETags and If-None-Match matching
// Author: Matt Barham
// Created: 2026-10-17
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================
//
// The fingerprint is derived from the request parameters alone. It does not
// change when the table does, so a client holding a fingerprint keeps getting
// 304 for that query until it drops the header.
//
// ==============================================================================

/// Deterministic fingerprint for a paginated ID query
pub fn fingerprint(id: &str, page: usize, per_page: usize) -> String {
    format!("{}_{}_{}", id, page, per_page)
}

/// Quoted form sent in the `ETag` response header
pub fn etag_value(fingerprint: &str) -> String {
    format!("\"{}\"", fingerprint)
}

/// True if any `If-None-Match` value names the fingerprint
///
/// Each header value is compared whole first, then as a comma-separated list,
/// so IDs containing commas still match their own tag. Quotes and the `W/`
/// weak prefix are ignored. `*` has no special meaning.
pub fn is_unmodified<'a>(fingerprint: &str, validators: impl IntoIterator<Item = &'a str>) -> bool {
    validators.into_iter().any(|value| {
        normalize_tag(value) == fingerprint
            || value.split(',').map(normalize_tag).any(|tag| tag == fingerprint)
    })
}

fn normalize_tag(tag: &str) -> &str {
    let tag = tag.trim();
    let tag = tag.strip_prefix("W/").unwrap_or(tag);
    tag.trim_matches('"')
}
