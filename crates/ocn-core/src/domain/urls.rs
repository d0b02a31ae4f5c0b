//! URL assembly helpers.

/// Joins a base URL with path segments, normalizing slashes at each seam.
/// Segments containing inner slashes are kept verbatim so callers can pass
/// pre-built suffixes like `"LOC1/EVSE1"`.
pub fn join_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_string();
    for segment in segments {
        let trimmed = segment.trim_matches('/');
        if trimmed.is_empty() {
            continue;
        }
        url.push('/');
        url.push_str(trimmed);
    }
    url
}
