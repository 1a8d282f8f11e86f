//! URL assembly shared by the handler variants.

/// Join an origin base, a request path and an optional raw query string into
/// the full URL used both for the origin fetch and for cache addressing.
pub fn build_full_url(base_url: &str, path: &str, query: Option<&str>) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let mut url = if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    };
    if let Some(query) = query {
        if !query.is_empty() {
            url.push('?');
            url.push_str(query);
        }
    }
    url
}
