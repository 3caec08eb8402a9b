//! Host normalization shared by site configs, SERP matching and reports.

/// Lowercased host of `url` with scheme, credentials, port, path and a
/// leading `www.` removed. Returns `None` for an empty host.
///
/// The scheme is optional, so bare domains like `example.com/path` work too.
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let without_scheme = trimmed
        .split_once("://")
        .map_or(trimmed, |(_, rest)| rest);
    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = host_port.split(':').next().unwrap_or_default();
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let host = host.strip_prefix("www.").map_or(host.clone(), str::to_owned);
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}
