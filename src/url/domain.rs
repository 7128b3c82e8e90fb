use url::Url;

/// Extracts the host from a URL
///
/// The port is not part of the host, so `example.com:8080` and `example.com`
/// compare equal.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_harvester::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8443/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if both URLs carry the same host
///
/// URLs without a host never match anything.
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (extract_host(a), extract_host(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
