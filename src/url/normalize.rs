use crate::UrlError;
use url::Url;

/// Normalizes a URL into the identity used for visited/pending comparison
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require the http or https scheme
/// 3. Require a host
/// 4. Remove the fragment (everything after #)
///
/// Nothing else is rewritten. Trailing slashes, path case and query order are
/// significant, so `/a` and `/a/` are distinct pages. Host case is folded by
/// the URL parser itself.
///
/// # Examples
///
/// ```
/// use site_harvester::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/Page/#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/Page/");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Normalizes an already parsed URL (see [`normalize_url`])
pub(crate) fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Resolves a possibly relative reference against a base URL
///
/// Returns None if the reference should be ignored:
/// - empty or fragment-only references
/// - javascript:, mailto:, tel:, data: schemes
/// - references that fail to resolve or resolve to a non-HTTP(S) URL
pub fn resolve_http_url(reference: &str, base: &Url) -> Option<Url> {
    let reference = reference.trim();

    if reference.is_empty() || reference.starts_with('#') {
        return None;
    }

    let lowered = reference.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let resolved = base.join(reference).ok()?;
    normalize_parsed(resolved).ok()
}
