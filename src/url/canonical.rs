use crate::UrlError;
use url::Url;

/// Canonicalizes a URL for duplicate detection
///
/// The canonical form is only ever compared, never fetched. It deliberately
/// under-normalizes: two distinct articles must never collapse into one key,
/// while an occasional duplicate slipping through only costs a fetch.
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed or not HTTP(S)
/// 2. Lowercase the host; the parser already drops the scheme's default port
/// 3. Remove a trailing slash from the path (except for root /)
/// 4. Remove the fragment
/// 5. Drop query parameters listed in `tracking_params`
/// 6. Sort the remaining query parameters by key (values keep their order)
/// 7. Remove an empty query string
///
/// The `www.` prefix, path case, scheme and repeated slashes are left as-is,
/// since news sites do serve different content on those variants.
///
/// # Examples
///
/// ```
/// use warta::url::canonicalize_url;
///
/// let url = canonicalize_url("https://WWW.Bisnis.com:443/read/1/?b=2&a=1#top", &[]).unwrap();
/// assert_eq!(url.as_str(), "https://www.bisnis.com/read/1?a=1&b=2");
/// ```
pub fn canonicalize_url(raw_url: &str, tracking_params: &[String]) -> Result<Url, UrlError> {
    let mut url = Url::parse(raw_url.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
        if url.path().is_empty() {
            url.set_path("/");
        }
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url, tracking_params);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url, tracking_params: &[String]) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !tracking_params.iter().any(|t| t == key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    // Stable: repeated keys keep their relative order
    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}
