use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use warta::url::extract_host;
///
/// let url = Url::parse("https://WWW.Bisnis.com/read/1").unwrap();
/// assert_eq!(extract_host(&url), Some("www.bisnis.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Builds the key politeness limits are tracked under
///
/// Hosts served on a non-default port are distinct targets, so the port is
/// part of the key. Unparseable input yields `None`.
pub fn host_key(raw_url: &str) -> Option<String> {
    let url = Url::parse(raw_url).ok()?;
    let host = extract_host(&url)?;

    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
