use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Returns
///
/// * `Some(String)` - The lowercase host
/// * `None` - If the URL has no host
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Turns a host into a token that is safe to embed in a file name
///
/// ```
/// use event_harvester::url::host_slug;
///
/// assert_eq!(host_slug("www.ibiza-spotlight.com"), "www_ibiza-spotlight_com");
/// ```
pub fn host_slug(host: &str) -> String {
    host.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
