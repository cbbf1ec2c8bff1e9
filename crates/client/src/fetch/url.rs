//! URL canonicalization and origin checks for intercepted requests.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a request URL so equal resources share one cache key.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve root-relative input (`/css/main.css`) against `origin`
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        origin.join(trimmed)
    }
    .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://axioma.example").unwrap()
    }

    #[test]
    fn test_canonicalize_absolute() {
        let url = canonicalize(&origin(), "https://example.com/a").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a");
    }

    #[test]
    fn test_canonicalize_root_relative() {
        let url = canonicalize(&origin(), "/css/main.css").unwrap();
        assert_eq!(url.as_str(), "https://axioma.example/css/main.css");
    }

    #[test]
    fn test_canonicalize_site_root() {
        let url = canonicalize(&origin(), "/").unwrap();
        assert_eq!(url.as_str(), "https://axioma.example/");
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize(&origin(), "https://AXIOMA.EXAMPLE/js/main.js").unwrap();
        assert_eq!(url.host_str(), Some("axioma.example"));
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize(&origin(), "/#contacts").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize(&origin(), "/api/rates?currency=usd&period=1d").unwrap();
        assert_eq!(url.query(), Some("currency=usd&period=1d"));
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(canonicalize(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_same_origin() {
        let a = Url::parse("https://axioma.example/css/main.css").unwrap();
        let b = Url::parse("https://axioma.example/").unwrap();
        let other_host = Url::parse("https://fonts.example/font.woff2").unwrap();
        let other_scheme = Url::parse("http://axioma.example/").unwrap();
        let other_port = Url::parse("https://axioma.example:8443/").unwrap();

        assert!(same_origin(&a, &b));
        assert!(!same_origin(&a, &other_host));
        assert!(!same_origin(&a, &other_scheme));
        assert!(!same_origin(&a, &other_port));
    }
}
