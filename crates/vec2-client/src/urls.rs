//! Endpoint URL construction

use url::Url;
use vec2_transport::FormData;

use crate::error::{Error, Result};

/// Join `segments` onto `base`.
///
/// Slashes around the base path and each segment are trimmed, then each
/// segment is appended as one percent-encoded path segment. Non-empty
/// `query` becomes the query string.
pub fn build_url(base: &Url, segments: &[&str], query: &FormData) -> Result<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| Error::InvalidUrl(format!("{base} cannot be a base URL")))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment.trim_matches('/'));
        }
    }
    if !query.is_empty() {
        url.set_query(Some(&query.to_query()));
    }
    Ok(url)
}

/// Parse and validate an API base URL.
pub fn parse_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| Error::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::InvalidUrl(format!(
            "{raw}: unsupported scheme {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(raw: &str) -> Url {
        parse_base(raw).unwrap()
    }

    #[test]
    fn joins_segments_onto_host() {
        let url = build_url(
            &base("https://api.example.com/"),
            &["profile", "bob"],
            &FormData::new(),
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/profile/bob");
    }

    #[test]
    fn appends_query() {
        let url = build_url(
            &base("https://api.example.com/"),
            &["profile", "bob"],
            &FormData::new().with("q", "x"),
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/profile/bob?q=x");
    }

    #[test]
    fn trims_slashes_and_keeps_base_path() {
        let url = build_url(
            &base("https://api.example.com/v1/"),
            &["/user/", "vectors/"],
            &FormData::new(),
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/user/vectors");
    }

    #[test]
    fn encodes_segment_content() {
        let url = build_url(
            &base("https://api.example.com"),
            &["vector", "search", "red car"],
            &FormData::new(),
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/vector/search/red%20car");
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(matches!(
            parse_base("ftp://api.example.com"),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(parse_base("not a url"), Err(Error::InvalidUrl(_))));
    }
}
