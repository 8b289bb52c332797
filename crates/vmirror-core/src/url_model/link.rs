//! Normalisation of detail-page links read from item cards.

use url::Url;

/// Resolves `href` against `base` and drops the fragment.
///
/// Card links may be relative or carry `#comments`-style anchors; both would
/// otherwise produce distinct manifest keys for the same detail page.
/// Returns `None` for empty hrefs, `javascript:` links, or anything that does
/// not resolve to an http(s) URL.
pub fn normalize_detail_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let mut url = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base).ok()?.join(href).ok()?,
        Err(_) => return None,
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}
