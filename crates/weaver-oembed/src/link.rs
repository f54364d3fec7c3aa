use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::EmbedError;

/// Hosts whose embeds don't work inside a sandboxed preview frame.
pub const DEFAULT_NO_PREVIEW_HOSTS: &[&str] = &["facebook.com"];

static PASTED_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(https?://\S+)\s*").unwrap());

/// Basic shape check before anything goes over the network.
pub fn validate_url(input: &str) -> Result<Url, EmbedError> {
    let malformed = |reason: &str| EmbedError::MalformedUrl {
        url: input.to_owned(),
        reason: reason.to_owned(),
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(malformed("empty URL"));
    }
    let url = Url::parse(trimmed).map_err(|e| malformed(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(malformed("only http and https URLs can be embedded"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(malformed("URL has no host"));
    }
    Ok(url)
}

fn bare_host(url: &Url) -> &str {
    let host = url.host_str().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host)
}

/// Whether the embed for `url` can't be previewed in the editor.
pub fn cannot_preview<S: AsRef<str>>(url: &Url, no_preview_hosts: &[S]) -> bool {
    let host = bare_host(url);
    no_preview_hosts
        .iter()
        .any(|h| h.as_ref().eq_ignore_ascii_case(host))
}

/// Accessible title of the preview frame.
pub fn iframe_title(url: &Url) -> String {
    format!("Embedded content from {}", url.host_str().unwrap_or_default())
}

/// A pasted paragraph that starts with a URL becomes a generic embed of the
/// paragraph's trimmed text.
pub fn url_from_pasted_paragraph(text: &str) -> Option<&str> {
    PASTED_URL_RE.is_match(text).then(|| text.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        let url = validate_url("  https://youtu.be/abc ").unwrap();
        assert_eq!(url.host_str(), Some("youtu.be"));

        for bad in ["", "   ", "not a url", "ftp://example.com/file", "mailto:a@b.test"] {
            assert!(
                matches!(validate_url(bad), Err(EmbedError::MalformedUrl { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_cannot_preview() {
        let facebook = Url::parse("https://www.facebook.com/some/post").unwrap();
        let youtube = Url::parse("https://www.youtube.com/watch?v=1").unwrap();
        assert!(cannot_preview(&facebook, DEFAULT_NO_PREVIEW_HOSTS));
        assert!(!cannot_preview(&youtube, DEFAULT_NO_PREVIEW_HOSTS));
        assert!(cannot_preview(&youtube, &["youtube.com".to_string()]));
    }

    #[test]
    fn test_iframe_title() {
        let url = Url::parse("https://vimeo.com/1").unwrap();
        assert_eq!(iframe_title(&url), "Embedded content from vimeo.com");
    }

    #[test]
    fn test_pasted_paragraph() {
        assert_eq!(
            url_from_pasted_paragraph("  https://youtu.be/abc \n"),
            Some("https://youtu.be/abc")
        );
        assert_eq!(
            url_from_pasted_paragraph("HTTP://EXAMPLE.COM/x"),
            Some("HTTP://EXAMPLE.COM/x")
        );
        assert_eq!(url_from_pasted_paragraph("see https://youtu.be/abc"), None);
        assert_eq!(url_from_pasted_paragraph("https://"), None);
    }
}
