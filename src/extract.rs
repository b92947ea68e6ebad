//! Plain-text extraction from source documents (web pages, PDFs).
//!
//! The URL path issues a single GET with an identifying User-Agent and
//! applies a best-effort, non-DOM-aware HTML reduction: regex-level tag
//! stripping plus a small fixed set of entity decodes. It does not try
//! to repair nested or malformed markup.
//!
//! Extraction may legitimately produce empty or near-empty text; the
//! minimum-length policy is enforced by the approval workflow, not here.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::IndexerError;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// The only entities decoded; anything else passes through literally.
const ENTITIES: [(&str, &str); 6] = [
    ("&nbsp;", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
];

/// Fetch a URL and reduce its HTML body to plain text.
///
/// Fails with [`IndexerError::Fetch`] if the request cannot be sent or
/// the response status is not 2xx. Non-HTML bodies pass through the
/// reduction unchanged apart from whitespace normalization.
pub async fn extract_from_url(config: &FetchConfig, url: &str) -> Result<String, IndexerError> {
    let fetch_err = |reason: String| IndexerError::Fetch {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| fetch_err(e.to_string()))?;

    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, &config.user_agent)
        .send()
        .await
        .map_err(|e| fetch_err(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(fetch_err(format!("HTTP {}", status)));
    }

    let html = response.text().await.map_err(|e| fetch_err(e.to_string()))?;
    let text = html_to_text(&html);
    debug!(url, html_bytes = html.len(), text_chars = text.chars().count(), "extracted url");

    Ok(text)
}

/// Extract the text layer of a PDF document.
///
/// Fails with [`IndexerError::Parse`] if the bytes are not a valid PDF
/// or the document carries no extractable text.
pub fn extract_from_pdf(bytes: &[u8]) -> Result<String, IndexerError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| IndexerError::Parse(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(IndexerError::Parse(
            "PDF contains no extractable text".to_string(),
        ));
    }

    Ok(text)
}

/// Reduce an HTML document to plain text.
///
/// Strips `<script>`/`<style>` blocks including their contents, replaces
/// every remaining tag with a space, decodes the entities in
/// [`ENTITIES`], and collapses whitespace runs to single spaces.
pub fn html_to_text(html: &str) -> String {
    let text = SCRIPT_RE.replace_all(html, "");
    let text = STYLE_RE.replace_all(&text, "");
    let mut text = TAG_RE.replace_all(&text, " ").into_owned();

    for (entity, replacement) in ENTITIES {
        text = text.replace(entity, replacement);
    }

    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let html = "<html><body><h1>Title</h1>\n  <p>Some   body\ttext.</p></body></html>";
        assert_eq!(html_to_text(html), "Title Some body text.");
    }

    #[test]
    fn script_and_style_contents_are_removed_entirely() {
        let html = concat!(
            "<head><style>body { color: red; }</style>",
            "<script type=\"text/javascript\">var secret = 42;</script></head>",
            "<body>visible</body>",
        );
        assert_eq!(html_to_text(html), "visible");
    }

    #[test]
    fn script_stripping_is_case_insensitive_and_multiline() {
        let html = "<SCRIPT>\nline one\nline two\n</SCRIPT>kept";
        assert_eq!(html_to_text(html), "kept");
    }

    #[test]
    fn decodes_the_fixed_entity_set() {
        let html = "a&nbsp;b &amp; c &lt;d&gt; &quot;e&quot; &#39;f&#39;";
        assert_eq!(html_to_text(html), "a b & c <d> \"e\" 'f'");
    }

    #[test]
    fn unknown_entities_pass_through() {
        assert_eq!(html_to_text("caf&eacute;"), "caf&eacute;");
    }

    #[test]
    fn tags_become_word_separators() {
        // Replacing tags with a space keeps adjacent words apart.
        assert_eq!(html_to_text("<p>one</p><p>two</p>"), "one two");
    }

    #[test]
    fn plain_text_passes_through_trimmed() {
        assert_eq!(html_to_text("  just text  "), "just text");
    }

    #[test]
    fn invalid_pdf_is_a_parse_error() {
        let err = extract_from_pdf(b"not a pdf").unwrap_err();
        assert!(matches!(err, IndexerError::Parse(_)));
    }
}
