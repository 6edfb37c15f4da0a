use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use super::{BufferSource, Link, LinkKind, LinkProvider};

/// URL pattern for http(s) links in plain text
static URL_REGEX: OnceLock<Regex> = OnceLock::new();

/// Get the compiled URL regex pattern
fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| {
        // Body: anything but whitespace, quotes and RFC 1738 "unsafe" characters.
        // Last character: additionally not sentence punctuation or a closing
        // bracket, so "see https://x.com)." stops at "com". A `~` may appear
        // inside the URL but not at its end.
        Regex::new(
            r#"(?xi)
            https?://
            [^\s"'!*(){}|\\^<>`]*
            [^\s"':,.!?{}|\\^~\[\]`()<>]
            "#,
        )
        .expect("Failed to compile URL regex")
    })
}

/// Reconstruct row text with one `char` per cell.
///
/// Control characters, nulls (empty cells) and invalid code points become a
/// blank, so the character index of the result equals the column.
pub fn row_text(codepoints: &[u32]) -> String {
    codepoints
        .iter()
        .map(|&cp| match char::from_u32(cp) {
            Some(c) if !c.is_control() => c,
            _ => ' ',
        })
        .collect()
}

/// The parsed `scheme://[user[:password]@]host[:port]` of a URL must be a
/// case-insensitive prefix of the text it was parsed from.
fn is_valid_candidate(candidate: &str) -> bool {
    let Ok(parsed) = Url::parse(candidate) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };

    let mut authority = format!("{}://", parsed.scheme());
    if !parsed.username().is_empty() {
        authority.push_str(parsed.username());
        if let Some(password) = parsed.password() {
            authority.push(':');
            authority.push_str(password);
        }
        authority.push('@');
    }
    authority.push_str(host);
    if let Some(port) = parsed.port() {
        authority.push(':');
        authority.push_str(&port.to_string());
    }

    candidate
        .get(..authority.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(&authority))
}

/// Detect validated http(s) URLs in a line whose char index equals its column.
pub fn detect_urls_in_line(text: &str, row: usize) -> Vec<Link> {
    let mut links = Vec::new();

    for mat in url_regex().find_iter(text) {
        let candidate = mat.as_str();
        if !is_valid_candidate(candidate) {
            log::trace!("Discarding invalid URL candidate: {}", candidate);
            continue;
        }

        let start_col = text[..mat.start()].chars().count();
        let end_col = start_col + candidate.chars().count() - 1;
        links.push(Link {
            text: candidate.to_string(),
            uri: candidate.to_string(),
            row,
            start_col,
            end_col,
            kind: LinkKind::Url,
        });
    }

    links
}

/// Links found by scanning the row's displayed text for URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlProvider;

impl LinkProvider for UrlProvider {
    fn provide_links(&self, source: &dyn BufferSource, row: usize) -> Option<Vec<Link>> {
        let codepoints = source.row_codepoints(row)?;
        let links = detect_urls_in_line(&row_text(&codepoints), row);
        if links.is_empty() { None } else { Some(links) }
    }
}
