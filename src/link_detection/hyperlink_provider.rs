use super::{BufferSource, Link, LinkKind, LinkProvider, row_text};

/// Links from engine-reported OSC 8 hyperlink metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperlinkProvider;

impl LinkProvider for HyperlinkProvider {
    fn provide_links(&self, source: &dyn BufferSource, row: usize) -> Option<Vec<Link>> {
        let spans = source.hyperlinks(row);
        if spans.is_empty() {
            return None;
        }

        let cells: Option<Vec<char>> = source
            .row_codepoints(row)
            .map(|codepoints| row_text(&codepoints).chars().collect());

        let mut links: Vec<Link> = spans
            .into_iter()
            .filter(|span| span.start_col <= span.end_col && !span.uri.is_empty())
            .map(|span| {
                // Display text is whatever the cells show; fall back to the URI
                // when the row cannot be read.
                let text = cells
                    .as_ref()
                    .filter(|cells| span.end_col < cells.len())
                    .map(|cells| cells[span.start_col..=span.end_col].iter().collect())
                    .unwrap_or_else(|| span.uri.clone());
                Link {
                    text,
                    uri: span.uri,
                    row,
                    start_col: span.start_col,
                    end_col: span.end_col,
                    kind: LinkKind::Hyperlink,
                }
            })
            .collect();

        if links.is_empty() {
            return None;
        }
        links.sort_by_key(|link| link.start_col);
        Some(links)
    }
}
