/// Clickable link detection for a single terminal row.
//
// Providers are consulted in priority order: explicit OSC 8 hyperlinks first,
// then plain-text URLs found by pattern matching. A link from a lower-priority
// provider is dropped when it overlaps one already accepted.
use termshim_terminal::{HyperlinkSpan, Terminal};
use thiserror::Error;

mod hyperlink_provider;
mod url_provider;

pub use hyperlink_provider::HyperlinkProvider;
pub use url_provider::{UrlProvider, detect_urls_in_line, row_text};

/// Where a link came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// OSC 8 hyperlink reported by the engine
    Hyperlink,
    /// Plain-text URL found by pattern matching
    Url,
}

/// Clickable span on one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Text displayed over the span
    pub text: String,
    /// Target opened on activation
    pub uri: String,
    /// Row position
    pub row: usize,
    /// Start column position
    pub start_col: usize,
    /// End column position (inclusive)
    pub end_col: usize,
    pub kind: LinkKind,
}

impl Link {
    pub fn contains(&self, col: usize) -> bool {
        col >= self.start_col && col <= self.end_col
    }

    pub fn overlaps(&self, other: &Link) -> bool {
        self.row == other.row && self.start_col <= other.end_col && other.start_col <= self.end_col
    }

    /// Open the target if the activation carries the link modifier.
    ///
    /// Returns `Ok(false)` when the click is ignored.
    pub fn activate(
        &self,
        event: ActivationEvent,
        opener: &dyn LinkOpener,
    ) -> Result<bool, LinkError> {
        if !event.has_link_modifier() {
            log::trace!("Ignoring link click without modifier: {}", self.uri);
            return Ok(false);
        }
        if !has_openable_scheme(&self.uri) {
            log::warn!("Refusing to open link with unsupported scheme: {}", self.uri);
            return Err(LinkError::UnsupportedScheme {
                uri: self.uri.clone(),
            });
        }
        log::info!("Opening link: {}", self.uri);
        opener.open(&self.uri)?;
        Ok(true)
    }
}

/// Schemes a link may be opened with. Hyperlink URIs come from program output,
/// so anything that would launch a local handler is refused.
const OPENABLE_SCHEMES: &[&str] = &["http", "https", "mailto"];

fn has_openable_scheme(uri: &str) -> bool {
    url::Url::parse(uri).is_ok_and(|parsed| OPENABLE_SCHEMES.contains(&parsed.scheme()))
}

/// Modifier state of a click on a link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationEvent {
    pub ctrl: bool,
    /// Cmd on macOS, Super elsewhere
    pub meta: bool,
}

impl ActivationEvent {
    /// Ctrl on Linux/Windows, Cmd on macOS. Either is accepted everywhere.
    pub fn has_link_modifier(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Refusing to open '{uri}': only http, https and mailto links can be opened")]
    UnsupportedScheme { uri: String },

    #[error("Failed to open URL '{uri}': {source}")]
    Open {
        uri: String,
        #[source]
        source: std::io::Error,
    },
}

/// Opens link targets.
pub trait LinkOpener: Send + Sync {
    fn open(&self, uri: &str) -> Result<(), LinkError>;
}

/// Opens links in a new window or tab of the system browser, outside this
/// process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn open(&self, uri: &str) -> Result<(), LinkError> {
        open::that(uri).map_err(|source| LinkError::Open {
            uri: uri.to_string(),
            source,
        })
    }
}

/// Read access to the displayed rows.
pub trait BufferSource {
    /// Code point per cell, or `None` when the row is unavailable.
    fn row_codepoints(&self, row: usize) -> Option<Vec<u32>>;

    /// Explicit hyperlinks on the row.
    fn hyperlinks(&self, row: usize) -> Vec<HyperlinkSpan>;
}

impl BufferSource for Terminal {
    fn row_codepoints(&self, row: usize) -> Option<Vec<u32>> {
        Terminal::row_codepoints(self, row)
    }

    fn hyperlinks(&self, row: usize) -> Vec<HyperlinkSpan> {
        Terminal::hyperlinks(self, row)
    }
}

/// Reports the links on one row.
pub trait LinkProvider: Send + Sync {
    /// `None` when nothing was found, otherwise a non-empty list ordered by
    /// start column.
    fn provide_links(&self, source: &dyn BufferSource, row: usize) -> Option<Vec<Link>>;
}

/// Ordered set of link providers.
pub struct LinkDetector {
    providers: Vec<Box<dyn LinkProvider>>,
}

impl Default for LinkDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkDetector {
    /// Hyperlink provider first, URL provider second.
    pub fn new() -> Self {
        Self {
            providers: vec![Box::new(HyperlinkProvider), Box::new(UrlProvider)],
        }
    }

    /// A detector with no providers.
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a provider below every existing one.
    pub fn register(&mut self, provider: Box<dyn LinkProvider>) {
        self.providers.push(provider);
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Links on `row`, ordered by start column. Where spans overlap, the one
    /// from the higher-priority provider wins.
    pub fn links_for_row(&self, source: &dyn BufferSource, row: usize) -> Vec<Link> {
        let mut accepted: Vec<Link> = Vec::new();

        for provider in &self.providers {
            let Some(links) = provider.provide_links(source, row) else {
                continue;
            };
            for link in links {
                if accepted.iter().any(|existing| existing.overlaps(&link)) {
                    log::trace!(
                        "Dropping {:?} link '{}' at {}..={} overlapped by a higher-priority link",
                        link.kind,
                        link.text,
                        link.start_col,
                        link.end_col
                    );
                    continue;
                }
                accepted.push(link);
            }
        }

        accepted.sort_by_key(|link| link.start_col);
        accepted
    }

    /// The link covering a cell.
    pub fn link_at(&self, source: &dyn BufferSource, row: usize, col: usize) -> Option<Link> {
        self.links_for_row(source, row)
            .into_iter()
            .find(|link| link.contains(col))
    }
}

#[cfg(test)]
mod tests;
