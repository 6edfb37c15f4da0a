//! Capability interface of the external terminal engine.
//!
//! The engine (VT parser, screen buffer, cursor, renderer) is opaque. The shim
//! only needs to feed it bytes, resize it, push option values into it, and read
//! back enough of a display row to detect links.

use std::future::Future;
use std::pin::Pin;

use termshim_config::OptionValue;

use crate::error::EngineError;

/// An explicit (OSC 8) hyperlink reported by the engine for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperlinkSpan {
    /// First column covered (0-indexed)
    pub start_col: usize,
    /// Last column covered (inclusive)
    pub end_col: usize,
    /// Target URI from the escape sequence
    pub uri: String,
}

/// A loaded engine instance. All calls are synchronous.
pub trait Engine: Send {
    /// Feed output bytes (VT/ANSI stream) into the engine.
    fn write(&mut self, data: &[u8]);

    /// Resize the screen.
    fn resize(&mut self, cols: u16, rows: u16) -> Result<(), EngineError>;

    /// Apply a live option value by wire name.
    fn set_option(&mut self, name: &str, value: &OptionValue) -> Result<(), EngineError>;

    /// Explicit hyperlinks on a viewport row.
    fn hyperlinks(&self, row: usize) -> Vec<HyperlinkSpan>;

    /// Code point of every cell on a viewport row, one entry per column.
    ///
    /// Empty cells report `0`. Returns `None` for rows outside the viewport.
    fn row_codepoints(&self, row: usize) -> Option<Vec<u32>>;
}

/// Outcome of an engine load.
pub type EngineResult = Result<Box<dyn Engine>, EngineError>;

/// Boxed engine load future, as stored by the load task.
pub type EngineLoad = Pin<Box<dyn Future<Output = EngineResult> + Send + 'static>>;
