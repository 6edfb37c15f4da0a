//! Default value functions for terminal options.
//!
//! Each sub-module groups related `default_*` free functions used as
//! `#[serde(default = "crate::defaults::...")]` attributes on
//! `TerminalOptions` fields.

mod font;
mod terminal;

// ── Font & text rendering ──────────────────────────────────────────────────
pub use font::{font_family, font_size, letter_spacing, line_height};

// ── Terminal behaviour ─────────────────────────────────────────────────────
pub use terminal::{cols, rows, scrollback};
