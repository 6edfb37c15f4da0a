//! Options store for the termshim terminal widget.
//!
//! This crate owns the configuration side of a terminal instance:
//!
//! - `TerminalOptions`: the serde-backed option bag with per-field defaults
//! - `OptionName` / `OptionKey`: the declared option set plus inert extensions
//! - `OptionsStore`: a shared, observable store with typed accessors and
//!   batched change notification
//! - `Subscription`: the disposal handle returned by every listener registration

pub mod defaults;
pub mod error;
pub mod options;
pub mod store;
pub mod subscription;
mod types;

// Re-export main types for convenience
pub use error::ConfigError;
pub use options::{OptionKey, OptionName, OptionValue, TerminalOptions};
pub use store::{OptionChange, OptionsBatch, OptionsStore};
pub use subscription::Subscription;
pub use types::{CursorStyle, Theme};
