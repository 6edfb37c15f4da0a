//! Typed error variants for the termshim-config crate.
//!
//! File loading helpers return `anyhow::Result` with context attached; the
//! underlying cause is always one of these variants, so callers can recover it
//! with `downcast_ref::<ConfigError>()`.

use thiserror::Error;

/// Errors produced while reading or writing terminal options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A declared option was assigned a value of the wrong shape
    /// (e.g. a string for `cols`).
    #[error("Invalid value for option '{name}': {source}")]
    InvalidValue {
        /// Wire name of the option.
        name: String,
        /// Underlying conversion error.
        #[source]
        source: serde_json::Error,
    },

    /// The option bag could not be parsed as JSON.
    #[error("JSON parse error in options: {0}")]
    Json(#[from] serde_json::Error),

    /// The option file could not be parsed as YAML.
    #[error("YAML parse error in options: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// The option file could not be read.
    #[error("I/O error reading options: {0}")]
    Io(#[from] std::io::Error),
}
