//! Typed error types for termshim-terminal.

use std::sync::Arc;

use termshim_config::{ConfigError, OptionName};
use thiserror::Error;

/// Errors reported by an engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be instantiated (module fetch, compile, init).
    #[error("Engine initialisation failed: {0}")]
    Init(String),

    /// The loader was dropped before producing an engine.
    #[error("Engine loader was cancelled before completing")]
    Cancelled,

    /// The engine refused a resize request.
    #[error("Engine rejected resize to {cols}x{rows}: {reason}")]
    Resize {
        cols: u16,
        rows: u16,
        reason: String,
    },

    /// The engine refused an option value.
    #[error("Engine rejected option '{name}': {reason}")]
    Option { name: String, reason: String },
}

/// Engine load failure as delivered to ready subscribers.
///
/// Cloneable so every subscriber, including late ones, receives the same
/// failure.
#[derive(Debug, Clone, Error)]
#[error("Terminal engine failed to load: {source}")]
pub struct LoadFailure {
    #[source]
    source: Arc<EngineError>,
}

impl LoadFailure {
    pub fn new(source: EngineError) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// The engine error that caused the failure.
    pub fn engine_error(&self) -> &EngineError {
        &self.source
    }
}

/// Errors surfaced by the `Terminal` facade.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// An engine load was requested on an instance that is already loading,
    /// loaded, or failed. The instance is left as it was.
    #[error("Terminal engine is already loading or loaded")]
    DoubleInitialization,

    /// The instance was used after `dispose()`.
    #[error("Terminal has been disposed")]
    Disposed,

    /// The engine failed to load; the instance is unusable.
    #[error(transparent)]
    LoadFailed(#[from] LoadFailure),

    /// No tokio runtime was available to drive the engine load.
    #[error("No async runtime available to load the terminal engine")]
    NoRuntime,

    /// `open` was called on a terminal that is already attached.
    #[error("Terminal is already attached to a container")]
    AlreadyOpen,

    /// An addon with the same name is already loaded.
    #[error("Addon '{0}' is already loaded")]
    AddonAlreadyLoaded(&'static str),

    /// Zero-sized terminal dimensions.
    #[error("Invalid terminal dimensions: {cols}x{rows}")]
    InvalidDimensions { cols: u16, rows: u16 },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Non-fatal outcome of propagating one option to the engine.
#[derive(Debug, Error)]
pub enum PropagationError {
    /// The option is stored but has no live propagation path.
    #[error("Option '{0}' is stored but cannot be applied at runtime")]
    UnsupportedAtRuntime(OptionName),

    /// The engine refused the option value.
    #[error("Failed to apply option '{name}': {source}")]
    Engine {
        name: OptionName,
        #[source]
        source: EngineError,
    },
}
