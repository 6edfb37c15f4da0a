// Library exports for termshim
//
// # Mutex Usage Policy
//
// termshim shares per-terminal state between host calls and the engine load
// task, so all shared state sits behind `parking_lot::Mutex`:
//
//   - No lock is held while a host callback runs (write completion, ready
//     subscriber, option listener, data listener, addon hook). Callbacks may
//     call straight back into the terminal.
//
//   - Engine calls are made with the terminal state lock held. Engines must
//     not call back into the terminal.
//
//   - Lock order is terminal state, then options store. The options store
//     never calls out while holding its own lock.

/// Crate version, for hosts that report it.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod fit;
pub mod link_detection;

pub use fit::FitAddon;
pub use link_detection::{
    ActivationEvent, BufferSource, Link, LinkDetector, LinkError, LinkKind, LinkOpener,
    LinkProvider, SystemOpener,
};

pub use termshim_config::{
    ConfigError, CursorStyle, OptionChange, OptionKey, OptionName, OptionValue, OptionsBatch,
    OptionsStore, Subscription, TerminalOptions, Theme,
};
pub use termshim_terminal::{
    Addon, Container, ContainerMetrics, Engine, EngineError, EngineLoad, EngineResult,
    HyperlinkSpan, LoadFailure, PropagationError, ReadyOutcome, ReadyPhase, Terminal,
    TerminalError, TerminalHandle,
};
