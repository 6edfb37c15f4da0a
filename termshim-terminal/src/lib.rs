//! Terminal coordinator for termshim.
//!
//! Wraps an asynchronously loaded terminal engine so hosts can use it as if it
//! were available synchronously:
//!
//! - `Engine`: the capability interface of the external engine
//! - `ReadinessGate`: exactly-once ready transition with late subscription
//! - `WriteQueue`: ordered output buffered until the engine is ready
//! - `Propagator`: pushes stored option values into the live engine
//! - `Terminal`: the facade tying these together
//! - `Addon`: extension hook used by the fit addon

pub mod addon;
pub mod container;
pub mod engine;
pub mod error;
pub mod event;
pub mod propagation;
pub mod readiness;
pub mod terminal;
pub mod write_queue;

// Re-export main types for convenience
pub use addon::Addon;
pub use container::{Container, ContainerMetrics};
pub use engine::{Engine, EngineLoad, EngineResult, HyperlinkSpan};
pub use error::{EngineError, LoadFailure, PropagationError, TerminalError};
pub use event::EventEmitter;
pub use propagation::{PropagationKind, Propagator};
pub use readiness::{ReadinessGate, ReadyOutcome, ReadyPhase};
pub use terminal::{Terminal, TerminalHandle};
pub use write_queue::{PendingWrite, WriteCallback, WriteQueue};

// Re-export the options surface that is part of our public API
pub use termshim_config::{OptionsStore, Subscription, TerminalOptions};
