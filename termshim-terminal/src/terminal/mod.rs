use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use termshim_config::{OptionChange, OptionKey, OptionsStore, Subscription, TerminalOptions};

use crate::addon::Addon;
use crate::container::{Container, ContainerMetrics};
use crate::engine::Engine;
use crate::error::TerminalError;
use crate::event::EventEmitter;
use crate::propagation::Propagator;
use crate::readiness::{ReadinessGate, ReadyCallback, ReadyOutcome, ReadyPhase};
use crate::write_queue::WriteQueue;

pub mod io;
pub mod lifecycle;

/// Mutable per-instance state, guarded by one lock.
///
/// Invariant: the lock is never held while a host callback (write completion,
/// ready subscriber, data listener, addon hook) runs. Engine calls are made
/// with the lock held; engines must not call back into the terminal.
pub(crate) struct TerminalState {
    pub(crate) gate: ReadinessGate,
    pub(crate) queue: WriteQueue,
    pub(crate) engine: Option<Box<dyn Engine>>,
    pub(crate) propagator: Propagator,
    pub(crate) container: Option<Arc<dyn Container>>,
    pub(crate) addons: Vec<Box<dyn Addon>>,
    options_subscription: Option<Subscription>,
}

pub(crate) struct Inner {
    pub(crate) state: Mutex<TerminalState>,
    pub(crate) options: OptionsStore,
    pub(crate) data: EventEmitter<str>,
}

/// Terminal widget over an asynchronously loaded engine.
///
/// Every operation returns immediately. Output written before the engine is
/// loaded is queued and replayed in order; option writes are stored at once
/// and reach the engine when it is ready.
///
/// Dropping the terminal disposes it.
pub struct Terminal {
    inner: Arc<Inner>,
}

/// Non-owning reference to a terminal, handed to addons.
#[derive(Clone)]
pub struct TerminalHandle {
    inner: Weak<Inner>,
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Terminal")
            .field("phase", &state.gate.phase())
            .field("queued_writes", &state.queue.len())
            .field("open", &state.container.is_some())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for TerminalHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalHandle")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Terminal {
    /// Create a terminal with no engine load in flight.
    ///
    /// Call [`Terminal::load_engine`] to start one; [`Terminal::new`] does both.
    pub fn without_engine(options: TerminalOptions) -> Self {
        log::info!(
            "Creating terminal with dimensions: {}x{}, scrollback: {}",
            options.cols,
            options.rows,
            options.scrollback
        );

        let inner = Arc::new(Inner {
            state: Mutex::new(TerminalState {
                gate: ReadinessGate::new(),
                queue: WriteQueue::new(),
                engine: None,
                propagator: Propagator::with_initial_sync(&options),
                container: None,
                addons: Vec::new(),
                options_subscription: None,
            }),
            options: OptionsStore::new(options),
            data: EventEmitter::new(),
        });

        let weak = Arc::downgrade(&inner);
        let subscription = inner.options.on_change(move |changes| {
            if let Some(inner) = weak.upgrade() {
                inner.on_options_changed(changes);
            }
        });
        inner.state.lock().options_subscription = Some(subscription);

        Self { inner }
    }

    /// Non-owning handle for addons and host callbacks.
    pub fn handle(&self) -> TerminalHandle {
        TerminalHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// The option store. Reads always see the last write, before and after
    /// readiness.
    pub fn options(&self) -> &OptionsStore {
        &self.inner.options
    }

    /// Attach to a host container. Does not wait for the engine.
    pub fn open(&self, container: Arc<dyn Container>) -> Result<(), TerminalError> {
        let mut state = self.inner.state.lock();
        if state.gate.phase() == ReadyPhase::Disposed {
            return Err(TerminalError::Disposed);
        }
        if state.container.is_some() {
            return Err(TerminalError::AlreadyOpen);
        }
        state.container = Some(container);
        log::info!("Terminal opened (phase: {:?})", state.gate.phase());
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.inner.state.lock().container.is_some()
    }

    /// Measure the attached container.
    pub fn container_metrics(&self) -> Option<ContainerMetrics> {
        self.inner.container_metrics()
    }

    /// Load an addon. Its `activate` hook runs immediately.
    pub fn load_addon<A: Addon + 'static>(&self, addon: A) -> Result<(), TerminalError> {
        let mut addon: Box<dyn Addon> = Box::new(addon);
        {
            let state = self.inner.state.lock();
            if state.gate.phase() == ReadyPhase::Disposed {
                return Err(TerminalError::Disposed);
            }
            if state.addons.iter().any(|loaded| loaded.name() == addon.name()) {
                return Err(TerminalError::AddonAlreadyLoaded(addon.name()));
            }
        }

        log::debug!("Activating addon '{}'", addon.name());
        addon.activate(self.handle());

        let mut state = self.inner.state.lock();
        if state.gate.phase() == ReadyPhase::Disposed {
            drop(state);
            addon.dispose();
            return Err(TerminalError::Disposed);
        }
        state.addons.push(addon);
        Ok(())
    }

    /// Release the engine, discard queued writes without running their
    /// callbacks, drop every subscription and dispose loaded addons.
    /// Idempotent.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.phase() == ReadyPhase::Disposed
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

impl TerminalHandle {
    fn upgrade(&self) -> Result<Arc<Inner>, TerminalError> {
        self.inner.upgrade().ok_or(TerminalError::Disposed)
    }

    pub fn is_ready(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.phase() == ReadyPhase::Ready)
    }

    pub fn phase(&self) -> ReadyPhase {
        self.inner
            .upgrade()
            .map_or(ReadyPhase::Disposed, |inner| inner.phase())
    }

    /// Same contract as [`Terminal::on_ready`].
    pub fn on_ready<F>(&self, callback: F) -> Result<Subscription, TerminalError>
    where
        F: FnOnce(&ReadyOutcome) + Send + 'static,
    {
        let inner = self.upgrade()?;
        Ok(inner.on_ready(Box::new(callback) as ReadyCallback))
    }

    pub fn container_metrics(&self) -> Option<ContainerMetrics> {
        self.inner.upgrade()?.container_metrics()
    }

    /// Same contract as [`Terminal::write`].
    pub fn write(&self, data: impl AsRef<[u8]>) -> Result<(), TerminalError> {
        self.upgrade()?.write(data.as_ref().to_vec(), None)
    }

    /// Same contract as [`Terminal::resize`].
    pub fn resize(&self, cols: u16, rows: u16) -> Result<(), TerminalError> {
        self.upgrade()?.resize(cols, rows)
    }

    pub fn options(&self) -> Option<OptionsStore> {
        self.inner.upgrade().map(|inner| inner.options.clone())
    }
}

impl Inner {
    pub(crate) fn phase(&self) -> ReadyPhase {
        self.state.lock().gate.phase()
    }

    fn container_metrics(&self) -> Option<ContainerMetrics> {
        let container = self.state.lock().container.clone()?;
        container.metrics()
    }

    fn on_options_changed(&self, changes: &[OptionChange]) {
        let keys: Vec<OptionKey> = changes.iter().map(|change| change.key.clone()).collect();

        let mut guard = self.state.lock();
        let state = &mut *guard;
        match state.gate.phase() {
            ReadyPhase::Disposed | ReadyPhase::Failed => {}
            phase if phase.is_live() => {
                if let Some(engine) = state.engine.as_deref_mut() {
                    let snapshot = self.options.snapshot();
                    state.propagator.apply(engine, &keys, &snapshot);
                }
            }
            phase => {
                log::trace!("Deferring {} option change(s) until ready ({:?})", keys.len(), phase);
                state.propagator.defer(&keys);
            }
        }
    }

    fn dispose(&self) {
        let (subscription, addons, dropped) = {
            let mut state = self.state.lock();
            if !state.gate.dispose() {
                return;
            }
            state.engine = None;
            state.container = None;
            let dropped = state.queue.discard();
            (
                state.options_subscription.take(),
                std::mem::take(&mut state.addons),
                dropped,
            )
        };

        if let Some(mut subscription) = subscription {
            subscription.dispose();
        }
        self.options.clear_listeners();
        self.data.clear();

        for mut addon in addons {
            log::debug!("Disposing addon '{}'", addon.name());
            addon.dispose();
        }

        log::info!("Terminal disposed ({} queued write(s) discarded)", dropped);
    }
}
