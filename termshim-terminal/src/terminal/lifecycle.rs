//! Engine load and the ready transition.
//!
//! On a successful load the transition runs, in order:
//! 1. flush the write queue (FIFO, each callback after its payload),
//! 2. reconcile options changed before readiness,
//! 3. run ready subscribers in registration order,
//! 4. switch to `Ready` so later subscribers fire on registration.
//!
//! Steps 3 and 4 meet under one lock: the gate switches to `Ready` in the
//! same critical section that finds the subscriber queue empty.

use std::future::Future;
use std::sync::Arc;

use termshim_config::{Subscription, TerminalOptions};
use tokio::sync::oneshot;

use super::{Inner, Terminal};
use crate::engine::{Engine, EngineLoad, EngineResult};
use crate::error::{EngineError, LoadFailure, TerminalError};
use crate::readiness::{ReadyCallback, ReadyOutcome, ReadyPhase, Registration};
use crate::terminal::io::commit_write;

impl Terminal {
    /// Create a terminal and immediately start loading its engine on the
    /// ambient tokio runtime.
    ///
    /// Returns [`TerminalError::NoRuntime`] outside a runtime context.
    pub fn new<F>(options: TerminalOptions, loader: F) -> Result<Self, TerminalError>
    where
        F: Future<Output = EngineResult> + Send + 'static,
    {
        let terminal = Self::without_engine(options);
        terminal.load_engine(loader)?;
        Ok(terminal)
    }

    /// Start loading an engine.
    ///
    /// Rejected with [`TerminalError::DoubleInitialization`] if a load is
    /// already in flight or has completed; the existing state is untouched.
    pub fn load_engine<F>(&self, loader: F) -> Result<(), TerminalError>
    where
        F: Future<Output = EngineResult> + Send + 'static,
    {
        self.inner.start_load(Box::pin(loader))
    }

    /// Register a ready subscriber.
    ///
    /// Before readiness the callback runs exactly once when the engine is
    /// loaded (or with the failure if loading fails). After readiness it runs
    /// before this method returns. Disposing the returned handle first
    /// guarantees it never runs.
    pub fn on_ready<F>(&self, callback: F) -> Subscription
    where
        F: FnOnce(&ReadyOutcome) + Send + 'static,
    {
        self.inner.on_ready(Box::new(callback))
    }

    /// Resolve once the engine is ready, or with the load failure.
    pub fn wait_ready(&self) -> impl Future<Output = Result<(), TerminalError>> + Send + 'static {
        let (tx, rx) = oneshot::channel::<ReadyOutcome>();
        let _ = self.on_ready(move |outcome| {
            let _ = tx.send(outcome.clone());
        });

        async move {
            match rx.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(failure)) => Err(TerminalError::LoadFailed(failure)),
                // Sender dropped without firing: the terminal was disposed.
                Err(_) => Err(TerminalError::Disposed),
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.inner.phase() == ReadyPhase::Ready
    }

    pub fn phase(&self) -> ReadyPhase {
        self.inner.phase()
    }

    /// The load failure, if the engine failed to load.
    pub fn load_error(&self) -> Option<LoadFailure> {
        self.inner.state.lock().gate.failure().cloned()
    }
}

impl Inner {
    fn start_load(self: &Arc<Self>, load: EngineLoad) -> Result<(), TerminalError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| TerminalError::NoRuntime)?;
        self.state.lock().gate.begin_loading()?;
        log::info!("Loading terminal engine");

        let weak = Arc::downgrade(self);
        runtime.spawn(async move {
            let result = load.await;
            match weak.upgrade() {
                Some(inner) => inner.finish_load(result),
                None => log::debug!("Terminal dropped before its engine finished loading"),
            }
        });
        Ok(())
    }

    pub(crate) fn on_ready(self: &Arc<Self>, callback: ReadyCallback) -> Subscription {
        let registration = self.state.lock().gate.subscribe(callback);
        match registration {
            Registration::Pending(id) => {
                let weak = Arc::downgrade(self);
                Subscription::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.state.lock().gate.unsubscribe(id);
                    }
                })
            }
            Registration::Settled(callback, outcome) => {
                callback(&outcome);
                Subscription::noop()
            }
            Registration::Rejected => {
                log::warn!("Ready subscription on a disposed terminal ignored");
                Subscription::noop()
            }
        }
    }

    fn finish_load(&self, result: EngineResult) {
        match result {
            Ok(engine) => self.become_ready(engine),
            Err(error) => self.fail_load(error),
        }
    }

    fn fail_load(&self, error: EngineError) {
        let failure = LoadFailure::new(error);
        {
            let mut state = self.state.lock();
            if !state.gate.fail(failure.clone()) {
                log::debug!("Ignoring engine load failure for a terminal that is not loading");
                return;
            }
            log::error!(
                "{} ({} queued write(s) retained)",
                failure,
                state.queue.len()
            );
        }
        self.notify_ready_subscribers(&Err(failure));
    }

    fn become_ready(&self, engine: Box<dyn Engine>) {
        {
            let mut state = self.state.lock();
            if !state.gate.engine_arrived() {
                log::info!("Discarding engine loaded for a terminal that is no longer loading");
                return;
            }
            state.engine = Some(engine);
            log::info!(
                "Terminal engine loaded; flushing {} queued write(s)",
                state.queue.len()
            );
        }

        loop {
            self.flush_queue();

            let mut guard = self.state.lock();
            let state = &mut *guard;
            if state.gate.phase() != ReadyPhase::Flushing {
                // Disposed while a completion callback ran.
                return;
            }
            if !state.queue.is_empty() {
                continue;
            }
            if let Some(engine) = state.engine.as_deref_mut() {
                let snapshot = self.options.snapshot();
                state.propagator.reconcile(engine, &snapshot);
            }
            state.gate.begin_notifying();
            break;
        }

        loop {
            let next = self.state.lock().gate.next_subscriber_or_mark_ready();
            match next {
                Some(callback) => callback(&Ok(())),
                None => break,
            }
        }

        if self.phase() == ReadyPhase::Ready {
            log::info!("Terminal ready");
        }
    }

    /// Apply queued writes one at a time, running each completion callback
    /// with the lock released. Writes issued from a callback are appended and
    /// drained by the same loop.
    fn flush_queue(&self) {
        loop {
            let callback = {
                let mut guard = self.state.lock();
                let state = &mut *guard;
                if state.gate.phase() != ReadyPhase::Flushing {
                    return;
                }
                let Some(write) = state.queue.pop_front() else {
                    return;
                };
                let convert_eol = self.options.convert_eol();
                if let Some(engine) = state.engine.as_deref_mut() {
                    commit_write(engine, &write.data, convert_eol);
                }
                write.callback
            };

            if let Some(callback) = callback {
                callback();
            }
        }
    }

    /// Used on the failure path only: `Failed` is already set, so new
    /// subscribers settle on registration.
    fn notify_ready_subscribers(&self, outcome: &ReadyOutcome) {
        loop {
            let next = self.state.lock().gate.next_subscriber();
            match next {
                Some(callback) => callback(outcome),
                None => break,
            }
        }
    }
}
