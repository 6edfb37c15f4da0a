//! Disposal handle for listener registrations.

use std::fmt;

/// Handle returned by every listener registration.
///
/// Calling [`Subscription::dispose`] guarantees the listener never runs again.
/// Dropping the handle without disposing leaves the listener registered, so
/// fire-and-forget registrations can simply ignore the return value.
pub struct Subscription {
    on_dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap the teardown action for a registration.
    pub fn new(on_dispose: impl FnOnce() + Send + 'static) -> Self {
        Self {
            on_dispose: Some(Box::new(on_dispose)),
        }
    }

    /// A handle with nothing to tear down (e.g. the listener already ran).
    pub fn noop() -> Self {
        Self { on_dispose: None }
    }

    /// Unregister the listener. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(on_dispose) = self.on_dispose.take() {
            on_dispose();
        }
    }

    /// Whether `dispose` still has work to do.
    pub fn is_active(&self) -> bool {
        self.on_dispose.is_some()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
