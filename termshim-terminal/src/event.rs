//! Multi-listener event emitter with disposable registrations.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use termshim_config::Subscription;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct EmitterInner<T: ?Sized> {
    listeners: Vec<(u64, Listener<T>)>,
    next_id: u64,
}

/// Delivers events to listeners in registration order.
///
/// The listener list is snapshotted per emit and no lock is held while a
/// listener runs; a listener disposed earlier in the same emit is skipped.
pub struct EventEmitter<T: ?Sized> {
    inner: Arc<Mutex<EmitterInner<T>>>,
}

impl<T: ?Sized> Clone for EventEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> Default for EventEmitter<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EmitterInner {
                listeners: Vec::new(),
                next_id: 1,
            })),
        }
    }
}

impl<T: ?Sized + 'static> std::fmt::Debug for EventEmitter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<T: ?Sized + 'static> EventEmitter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, Arc::new(listener)));
            id
        };

        let weak: Weak<Mutex<EmitterInner<T>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().listeners.retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }

    pub fn emit(&self, event: &T) {
        let listeners = self.inner.lock().listeners.clone();
        for (id, listener) in listeners {
            let still_registered = self
                .inner
                .lock()
                .listeners
                .iter()
                .any(|(listener_id, _)| *listener_id == id);
            if still_registered {
                listener(event);
            }
        }
    }

    pub fn clear(&self) {
        self.inner.lock().listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_in_registration_order() {
        let emitter: EventEmitter<str> = EventEmitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let sink = Arc::clone(&seen);
            let _ = emitter.subscribe(move |data: &str| sink.lock().push(format!("{tag}:{data}")));
        }

        emitter.emit("x");
        assert_eq!(*seen.lock(), vec!["first:x", "second:x"]);
    }

    #[test]
    fn test_disposed_listener_skipped() {
        let emitter: EventEmitter<str> = EventEmitter::new();
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let mut sub = emitter.subscribe(move |_| *sink.lock() += 1);

        emitter.emit("a");
        sub.dispose();
        emitter.emit("b");
        assert_eq!(*seen.lock(), 1);
        assert_eq!(emitter.listener_count(), 0);
    }
}
