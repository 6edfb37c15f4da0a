//! FIFO buffer for output written before the engine is ready.

use std::collections::VecDeque;
use std::fmt;

/// Completion callback invoked once a write has been applied to the engine.
pub type WriteCallback = Box<dyn FnOnce() + Send>;

/// A write waiting for the engine.
pub struct PendingWrite {
    pub data: Vec<u8>,
    pub callback: Option<WriteCallback>,
}

impl fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingWrite")
            .field("bytes", &self.data.len())
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Ordered list of pending writes.
#[derive(Debug, Default)]
pub struct WriteQueue {
    pending: VecDeque<PendingWrite>,
    queued_bytes: usize,
}

impl WriteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, data: Vec<u8>, callback: Option<WriteCallback>) {
        self.queued_bytes += data.len();
        self.pending.push_back(PendingWrite { data, callback });
    }

    /// Take the oldest write.
    pub fn pop_front(&mut self) -> Option<PendingWrite> {
        let write = self.pending.pop_front()?;
        self.queued_bytes -= write.data.len();
        Some(write)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total payload bytes waiting.
    pub fn queued_bytes(&self) -> usize {
        self.queued_bytes
    }

    /// Payloads in issue order, for diagnostics.
    pub fn payloads(&self) -> impl Iterator<Item = &[u8]> {
        self.pending.iter().map(|write| write.data.as_slice())
    }

    /// Discard everything without running callbacks. Returns the number of
    /// writes dropped.
    pub fn discard(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.queued_bytes = 0;
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_fifo_order() {
        let mut queue = WriteQueue::new();
        queue.push(b"a".to_vec(), None);
        queue.push(b"bc".to_vec(), None);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.queued_bytes(), 3);

        let payloads: Vec<&[u8]> = queue.payloads().collect();
        assert_eq!(payloads, vec![b"a".as_slice(), b"bc".as_slice()]);

        assert_eq!(queue.pop_front().unwrap().data, b"a");
        assert_eq!(queue.pop_front().unwrap().data, b"bc");
        assert!(queue.pop_front().is_none());
        assert_eq!(queue.queued_bytes(), 0);
    }

    #[test]
    fn test_discard_skips_callbacks() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let mut queue = WriteQueue::new();
        queue.push(
            b"x".to_vec(),
            Some(Box::new(move || flag.store(true, Ordering::SeqCst))),
        );

        assert_eq!(queue.discard(), 1);
        assert!(queue.is_empty());
        assert!(!fired.load(Ordering::SeqCst));
    }
}
