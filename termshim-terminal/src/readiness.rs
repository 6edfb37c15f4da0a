//! Readiness state machine and ready-subscriber bookkeeping.
//!
//! The gate only tracks state; the terminal drives the transition and invokes
//! callbacks with no lock held. Subscribers are handed out one at a time by
//! [`ReadinessGate::next_subscriber`], so a subscription disposed while the
//! notification loop is running is removed before the loop can reach it.

use std::collections::VecDeque;
use std::fmt;

use crate::error::{LoadFailure, TerminalError};

/// Lifecycle phase of a terminal instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyPhase {
    /// Created, engine load not started yet
    Constructing,
    /// Engine load in flight; writes queue up
    Loading,
    /// Engine present, pending writes being applied
    Flushing,
    /// Writes flushed and options reconciled, ready subscribers running
    Notifying,
    /// Pass-through mode
    Ready,
    /// Engine load failed; the instance is unusable
    Failed,
    Disposed,
}

impl ReadyPhase {
    /// Whether writes and option changes go straight to the engine.
    pub fn is_live(self) -> bool {
        matches!(self, ReadyPhase::Notifying | ReadyPhase::Ready)
    }
}

/// What ready subscribers receive.
pub type ReadyOutcome = Result<(), LoadFailure>;

/// Ready subscriber callback.
pub type ReadyCallback = Box<dyn FnOnce(&ReadyOutcome) + Send>;

/// Result of registering a ready subscriber.
pub enum Registration {
    /// Stored; fires when the gate settles.
    Pending(u64),
    /// The gate already settled; the caller must invoke the callback now.
    Settled(ReadyCallback, ReadyOutcome),
    /// The instance is disposed; the callback was dropped.
    Rejected,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Registration::Pending(id) => f.debug_tuple("Pending").field(id).finish(),
            Registration::Settled(_, outcome) => {
                f.debug_tuple("Settled").field(outcome).finish()
            }
            Registration::Rejected => f.write_str("Rejected"),
        }
    }
}

pub struct ReadinessGate {
    phase: ReadyPhase,
    subscribers: VecDeque<(u64, ReadyCallback)>,
    next_id: u64,
    failure: Option<LoadFailure>,
}

impl fmt::Debug for ReadinessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessGate")
            .field("phase", &self.phase)
            .field("subscribers", &self.subscribers.len())
            .field("failure", &self.failure)
            .finish()
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self {
            phase: ReadyPhase::Constructing,
            subscribers: VecDeque::new(),
            next_id: 1,
            failure: None,
        }
    }

    pub fn phase(&self) -> ReadyPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == ReadyPhase::Ready
    }

    pub fn failure(&self) -> Option<&LoadFailure> {
        self.failure.as_ref()
    }

    /// `Constructing -> Loading`. Any other starting phase is rejected and
    /// left untouched.
    pub fn begin_loading(&mut self) -> Result<(), TerminalError> {
        match self.phase {
            ReadyPhase::Constructing => {
                self.phase = ReadyPhase::Loading;
                Ok(())
            }
            ReadyPhase::Disposed => Err(TerminalError::Disposed),
            _ => Err(TerminalError::DoubleInitialization),
        }
    }

    /// `Loading -> Flushing`. Returns false if the load result arrived for an
    /// instance that is no longer waiting for it.
    pub fn engine_arrived(&mut self) -> bool {
        if self.phase != ReadyPhase::Loading {
            return false;
        }
        self.phase = ReadyPhase::Flushing;
        true
    }

    /// `Flushing -> Notifying`.
    pub fn begin_notifying(&mut self) {
        if self.phase == ReadyPhase::Flushing {
            self.phase = ReadyPhase::Notifying;
        }
    }

    /// `Notifying -> Ready`.
    pub fn mark_ready(&mut self) {
        if self.phase == ReadyPhase::Notifying {
            self.phase = ReadyPhase::Ready;
        }
    }

    /// `Loading -> Failed`. Returns false if the instance was not loading.
    pub fn fail(&mut self, failure: LoadFailure) -> bool {
        if self.phase != ReadyPhase::Loading {
            return false;
        }
        self.phase = ReadyPhase::Failed;
        self.failure = Some(failure);
        true
    }

    /// Enter the terminal `Disposed` phase, dropping every pending subscriber.
    /// Returns false if already disposed.
    pub fn dispose(&mut self) -> bool {
        if self.phase == ReadyPhase::Disposed {
            return false;
        }
        self.phase = ReadyPhase::Disposed;
        self.subscribers.clear();
        true
    }

    /// Register a subscriber.
    ///
    /// While the notification loop is running new subscribers are appended
    /// and picked up by the same loop; after `Ready` or `Failed` they settle
    /// immediately.
    pub fn subscribe(&mut self, callback: ReadyCallback) -> Registration {
        match self.phase {
            ReadyPhase::Ready => Registration::Settled(callback, Ok(())),
            ReadyPhase::Failed => match &self.failure {
                Some(failure) => Registration::Settled(callback, Err(failure.clone())),
                None => Registration::Rejected,
            },
            ReadyPhase::Disposed => Registration::Rejected,
            ReadyPhase::Constructing
            | ReadyPhase::Loading
            | ReadyPhase::Flushing
            | ReadyPhase::Notifying => {
                let id = self.next_id;
                self.next_id += 1;
                self.subscribers.push_back((id, callback));
                Registration::Pending(id)
            }
        }
    }

    /// Remove a pending subscriber. Returns false if it already ran or was
    /// never registered.
    pub fn unsubscribe(&mut self, id: u64) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(subscriber_id, _)| *subscriber_id != id);
        self.subscribers.len() != before
    }

    /// Next subscriber in registration order.
    pub fn next_subscriber(&mut self) -> Option<ReadyCallback> {
        self.subscribers.pop_front().map(|(_, callback)| callback)
    }

    /// Next subscriber in registration order, or `Notifying -> Ready` once
    /// none are left. Both happen under the caller's lock, so a subscriber
    /// can never be stored after the last one was handed out.
    pub fn next_subscriber_or_mark_ready(&mut self) -> Option<ReadyCallback> {
        let next = self.next_subscriber();
        if next.is_none() {
            self.mark_ready();
        }
        next
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
