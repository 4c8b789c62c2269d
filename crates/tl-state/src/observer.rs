//! History change notification
//!
//! Observers are called synchronously, after a transition is committed, with
//! the event and the now-current snapshot. Toolkits that poll can register a
//! [`ChannelObserver`] and drain the receiver from their own loop.

use crossbeam_channel::{Receiver, Sender};

use crate::{DocumentSnapshot, EditKind};

/// A committed history transition
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    /// History was (re)seeded with a single initial state
    Initialized,
    Pushed { index: usize, kind: EditKind },
    Consolidated { index: usize, kind: EditKind },
    /// The current state was amended in place
    Modified { index: usize },
    RolledBack { index: usize },
    Jumped { from: usize, to: usize },
    DirtyChanged(bool),
    /// The persistence collaborator failed; history is unaffected
    AutosaveFailed(String),
}

/// Receives history events
pub trait HistoryObserver: Send {
    fn on_history_event(&mut self, event: &HistoryEvent, current: &DocumentSnapshot);
}

impl<F> HistoryObserver for F
where
    F: FnMut(&HistoryEvent, &DocumentSnapshot) + Send,
{
    fn on_history_event(&mut self, event: &HistoryEvent, current: &DocumentSnapshot) {
        self(event, current)
    }
}

/// Forwards events into a channel
pub struct ChannelObserver {
    tx: Sender<HistoryEvent>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its unbounded channel
    pub fn channel() -> (Self, Receiver<HistoryEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl HistoryObserver for ChannelObserver {
    fn on_history_event(&mut self, event: &HistoryEvent, _current: &DocumentSnapshot) {
        if self.tx.send(event.clone()).is_err() {
            log::debug!("History event receiver dropped: {:?}", event);
        }
    }
}

/// Handle returned by subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registered observers in subscription order
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(ObserverId, Box<dyn HistoryObserver>)>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn HistoryObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify(&mut self, event: &HistoryEvent, current: &DocumentSnapshot) {
        for (_, observer) in &mut self.observers {
            observer.on_history_event(event, current);
        }
    }
}
