//! Project History
//!
//! Facade the editing operations talk to. Owns the undo stack, decides
//! consolidation through push flags, fans out notifications and calls the
//! autosave collaborator. Every operation works on a `DocumentState` passed
//! in by the owning session; nothing is looked up globally.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tl_core::DocumentState;

use crate::{
    AutosaveError, AutosaveSink, DocumentSnapshot, EditDescription, HistoryEvent, HistoryObserver, ObserverId,
    ObserverRegistry, PushFlags, PushOutcome, UndoStack,
};

/// History configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of states kept, 0 = unlimited
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 0 }
    }
}

/// History Engine
pub struct ProjectHistory {
    stack: UndoStack,
    observers: ObserverRegistry,
    autosave: Option<Arc<dyn AutosaveSink>>,
    last_autosave_error: Option<String>,
}

impl ProjectHistory {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            stack: UndoStack::new(config.max_depth),
            observers: ObserverRegistry::new(),
            autosave: None,
            last_autosave_error: None,
        }
    }

    /// Install or remove the persistence collaborator
    pub fn set_autosave_sink(&mut self, sink: Option<Arc<dyn AutosaveSink>>) {
        self.autosave = sink;
    }

    pub fn subscribe(&mut self, observer: impl HistoryObserver + 'static) -> ObserverId {
        self.observers.subscribe(Box::new(observer))
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    // ============ Transitions ============

    /// Seed history with the document as it is now. Clean, nothing to undo.
    pub fn initial_state(&mut self, doc: &DocumentState) {
        let was_dirty = !self.stack.is_empty() && self.stack.dirty();
        self.stack.seed(DocumentSnapshot::capture(
            doc,
            EditDescription::initial(),
            PushFlags::NONE,
        ));
        log::info!("History initialized with {} track(s)", doc.tracks.len());

        self.notify(HistoryEvent::Initialized);
        if was_dirty {
            self.notify(HistoryEvent::DirtyChanged(false));
        }
    }

    /// Record the document as a new undoable state, with autosave
    pub fn push_state(&mut self, doc: &DocumentState, description: EditDescription) -> usize {
        self.push_state_with(doc, description, PushFlags::AUTOSAVE)
    }

    /// Record the document as a new state. Returns the index of the state
    /// that now holds it.
    pub fn push_state_with(
        &mut self,
        doc: &DocumentState,
        description: EditDescription,
        flags: PushFlags,
    ) -> usize {
        let kind = description.kind;
        let was_dirty = self.stack.dirty();
        let outcome = self
            .stack
            .push(DocumentSnapshot::capture(doc, description, flags));

        self.notify(match outcome {
            PushOutcome::Appended(index) => HistoryEvent::Pushed { index, kind },
            PushOutcome::Consolidated(index) => HistoryEvent::Consolidated { index, kind },
        });
        if !was_dirty {
            self.notify(HistoryEvent::DirtyChanged(true));
        }
        if flags.contains(PushFlags::AUTOSAVE) {
            self.autosave();
        }
        outcome.index()
    }

    /// Drop the state recorded by the last push and restore its predecessor
    /// into `doc`
    pub fn rollback_state(&mut self, doc: &mut DocumentState) {
        let was_dirty = self.stack.dirty();
        let discarded_autosave = self.stack.current().flags().contains(PushFlags::AUTOSAVE);
        let restored = self.stack.rollback();
        doc.restore(restored.tracks(), restored.selection());

        let index = self.stack.cursor();
        self.notify(HistoryEvent::RolledBack { index });
        if was_dirty != self.stack.dirty() {
            self.notify(HistoryEvent::DirtyChanged(self.stack.dirty()));
        }
        // The newest recovery copy holds the discarded state
        if discarded_autosave {
            self.autosave();
        }
    }

    /// Amend the current state with the document without creating an undo step
    pub fn modify_state(&mut self, doc: &DocumentState, wants_autosave: bool) {
        let was_dirty = self.stack.dirty();
        self.stack.modify_current(doc);

        let index = self.stack.cursor();
        self.notify(HistoryEvent::Modified { index });
        if !was_dirty {
            self.notify(HistoryEvent::DirtyChanged(true));
        }
        if wants_autosave {
            self.autosave();
        }
    }

    /// Make state `index` current and point `doc` at its tracks.
    /// Panics when `index` is out of range.
    pub fn set_state_to(&mut self, index: usize, doc: &mut DocumentState) {
        let from = self.stack.cursor();
        let state = self.stack.set_cursor(index);
        doc.restore(state.tracks(), state.selection());

        log::debug!("History moved from state {} to {}", from, index);
        self.notify(HistoryEvent::Jumped { from, to: index });
    }

    /// Step back one state. Returns the short description of the undone step.
    pub fn undo(&mut self, doc: &mut DocumentState) -> Option<String> {
        let description = self.stack.undo_description()?.to_string();
        self.set_state_to(self.stack.cursor() - 1, doc);
        Some(description)
    }

    /// Step forward one state. Returns the short description of the redone step.
    pub fn redo(&mut self, doc: &mut DocumentState) -> Option<String> {
        let description = self.stack.redo_description()?.to_string();
        self.set_state_to(self.stack.cursor() + 1, doc);
        Some(description)
    }

    // ============ Queries ============

    pub fn undo_available(&self) -> bool {
        self.stack.undo_available()
    }

    pub fn redo_available(&self) -> bool {
        self.stack.redo_available()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.stack.undo_description()
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.stack.redo_description()
    }

    /// Does the in-memory document differ from the persisted copy
    pub fn dirty(&self) -> bool {
        self.stack.dirty()
    }

    /// Cleared by the persistence collaborator after a successful save
    pub fn set_dirty(&mut self, dirty: bool) {
        if self.stack.dirty() != dirty {
            self.stack.set_dirty(dirty);
            self.notify(HistoryEvent::DirtyChanged(dirty));
        }
    }

    /// The state the document currently reflects
    pub fn current(&self) -> &DocumentSnapshot {
        self.stack.current()
    }

    pub fn current_index(&self) -> usize {
        self.stack.cursor()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn stack(&self) -> &UndoStack {
        &self.stack
    }

    pub fn last_autosave_error(&self) -> Option<&str> {
        self.last_autosave_error.as_deref()
    }

    // ============ Internals ============

    /// Report failures of autosave writes that finished since the last check
    pub fn poll_autosave(&mut self) {
        let failures = match &self.autosave {
            Some(sink) => sink.take_failures(),
            None => return,
        };
        for e in failures {
            self.report_autosave_failure(e);
        }
    }

    /// Hand the current state to the sink. Does not wait for the write.
    fn autosave(&mut self) {
        let Some(sink) = self.autosave.clone() else {
            return;
        };

        let handed_off = sink.write_recovery(self.stack.current().clone());
        let mut failures = sink.take_failures();
        if let Err(e) = handed_off {
            failures.push(e);
        }

        if failures.is_empty() {
            self.last_autosave_error = None;
        }
        for e in failures {
            self.report_autosave_failure(e);
        }
    }

    fn report_autosave_failure(&mut self, e: AutosaveError) {
        log::warn!("Autosave failed: {}", e);
        let message = e.to_string();
        self.last_autosave_error = Some(message.clone());
        self.notify(HistoryEvent::AutosaveFailed(message));
    }

    fn notify(&mut self, event: HistoryEvent) {
        if self.stack.is_empty() {
            return;
        }
        self.observers.notify(&event, self.stack.current());
    }
}

impl Default for ProjectHistory {
    fn default() -> Self {
        Self::new(&HistoryConfig::default())
    }
}

// ============ Tests ============
