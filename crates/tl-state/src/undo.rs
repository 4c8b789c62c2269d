//! Undo/Redo stack of document snapshots
//!
//! Linear history with a cursor:
//! - Pushing discards everything after the cursor (no branching)
//! - Consolidation folds a repeated edit kind into the current state
//! - Moving the cursor never truncates; redo stays available until the next push
//! - The dirty flag is independent of the cursor

use std::collections::{HashSet, VecDeque};

use tl_core::DocumentState;

use crate::{DocumentSnapshot, PushFlags};

/// Result of recording a state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// A new state was appended at this index
    Appended(usize),
    /// The state at this index absorbed the edit
    Consolidated(usize),
}

impl PushOutcome {
    pub fn index(self) -> usize {
        match self {
            Self::Appended(i) | Self::Consolidated(i) => i,
        }
    }
}

/// Memory held by the history, with shared buffers attributed to the
/// first state that references them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpaceUsage {
    pub per_state: Vec<usize>,
    pub total: usize,
}

#[derive(Debug, Clone, Copy)]
struct PendingPush {
    dirty_before: bool,
}

/// History Stack
pub struct UndoStack {
    states: VecDeque<DocumentSnapshot>,
    cursor: usize,
    /// Maximum number of states kept, 0 = unlimited
    max_depth: usize,
    dirty: bool,
    /// Consolidation only chains onto a state produced by the previous push
    may_consolidate: bool,
    /// Set by an appending push, cleared by anything that makes rollback unsafe
    pending: Option<PendingPush>,
}

impl UndoStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            states: VecDeque::new(),
            cursor: 0,
            max_depth: normalize_depth(max_depth),
            dirty: false,
            may_consolidate: false,
            pending: None,
        }
    }

    /// Drop all states and start over from `initial`
    pub fn seed(&mut self, initial: DocumentSnapshot) {
        self.states.clear();
        self.states.push_back(initial);
        self.cursor = 0;
        self.dirty = false;
        self.may_consolidate = false;
        self.pending = None;
    }

    /// Record a new state after the cursor
    pub fn push(&mut self, snapshot: DocumentSnapshot) -> PushOutcome {
        assert!(
            !self.states.is_empty(),
            "history push before the initial state was recorded"
        );

        if self.cursor + 1 < self.states.len() {
            log::debug!(
                "Discarding {} redo state(s)",
                self.states.len() - self.cursor - 1
            );
            self.states.truncate(self.cursor + 1);
        }

        if snapshot.flags().contains(PushFlags::CONSOLIDATE)
            && self.may_consolidate
            && self.states[self.cursor].kind() == snapshot.kind()
        {
            self.states[self.cursor] = snapshot;
            self.dirty = true;
            self.pending = None;
            log::debug!("Consolidated into state {}", self.cursor);
            return PushOutcome::Consolidated(self.cursor);
        }

        self.pending = Some(PendingPush {
            dirty_before: self.dirty,
        });
        self.states.push_back(snapshot);
        self.cursor = self.states.len() - 1;
        self.dirty = true;
        self.may_consolidate = true;
        self.trim();

        log::debug!(
            "Pushed state {} ({} total)",
            self.cursor,
            self.states.len()
        );
        PushOutcome::Appended(self.cursor)
    }

    /// Remove the state appended by the last push and step back onto its
    /// predecessor. The dirty flag returns to what it was before that push.
    pub fn rollback(&mut self) -> &DocumentSnapshot {
        let Some(pending) = self.pending.take() else {
            panic!("rollback without a preceding push");
        };
        assert!(
            self.states.len() > 1 && self.cursor + 1 == self.states.len(),
            "rollback target is not the most recent state"
        );

        self.states.pop_back();
        self.cursor -= 1;
        self.dirty = pending.dirty_before;
        self.may_consolidate = false;

        log::debug!("Rolled back to state {}", self.cursor);
        &self.states[self.cursor]
    }

    /// Replace the content of the current state without moving the cursor
    pub fn modify_current(&mut self, doc: &DocumentState) {
        let current = self.current().amended(doc);
        self.states[self.cursor] = current;
        self.dirty = true;
        log::debug!("Modified state {}", self.cursor);
    }

    /// Move the cursor. Out of range is a programming error.
    pub fn set_cursor(&mut self, index: usize) -> &DocumentSnapshot {
        assert!(
            index < self.states.len(),
            "history index {} out of range (len {})",
            index,
            self.states.len()
        );
        self.cursor = index;
        self.may_consolidate = false;
        self.pending = None;
        &self.states[index]
    }

    pub fn current(&self) -> &DocumentSnapshot {
        assert!(!self.states.is_empty(), "history has no initial state");
        &self.states[self.cursor]
    }

    pub fn get(&self, index: usize) -> Option<&DocumentSnapshot> {
        self.states.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentSnapshot> {
        self.states.iter()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn undo_available(&self) -> bool {
        self.cursor > 0
    }

    pub fn redo_available(&self) -> bool {
        self.cursor + 1 < self.states.len()
    }

    /// True when the last operation was an appending push that can be rolled back
    pub fn can_rollback(&self) -> bool {
        self.pending.is_some()
    }

    /// Description of the step undo would revert
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_available()
            .then(|| self.states[self.cursor].short_description())
    }

    /// Description of the step redo would apply
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_available()
            .then(|| self.states[self.cursor + 1].short_description())
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.cursor = 0;
        self.may_consolidate = false;
        self.pending = None;
    }

    /// Content bytes held by the history. A buffer shared by several states
    /// is charged once, to the earliest.
    pub fn space_usage(&self) -> SpaceUsage {
        let mut seen = HashSet::new();
        let per_state: Vec<usize> = self
            .states
            .iter()
            .map(|state| {
                state
                    .tracks()
                    .iter()
                    .filter(|t| seen.insert(t.content().buffer_key()))
                    .map(|t| t.content_bytes())
                    .sum()
            })
            .collect();
        let total = per_state.iter().sum();
        SpaceUsage { per_state, total }
    }

    fn trim(&mut self) {
        if self.max_depth == 0 {
            return;
        }
        let mut dropped = 0;
        while self.states.len() > self.max_depth {
            self.states.pop_front();
            self.cursor -= 1;
            dropped += 1;
        }
        if dropped > 0 {
            log::warn!("History depth limit reached, dropped {} oldest state(s)", dropped);
        }
    }
}

/// A limit of one would leave nothing to roll back onto
fn normalize_depth(max_depth: usize) -> usize {
    if max_depth == 0 { 0 } else { max_depth.max(2) }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(0)
    }
}
