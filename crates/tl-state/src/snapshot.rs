//! Document snapshots
//!
//! A snapshot records the track *references* of the document at one point in
//! history, never copies of their content. Tracks are immutable once
//! captured: later edits go through `TrackList::make_mut`, which clones before
//! writing, so the references held here keep pointing at the pre-edit data.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tl_core::{DocumentState, SelectionState, Track, TrackId};

// ============ Push Flags ============

/// Options for recording a new history state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PushFlags(u8);

impl PushFlags {
    pub const NONE: Self = Self(0);
    /// Merge into the current state when it records the same kind of edit
    pub const CONSOLIDATE: Self = Self(1 << 0);
    /// Ask the persistence collaborator for a recovery copy after the push
    pub const AUTOSAVE: Self = Self(1 << 1);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PushFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PushFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// ============ Edit Description ============

/// Structured tag for the edit that produced a state. Consolidation compares
/// these, never the display strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    Initial,
    AddTrack,
    RemoveTrack,
    MoveTrack,
    RenameTrack,
    Mute,
    Solo,
    Select,
    EditContent,
    /// Application-defined edit, keyed by a stable identifier
    Custom(&'static str),
}

/// Human readable description of a history step plus its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDescription {
    /// Shown in the history list, e.g. "Removed track 'Drums'"
    pub long: String,
    /// Shown in Undo/Redo menu items, e.g. "Remove Track"
    pub short: String,
    pub kind: EditKind,
}

impl EditDescription {
    pub fn new(long: impl Into<String>, short: impl Into<String>, kind: EditKind) -> Self {
        Self {
            long: long.into(),
            short: short.into(),
            kind,
        }
    }

    pub fn initial() -> Self {
        Self::new("Created new project", "", EditKind::Initial)
    }
}

impl fmt::Display for EditDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.long)
    }
}

// ============ Snapshot ============

/// Immutable record of one history state
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    tracks: Arc<[Arc<Track>]>,
    selection: SelectionState,
    description: EditDescription,
    flags: PushFlags,
    captured_at: DateTime<Utc>,
}

impl DocumentSnapshot {
    /// Record the current document. Costs one reference count per track.
    pub fn capture(doc: &DocumentState, description: EditDescription, flags: PushFlags) -> Self {
        Self {
            tracks: doc.tracks.as_slice().into(),
            selection: doc.selection(),
            description,
            flags,
            captured_at: Utc::now(),
        }
    }

    /// New snapshot with this one's description but the document's content.
    /// Used when a state is amended in place.
    pub fn amended(&self, doc: &DocumentState) -> Self {
        Self::capture(doc, self.description.clone(), self.flags)
    }

    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Arc<Track>> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn track_ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|t| t.id).collect()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn description(&self) -> &EditDescription {
        &self.description
    }

    pub fn long_description(&self) -> &str {
        &self.description.long
    }

    pub fn short_description(&self) -> &str {
        &self.description.short
    }

    pub fn kind(&self) -> EditKind {
        self.description.kind
    }

    pub fn flags(&self) -> PushFlags {
        self.flags
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// True when both snapshots reference the same track objects in order
    pub fn same_tracks_as(&self, other: &DocumentSnapshot) -> bool {
        self.tracks.len() == other.tracks.len()
            && self
                .tracks
                .iter()
                .zip(other.tracks.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }

    /// Sum of content bytes referenced, counting shared buffers once per snapshot
    pub fn content_bytes(&self) -> usize {
        let mut seen = Vec::with_capacity(self.tracks.len());
        self.tracks
            .iter()
            .filter(|t| {
                let key = t.content().buffer_key();
                if seen.contains(&key) {
                    false
                } else {
                    seen.push(key);
                    true
                }
            })
            .map(|t| t.content_bytes())
            .sum()
    }
}
