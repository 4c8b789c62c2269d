//! Track focus
//!
//! The focused track is remembered by identity only. Undo, redo and removal
//! can make it disappear at any time, so every read resolves it against the
//! live track list.

use std::sync::Arc;

use tl_core::{Track, TrackId, TrackList};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackFocus {
    focused: Option<TrackId>,
}

impl TrackFocus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Focused track, or the first track when focus is unset or stale
    pub fn get<'a>(&self, tracks: &'a TrackList) -> Option<&'a Arc<Track>> {
        self.focused
            .and_then(|id| tracks.get(id))
            .or_else(|| tracks.first())
    }

    /// Focus `id`. Returns the focus actually applied, which falls back to the
    /// first track when `id` is absent from the list.
    pub fn set(&mut self, id: Option<TrackId>, tracks: &TrackList) -> Option<TrackId> {
        self.focused = id
            .filter(|id| tracks.contains(*id))
            .or_else(|| tracks.first().map(|t| t.id));
        self.focused
    }

    pub fn clear(&mut self) {
        self.focused = None;
    }

    /// Raw stored identity, which may no longer resolve
    pub fn id(&self) -> Option<TrackId> {
        self.focused
    }

    pub fn is_focused(&self, id: TrackId, tracks: &TrackList) -> bool {
        self.get(tracks).is_some_and(|t| t.id == id)
    }
}
