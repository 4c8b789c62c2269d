//! Live document state: the track collection plus its view

use std::sync::Arc;

use crate::{SelectionState, Track, TrackList, ViewInfo};

/// What the editor is currently showing. History snapshots are taken from
/// this and restored into it.
#[derive(Debug, Clone, Default)]
pub struct DocumentState {
    pub tracks: TrackList,
    pub view: ViewInfo,
}

impl DocumentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(tracks: TrackList) -> Self {
        Self {
            tracks,
            view: ViewInfo::default(),
        }
    }

    pub fn selection(&self) -> SelectionState {
        SelectionState::capture(&self.tracks, &self.view)
    }

    /// Point the live collection at a recorded sequence. Reference swap only.
    pub fn restore(&mut self, tracks: &[Arc<Track>], selection: &SelectionState) {
        self.tracks.replace_all(tracks);
        self.view.selected_region = selection.region;
    }
}
