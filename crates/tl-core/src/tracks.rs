//! Track Collection
//!
//! Ordered sequence of shared track references. Cloning a `TrackList` copies
//! references only; content is cloned lazily through [`TrackList::make_mut`],
//! which detaches a track only while some other holder (a history snapshot,
//! a staged edit) still points at it.

use std::sync::Arc;

use crate::{TlError, TlResult, Track, TrackId};

/// Live, ordered track collection
#[derive(Debug, Clone, Default)]
pub struct TrackList {
    tracks: Vec<Arc<Track>>,
    next_id: u64,
}

impl TrackList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from existing references, keeping id allocation above them
    pub fn from_tracks(tracks: Vec<Arc<Track>>) -> Self {
        let next_id = tracks.iter().map(|t| t.id.0 + 1).max().unwrap_or(0);
        Self { tracks, next_id }
    }

    /// Reserve a fresh id. Ids are never reused within a list's lifetime.
    pub fn allocate_id(&mut self) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<Track>> + ExactSizeIterator {
        self.tracks.iter()
    }

    pub fn as_slice(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    pub fn ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|t| t.id).collect()
    }

    pub fn get(&self, id: TrackId) -> Option<&Arc<Track>> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&Arc<Track>> {
        self.tracks.get(index)
    }

    pub fn first(&self) -> Option<&Arc<Track>> {
        self.tracks.first()
    }

    pub fn last(&self) -> Option<&Arc<Track>> {
        self.tracks.last()
    }

    /// Position of a track in the sequence
    pub fn position(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.position(id).is_some()
    }

    pub fn selected(&self) -> impl Iterator<Item = &Arc<Track>> {
        self.tracks.iter().filter(|t| t.selected)
    }

    pub fn playable(&self) -> impl Iterator<Item = &Arc<Track>> {
        self.tracks.iter().filter(|t| t.is_playable())
    }

    /// Earliest start over all tracks, 0 when empty
    pub fn min_offset(&self) -> f64 {
        self.tracks
            .iter()
            .map(|t| t.start_time())
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    /// Latest end over all tracks, 0 when empty
    pub fn end_time(&self) -> f64 {
        self.tracks
            .iter()
            .map(|t| t.end_time())
            .reduce(f64::max)
            .unwrap_or(0.0)
    }

    /// Append a track. The id must not already be present.
    pub fn push(&mut self, track: Track) -> TlResult<TrackId> {
        let index = self.tracks.len();
        self.insert(index, track)
    }

    /// Insert a track at `index` (clamped to the end)
    pub fn insert(&mut self, index: usize, track: Track) -> TlResult<TrackId> {
        if self.contains(track.id) {
            return Err(TlError::InvalidParam(format!(
                "duplicate track id {:?}",
                track.id
            )));
        }
        let id = track.id;
        self.next_id = self.next_id.max(id.0 + 1);
        let index = index.min(self.tracks.len());
        self.tracks.insert(index, Arc::new(track));
        Ok(id)
    }

    pub fn remove(&mut self, id: TrackId) -> Option<Arc<Track>> {
        let index = self.position(id)?;
        Some(self.tracks.remove(index))
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Writable access to one track. Clones the track header if it is shared;
    /// content buffers stay shared until written through `samples_mut`/`labels_mut`.
    pub fn make_mut(&mut self, id: TrackId) -> TlResult<&mut Track> {
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TlError::TrackNotFound(id))?;
        Ok(Arc::make_mut(track))
    }

    /// Apply `f` to every track matching `filter`, cloning only those that change
    pub fn update_where(
        &mut self,
        filter: impl Fn(&Track) -> bool,
        mut f: impl FnMut(&mut Track),
    ) -> usize {
        let mut touched = 0;
        for track in self.tracks.iter_mut() {
            if !filter(track) {
                continue;
            }
            let mut copy = Track::clone(track);
            f(&mut copy);
            if copy != **track {
                *Arc::make_mut(track) = copy;
                touched += 1;
            }
        }
        touched
    }

    pub fn can_move_up(&self, id: TrackId) -> bool {
        matches!(self.position(id), Some(i) if i > 0)
    }

    pub fn can_move_down(&self, id: TrackId) -> bool {
        matches!(self.position(id), Some(i) if i + 1 < self.tracks.len())
    }

    /// Swap a track with its neighbour. Returns false when it cannot move.
    pub fn move_track(&mut self, id: TrackId, up: bool) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        if up {
            if index == 0 {
                return false;
            }
            self.tracks.swap(index, index - 1);
        } else {
            if index + 1 >= self.tracks.len() {
                return false;
            }
            self.tracks.swap(index, index + 1);
        }
        true
    }

    pub fn move_to_top(&mut self, id: TrackId) -> bool {
        match self.position(id) {
            Some(index) if index > 0 => {
                self.tracks[..=index].rotate_right(1);
                true
            }
            _ => false,
        }
    }

    pub fn move_to_bottom(&mut self, id: TrackId) -> bool {
        match self.position(id) {
            Some(index) if index + 1 < self.tracks.len() => {
                self.tracks[index..].rotate_left(1);
                true
            }
            _ => false,
        }
    }

    /// Swap in a whole reference sequence (history restore). No content is copied.
    pub fn replace_all(&mut self, tracks: &[Arc<Track>]) {
        self.tracks = tracks.to_vec();
        let floor = tracks.iter().map(|t| t.id.0 + 1).max().unwrap_or(0);
        self.next_id = self.next_id.max(floor);
    }

    /// True when both sequences hold the very same track objects in order
    pub fn same_refs(&self, other: &[Arc<Track>]) -> bool {
        self.tracks.len() == other.len()
            && self
                .tracks
                .iter()
                .zip(other)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(names: &[&str]) -> TrackList {
        let mut list = TrackList::new();
        for name in names {
            let id = list.allocate_id();
            list.push(Track::wave(id, *name, 48000, vec![0.0; 8])).unwrap();
        }
        list
    }

    fn names(list: &TrackList) -> Vec<String> {
        list.iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn test_make_mut_clones_only_shared() {
        let mut list = list_of(&["A", "B"]);
        let captured = list.as_slice().to_vec();

        list.make_mut(TrackId(0)).unwrap().muted = true;

        assert!(!Arc::ptr_eq(&list.as_slice()[0], &captured[0]));
        assert!(Arc::ptr_eq(&list.as_slice()[1], &captured[1]));
        assert!(!captured[0].muted);
        // Header clone keeps the sample buffer shared
        assert!(list.as_slice()[0].shares_content_with(&captured[0]));
    }

    #[test]
    fn test_make_mut_in_place_when_unshared() {
        let mut list = list_of(&["A"]);
        let before = Arc::as_ptr(&list.as_slice()[0]);
        list.make_mut(TrackId(0)).unwrap().name = "Renamed".into();
        assert_eq!(Arc::as_ptr(&list.as_slice()[0]), before);
    }

    #[test]
    fn test_make_mut_missing_track() {
        let mut list = list_of(&["A"]);
        assert!(matches!(
            list.make_mut(TrackId(9)),
            Err(TlError::TrackNotFound(TrackId(9)))
        ));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut list = list_of(&["A"]);
        let dup = Track::label(TrackId(0), "dup");
        assert!(list.push(dup).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_reorder() {
        let mut list = list_of(&["A", "B", "C", "D"]);
        let captured = list.as_slice().to_vec();

        assert!(list.move_track(TrackId(1), true));
        assert_eq!(names(&list), ["B", "A", "C", "D"]);

        assert!(list.move_to_bottom(TrackId(1)));
        assert_eq!(names(&list), ["A", "C", "D", "B"]);

        assert!(list.move_to_top(TrackId(2)));
        assert_eq!(names(&list), ["C", "A", "D", "B"]);

        assert!(!list.move_track(TrackId(2), true));
        assert!(!list.move_to_bottom(TrackId(1)));

        // Reordering never clones
        for track in list.iter() {
            assert!(captured.iter().any(|c| Arc::ptr_eq(c, track)));
        }
    }

    #[test]
    fn test_update_where_skips_unchanged() {
        let mut list = list_of(&["A", "B"]);
        list.make_mut(TrackId(1)).unwrap().selected = true;
        let captured = list.as_slice().to_vec();

        let touched = list.update_where(|_| true, |t| t.selected = true);

        assert_eq!(touched, 1);
        assert!(Arc::ptr_eq(&list.as_slice()[1], &captured[1]));
        assert!(list.iter().all(|t| t.selected));
    }

    #[test]
    fn test_replace_all_keeps_ids_fresh() {
        let mut list = list_of(&["A", "B", "C"]);
        let earlier = list.as_slice()[..1].to_vec();
        list.replace_all(&earlier);
        assert_eq!(list.len(), 1);
        assert_eq!(list.allocate_id(), TrackId(3));
        assert!(list.same_refs(&earlier));
    }

    #[test]
    fn test_extent() {
        let mut list = TrackList::new();
        assert_eq!(list.end_time(), 0.0);
        let mut a = Track::wave(TrackId(0), "A", 10, vec![0.0; 20]);
        a.offset = 0.5;
        list.push(a).unwrap();
        list.push(Track::wave(TrackId(1), "B", 10, vec![0.0; 10])).unwrap();
        assert_eq!(list.min_offset(), 0.0);
        assert!((list.end_time() - 2.5).abs() < 1e-9);
    }
}
