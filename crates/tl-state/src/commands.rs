//! Track and selection operations
//!
//! Every operation edits the live document of a [`Project`] and records the
//! result through its history:
//! - Track operations (add, remove, rename, reorder) push undoable states
//! - Mute/solo follow the project's `SoloMode` and push with autosave
//! - Content edits run as staged, all-or-nothing transactions
//! - Selection changes amend the current state instead of pushing

use tl_core::{DocumentState, Label, SelectedRegion, TlResult, Track, TrackId, TrackKind};

use crate::{EditDescription, EditKind, Project, PushFlags};

/// Where to move a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveChoice {
    Up,
    Down,
    ToTop,
    ToBottom,
}

impl MoveChoice {
    fn descriptions(self) -> (&'static str, &'static str) {
        match self {
            MoveChoice::Up => ("Moved '{}' Up", "Move Track Up"),
            MoveChoice::Down => ("Moved '{}' Down", "Move Track Down"),
            MoveChoice::ToTop => ("Moved '{}' to Top", "Move Track to Top"),
            MoveChoice::ToBottom => ("Moved '{}' to Bottom", "Move Track to Bottom"),
        }
    }
}

// ============ Track Operations ============

impl Project {
    /// Append an audio track, select it alone and focus it
    pub fn add_wave_track(
        &mut self,
        name: impl Into<String>,
        sample_rate: u32,
        samples: Vec<f32>,
    ) -> TlResult<TrackId> {
        let name = name.into();
        self.add_track(
            EditDescription::new("Created new audio track", "Add Track", EditKind::AddTrack),
            move |id| Track::wave(id, name, sample_rate, samples),
        )
    }

    /// Append an empty label track, select it alone and focus it
    pub fn add_label_track(&mut self, name: impl Into<String>) -> TlResult<TrackId> {
        let name = name.into();
        self.add_track(
            EditDescription::new("Created new label track", "Add Track", EditKind::AddTrack),
            move |id| Track::label(id, name),
        )
    }

    fn add_track(
        &mut self,
        description: EditDescription,
        make: impl FnOnce(TrackId) -> Track,
    ) -> TlResult<TrackId> {
        let id = self.edit(description, PushFlags::AUTOSAVE, |doc| {
            deselect_all(doc);
            let mut track = make(doc.tracks.allocate_id());
            track.selected = true;
            doc.tracks.push(track)
        })?;
        self.focus.set(Some(id), &self.doc.tracks);
        log::debug!("Added {:?} track {:?}", self.doc.tracks.get(id).map(|t| t.kind()), id);
        Ok(id)
    }

    /// Remove every selected track. Focus moves to the track that followed
    /// the removed block, else to the last remaining track. Returns the number
    /// of tracks removed; nothing is pushed when none were selected.
    pub fn remove_selected_tracks(&mut self) -> usize {
        let to_remove: Vec<TrackId> = self.doc.tracks.selected().map(|t| t.id).collect();
        let Some(first) = to_remove.first().and_then(|id| self.doc.tracks.position(*id)) else {
            return 0;
        };

        self.apply(
            EditDescription::new("Removed audio track(s)", "Remove Track", EditKind::RemoveTrack),
            PushFlags::AUTOSAVE,
            |doc| {
                for id in &to_remove {
                    doc.tracks.remove(*id);
                }
            },
        );

        // Every track before `first` survived, so the next survivor now sits at `first`
        let tracks = &self.doc.tracks;
        let new_focus = tracks.at(first).or_else(|| tracks.last()).map(|t| t.id);
        self.focus.set(new_focus, tracks);
        to_remove.len()
    }

    /// Remove one track. If it had focus, focus moves to the next track, or
    /// the previous one when it was last.
    pub fn remove_track(&mut self, id: TrackId) -> bool {
        let Some(index) = self.doc.tracks.position(id) else {
            return false;
        };
        let tracks = &self.doc.tracks;
        let was_focused = self.focus.is_focused(id, tracks);
        let new_focus = tracks
            .at(index + 1)
            .or_else(|| index.checked_sub(1).and_then(|i| tracks.at(i)))
            .map(|t| t.id);
        let name = tracks.as_slice()[index].name.clone();

        self.apply(
            EditDescription::new(
                format!("Removed track '{}.'", name),
                "Track Remove",
                EditKind::RemoveTrack,
            ),
            PushFlags::AUTOSAVE,
            |doc| doc.tracks.remove(id),
        );

        if was_focused {
            self.focus.set(new_focus, &self.doc.tracks);
        }
        if self.last_picked == Some(id) {
            self.last_picked = None;
        }
        true
    }

    /// Reorder a track. Only the reference sequence changes. Returns false,
    /// pushing nothing, when the track cannot move that way.
    pub fn move_track(&mut self, id: TrackId, choice: MoveChoice) -> bool {
        let tracks = &self.doc.tracks;
        let movable = match choice {
            MoveChoice::Up | MoveChoice::ToTop => tracks.can_move_up(id),
            MoveChoice::Down | MoveChoice::ToBottom => tracks.can_move_down(id),
        };
        let Some(track) = tracks.get(id).filter(|_| movable) else {
            return false;
        };

        let (long, short) = choice.descriptions();
        let description = EditDescription::new(
            long.replace("{}", &track.name),
            short,
            EditKind::MoveTrack,
        );

        self.apply(description, PushFlags::AUTOSAVE, |doc| match choice {
            MoveChoice::Up => doc.tracks.move_track(id, true),
            MoveChoice::Down => doc.tracks.move_track(id, false),
            MoveChoice::ToTop => doc.tracks.move_to_top(id),
            MoveChoice::ToBottom => doc.tracks.move_to_bottom(id),
        })
    }

    /// Rename a track. Consecutive renames collapse into one undo step.
    pub fn rename_track(&mut self, id: TrackId, name: impl Into<String>) -> bool {
        let name = name.into();
        let Some(old) = self.doc.tracks.get(id).map(|t| t.name.clone()) else {
            return false;
        };
        if old == name {
            return false;
        }

        let description = EditDescription::new(
            format!("Renamed '{}' to '{}'", old, name),
            "Name Change",
            EditKind::RenameTrack,
        );
        self.apply(description, PushFlags::CONSOLIDATE | PushFlags::AUTOSAVE, |doc| {
            doc.tracks.update_where(|t| t.id == id, |t| t.name.clone_from(&name));
        });
        true
    }

    // ============ Mute / Solo ============

    /// Toggle mute. `exclusive` mutes only this track, unmutes every other
    /// playable track and clears all solos.
    pub fn toggle_mute(&mut self, id: TrackId, exclusive: bool) -> bool {
        let Some(track) = self.doc.tracks.get(id) else {
            return false;
        };
        if !exclusive && !track.is_playable() {
            return false;
        }
        let was_muted = track.muted;
        let long = if exclusive {
            format!("Muted all tracks except '{}'", track.name)
        } else if was_muted {
            format!("Unmuted '{}'", track.name)
        } else {
            format!("Muted '{}'", track.name)
        };
        let maintain_solo = self.settings.is_solo_simple() || self.settings.is_solo_none();

        self.apply(
            EditDescription::new(long, "Mute", EditKind::Mute),
            PushFlags::AUTOSAVE,
            |doc| {
                if exclusive {
                    doc.tracks.update_where(Track::is_playable, |t| {
                        t.muted = t.id == id;
                        t.solo = false;
                    });
                    return;
                }

                doc.tracks.update_where(|t| t.id == id, |t| t.muted = !was_muted);

                if maintain_solo {
                    // A lone audible track among several shows as soloed
                    let playable = doc.tracks.playable().count();
                    let playing = doc.tracks.playable().filter(|t| !t.muted).count();
                    let lone = playing == 1 && playable > 1;
                    doc.tracks
                        .update_where(Track::is_playable, |t| t.solo = lone && !t.muted);
                }
            },
        );
        true
    }

    /// Toggle solo. With `SoloMode::Multiple` (or `exclusive` under the
    /// other modes) only this track's solo flips. Otherwise it becomes the
    /// sole soloed track, and under `SoloMode::Simple` the others are muted
    /// or unmuted to match.
    pub fn toggle_solo(&mut self, id: TrackId, exclusive: bool) -> bool {
        let Some(track) = self.doc.tracks.get(id).filter(|t| t.is_playable()) else {
            return false;
        };
        let was_solo = track.solo;
        let long = if was_solo {
            format!("Unsoloed '{}'", track.name)
        } else {
            format!("Soloed '{}'", track.name)
        };
        let simple = self.settings.is_solo_simple();
        let multiple = !simple ^ exclusive;

        self.apply(
            EditDescription::new(long, "Solo", EditKind::Solo),
            PushFlags::AUTOSAVE,
            |doc| {
                if multiple {
                    doc.tracks.update_where(|t| t.id == id, |t| t.solo = !was_solo);
                    return;
                }
                doc.tracks.update_where(Track::is_playable, |t| {
                    let chosen = t.id == id;
                    t.solo = chosen && !was_solo;
                    if simple {
                        t.muted = !chosen && !was_solo;
                    }
                });
            },
        );
        true
    }

    // ============ Content ============

    /// Edit the samples of an audio track. The buffer is detached from
    /// history first; if that or `f` fails nothing is changed or pushed.
    pub fn edit_samples<R>(
        &mut self,
        id: TrackId,
        description: EditDescription,
        flags: PushFlags,
        f: impl FnOnce(&mut Vec<f32>) -> TlResult<R>,
    ) -> TlResult<R> {
        self.edit(description, flags, |doc| {
            let samples = doc.tracks.make_mut(id)?.samples_mut()?;
            f(samples)
        })
    }

    /// Edit the labels of a label track, all-or-nothing
    pub fn edit_labels<R>(
        &mut self,
        id: TrackId,
        description: EditDescription,
        flags: PushFlags,
        f: impl FnOnce(&mut Vec<Label>) -> TlResult<R>,
    ) -> TlResult<R> {
        self.edit(description, flags, |doc| {
            let labels = doc.tracks.make_mut(id)?.labels_mut()?;
            f(labels)
        })
    }

    // ============ Selection ============

    /// Select all time and every track
    pub fn select_all(&mut self) {
        self.select_time_and_tracks(true, true);
    }

    /// Select all time and only the audio tracks
    pub fn select_all_audio(&mut self) {
        select_all_time(&mut self.doc);
        self.doc.tracks.update_where(
            |_| true,
            |t| t.selected = t.kind() == TrackKind::Wave,
        );
        self.history.modify_state(&self.doc, false);
    }

    /// Deselect every track. Not recorded in history.
    pub fn select_none(&mut self) {
        deselect_all(&mut self.doc);
    }

    pub fn select_time_and_tracks(&mut self, all_time: bool, all_tracks: bool) {
        if all_time {
            select_all_time(&mut self.doc);
        }
        if all_tracks {
            self.doc.tracks.update_where(|t| !t.selected, |t| t.selected = true);
            self.history.modify_state(&self.doc, false);
        }
    }

    /// Select all tracks if none are selected, and all time if the region is
    /// a point
    pub fn select_something(&mut self) {
        let no_time = self.doc.view.selected_region.is_point();
        let no_tracks = self.doc.tracks.selected().next().is_none();
        if no_time || no_tracks {
            self.select_time_and_tracks(no_time, no_tracks);
        }
    }

    /// Select all audio when nothing usable is selected
    pub fn select_all_if_none(&mut self) {
        if self.doc.tracks.selected().next().is_none()
            || self.doc.view.selected_region.is_point()
        {
            self.select_all_audio();
        }
    }

    /// Track-list click.
    /// - `ctrl` toggles this track's selection
    /// - `shift` selects the range from the last picked track (or the nearest
    ///   end of the current selection) to this one
    /// - a plain click selects only this track and its time extent
    ///
    /// Focus follows unless `ctrl` is held.
    pub fn list_selection(
        &mut self,
        id: TrackId,
        shift: bool,
        ctrl: bool,
        modify_state: bool,
    ) -> bool {
        let Some(index) = self.doc.tracks.position(id) else {
            return false;
        };

        if ctrl {
            self.doc.tracks.update_where(|t| t.id == id, |t| t.selected = !t.selected);
            self.last_picked = Some(id);
        } else if shift && self.has_extend_anchor() {
            let anchor = self.extend_anchor(index);
            deselect_all(&mut self.doc);
            match anchor.and_then(|a| self.doc.tracks.position(a)) {
                Some(from) => {
                    let (lo, hi) = (from.min(index), from.max(index));
                    let range: Vec<TrackId> = self.doc.tracks.as_slice()[lo..=hi]
                        .iter()
                        .map(|t| t.id)
                        .collect();
                    self.doc
                        .tracks
                        .update_where(|t| range.contains(&t.id), |t| t.selected = true);
                    self.last_picked = anchor;
                }
                None => {
                    self.doc.tracks.update_where(|t| t.id == id, |t| t.selected = true);
                    self.last_picked = Some(id);
                }
            }
        } else {
            deselect_all(&mut self.doc);
            self.doc.tracks.update_where(|t| t.id == id, |t| t.selected = true);
            self.last_picked = Some(id);
            if let Some(track) = self.doc.tracks.get(id) {
                let region = SelectedRegion::new(track.start_time(), track.end_time());
                self.doc.view.selected_region = region;
            }
        }

        if !ctrl {
            self.focus.set(Some(id), &self.doc.tracks);
        }
        if modify_state {
            self.history.modify_state(&self.doc, true);
        }
        true
    }

    fn has_extend_anchor(&self) -> bool {
        self.last_picked.is_some_and(|id| self.doc.tracks.contains(id))
            || self.doc.tracks.selected().next().is_some()
    }

    /// Last picked track if still present, else the first selected track when
    /// `index` is at or after it, else the last selected track
    fn extend_anchor(&self, index: usize) -> Option<TrackId> {
        let tracks = &self.doc.tracks;
        if let Some(id) = self.last_picked.filter(|id| tracks.contains(*id)) {
            return Some(id);
        }
        let first = tracks.selected().next()?;
        if tracks.position(first.id).is_some_and(|p| index >= p) {
            return Some(first.id);
        }
        tracks.selected().last().map(|t| t.id)
    }
}

fn deselect_all(doc: &mut DocumentState) {
    doc.tracks.update_where(|t| t.selected, |t| t.selected = false);
}

fn select_all_time(doc: &mut DocumentState) {
    let (t0, t1) = (doc.tracks.min_offset(), doc.tracks.end_time());
    doc.view.selected_region.set_times(t0, t1);
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProjectSettings, SoloMode};

    fn project(solo_mode: SoloMode) -> (Project, Vec<TrackId>) {
        let settings = ProjectSettings {
            solo_mode,
            ..Default::default()
        };
        let mut project = Project::new("test", settings);
        let ids = ["A", "B", "C"]
            .into_iter()
            .map(|name| project.add_wave_track(name, 48000, vec![0.0; 480]).unwrap())
            .collect();
        (project, ids)
    }

    fn flags(project: &Project, id: TrackId) -> (bool, bool) {
        let track = project.tracks().get(id).unwrap();
        (track.muted, track.solo)
    }

    fn names(project: &Project) -> Vec<String> {
        project.tracks().iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn test_add_track_selects_and_focuses() {
        let (project, ids) = project(SoloMode::Simple);
        assert_eq!(project.history().len(), 4);
        assert_eq!(project.history().undo_description(), Some("Add Track"));

        let selected: Vec<_> = project.tracks().selected().map(|t| t.id).collect();
        assert_eq!(selected, vec![ids[2]]);
        assert_eq!(project.focused_track().map(|t| t.id), Some(ids[2]));
    }

    #[test]
    fn test_remove_selected_focuses_following_track() {
        let (mut project, ids) = project(SoloMode::Simple);
        project.list_selection(ids[0], false, false, false);
        project.list_selection(ids[1], true, false, false);

        assert_eq!(project.remove_selected_tracks(), 2);
        assert_eq!(names(&project), vec!["C"]);
        assert_eq!(project.focused_track().map(|t| t.id), Some(ids[2]));
        assert_eq!(project.history().undo_description(), Some("Remove Track"));

        project.select_none();
        let len = project.history().len();
        assert_eq!(project.remove_selected_tracks(), 0);
        assert_eq!(project.history().len(), len);
    }

    #[test]
    fn test_remove_selected_at_end_focuses_last() {
        let (mut project, ids) = project(SoloMode::Simple);
        assert_eq!(project.remove_selected_tracks(), 1);
        assert_eq!(project.focused_track().map(|t| t.id), Some(ids[1]));
    }

    #[test]
    fn test_remove_focused_track_moves_focus() {
        let (mut project, ids) = project(SoloMode::Simple);
        project.set_focus(Some(ids[1]));
        assert!(project.remove_track(ids[1]));
        assert_eq!(project.focused_track().map(|t| t.id), Some(ids[2]));
        assert_eq!(
            project.history().current().long_description(),
            "Removed track 'B.'"
        );

        project.set_focus(Some(ids[2]));
        assert!(project.remove_track(ids[2]));
        assert_eq!(project.focused_track().map(|t| t.id), Some(ids[0]));
        assert!(!project.remove_track(ids[2]));
    }

    #[test]
    fn test_move_track() {
        let (mut project, ids) = project(SoloMode::Simple);
        let len = project.history().len();

        assert!(!project.move_track(ids[0], MoveChoice::Up));
        assert_eq!(project.history().len(), len);

        assert!(project.move_track(ids[0], MoveChoice::ToBottom));
        assert_eq!(names(&project), vec!["B", "C", "A"]);
        assert_eq!(
            project.history().current().long_description(),
            "Moved 'A' to Bottom"
        );

        assert!(project.move_track(ids[0], MoveChoice::Up));
        assert_eq!(names(&project), vec!["B", "A", "C"]);

        project.undo();
        project.undo();
        assert_eq!(names(&project), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_move_does_not_clone_tracks() {
        let (mut project, ids) = project(SoloMode::Simple);
        let before = project.tracks().get(ids[1]).unwrap().clone();
        project.move_track(ids[1], MoveChoice::ToTop);
        assert!(std::sync::Arc::ptr_eq(
            &before,
            project.tracks().get(ids[1]).unwrap()
        ));
    }

    #[test]
    fn test_renames_consolidate() {
        let (mut project, ids) = project(SoloMode::Simple);
        let len = project.history().len();

        assert!(project.rename_track(ids[0], "Dr"));
        assert!(project.rename_track(ids[0], "Drums"));
        assert!(!project.rename_track(ids[0], "Drums"));

        assert_eq!(project.history().len(), len + 1);
        assert_eq!(project.tracks().get(ids[0]).unwrap().name, "Drums");

        project.undo();
        assert_eq!(project.tracks().get(ids[0]).unwrap().name, "A");
    }

    #[test]
    fn test_simple_mute_maintains_solo_indicator() {
        let (mut project, ids) = project(SoloMode::Simple);
        project.toggle_mute(ids[0], false);
        assert_eq!(flags(&project, ids[0]), (true, false));
        assert_eq!(flags(&project, ids[1]), (false, false));

        project.toggle_mute(ids[1], false);
        // Only C is audible now
        assert_eq!(flags(&project, ids[2]), (false, true));
        assert_eq!(flags(&project, ids[0]), (true, false));

        project.toggle_mute(ids[0], false);
        assert_eq!(flags(&project, ids[2]), (false, false));
    }

    #[test]
    fn test_exclusive_mute() {
        let (mut project, ids) = project(SoloMode::Multiple);
        project.toggle_solo(ids[2], false);
        project.toggle_mute(ids[1], true);

        assert_eq!(flags(&project, ids[0]), (false, false));
        assert_eq!(flags(&project, ids[1]), (true, false));
        assert_eq!(flags(&project, ids[2]), (false, false));
    }

    #[test]
    fn test_simple_solo_mutes_others() {
        let (mut project, ids) = project(SoloMode::Simple);
        project.toggle_solo(ids[1], false);
        assert_eq!(flags(&project, ids[0]), (true, false));
        assert_eq!(flags(&project, ids[1]), (false, true));
        assert_eq!(flags(&project, ids[2]), (true, false));

        project.toggle_solo(ids[1], false);
        for id in &ids {
            assert_eq!(flags(&project, *id), (false, false));
        }
    }

    #[test]
    fn test_multiple_solo_is_independent() {
        let (mut project, ids) = project(SoloMode::Multiple);
        project.toggle_solo(ids[0], false);
        project.toggle_solo(ids[1], false);
        assert_eq!(flags(&project, ids[0]), (false, true));
        assert_eq!(flags(&project, ids[1]), (false, true));
        assert_eq!(flags(&project, ids[2]), (false, false));

        // Exclusive flips back to radio behaviour without muting
        project.toggle_solo(ids[2], true);
        assert_eq!(flags(&project, ids[0]), (false, false));
        assert_eq!(flags(&project, ids[2]), (false, true));
    }

    #[test]
    fn test_mute_and_solo_are_undoable() {
        let (mut project, ids) = project(SoloMode::Simple);
        project.toggle_mute(ids[0], false);
        assert_eq!(project.history().undo_description(), Some("Mute"));

        project.undo();
        assert_eq!(flags(&project, ids[0]), (false, false));
    }

    #[test]
    fn test_label_track_cannot_be_muted() {
        let (mut project, _) = project(SoloMode::Simple);
        let labels = project.add_label_track("Notes").unwrap();
        let len = project.history().len();

        assert!(!project.toggle_mute(labels, false));
        assert!(!project.toggle_solo(labels, false));
        assert_eq!(project.history().len(), len);
    }

    #[test]
    fn test_edit_samples_is_isolated_from_history() {
        let (mut project, ids) = project(SoloMode::Simple);
        let before = project.history().current().clone();

        project
            .edit_samples(
                ids[0],
                EditDescription::new("Amplify", "Amplify", EditKind::EditContent),
                PushFlags::NONE,
                |samples| {
                    samples.iter_mut().for_each(|s| *s = 1.0);
                    Ok(())
                },
            )
            .unwrap();

        let old = before.track(ids[0]).unwrap();
        assert!(old.samples().unwrap().iter().all(|s| *s == 0.0));
        let new = project.tracks().get(ids[0]).unwrap();
        assert!(new.samples().unwrap().iter().all(|s| *s == 1.0));
        // Untouched tracks keep sharing their content
        assert!(before
            .track(ids[1])
            .unwrap()
            .shares_content_with(project.tracks().get(ids[1]).unwrap()));
    }

    #[test]
    fn test_edit_on_wrong_kind_fails_cleanly() {
        let (mut project, ids) = project(SoloMode::Simple);
        let len = project.history().len();

        let result = project.edit_labels(
            ids[0],
            EditDescription::new("Add label", "Add Label", EditKind::EditContent),
            PushFlags::NONE,
            |labels| {
                labels.push(Label::point(0.0, "x"));
                Ok(())
            },
        );

        assert!(result.is_err());
        assert_eq!(project.history().len(), len);
    }

    #[test]
    fn test_selection_amends_current_state() {
        let (mut project, ids) = project(SoloMode::Simple);
        let len = project.history().len();

        project.select_all();
        assert_eq!(project.tracks().selected().count(), 3);
        assert_eq!(project.history().len(), len);
        assert_eq!(project.history().current().selection().tracks, ids);
        assert_eq!(project.view().selected_region.t1(), 0.01);

        project.select_none();
        assert_eq!(project.tracks().selected().count(), 0);
        // select_none does not touch history
        assert_eq!(project.history().current().selection().tracks.len(), 3);
    }

    #[test]
    fn test_select_all_audio_skips_labels() {
        let (mut project, ids) = project(SoloMode::Simple);
        project.add_label_track("Notes").unwrap();

        project.select_all_audio();
        let selected: Vec<_> = project.tracks().selected().map(|t| t.id).collect();
        assert_eq!(selected, ids);
    }

    #[test]
    fn test_select_something() {
        let (mut project, _) = project(SoloMode::Simple);
        project.select_none();
        project.set_selected_region(SelectedRegion::point(0.0));

        project.select_something();
        assert_eq!(project.tracks().selected().count(), 3);
        assert!(!project.view().selected_region.is_point());
    }

    #[test]
    fn test_list_selection_modifiers() {
        let (mut project, ids) = project(SoloMode::Simple);

        project.list_selection(ids[0], false, false, false);
        let selected: Vec<_> = project.tracks().selected().map(|t| t.id).collect();
        assert_eq!(selected, vec![ids[0]]);
        assert_eq!(project.focused_track().map(|t| t.id), Some(ids[0]));

        project.list_selection(ids[2], true, false, false);
        assert_eq!(project.tracks().selected().count(), 3);

        project.list_selection(ids[1], false, true, true);
        let selected: Vec<_> = project.tracks().selected().map(|t| t.id).collect();
        assert_eq!(selected, vec![ids[0], ids[2]]);
        // Ctrl-click leaves focus alone
        assert_eq!(project.focused_track().map(|t| t.id), Some(ids[2]));
        assert_eq!(project.history().current().selection().tracks, selected);
    }
}
