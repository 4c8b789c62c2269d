//! Project session
//!
//! Owns one open document and everything tied to its lifetime:
//! - Live `DocumentState`
//! - `ProjectHistory` (undo/redo)
//! - Track focus and last-picked track
//! - Settings and the optional autosave collaborator
//!
//! Editing operations receive the session by `&mut`, there is no global
//! per-project registry.

use std::sync::Arc;

use tl_core::{DocumentState, SelectedRegion, TlResult, Track, TrackId, TrackList, ViewInfo};

use crate::{
    AutosaveError, AutosaveManager, AutosaveSink, EditDescription, HistoryObserver, ObserverId,
    ProjectHistory, ProjectSettings, PushFlags, RecoveryRecord, TrackFocus,
};

/// An open project
pub struct Project {
    pub(crate) name: String,
    pub(crate) doc: DocumentState,
    pub(crate) history: ProjectHistory,
    pub(crate) focus: TrackFocus,
    pub(crate) settings: ProjectSettings,
    /// Anchor for shift-click list selection
    pub(crate) last_picked: Option<TrackId>,
    autosave_manager: Option<Arc<AutosaveManager>>,
}

impl Project {
    /// New empty project, history seeded
    pub fn new(name: impl Into<String>, settings: ProjectSettings) -> Self {
        Self::with_document(name, settings, DocumentState::new())
    }

    /// Open an existing document. Its current content becomes the clean
    /// initial state.
    pub fn with_document(
        name: impl Into<String>,
        settings: ProjectSettings,
        doc: DocumentState,
    ) -> Self {
        let mut history = ProjectHistory::new(&settings.history);
        history.initial_state(&doc);

        let name = name.into();
        log::info!("Opened project '{}' with {} track(s)", name, doc.tracks.len());

        Self {
            name,
            doc,
            history,
            focus: TrackFocus::new(),
            settings,
            last_picked: None,
            autosave_manager: None,
        }
    }

    /// Rebuild a project from a crash recovery record. The result is dirty,
    /// since nothing persisted matches it.
    pub fn recover(
        name: impl Into<String>,
        settings: ProjectSettings,
        record: RecoveryRecord,
    ) -> Self {
        log::info!(
            "Recovering '{}' from autosave written {}",
            record.project_name,
            record.saved_at
        );
        let mut project = Self::with_document(name, settings, record.into_document());
        project.history.set_dirty(true);
        project
    }

    // ============ Collaborators ============

    /// Use a file-backed autosave manager. Recovery files are named after
    /// the project and cleared on save and clean close.
    pub fn attach_autosave(&mut self, manager: Arc<AutosaveManager>) {
        manager.set_project_name(self.name.as_str());
        self.history
            .set_autosave_sink(Some(manager.clone() as Arc<dyn AutosaveSink>));
        self.autosave_manager = Some(manager);
    }

    /// Use any persistence collaborator, or none
    pub fn set_autosave_sink(&mut self, sink: Option<Arc<dyn AutosaveSink>>) {
        self.autosave_manager = None;
        self.history.set_autosave_sink(sink);
    }

    pub fn subscribe(&mut self, observer: impl HistoryObserver + 'static) -> ObserverId {
        self.history.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.history.unsubscribe(id)
    }

    // ============ Accessors ============

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn document(&self) -> &DocumentState {
        &self.doc
    }

    pub fn tracks(&self) -> &TrackList {
        &self.doc.tracks
    }

    pub fn view(&self) -> &ViewInfo {
        &self.doc.view
    }

    /// Scroll and zoom are not part of history
    pub fn view_mut(&mut self) -> &mut ViewInfo {
        &mut self.doc.view
    }

    pub fn set_selected_region(&mut self, region: SelectedRegion) {
        self.doc.view.selected_region = region;
    }

    pub fn history(&self) -> &ProjectHistory {
        &self.history
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ProjectSettings {
        &mut self.settings
    }

    pub fn focused_track(&self) -> Option<&Arc<Track>> {
        self.focus.get(&self.doc.tracks)
    }

    pub fn set_focus(&mut self, id: Option<TrackId>) -> Option<TrackId> {
        self.focus.set(id, &self.doc.tracks)
    }

    // ============ Edit Transactions ============

    /// Run a fallible edit on a staged copy of the document. On success the
    /// copy becomes live and is pushed; on error nothing changes.
    pub fn edit<R>(
        &mut self,
        description: EditDescription,
        flags: PushFlags,
        f: impl FnOnce(&mut DocumentState) -> TlResult<R>,
    ) -> TlResult<R> {
        let mut staged = self.doc.clone();
        let result = f(&mut staged).inspect_err(|e| {
            log::debug!("Edit '{}' abandoned: {}", description.short, e);
        })?;
        self.doc = staged;
        self.history.push_state_with(&self.doc, description, flags);
        Ok(result)
    }

    /// Like [`Project::edit`], but amends the current state instead of
    /// pushing a new one
    pub fn modify<R>(
        &mut self,
        wants_autosave: bool,
        f: impl FnOnce(&mut DocumentState) -> TlResult<R>,
    ) -> TlResult<R> {
        let mut staged = self.doc.clone();
        let result = f(&mut staged)?;
        self.doc = staged;
        self.history.modify_state(&self.doc, wants_autosave);
        Ok(result)
    }

    /// Infallible edit applied straight to the live document, then pushed
    pub(crate) fn apply<R>(
        &mut self,
        description: EditDescription,
        flags: PushFlags,
        f: impl FnOnce(&mut DocumentState) -> R,
    ) -> R {
        let result = f(&mut self.doc);
        self.history.push_state_with(&self.doc, description, flags);
        result
    }

    // ============ History ============

    /// Record the live document as a new undoable state
    pub fn push_state(&mut self, description: EditDescription, flags: PushFlags) -> usize {
        self.history.push_state_with(&self.doc, description, flags)
    }

    pub fn modify_state(&mut self, wants_autosave: bool) {
        self.history.modify_state(&self.doc, wants_autosave);
    }

    /// Surface failures of background autosave writes as history events
    pub fn poll_autosave(&mut self) {
        self.history.poll_autosave();
    }

    pub fn rollback_state(&mut self) {
        self.history.rollback_state(&mut self.doc);
    }

    pub fn set_state_to(&mut self, index: usize) {
        self.history.set_state_to(index, &mut self.doc);
    }

    pub fn undo(&mut self) -> Option<String> {
        self.history.undo(&mut self.doc)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.history.redo(&mut self.doc)
    }

    pub fn undo_available(&self) -> bool {
        self.history.undo_available()
    }

    pub fn redo_available(&self) -> bool {
        self.history.redo_available()
    }

    pub fn dirty(&self) -> bool {
        self.history.dirty()
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.history.set_dirty(dirty);
    }

    // ============ Lifecycle ============

    /// Called by the persistence collaborator after a successful save
    pub fn mark_saved(&mut self) {
        self.history.set_dirty(false);
        self.clear_recovery_files();
    }

    /// Drop every track and start a fresh history
    pub fn reset_to_empty(&mut self) {
        self.doc = DocumentState::new();
        self.focus.clear();
        self.last_picked = None;
        self.history.initial_state(&self.doc);
        log::info!("Project '{}' reset to empty", self.name);
    }

    /// An empty, clean project can be replaced by an opened file
    pub fn can_open_in_place(&self) -> bool {
        self.doc.tracks.is_empty() && !self.history.dirty()
    }

    /// Whether closing should ask to save first
    pub fn needs_save_prompt(&self) -> bool {
        self.history.dirty()
            && (!self.doc.tracks.is_empty() || self.settings.empty_can_be_dirty)
    }

    /// Close the project. A clean close removes its recovery files.
    pub fn close(self) -> Result<(), AutosaveError> {
        log::info!("Closing project '{}'", self.name);
        if self.history.dirty() {
            return Ok(());
        }
        match &self.autosave_manager {
            Some(manager) => manager.clear_autosaves().map(|_| ()),
            None => Ok(()),
        }
    }

    fn clear_recovery_files(&self) {
        if let Some(manager) = &self.autosave_manager {
            if let Err(e) = manager.clear_autosaves() {
                log::warn!("Failed to clear recovery files: {}", e);
            }
        }
    }
}

// ============ Tests ============
