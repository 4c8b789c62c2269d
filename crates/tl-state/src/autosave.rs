//! Autosave System
//!
//! Crash recovery copies written on behalf of the history engine:
//! - `AutosaveSink` is the collaborator contract the history calls into
//! - `AutosaveManager` queues snapshots to a writer thread that stores
//!   JSON recovery records on disk
//! - Backup rotation keeps the newest N records per project
//! - Recovery turns a record back into a `DocumentState`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tl_core::{DocumentState, SelectionState, Track, TrackList};

use crate::DocumentSnapshot;

/// Recovery file extension
pub const RECOVERY_EXTENSION: &str = "tlrec";

/// Recovery record schema version
pub const RECOVERY_VERSION: u32 = 1;

// ============ Sink ============

/// Persistence collaborator invoked after autosave-flagged transitions.
///
/// `write_recovery` hands the snapshot off and returns; it must not wait on
/// disk. Failures of writes that finish later are collected through
/// `take_failures`. None of them undo the transition.
pub trait AutosaveSink: Send + Sync {
    fn write_recovery(&self, snapshot: DocumentSnapshot) -> Result<(), AutosaveError>;

    /// Failures of handed-off writes since the last call
    fn take_failures(&self) -> Vec<AutosaveError> {
        Vec::new()
    }
}

// ============ Autosave Config ============

/// Autosave configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Enable autosave
    pub enabled: bool,
    /// Number of recovery files to keep per project
    pub backup_count: usize,
    /// Autosave directory
    pub autosave_dir: PathBuf,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backup_count: 3,
            autosave_dir: default_autosave_dir(),
        }
    }
}

fn default_autosave_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Tapeline")
        .join("AutoSave")
}

// ============ Recovery Record ============

/// What an autosave writes: enough to rebuild the document after a crash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryRecord {
    pub version: u32,
    pub project_name: String,
    pub saved_at: DateTime<Utc>,
    /// Long description of the state that was current when written
    pub description: String,
    pub selection: SelectionState,
    pub tracks: Vec<Arc<Track>>,
}

impl RecoveryRecord {
    pub fn from_snapshot(project_name: impl Into<String>, snapshot: &DocumentSnapshot) -> Self {
        Self {
            version: RECOVERY_VERSION,
            project_name: project_name.into(),
            saved_at: Utc::now(),
            description: snapshot.long_description().to_string(),
            selection: snapshot.selection().clone(),
            tracks: snapshot.tracks().to_vec(),
        }
    }

    /// Rebuild a live document from the record
    pub fn into_document(self) -> DocumentState {
        let mut doc = DocumentState::with_tracks(TrackList::from_tracks(self.tracks));
        doc.view.selected_region = self.selection.region;
        doc
    }
}

// ============ Autosave State ============

/// State tracking for autosave
pub struct AutosaveState {
    /// Last save timestamp (Unix ms)
    last_save: AtomicU64,
    /// Currently saving flag
    is_saving: AtomicBool,
    /// Records written since creation
    save_count: AtomicU64,
    /// Failed writes since creation
    failure_count: AtomicU64,
}

impl AutosaveState {
    pub fn new() -> Self {
        Self {
            last_save: AtomicU64::new(0),
            is_saving: AtomicBool::new(false),
            save_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
        }
    }

    /// Mark save started
    pub fn start_save(&self) -> bool {
        self.is_saving
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Mark save completed
    pub fn complete_save(&self, ok: bool) {
        if ok {
            self.last_save.store(current_timestamp(), Ordering::Relaxed);
            self.save_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
        self.is_saving.store(false, Ordering::Relaxed);
    }

    /// Check if save is in progress
    pub fn is_saving(&self) -> bool {
        self.is_saving.load(Ordering::Relaxed)
    }

    pub fn save_count(&self) -> u64 {
        self.save_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Get time since last save (seconds)
    pub fn seconds_since_save(&self) -> u64 {
        let last = self.last_save.load(Ordering::Relaxed);
        if last == 0 {
            return u64::MAX;
        }
        current_timestamp().saturating_sub(last) / 1000
    }
}

impl Default for AutosaveState {
    fn default() -> Self {
        Self::new()
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ============ Record Writer ============

/// Everything the writer thread and the manager both touch
struct RecordWriter {
    config: RwLock<AutosaveConfig>,
    state: AutosaveState,
    project_name: RwLock<String>,
    /// Disambiguates records written within the same millisecond
    sequence: AtomicU64,
}

impl RecordWriter {
    fn file_prefix(&self) -> String {
        format!("{}_autosave_", sanitize_filename(&self.project_name.read()))
    }

    /// Next recovery file path. Names sort chronologically.
    fn next_path(&self, config: &AutosaveConfig) -> PathBuf {
        let name = self.project_name.read();
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);

        let filename = format!(
            "{}_autosave_{:013}_{:06}.{}",
            sanitize_filename(&name),
            current_timestamp(),
            seq,
            RECOVERY_EXTENSION
        );
        config.autosave_dir.join(filename)
    }

    fn write(&self, snapshot: &DocumentSnapshot) -> Result<PathBuf, AutosaveError> {
        let config = self.config.read().clone();
        if !config.enabled {
            return Err(AutosaveError::Disabled);
        }
        if !self.state.start_save() {
            return Err(AutosaveError::SaveInProgress);
        }

        let result = self.write_record(&config, snapshot);

        self.state.complete_save(result.is_ok());
        result
    }

    fn write_record(
        &self,
        config: &AutosaveConfig,
        snapshot: &DocumentSnapshot,
    ) -> Result<PathBuf, AutosaveError> {
        std::fs::create_dir_all(&config.autosave_dir)?;

        let path = self.next_path(config);
        let record = RecoveryRecord::from_snapshot(self.project_name.read().clone(), snapshot);
        let json = serde_json::to_string(&record)?;

        // Write-then-rename so a crash mid-write never leaves a truncated record
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;

        self.rotate_backups(config)?;

        log::info!("Autosave completed: {:?}", path);
        Ok(path)
    }

    /// Delete all but the newest `backup_count` records of this project
    fn rotate_backups(&self, config: &AutosaveConfig) -> Result<(), AutosaveError> {
        let prefix = self.file_prefix();

        let mut autosaves: Vec<_> = std::fs::read_dir(&config.autosave_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| is_recovery_file(&e.path()))
            .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
            .map(|e| e.path())
            .collect();

        // Newest first
        autosaves.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

        for old in autosaves.iter().skip(config.backup_count.max(1)) {
            if let Err(e) = std::fs::remove_file(old) {
                log::warn!("Failed to remove old autosave {:?}: {}", old, e);
            }
        }

        Ok(())
    }
}

enum WriterJob {
    Write(DocumentSnapshot),
    /// Acknowledged once every earlier job is done
    Flush(Sender<()>),
    Shutdown,
}

fn run_writer(
    writer: Arc<RecordWriter>,
    jobs: Receiver<WriterJob>,
    failures: Sender<AutosaveError>,
) {
    let mut next = jobs.recv().ok();
    while let Some(job) = next.take() {
        match job {
            WriterJob::Write(mut snapshot) => {
                // Only the newest queued state matters for recovery
                while let Ok(queued) = jobs.try_recv() {
                    match queued {
                        WriterJob::Write(newer) => snapshot = newer,
                        other => {
                            next = Some(other);
                            break;
                        }
                    }
                }

                match writer.write(&snapshot) {
                    Ok(_) | Err(AutosaveError::Disabled) => {}
                    Err(e) => {
                        log::warn!("Autosave write failed: {}", e);
                        let _ = failures.send(e);
                    }
                }
            }
            WriterJob::Flush(done) => {
                let _ = done.send(());
            }
            WriterJob::Shutdown => break,
        }

        if next.is_none() {
            next = jobs.recv().ok();
        }
    }

    log::debug!("Autosave writer exiting");
}

// ============ Autosave Manager ============

/// File-backed autosave collaborator. Snapshots handed to it are written by
/// a background thread.
pub struct AutosaveManager {
    writer: Arc<RecordWriter>,
    jobs: Sender<WriterJob>,
    failures: Receiver<AutosaveError>,
    worker: Option<JoinHandle<()>>,
}

impl AutosaveManager {
    pub fn new(config: AutosaveConfig) -> Self {
        let writer = Arc::new(RecordWriter {
            config: RwLock::new(config),
            state: AutosaveState::new(),
            project_name: RwLock::new("Untitled".to_string()),
            sequence: AtomicU64::new(0),
        });

        let (jobs, job_rx) = unbounded();
        let (failure_tx, failures) = unbounded();

        let thread_writer = writer.clone();
        let worker = thread::Builder::new()
            .name("tl-autosave".into())
            .spawn(move || run_writer(thread_writer, job_rx, failure_tx));

        // A failed spawn drops the job receiver, so later hand-offs report
        // `WriterStopped`
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to start autosave writer: {}", e);
                None
            }
        };

        Self {
            writer,
            jobs,
            failures,
            worker,
        }
    }

    /// Set project name
    pub fn set_project_name(&self, name: impl Into<String>) {
        *self.writer.project_name.write() = name.into();
    }

    pub fn project_name(&self) -> String {
        self.writer.project_name.read().clone()
    }

    /// Queue `snapshot` for the writer thread
    pub fn queue(&self, snapshot: DocumentSnapshot) -> Result<(), AutosaveError> {
        self.jobs
            .send(WriterJob::Write(snapshot))
            .map_err(|_| AutosaveError::WriterStopped)
    }

    /// Block until every queued snapshot has been written
    pub fn flush(&self) {
        let (done, wait) = bounded(1);
        if self.jobs.send(WriterJob::Flush(done)).is_ok() {
            let _ = wait.recv();
        }
    }

    /// Write a recovery record for `snapshot` on the calling thread
    pub fn autosave(&self, snapshot: &DocumentSnapshot) -> Result<PathBuf, AutosaveError> {
        self.writer.write(snapshot)
    }

    /// Get latest autosave of this project for recovery
    pub fn latest_autosave(&self) -> Option<PathBuf> {
        self.list_autosaves()
            .into_iter()
            .max_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)))
            .map(|info| info.path)
    }

    /// Recovery files of this project, after pending writes land
    pub fn list_autosaves(&self) -> Vec<AutosaveInfo> {
        self.flush();

        let config = self.writer.config.read().clone();
        let prefix = self.writer.file_prefix();

        if !config.autosave_dir.exists() {
            return Vec::new();
        }

        std::fs::read_dir(&config.autosave_dir)
            .into_iter()
            .flatten()
            .filter_map(|e| e.ok())
            .filter(|e| is_recovery_file(&e.path()))
            .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
            .filter_map(|e| {
                let path = e.path();
                let metadata = e.metadata().ok()?;
                let modified = metadata.modified().ok()?;

                Some(AutosaveInfo {
                    name: path.file_stem()?.to_string_lossy().into_owned(),
                    size: metadata.len(),
                    modified,
                    path,
                })
            })
            .collect()
    }

    /// Delete all autosaves for current project, after pending writes land
    pub fn clear_autosaves(&self) -> Result<usize, AutosaveError> {
        self.flush();

        let config = self.writer.config.read().clone();
        let prefix = self.writer.file_prefix();

        let mut count = 0;
        if let Ok(entries) = std::fs::read_dir(&config.autosave_dir) {
            for entry in entries.flatten() {
                if entry.file_name().to_string_lossy().starts_with(&prefix)
                    && std::fs::remove_file(entry.path()).is_ok()
                {
                    count += 1;
                }
            }
        }

        Ok(count)
    }

    /// Read a recovery record
    pub fn recover(&self, path: &Path) -> Result<RecoveryRecord, AutosaveError> {
        if !path.exists() {
            return Err(AutosaveError::NotFound);
        }
        let json = std::fs::read_to_string(path)?;
        let record: RecoveryRecord = serde_json::from_str(&json)?;
        log::info!(
            "Recovered '{}' ({} tracks) from {:?}",
            record.project_name,
            record.tracks.len(),
            path
        );
        Ok(record)
    }

    /// Get current config
    pub fn config(&self) -> AutosaveConfig {
        self.writer.config.read().clone()
    }

    /// Update config
    pub fn set_config(&self, config: AutosaveConfig) {
        *self.writer.config.write() = config;
    }

    pub fn status(&self) -> AutosaveStatus {
        let state = &self.writer.state;
        AutosaveStatus {
            enabled: self.writer.config.read().enabled,
            is_saving: state.is_saving(),
            seconds_since_save: state.seconds_since_save(),
            save_count: state.save_count(),
            failure_count: state.failure_count(),
        }
    }
}

impl AutosaveSink for AutosaveManager {
    fn write_recovery(&self, snapshot: DocumentSnapshot) -> Result<(), AutosaveError> {
        self.queue(snapshot)
    }

    fn take_failures(&self) -> Vec<AutosaveError> {
        self.failures.try_iter().collect()
    }
}

impl Default for AutosaveManager {
    fn default() -> Self {
        Self::new(AutosaveConfig::default())
    }
}

impl Drop for AutosaveManager {
    fn drop(&mut self) {
        // Queued writes ahead of the shutdown still land
        let _ = self.jobs.send(WriterJob::Shutdown);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

fn is_recovery_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == RECOVERY_EXTENSION)
        .unwrap_or(false)
}

// ============ Helper Types ============

/// Autosave file info
#[derive(Debug, Clone)]
pub struct AutosaveInfo {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
}

/// Autosave status
#[derive(Debug, Clone)]
pub struct AutosaveStatus {
    pub enabled: bool,
    pub is_saving: bool,
    pub seconds_since_save: u64,
    pub save_count: u64,
    pub failure_count: u64,
}

/// Autosave errors
#[derive(Debug, thiserror::Error)]
pub enum AutosaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Save already in progress")]
    SaveInProgress,

    #[error("Autosave disabled")]
    Disabled,

    #[error("Autosave writer is not running")]
    WriterStopped,

    #[error("No autosave found")]
    NotFound,
}

/// Sanitize filename for cross-platform compatibility.
/// Strips separators and ".." so the name cannot leave the autosave directory.
fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect();

    let mut result = sanitized.replace("..", "");
    result = result.trim_matches(|c| c == '.' || c == ' ').to_string();

    if result.is_empty() {
        result = "unnamed".to_string();
    }

    if result.len() > 200 {
        let mut cut = 200;
        while !result.is_char_boundary(cut) {
            cut -= 1;
        }
        result.truncate(cut);
    }

    result
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EditDescription, EditKind, PushFlags};
    use tl_core::{SelectedRegion, TrackId};

    fn manager_in(dir: &Path, backups: usize) -> AutosaveManager {
        let manager = AutosaveManager::new(AutosaveConfig {
            enabled: true,
            backup_count: backups,
            autosave_dir: dir.to_path_buf(),
        });
        manager.set_project_name("Session");
        manager
    }

    fn snapshot_of(track_name: &str) -> DocumentSnapshot {
        let mut doc = DocumentState::new();
        doc.tracks
            .push(Track::wave(TrackId(0), track_name, 8000, vec![0.25; 32]))
            .unwrap();
        doc.view.selected_region = SelectedRegion::new(0.5, 1.5);
        DocumentSnapshot::capture(
            &doc,
            EditDescription::new(format!("Added {}", track_name), "Add Track", EditKind::AddTrack),
            PushFlags::AUTOSAVE,
        )
    }

    fn snapshot() -> DocumentSnapshot {
        snapshot_of("Vocals")
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test:file"), "test_file");
        assert_eq!(sanitize_filename("test/path"), "test_path");
        assert_eq!(sanitize_filename("../../etc"), "__etc");
        assert_eq!(sanitize_filename(".."), "unnamed");
        assert_eq!(sanitize_filename("valid_name"), "valid_name");
    }

    #[test]
    fn test_write_and_recover() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path(), 3);

        let path = manager.autosave(&snapshot()).unwrap();
        assert!(path.exists());
        assert_eq!(manager.latest_autosave(), Some(path.clone()));

        let record = manager.recover(&path).unwrap();
        assert_eq!(record.version, RECOVERY_VERSION);
        assert_eq!(record.description, "Added Vocals");

        let doc = record.into_document();
        assert_eq!(doc.tracks.len(), 1);
        assert_eq!(doc.tracks.as_slice()[0].samples().unwrap(), &[0.25; 32][..]);
        assert_eq!(doc.view.selected_region, SelectedRegion::new(0.5, 1.5));
        assert_eq!(manager.status().save_count, 1);
    }

    #[test]
    fn test_rotation_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path(), 2);
        let snapshot = snapshot();

        let paths: Vec<_> = (0..4).map(|_| manager.autosave(&snapshot).unwrap()).collect();

        assert_eq!(manager.list_autosaves().len(), 2);
        assert!(!paths[0].exists());
        assert!(!paths[1].exists());
        assert!(paths[2].exists());
        assert!(paths[3].exists());
    }

    #[test]
    fn test_write_recovery_does_not_wait_for_disk() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path(), 3);

        // The writer reads the config first, so it stalls while this is held
        let gate = manager.writer.config.write();
        manager.write_recovery(snapshot_of("First")).unwrap();
        manager.write_recovery(snapshot_of("Second")).unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        drop(gate);

        let latest = manager.latest_autosave().unwrap();
        assert_eq!(manager.recover(&latest).unwrap().description, "Added Second");
        assert!(manager.take_failures().is_empty());
    }

    #[test]
    fn test_writer_failures_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let manager = manager_in(&blocker, 3);

        manager.write_recovery(snapshot()).unwrap();
        manager.flush();

        let failures = manager.take_failures();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], AutosaveError::Io(_)));
        assert_eq!(manager.status().failure_count, 1);
        assert!(manager.take_failures().is_empty());
    }

    #[test]
    fn test_disabled_is_not_a_sink_failure() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path(), 2);
        manager.set_config(AutosaveConfig {
            enabled: false,
            ..manager.config()
        });

        assert!(matches!(manager.autosave(&snapshot()), Err(AutosaveError::Disabled)));
        assert!(manager.write_recovery(snapshot()).is_ok());
        assert!(manager.list_autosaves().is_empty());
        assert!(manager.take_failures().is_empty());
    }

    #[test]
    fn test_queued_writes_land_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        {
            let manager = manager_in(dir.path(), 2);
            manager.write_recovery(snapshot()).unwrap();
        }

        let manager = manager_in(dir.path(), 2);
        assert_eq!(manager.list_autosaves().len(), 1);
    }

    #[test]
    fn test_listing_only_sees_own_project() {
        let dir = tempfile::tempdir().unwrap();
        let alpha = manager_in(dir.path(), 5);
        alpha.set_project_name("Alpha");
        alpha.autosave(&snapshot_of("alpha-track")).unwrap();

        let beta = manager_in(dir.path(), 5);
        beta.set_project_name("Beta");
        beta.autosave(&snapshot_of("beta-track")).unwrap();

        assert_eq!(alpha.list_autosaves().len(), 1);
        let latest = alpha.latest_autosave().unwrap();
        let record = alpha.recover(&latest).unwrap();
        assert_eq!(record.project_name, "Alpha");
        assert_eq!(record.tracks[0].name, "alpha-track");
    }

    #[test]
    fn test_clear_autosaves_only_touches_own_project() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path(), 5);
        manager.autosave(&snapshot()).unwrap();

        let other = manager_in(dir.path(), 5);
        other.set_project_name("Other");
        other.autosave(&snapshot()).unwrap();

        assert_eq!(manager.clear_autosaves().unwrap(), 1);
        assert!(manager.list_autosaves().is_empty());
        assert_eq!(other.list_autosaves().len(), 1);
    }

    #[test]
    fn test_recover_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(dir.path(), 1);
        assert!(matches!(
            manager.recover(&dir.path().join("missing.tlrec")),
            Err(AutosaveError::NotFound)
        ));
    }
}
