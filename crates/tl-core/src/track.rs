//! Track model
//!
//! A track is the unit of document content. Tracks are shared between the
//! live [`TrackList`](crate::TrackList) and every history snapshot that
//! captured them, so the content buffers live behind their own `Arc`:
//! - Flag edits (mute, solo, selection, rename) clone only the track header
//! - Content edits detach the buffer first (copy-on-write)
//! - Detaching reserves memory fallibly and reports `OutOfMemory`

use std::mem::size_of;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{TlError, TlResult};

/// Unique track identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl TrackId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Kind of content a track carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    /// Sampled audio
    Wave,
    /// Time-anchored text annotations
    Label,
}

/// Single annotation on a label track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// Start time relative to the track offset (seconds)
    pub start: f64,
    /// End time relative to the track offset (seconds)
    pub end: f64,
    pub text: String,
}

impl Label {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end: end.max(start),
            text: text.into(),
        }
    }

    pub fn point(at: f64, text: impl Into<String>) -> Self {
        Self::new(at, at, text)
    }
}

/// Track payload. Buffers are shared until the first write after capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrackContent {
    Wave {
        sample_rate: u32,
        samples: Arc<Vec<f32>>,
    },
    Label {
        labels: Arc<Vec<Label>>,
    },
}

impl TrackContent {
    pub fn kind(&self) -> TrackKind {
        match self {
            Self::Wave { .. } => TrackKind::Wave,
            Self::Label { .. } => TrackKind::Label,
        }
    }

    /// Approximate heap size of the payload
    pub fn bytes(&self) -> usize {
        match self {
            Self::Wave { samples, .. } => samples.len() * size_of::<f32>(),
            Self::Label { labels } => labels
                .iter()
                .map(|l| size_of::<Label>() + l.text.len())
                .sum(),
        }
    }

    /// Address of the shared buffer, stable for as long as the buffer lives
    pub fn buffer_key(&self) -> usize {
        match self {
            Self::Wave { samples, .. } => Arc::as_ptr(samples) as *const () as usize,
            Self::Label { labels } => Arc::as_ptr(labels) as *const () as usize,
        }
    }
}

/// Document track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier, stable across copy-on-write clones
    pub id: TrackId,
    /// Display name
    pub name: String,
    /// Start of the track on the timeline (seconds)
    pub offset: f64,
    pub selected: bool,
    pub muted: bool,
    pub solo: bool,
    content: TrackContent,
}

impl Track {
    /// Create a wave track from samples
    pub fn wave(id: TrackId, name: impl Into<String>, sample_rate: u32, samples: Vec<f32>) -> Self {
        Self::with_content(
            id,
            name,
            TrackContent::Wave {
                sample_rate: sample_rate.max(1),
                samples: Arc::new(samples),
            },
        )
    }

    /// Create an empty label track
    pub fn label(id: TrackId, name: impl Into<String>) -> Self {
        Self::with_content(
            id,
            name,
            TrackContent::Label {
                labels: Arc::new(Vec::new()),
            },
        )
    }

    pub fn with_content(id: TrackId, name: impl Into<String>, content: TrackContent) -> Self {
        Self {
            id,
            name: name.into(),
            offset: 0.0,
            selected: false,
            muted: false,
            solo: false,
            content,
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.content.kind()
    }

    /// Only wave tracks take part in mute/solo
    pub fn is_playable(&self) -> bool {
        self.kind() == TrackKind::Wave
    }

    pub fn content(&self) -> &TrackContent {
        &self.content
    }

    pub fn sample_rate(&self) -> Option<u32> {
        match &self.content {
            TrackContent::Wave { sample_rate, .. } => Some(*sample_rate),
            TrackContent::Label { .. } => None,
        }
    }

    pub fn samples(&self) -> Option<&[f32]> {
        match &self.content {
            TrackContent::Wave { samples, .. } => Some(samples.as_slice()),
            TrackContent::Label { .. } => None,
        }
    }

    pub fn labels(&self) -> Option<&[Label]> {
        match &self.content {
            TrackContent::Label { labels } => Some(labels.as_slice()),
            TrackContent::Wave { .. } => None,
        }
    }

    /// Writable samples, detaching the buffer if any other holder shares it
    pub fn samples_mut(&mut self) -> TlResult<&mut Vec<f32>> {
        let id = self.id;
        match &mut self.content {
            TrackContent::Wave { samples, .. } => detach(id, samples),
            TrackContent::Label { .. } => Err(TlError::WrongContent(id, "sample")),
        }
    }

    /// Writable labels, detaching the buffer if any other holder shares it
    pub fn labels_mut(&mut self) -> TlResult<&mut Vec<Label>> {
        let id = self.id;
        match &mut self.content {
            TrackContent::Label { labels } => detach(id, labels),
            TrackContent::Wave { .. } => Err(TlError::WrongContent(id, "label")),
        }
    }

    pub fn start_time(&self) -> f64 {
        self.offset
    }

    pub fn end_time(&self) -> f64 {
        match &self.content {
            TrackContent::Wave {
                sample_rate,
                samples,
            } => self.offset + samples.len() as f64 / *sample_rate as f64,
            TrackContent::Label { labels } => {
                self.offset + labels.iter().map(|l| l.end).fold(0.0, f64::max)
            }
        }
    }

    pub fn content_bytes(&self) -> usize {
        self.content.bytes()
    }

    /// True when both tracks point at the same content buffer
    pub fn shares_content_with(&self, other: &Track) -> bool {
        self.content.buffer_key() == other.content.buffer_key()
    }
}

fn detach<T: Clone>(track: TrackId, shared: &mut Arc<Vec<T>>) -> TlResult<&mut Vec<T>> {
    if Arc::get_mut(shared).is_none() {
        let mut copy = Vec::new();
        copy.try_reserve_exact(shared.len())
            .map_err(|_| TlError::OutOfMemory {
                track,
                bytes: shared.len() * size_of::<T>(),
            })?;
        copy.extend_from_slice(shared);
        log::trace!("Detached {} elements of track {:?}", copy.len(), track);
        *shared = Arc::new(copy);
    }
    // Unique at this point, so make_mut hands out the buffer without cloning
    Ok(Arc::make_mut(shared))
}
