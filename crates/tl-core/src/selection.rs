//! Selection and view types

use serde::{Deserialize, Serialize};

use crate::{TrackId, TrackList};

/// Selected time range (seconds), always ordered so `t0 <= t1`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RegionBounds")]
pub struct SelectedRegion {
    t0: f64,
    t1: f64,
}

/// Stored form of a region; ordered again on load
#[derive(Deserialize)]
struct RegionBounds {
    t0: f64,
    t1: f64,
}

impl From<RegionBounds> for SelectedRegion {
    fn from(bounds: RegionBounds) -> Self {
        Self::new(bounds.t0, bounds.t1)
    }
}

impl SelectedRegion {
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            t0: a.min(b),
            t1: a.max(b),
        }
    }

    pub fn point(at: f64) -> Self {
        Self { t0: at, t1: at }
    }

    pub fn set_times(&mut self, a: f64, b: f64) {
        *self = Self::new(a, b);
    }

    #[inline]
    pub fn t0(&self) -> f64 {
        self.t0
    }

    #[inline]
    pub fn t1(&self) -> f64 {
        self.t1
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.t1 - self.t0
    }

    pub fn is_point(&self) -> bool {
        self.t1 <= self.t0
    }
}

/// Per-document view metadata. Only the selected region is part of history;
/// scroll and zoom follow the user across undo/redo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewInfo {
    pub selected_region: SelectedRegion,
    /// Left edge of the visible timeline (seconds)
    pub h_offset: f64,
    /// Pixels per second
    pub zoom: f64,
}

impl Default for ViewInfo {
    fn default() -> Self {
        Self {
            selected_region: SelectedRegion::default(),
            h_offset: 0.0,
            zoom: 86.0,
        }
    }
}

/// Selection descriptor recorded with every history snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionState {
    pub region: SelectedRegion,
    /// Selected tracks, in document order
    pub tracks: Vec<TrackId>,
}

impl SelectionState {
    pub fn capture(tracks: &TrackList, view: &ViewInfo) -> Self {
        Self {
            region: view.selected_region,
            tracks: tracks.selected().map(|t| t.id).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.region.is_point()
    }
}
