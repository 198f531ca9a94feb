use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

/// Stable identifier for a track (filesystem path or content URI).
///
/// This is the cache key: at most one live handle exists per `TrackId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A track descriptor as handed out by the catalog.
///
/// Immutable once created. `duration` is filled in at scan time when the
/// tags are readable, otherwise the handle reports it after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    pub id: TrackId,
    pub display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
}

/// Continuation cursor for paged catalog listing: the id of the last track
/// of the previous page.
pub type Cursor = TrackId;

/// One page of catalog results.
#[derive(Debug, Clone)]
pub struct TrackPage {
    pub tracks: Vec<TrackRef>,
    /// Cursor to pass back for the next page; `None` when exhausted.
    pub next: Option<Cursor>,
}

/// Read-only media index collaborator.
pub trait Catalog {
    /// Return up to `limit` tracks starting after `cursor` (or from the
    /// beginning when `cursor` is `None`).
    fn page(&self, cursor: Option<&Cursor>, limit: usize) -> Result<TrackPage, PlayerError>;

    /// Total number of tracks currently known.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
