//! Session-facing small types and handles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::catalog::TrackRef;
use crate::error::PlayerError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Nothing loaded, or the list ended.
    #[default]
    Stopped,
    /// A switch is in flight; transient.
    Loading,
    Playing,
    Paused,
}

/// Which sequence the active index points into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// The full device catalog.
    Catalog,
    /// A named user playlist.
    Playlist(String),
}

#[derive(Debug)]
pub enum SessionCmd {
    /// Load and play the track at `index` of `source`.
    SwitchTo { source: TrackSource, index: usize },
    /// Start or resume playback of the current track.
    Play,
    /// Pause if playing.
    Pause,
    /// Skip to the next track; at the end of the list, wrap the index to 0
    /// without starting playback.
    Next,
    /// Go to the previous track; no-op at index 0.
    Prev,
    /// Seek relative to the current position (milliseconds, signed).
    SeekBy(i64),
    /// Seek to an absolute position (milliseconds).
    SeekTo(u64),
    /// Replace the catalog sequence.
    SetTracks(Vec<TrackRef>),
    /// Replace the playlist mapping.
    SetPlaylists(HashMap<String, Vec<TrackRef>>),
    /// Stop the engine thread.
    Quit,
}

impl SessionCmd {
    /// Commands that make an in-flight load pointless: its handle must not
    /// be promoted to active once one of these is pending.
    pub(crate) fn supersedes_load(&self) -> bool {
        matches!(
            self,
            Self::SwitchTo { .. } | Self::Next | Self::Prev | Self::Quit
        )
    }
}

/// What callers see: the session state at a point in time.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub status: PlaybackStatus,
    pub source: Option<TrackSource>,
    /// Position in the active sequence; `None` when nothing is active.
    pub index: Option<usize>,
    pub position: Duration,
    pub duration: Duration,
    pub track: Option<TrackRef>,
}

/// Pushed to status listeners.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A state transition (status, track, or position changed by command).
    Status(SessionSnapshot),
    /// Periodic position update while playing.
    Tick(SessionSnapshot),
    /// A surfaced failure; session state already reverted.
    Error(PlayerError),
}

pub type SnapshotHandle = Arc<Mutex<SessionSnapshot>>;
pub type StatusListener = Box<dyn Fn(&SessionEvent) + Send>;
pub(crate) type ListenerSet = Arc<Mutex<Vec<StatusListener>>>;
