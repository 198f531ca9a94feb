//! Error types for the playback session core.
//!
//! Every collaborator failure is translated into a `PlayerError` at the
//! session boundary; none of them take the process down.

use thiserror::Error;

use crate::catalog::TrackId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayerError {
    /// Caller passed an index outside the active sequence.
    #[error("index {index} out of range for {len} tracks")]
    IndexOutOfRange { index: usize, len: usize },

    /// Opening/decoding a track failed.
    #[error("failed to open {id}: {reason}")]
    Open { id: TrackId, reason: String },

    /// A transport command on a live handle failed.
    #[error("playback command failed: {0}")]
    Playback(String),

    /// The media index is not readable by this process.
    #[error("media library permission denied")]
    PermissionDenied,

    /// A playlist with this name already exists.
    #[error("playlist {0:?} already exists")]
    PlaylistExists(String),

    /// No playlist with this name.
    #[error("unknown playlist {0:?}")]
    UnknownPlaylist(String),

    /// The session engine is no longer running.
    #[error("session closed")]
    SessionClosed,
}
