//! The playback session: a single state machine owning "what is currently
//! loaded and playing".
//!
//! All state mutation happens on one engine thread fed by an mpsc command
//! channel; the `recv_timeout` tick doubles as the position/completion poll.
//! Callers observe the session through a shared snapshot handle or push
//! listeners.

mod engine;
mod player;
mod types;

pub use player::PlayerSession;
pub use types::{
    PlaybackStatus, SessionCmd, SessionEvent, SessionSnapshot, SnapshotHandle, StatusListener,
    TrackSource,
};
