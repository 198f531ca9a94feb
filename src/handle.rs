//! The sound-handle capability boundary.
//!
//! The session core only depends on this trait pair, never on a concrete
//! decoder. `RodioOpener` is the production implementation; tests drive the
//! core with the fakes in `handle::fake`.

use std::sync::Arc;
use std::time::Duration;

use crate::catalog::TrackRef;
use crate::error::PlayerError;

mod sink;

pub use sink::RodioOpener;

#[cfg(test)]
pub(crate) mod fake;

/// A live, stateful reference to an open audio resource.
///
/// `release` is idempotent; every other call on a released handle fails with
/// `PlayerError::Playback`. Completion is pollable via `finished`.
pub trait Handle {
    fn play(&self) -> Result<(), PlayerError>;
    fn pause(&self) -> Result<(), PlayerError>;
    /// Seek to an absolute position. Playing handles keep playing from the
    /// new position; paused handles stay paused there.
    fn seek_to(&self, position: Duration) -> Result<(), PlayerError>;
    fn position(&self) -> Duration;
    fn duration(&self) -> Duration;
    /// True once the underlying source has played to its end.
    fn finished(&self) -> bool;
    fn release(&self);
}

/// Handles are shared between the cache (owner) and the session (borrower of
/// the active track).
pub type SharedHandle = Arc<dyn Handle>;

/// The decode/open primitive wrapped as a factory.
pub trait HandleOpener {
    fn open(&self, track: &TrackRef) -> Result<SharedHandle, PlayerError>;
}

/// Deferred opener construction: the session engine builds its opener on its
/// own thread (audio output streams are not generally movable across
/// threads).
pub type OpenerFactory = Box<dyn FnOnce() -> Result<Box<dyn HandleOpener>, PlayerError> + Send>;
