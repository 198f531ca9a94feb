//! Thin transport command surface over the session.
//!
//! Validates that an operation is meaningful for the current snapshot
//! (duplicate play, pause while not playing, seeks with nothing loaded) and
//! forwards the rest. Holds no state of its own.

use crate::error::PlayerError;
use crate::session::{PlaybackStatus, PlayerSession, SessionCmd, SessionSnapshot, TrackSource};

/// The slice of the session the transport needs: observe and enqueue.
pub trait SessionControl {
    fn snapshot(&self) -> SessionSnapshot;
    fn send(&self, cmd: SessionCmd) -> Result<(), PlayerError>;
}

impl SessionControl for PlayerSession {
    fn snapshot(&self) -> SessionSnapshot {
        PlayerSession::snapshot(self)
    }

    fn send(&self, cmd: SessionCmd) -> Result<(), PlayerError> {
        PlayerSession::send(self, cmd)
    }
}

impl<T: SessionControl + ?Sized> SessionControl for &T {
    fn snapshot(&self) -> SessionSnapshot {
        (**self).snapshot()
    }

    fn send(&self, cmd: SessionCmd) -> Result<(), PlayerError> {
        (**self).send(cmd)
    }
}

pub struct Transport<S: SessionControl> {
    session: S,
    seek_step_ms: u64,
}

impl<S: SessionControl> Transport<S> {
    pub fn new(session: S, seek_step_ms: u64) -> Self {
        Self {
            session,
            seek_step_ms,
        }
    }

    /// Load and play a specific track.
    pub fn switch_to(&self, source: TrackSource, index: usize) -> Result<(), PlayerError> {
        self.session.send(SessionCmd::SwitchTo { source, index })
    }

    /// Start or resume; suppressed while already playing.
    pub fn play(&self) -> Result<(), PlayerError> {
        if self.session.snapshot().status == PlaybackStatus::Playing {
            return Ok(());
        }
        self.session.send(SessionCmd::Play)
    }

    /// Pause; only meaningful while playing.
    pub fn pause(&self) -> Result<(), PlayerError> {
        if self.session.snapshot().status != PlaybackStatus::Playing {
            return Ok(());
        }
        self.session.send(SessionCmd::Pause)
    }

    pub fn toggle(&self) -> Result<(), PlayerError> {
        match self.session.snapshot().status {
            PlaybackStatus::Playing => self.session.send(SessionCmd::Pause),
            _ => self.play(),
        }
    }

    /// Skip forward; suppressed when nothing is active.
    pub fn next(&self) -> Result<(), PlayerError> {
        if self.session.snapshot().source.is_none() {
            return Ok(());
        }
        self.session.send(SessionCmd::Next)
    }

    /// Skip backward; suppressed when nothing is active.
    pub fn previous(&self) -> Result<(), PlayerError> {
        if self.session.snapshot().source.is_none() {
            return Ok(());
        }
        self.session.send(SessionCmd::Prev)
    }

    /// Relative seek; suppressed without a loaded track.
    pub fn seek_by(&self, delta_ms: i64) -> Result<(), PlayerError> {
        if !self.has_loaded_track() {
            return Ok(());
        }
        self.session.send(SessionCmd::SeekBy(delta_ms))
    }

    /// Absolute seek; suppressed without a loaded track.
    pub fn seek_to(&self, ms: u64) -> Result<(), PlayerError> {
        if !self.has_loaded_track() {
            return Ok(());
        }
        self.session.send(SessionCmd::SeekTo(ms))
    }

    /// The configured-step scrub forward.
    pub fn step_forward(&self) -> Result<(), PlayerError> {
        self.seek_by(self.seek_step_ms as i64)
    }

    /// The configured-step scrub backward.
    pub fn step_back(&self) -> Result<(), PlayerError> {
        self.seek_by(-(self.seek_step_ms as i64))
    }

    fn has_loaded_track(&self) -> bool {
        matches!(
            self.session.snapshot().status,
            PlaybackStatus::Playing | PlaybackStatus::Paused
        )
    }
}
