use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::catalog::TrackRef;
use crate::config::Settings;
use crate::error::PlayerError;
use crate::handle::{HandleOpener, OpenerFactory, RodioOpener};

use super::engine::spawn_engine;
use super::types::{
    ListenerSet, SessionCmd, SessionEvent, SessionSnapshot, SnapshotHandle,
};

/// Public front of the playback session.
///
/// Owns the command sender, the shared snapshot and the engine thread.
/// Exactly one per process-wide session.
pub struct PlayerSession {
    tx: Sender<SessionCmd>,
    snapshot: SnapshotHandle,
    listeners: ListenerSet,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerSession {
    /// Spawn a session whose opener is built by `factory` on the engine
    /// thread. Fails if the factory does.
    pub fn spawn(
        settings: &Settings,
        tracks: Vec<TrackRef>,
        playlists: HashMap<String, Vec<TrackRef>>,
        factory: OpenerFactory,
    ) -> Result<Self, PlayerError> {
        let (tx, rx) = mpsc::channel::<SessionCmd>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let snapshot: SnapshotHandle = Arc::new(Mutex::new(SessionSnapshot::default()));
        let listeners: ListenerSet = Arc::new(Mutex::new(Vec::new()));

        let join = spawn_engine(
            rx,
            ready_tx,
            factory,
            Duration::from_secs(settings.cache.ttl_secs),
            Duration::from_millis(settings.session.poll_interval_ms),
            tracks,
            playlists,
            snapshot.clone(),
            listeners.clone(),
        );

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                tx,
                snapshot,
                listeners,
                join: Mutex::new(Some(join)),
            }),
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(_) => Err(PlayerError::SessionClosed),
        }
    }

    /// Spawn against the default audio output.
    pub fn open_default(
        settings: &Settings,
        tracks: Vec<TrackRef>,
        playlists: HashMap<String, Vec<TrackRef>>,
    ) -> Result<Self, PlayerError> {
        Self::spawn(
            settings,
            tracks,
            playlists,
            Box::new(|| RodioOpener::new().map(|o| Box::new(o) as Box<dyn HandleOpener>)),
        )
    }

    /// Queue a command for the engine.
    pub fn send(&self, cmd: SessionCmd) -> Result<(), PlayerError> {
        self.tx.send(cmd).map_err(|_| PlayerError::SessionClosed)
    }

    /// Current state, cloned from the shared snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// The shared snapshot handle, for callers that poll.
    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshot.clone()
    }

    /// Register a push listener; called on every state transition, each
    /// poll tick while playing, and for surfaced errors.
    pub fn on_status_change(&self, listener: impl Fn(&SessionEvent) + Send + 'static) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(Box::new(listener));
        }
    }

    /// Stop the engine and wait for it to wind down.
    pub fn shutdown(&self) {
        let _ = self.send(SessionCmd::Quit);
        if let Ok(mut join) = self.join.lock() {
            if let Some(handle) = join.take() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
