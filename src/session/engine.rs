use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::cache::HandleCache;
use crate::catalog::{TrackId, TrackRef};
use crate::error::PlayerError;
use crate::handle::{HandleOpener, OpenerFactory, SharedHandle};

use super::types::{
    ListenerSet, PlaybackStatus, SessionCmd, SessionEvent, SessionSnapshot, SnapshotHandle,
    TrackSource,
};

/// The single-writer playback state machine.
///
/// Every transition runs on the engine thread; commands never interleave.
/// The command loop in `spawn_engine` passes an `interrupt` probe into
/// navigation-sensitive operations so an in-flight load can observe newer
/// pending intents and stand down.
pub(super) struct Engine {
    tracks: Vec<TrackRef>,
    playlists: HashMap<String, Vec<TrackRef>>,
    cache: HandleCache,
    opener: Box<dyn HandleOpener>,

    status: PlaybackStatus,
    source: Option<TrackSource>,
    index: Option<usize>,
    position: Duration,
    duration: Duration,
    active: Option<(TrackId, SharedHandle)>,

    // Last non-transient (status, source, index); the revert target when a
    // switch fails.
    stable: (PlaybackStatus, Option<TrackSource>, Option<usize>),
    // One auto-advance per completion, even if the advance itself fails.
    finish_latched: bool,

    snapshot: SnapshotHandle,
    listeners: ListenerSet,
}

impl Engine {
    pub(super) fn new(
        opener: Box<dyn HandleOpener>,
        cache_ttl: Duration,
        tracks: Vec<TrackRef>,
        playlists: HashMap<String, Vec<TrackRef>>,
        snapshot: SnapshotHandle,
        listeners: ListenerSet,
    ) -> Self {
        Self {
            tracks,
            playlists,
            cache: HandleCache::new(cache_ttl),
            opener,
            status: PlaybackStatus::Stopped,
            source: None,
            index: None,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            active: None,
            stable: (PlaybackStatus::Stopped, None, None),
            finish_latched: false,
            snapshot,
            listeners,
        }
    }

    pub(super) fn handle_cmd(&mut self, cmd: SessionCmd, interrupt: &mut dyn FnMut() -> bool) {
        match cmd {
            SessionCmd::SwitchTo { source, index } => self.switch_to(source, index, interrupt),
            SessionCmd::Play => self.play(interrupt),
            SessionCmd::Pause => self.pause(),
            SessionCmd::Next => self.next(interrupt),
            SessionCmd::Prev => self.previous(interrupt),
            SessionCmd::SeekBy(delta_ms) => self.seek_by(delta_ms),
            SessionCmd::SeekTo(ms) => self.seek_to(ms),
            SessionCmd::SetTracks(tracks) => self.set_tracks(tracks),
            SessionCmd::SetPlaylists(playlists) => self.set_playlists(playlists),
            // The command loop exits on Quit before dispatching here.
            SessionCmd::Quit => {}
        }
    }

    fn sequence(&self, source: &TrackSource) -> Option<&[TrackRef]> {
        match source {
            TrackSource::Catalog => Some(&self.tracks),
            TrackSource::Playlist(name) => self.playlists.get(name).map(Vec::as_slice),
        }
    }

    fn current_track(&self) -> Option<TrackRef> {
        let source = self.source.as_ref()?;
        let index = self.index?;
        self.sequence(source)?.get(index).cloned()
    }

    fn remember_stable(&mut self) {
        self.stable = (self.status, self.source.clone(), self.index);
    }

    fn revert_to_stable(&mut self) {
        let (status, source, index) = self.stable.clone();
        self.status = status;
        self.source = source;
        self.index = index;
        self.publish_status();
    }

    pub(super) fn switch_to(
        &mut self,
        source: TrackSource,
        index: usize,
        interrupt: &mut dyn FnMut() -> bool,
    ) {
        let track = {
            let seq = match self.sequence(&source) {
                Some(seq) => seq,
                None => {
                    let TrackSource::Playlist(name) = source else {
                        return;
                    };
                    self.fail(PlayerError::UnknownPlaylist(name));
                    return;
                }
            };
            if index >= seq.len() {
                self.fail(PlayerError::IndexOutOfRange {
                    index,
                    len: seq.len(),
                });
                return;
            }
            seq[index].clone()
        };

        // Switching to what is already active is a resume, not a reload.
        // The id check matters: a superseded load advances source/index
        // without promoting a handle, so the fields alone can point at a
        // track the active handle does not belong to.
        if self.source.as_ref() == Some(&source) && self.index == Some(index) {
            if let Some((id, handle)) = self.active.clone() {
                if id == track.id {
                    self.cache.touch(&id);
                    match handle.play() {
                        Ok(()) => {
                            self.status = PlaybackStatus::Playing;
                            self.remember_stable();
                            self.publish_status();
                        }
                        Err(e) => self.fail(e),
                    }
                    return;
                }
            }
        }

        self.status = PlaybackStatus::Loading;
        self.publish_status();

        let active_id = self.active.as_ref().map(|(id, _)| id.clone());
        self.cache.evict_expired(Instant::now(), active_id.as_ref());

        // A navigation intent is already queued: advance the logical target
        // and let that intent drive the actual load.
        if interrupt() {
            debug!(id = %track.id, "pending navigation; load coalesced");
            self.source = Some(source);
            self.index = Some(index);
            return;
        }

        let was_cached = self.cache.contains(&track.id);
        let handle = match self.cache.acquire(&track, self.opener.as_ref()) {
            Ok(handle) => handle,
            Err(e) => {
                self.revert_to_stable();
                self.fail(e);
                return;
            }
        };

        // A navigation intent arrived while the open was in flight: the
        // completed load is stale. Never promote it; a handle opened just
        // for this load is released outright.
        if interrupt() {
            if !was_cached {
                self.cache.release(&track.id);
            }
            debug!(id = %track.id, "superseded load discarded");
            self.source = Some(source);
            self.index = Some(index);
            return;
        }

        // Cached handles may sit mid-track from an earlier play.
        if let Err(e) = handle.seek_to(Duration::ZERO) {
            self.revert_to_stable();
            self.fail(e);
            return;
        }

        if let Some((_, old)) = self.active.take() {
            let _ = old.pause();
        }

        if let Err(e) = handle.play() {
            // The previous handle is already parked; nothing is audible.
            self.status = PlaybackStatus::Stopped;
            self.source = Some(source);
            self.index = Some(index);
            self.position = Duration::ZERO;
            self.duration = Duration::ZERO;
            self.remember_stable();
            self.publish_status();
            self.fail(e);
            return;
        }

        let reported = handle.duration();
        self.duration = if reported > Duration::ZERO {
            reported
        } else {
            track.duration.unwrap_or(Duration::ZERO)
        };
        self.position = Duration::ZERO;
        self.source = Some(source);
        self.index = Some(index);
        self.active = Some((track.id.clone(), handle));
        self.finish_latched = false;
        self.status = PlaybackStatus::Playing;
        self.remember_stable();
        self.publish_status();
        debug!(id = %track.id, "switched track");
    }

    fn play(&mut self, interrupt: &mut dyn FnMut() -> bool) {
        if self.status == PlaybackStatus::Playing {
            return;
        }
        let current_id = self.current_track().map(|t| t.id);
        if let Some((id, handle)) = self.active.clone() {
            // Only resume a handle that still belongs to the current track.
            if Some(&id) == current_id.as_ref() {
                self.cache.touch(&id);
                match handle.play() {
                    Ok(()) => {
                        self.status = PlaybackStatus::Playing;
                        self.remember_stable();
                        self.publish_status();
                    }
                    Err(e) => self.fail(e),
                }
                return;
            }
        }
        // No usable handle (e.g. after the end-of-list wrap): load the
        // current reference instead.
        if let (Some(source), Some(index)) = (self.source.clone(), self.index) {
            self.switch_to(source, index, interrupt);
        }
    }

    fn pause(&mut self) {
        if self.status != PlaybackStatus::Playing {
            return;
        }
        let Some((_, handle)) = self.active.clone() else {
            return;
        };
        match handle.pause() {
            Ok(()) => {
                self.status = PlaybackStatus::Paused;
                self.remember_stable();
                self.publish_status();
            }
            Err(e) => self.fail(e),
        }
    }

    fn next(&mut self, interrupt: &mut dyn FnMut() -> bool) {
        let Some(source) = self.source.clone() else {
            return;
        };
        let len = match self.sequence(&source) {
            Some(seq) if !seq.is_empty() => seq.len(),
            _ => {
                self.stop_invalid();
                return;
            }
        };
        let next = self.index.map_or(0, |i| i + 1);
        if next < len {
            self.switch_to(source, next, interrupt);
        } else {
            self.wrap_to_start(source);
        }
    }

    fn previous(&mut self, interrupt: &mut dyn FnMut() -> bool) {
        let Some(source) = self.source.clone() else {
            return;
        };
        // At the first track this is a no-op; no wrap, no event.
        match self.index {
            Some(index) if index > 0 => self.switch_to(source, index - 1, interrupt),
            _ => {}
        }
    }

    /// End-of-list: keep the source, point back at the start, stop without
    /// playing. A later `play` restarts the list.
    fn wrap_to_start(&mut self, source: TrackSource) {
        if let Some((_, old)) = self.active.take() {
            let _ = old.pause();
        }
        self.source = Some(source);
        self.index = Some(0);
        self.status = PlaybackStatus::Stopped;
        self.position = Duration::ZERO;
        self.duration = Duration::ZERO;
        self.finish_latched = false;
        self.remember_stable();
        self.publish_status();
        debug!("end of list; index wrapped to start without replay");
    }

    fn seek_by(&mut self, delta_ms: i64) {
        let Some((_, handle)) = self.active.clone() else {
            return;
        };
        let target = handle.position().as_millis() as i64 + delta_ms;
        self.apply_seek(&handle, target);
    }

    fn seek_to(&mut self, ms: u64) {
        let Some((_, handle)) = self.active.clone() else {
            return;
        };
        self.apply_seek(&handle, ms.min(i64::MAX as u64) as i64);
    }

    fn apply_seek(&mut self, handle: &SharedHandle, target_ms: i64) {
        let upper = {
            let max = self.duration.as_millis().min(i64::MAX as u128) as i64;
            if max > 0 { max } else { i64::MAX }
        };
        let clamped = Duration::from_millis(target_ms.clamp(0, upper) as u64);
        match handle.seek_to(clamped) {
            Ok(()) => {
                self.position = clamped;
                // Rewinding past a finish must allow the next completion to
                // advance again.
                self.finish_latched = false;
                self.publish_status();
            }
            Err(e) => self.fail(e),
        }
    }

    fn set_tracks(&mut self, tracks: Vec<TrackRef>) {
        self.tracks = tracks;
        self.revalidate_active();
    }

    fn set_playlists(&mut self, playlists: HashMap<String, Vec<TrackRef>>) {
        self.playlists = playlists;
        self.revalidate_active();
    }

    /// After a list replacement, re-anchor the active track by id or stop if
    /// the reference no longer resolves.
    fn revalidate_active(&mut self) {
        enum Outcome {
            Keep,
            Move(usize),
            Invalidate,
        }

        let Some(source) = self.source.clone() else {
            return;
        };
        let outcome = match self.sequence(&source) {
            None => Outcome::Invalidate,
            Some(seq) => {
                if let Some((id, _)) = &self.active {
                    match seq.iter().position(|t| &t.id == id) {
                        Some(pos) if self.index == Some(pos) => Outcome::Keep,
                        Some(pos) => Outcome::Move(pos),
                        None => Outcome::Invalidate,
                    }
                } else {
                    match self.index {
                        Some(index) if index >= seq.len() => Outcome::Invalidate,
                        _ => Outcome::Keep,
                    }
                }
            }
        };

        match outcome {
            Outcome::Keep => {}
            Outcome::Move(pos) => {
                self.index = Some(pos);
                self.remember_stable();
                self.publish_status();
            }
            Outcome::Invalidate => self.stop_invalid(),
        }
    }

    fn stop_invalid(&mut self) {
        if let Some((_, old)) = self.active.take() {
            let _ = old.pause();
        }
        self.source = None;
        self.index = None;
        self.status = PlaybackStatus::Stopped;
        self.position = Duration::ZERO;
        self.duration = Duration::ZERO;
        self.finish_latched = false;
        self.remember_stable();
        self.publish_status();
        debug!("active list empty or invalid; session stopped");
    }

    /// Poll pass: refresh position while playing and detect completion.
    pub(super) fn tick(&mut self) {
        if self.status != PlaybackStatus::Playing {
            return;
        }
        let Some((_, handle)) = self.active.clone() else {
            return;
        };
        self.position = handle.position();
        if handle.finished() && !self.finish_latched {
            self.finish_latched = true;
            debug!("track finished; auto-advancing");
            self.next(&mut || false);
        } else {
            self.publish_tick();
        }
    }

    pub(super) fn shutdown(&mut self) {
        if let Some((_, old)) = self.active.take() {
            let _ = old.pause();
        }
        self.cache.clear();
        self.status = PlaybackStatus::Stopped;
        self.publish_status();
        debug!("session engine stopped");
    }

    #[cfg(test)]
    pub(super) fn cache(&self) -> &HandleCache {
        &self.cache
    }

    fn snapshot_now(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            source: self.source.clone(),
            index: self.index,
            position: self.position,
            duration: self.duration,
            track: self.current_track(),
        }
    }

    fn publish_status(&self) {
        let snap = self.snapshot_now();
        self.store_snapshot(&snap);
        self.notify(&SessionEvent::Status(snap));
    }

    fn publish_tick(&self) {
        let snap = self.snapshot_now();
        self.store_snapshot(&snap);
        self.notify(&SessionEvent::Tick(snap));
    }

    fn store_snapshot(&self, snap: &SessionSnapshot) {
        if let Ok(mut shared) = self.snapshot.lock() {
            *shared = snap.clone();
        }
    }

    fn notify(&self, event: &SessionEvent) {
        if let Ok(listeners) = self.listeners.lock() {
            for listener in listeners.iter() {
                listener(event);
            }
        }
    }

    fn fail(&self, err: PlayerError) {
        warn!(error = %err, "session operation failed");
        self.notify(&SessionEvent::Error(err));
    }
}

/// Spawn the engine thread: build the opener there (audio output streams do
/// not move across threads), then run the command loop with the poll tick.
pub(super) fn spawn_engine(
    rx: Receiver<SessionCmd>,
    ready_tx: Sender<Result<(), PlayerError>>,
    opener_factory: OpenerFactory,
    cache_ttl: Duration,
    poll_interval: Duration,
    tracks: Vec<TrackRef>,
    playlists: HashMap<String, Vec<TrackRef>>,
    snapshot: SnapshotHandle,
    listeners: ListenerSet,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let opener: Box<dyn HandleOpener> = match opener_factory() {
            Ok(opener) => {
                let _ = ready_tx.send(Ok(()));
                opener
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        let mut engine = Engine::new(opener, cache_ttl, tracks, playlists, snapshot, listeners);
        let poll = poll_interval.max(Duration::from_millis(1));
        let mut pending: VecDeque<SessionCmd> = VecDeque::new();

        loop {
            let cmd = match pending.pop_front() {
                Some(cmd) => cmd,
                None => match rx.recv_timeout(poll) {
                    Ok(cmd) => cmd,
                    Err(RecvTimeoutError::Timeout) => {
                        engine.tick();
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                },
            };

            if matches!(cmd, SessionCmd::Quit) {
                break;
            }

            // The probe drains newly arrived commands into the queue and
            // reports whether any of them makes the current load moot.
            let mut interrupt = || {
                while let Ok(newer) = rx.try_recv() {
                    pending.push_back(newer);
                }
                pending.iter().any(SessionCmd::supersedes_load)
            };
            engine.handle_cmd(cmd, &mut interrupt);
        }

        engine.shutdown();
    })
}
