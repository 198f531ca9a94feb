//! In-memory handle/opener doubles for exercising the cache and the
//! session state machine without an audio device.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::catalog::{TrackId, TrackRef};
use crate::error::PlayerError;

use super::{Handle, HandleOpener, SharedHandle};

#[derive(Default)]
pub(crate) struct FakeHandle {
    pub id: String,
    pub duration: Duration,
    playing: AtomicBool,
    position: Mutex<Duration>,
    finished: AtomicBool,
    released: AtomicBool,
    pub play_calls: AtomicUsize,
    pub pause_calls: AtomicUsize,
    pub release_calls: AtomicUsize,
}

impl FakeHandle {
    pub fn new(id: &str, duration: Duration) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            duration,
            ..Self::default()
        })
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn set_position(&self, position: Duration) {
        *self.position.lock().unwrap() = position;
    }

    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

impl Handle for FakeHandle {
    fn play(&self) -> Result<(), PlayerError> {
        if self.is_released() {
            return Err(PlayerError::Playback("handle released".to_string()));
        }
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) -> Result<(), PlayerError> {
        if self.is_released() {
            return Err(PlayerError::Playback("handle released".to_string()));
        }
        self.pause_calls.fetch_add(1, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn seek_to(&self, position: Duration) -> Result<(), PlayerError> {
        if self.is_released() {
            return Err(PlayerError::Playback("handle released".to_string()));
        }
        *self.position.lock().unwrap() = position.min(self.duration);
        self.finished.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn position(&self) -> Duration {
        *self.position.lock().unwrap()
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.release_calls.fetch_add(1, Ordering::SeqCst);
            self.playing.store(false, Ordering::SeqCst);
        }
    }
}

/// Opener double: records every open, optionally failing chosen ids, and
/// keeps the produced handles inspectable.
#[derive(Default)]
pub(crate) struct FakeOpener {
    pub duration: Duration,
    fail_ids: Mutex<HashSet<TrackId>>,
    pub opened: Mutex<Vec<TrackId>>,
    pub handles: Mutex<Vec<Arc<FakeHandle>>>,
}

impl FakeOpener {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    /// Make every open of `id` fail from now on.
    pub fn fail(&self, id: TrackId) {
        self.fail_ids.lock().unwrap().insert(id);
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    pub fn opens_of(&self, id: &TrackId) -> usize {
        self.opened.lock().unwrap().iter().filter(|o| *o == id).count()
    }

    /// The most recently opened handle for `id`.
    pub fn handle_for(&self, id: &str) -> Option<Arc<FakeHandle>> {
        self.handles
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|h| h.id == id)
            .cloned()
    }
}

// Tests keep an `Arc<FakeOpener>` for inspection while the engine owns a
// boxed clone of it.
impl HandleOpener for Arc<FakeOpener> {
    fn open(&self, track: &TrackRef) -> Result<SharedHandle, PlayerError> {
        self.as_ref().open(track)
    }
}

impl HandleOpener for FakeOpener {
    fn open(&self, track: &TrackRef) -> Result<SharedHandle, PlayerError> {
        self.opened.lock().unwrap().push(track.id.clone());
        if self.fail_ids.lock().unwrap().contains(&track.id) {
            return Err(PlayerError::Open {
                id: track.id.clone(),
                reason: "simulated open failure".to_string(),
            });
        }
        let handle = FakeHandle::new(&track.id.0, self.duration);
        self.handles.lock().unwrap().push(handle.clone());
        Ok(handle)
    }
}
