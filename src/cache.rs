//! Time-bounded cache of live sound handles.
//!
//! Re-playing a recent track reuses its decoder instead of paying the open
//! cost again. Entries expire lazily: the session runs an eviction pass
//! before each load rather than keeping a background timer. The cache is
//! owned by the session engine, so all mutation happens on one thread.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::catalog::{TrackId, TrackRef};
use crate::error::PlayerError;
use crate::handle::{HandleOpener, SharedHandle};

/// Default entry lifetime: one day, as counted from the last access.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct CacheEntry {
    handle: SharedHandle,
    last_access: Instant,
}

/// Maps track ids to live handles with per-entry last-access timestamps.
pub struct HandleCache {
    entries: HashMap<TrackId, CacheEntry>,
    ttl: Duration,
}

impl HandleCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Return the cached handle for `track`, or open a new one.
    ///
    /// A cache hit refreshes the entry's timestamp and hands back the same
    /// handle instance. A miss invokes `opener`; nothing is cached when the
    /// opener fails.
    pub fn acquire(
        &mut self,
        track: &TrackRef,
        opener: &dyn HandleOpener,
    ) -> Result<SharedHandle, PlayerError> {
        if let Some(entry) = self.entries.get_mut(&track.id) {
            entry.last_access = Instant::now();
            return Ok(entry.handle.clone());
        }

        let handle = opener.open(track)?;
        self.entries.insert(
            track.id.clone(),
            CacheEntry {
                handle: handle.clone(),
                last_access: Instant::now(),
            },
        );
        debug!(id = %track.id, size = self.entries.len(), "cached sound handle");
        Ok(handle)
    }

    /// Refresh the last-access timestamp without touching the handle.
    pub fn touch(&mut self, id: &TrackId) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.last_access = Instant::now();
        }
    }

    /// Drop every entry whose last access is older than the TTL, releasing
    /// its handle — except the one backing `active`, which stays however
    /// stale its timestamp is.
    pub fn evict_expired(&mut self, now: Instant, active: Option<&TrackId>) {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|id, entry| {
            if Some(id) == active {
                return true;
            }
            let expired = now.duration_since(entry.last_access) > ttl;
            if expired {
                entry.handle.release();
                debug!(id = %id, "evicted expired sound handle");
            }
            !expired
        });
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.entries.len(), "cache eviction pass");
        }
    }

    /// Forcibly drop one entry and release its handle. Hook point for size
    /// pressure; also used when a superseded load is discarded.
    pub fn release(&mut self, id: &TrackId) {
        if let Some(entry) = self.entries.remove(id) {
            entry.handle.release();
            debug!(id = %id, "released cached sound handle");
        }
    }

    /// Release everything; used at session shutdown.
    pub fn clear(&mut self) {
        for entry in self.entries.values() {
            entry.handle.release();
        }
        self.entries.clear();
    }

    pub fn contains(&self, id: &TrackId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
