use std::collections::HashMap;

use crate::catalog::TrackRef;
use crate::error::PlayerError;

/// Persistence collaborator: the store itself never touches disk.
pub trait PlaylistPersistence {
    fn save(&self, name: &str, tracks: &[TrackRef]) -> Result<(), PlayerError>;
    fn load_all(&self) -> Result<HashMap<String, Vec<TrackRef>>, PlayerError>;
}

/// Named playlists with user-defined track order.
///
/// Names are unique; the order playlists were created in is preserved for
/// listing. Playlists are never auto-deleted, only `remove` drops one.
#[derive(Debug, Default, Clone)]
pub struct PlaylistStore {
    names: Vec<String>,
    lists: HashMap<String, Vec<TrackRef>>,
}

impl PlaylistStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a persisted mapping. Name order follows the
    /// mapping's sorted keys so repeated loads agree.
    pub fn from_map(map: HashMap<String, Vec<TrackRef>>) -> Self {
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        Self { names, lists: map }
    }

    /// Create an empty playlist. Duplicate names are rejected.
    pub fn create(&mut self, name: &str) -> Result<(), PlayerError> {
        if self.lists.contains_key(name) {
            return Err(PlayerError::PlaylistExists(name.to_string()));
        }
        self.names.push(name.to_string());
        self.lists.insert(name.to_string(), Vec::new());
        Ok(())
    }

    /// Append a track to the named playlist.
    pub fn add_track(&mut self, name: &str, track: TrackRef) -> Result<(), PlayerError> {
        self.list_mut(name)?.push(track);
        Ok(())
    }

    /// Move the entry at `from` to position `to`, shifting the rest.
    pub fn reorder(&mut self, name: &str, from: usize, to: usize) -> Result<(), PlayerError> {
        let list = self.list_mut(name)?;
        let len = list.len();
        if from >= len {
            return Err(PlayerError::IndexOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(PlayerError::IndexOutOfRange { index: to, len });
        }
        let track = list.remove(from);
        list.insert(to, track);
        Ok(())
    }

    /// Drop a playlist entirely.
    pub fn remove(&mut self, name: &str) -> Result<(), PlayerError> {
        if self.lists.remove(name).is_none() {
            return Err(PlayerError::UnknownPlaylist(name.to_string()));
        }
        self.names.retain(|n| n != name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[TrackRef]> {
        self.lists.get(name).map(Vec::as_slice)
    }

    /// Playlist names in creation order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn as_map(&self) -> &HashMap<String, Vec<TrackRef>> {
        &self.lists
    }

    fn list_mut(&mut self, name: &str) -> Result<&mut Vec<TrackRef>, PlayerError> {
        self.lists
            .get_mut(name)
            .ok_or_else(|| PlayerError::UnknownPlaylist(name.to_string()))
    }
}
