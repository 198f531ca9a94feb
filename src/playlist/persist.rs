use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{TrackId, TrackRef};
use crate::error::PlayerError;

use super::store::PlaylistPersistence;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PlaylistFile {
    #[serde(default)]
    playlists: HashMap<String, Vec<TrackRef>>,
}

/// TOML-file-backed playlist persistence.
///
/// Each `save` rewrites the named playlist inside the file, leaving the
/// others untouched.
pub struct TomlPlaylists {
    path: PathBuf,
}

impl TomlPlaylists {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_file(&self) -> Result<PlaylistFile, PlayerError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => toml::from_str(&text).map_err(|e| self.io_err(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PlaylistFile::default()),
            Err(e) => Err(self.io_err(e.to_string())),
        }
    }

    fn io_err(&self, reason: String) -> PlayerError {
        PlayerError::Open {
            id: TrackId(self.path.display().to_string()),
            reason,
        }
    }
}

impl PlaylistPersistence for TomlPlaylists {
    fn save(&self, name: &str, tracks: &[TrackRef]) -> Result<(), PlayerError> {
        let mut file = self.read_file()?;
        file.playlists.insert(name.to_string(), tracks.to_vec());

        let text = toml::to_string_pretty(&file).map_err(|e| self.io_err(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e.to_string()))?;
        }
        std::fs::write(&self.path, text).map_err(|e| self.io_err(e.to_string()))?;
        debug!(playlist = name, count = tracks.len(), "playlist saved");
        Ok(())
    }

    fn load_all(&self) -> Result<HashMap<String, Vec<TrackRef>>, PlayerError> {
        Ok(self.read_file()?.playlists)
    }
}
