use std::io;
use std::path::Path;
use std::time::Duration;

use lofty::prelude::{AudioFile, ItemKey, TaggedFileExt};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::PlayerError;

use super::display::display_from_fields;
use super::model::{Catalog, Cursor, TrackId, TrackPage, TrackRef};

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Filesystem-backed catalog: walks a directory once at construction and
/// serves sorted `TrackRef`s from memory, in pages.
#[derive(Debug)]
pub struct FsCatalog {
    tracks: Vec<TrackRef>,
}

impl FsCatalog {
    /// Scan `dir` for audio files according to `settings`.
    ///
    /// An unreadable root maps to `PermissionDenied` so the caller can show
    /// its "no songs" state once instead of erroring repeatedly.
    pub fn scan(dir: &Path, settings: &LibrarySettings) -> Result<Self, PlayerError> {
        match std::fs::read_dir(dir) {
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(PlayerError::PermissionDenied);
            }
            Err(e) => {
                return Err(PlayerError::Open {
                    id: TrackId(dir.display().to_string()),
                    reason: e.to_string(),
                });
            }
            Ok(_) => {}
        }

        let mut tracks: Vec<TrackRef> = Vec::new();

        let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

        // Non-recursive = only the root directory.
        let depth_cap = if settings.recursive {
            settings.max_depth
        } else {
            Some(1)
        };
        if let Some(d) = depth_cap {
            walker = walker.max_depth(d);
        }

        for entry in walker
            .into_iter()
            .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
            .filter_map(Result::ok)
        {
            let path = entry.path();
            if path.is_file()
                && (settings.include_hidden || !is_hidden(path))
                && is_audio_file(path, settings)
            {
                let default_title = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("UNKNOWN")
                    .to_string();

                let mut title = default_title;
                let mut artist: Option<String> = None;
                let mut album: Option<String> = None;
                let mut duration: Option<Duration> = None;

                match lofty::read_from_path(path) {
                    Ok(tagged) => {
                        duration = Some(tagged.properties().duration());

                        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                            if let Some(v) = tag.get_string(&ItemKey::TrackTitle) {
                                if !v.trim().is_empty() {
                                    title = v.to_string();
                                }
                            }
                            if let Some(v) = tag.get_string(&ItemKey::TrackArtist) {
                                let v = v.trim();
                                if !v.is_empty() {
                                    artist = Some(v.to_string());
                                }
                            }
                            if let Some(v) = tag.get_string(&ItemKey::AlbumTitle) {
                                let v = v.trim();
                                if !v.is_empty() {
                                    album = Some(v.to_string());
                                }
                            }
                        }
                    }
                    Err(e) => {
                        // Untagged or unreadable files are still playable.
                        warn!(path = %path.display(), error = %e, "could not read tags");
                    }
                }

                let display = display_from_fields(
                    path,
                    &title,
                    artist.as_deref(),
                    album.as_deref(),
                    &settings.display_fields,
                    &settings.display_separator,
                );

                tracks.push(TrackRef {
                    id: TrackId(path.display().to_string()),
                    display,
                    duration,
                });
            }
        }

        tracks.sort_by(|a, b| a.display.to_lowercase().cmp(&b.display.to_lowercase()));
        info!(dir = %dir.display(), count = tracks.len(), "catalog scan complete");
        Ok(Self { tracks })
    }

    /// The full sorted track list.
    pub fn tracks(&self) -> &[TrackRef] {
        &self.tracks
    }
}

impl Catalog for FsCatalog {
    fn page(&self, cursor: Option<&Cursor>, limit: usize) -> Result<TrackPage, PlayerError> {
        let start = match cursor {
            None => 0,
            // An unknown cursor (e.g. from a stale listing) restarts the page walk.
            Some(id) => self
                .tracks
                .iter()
                .position(|t| &t.id == id)
                .map_or(0, |p| p + 1),
        };

        let end = start.saturating_add(limit).min(self.tracks.len());
        let tracks = self.tracks[start..end].to_vec();
        let next = if end < self.tracks.len() {
            tracks.last().map(|t| t.id.clone())
        } else {
            None
        };

        Ok(TrackPage { tracks, next })
    }

    fn len(&self) -> usize {
        self.tracks.len()
    }
}
