//! Local playback session manager with a time-bounded sound-handle cache.
//!
//! The crate tracks which track is loaded, drives play/pause/seek/skip
//! transitions, keeps user playlists, and caches live decoder handles so
//! switching back to a recent track skips the reload. Callers bring the
//! surrounding pieces — UI, media enumeration, persistence — through the
//! collaborator traits in [`catalog`], [`playlist`] and [`handle`].
//!
//! Typical wiring:
//!
//! ```no_run
//! use vivace::{FsCatalog, PlayerSession, Settings, Transport, TrackSource};
//!
//! # fn main() -> Result<(), vivace::PlayerError> {
//! let settings = Settings::load().unwrap_or_default();
//! let catalog = FsCatalog::scan(std::path::Path::new("Music"), &settings.library)?;
//! let session = PlayerSession::open_default(
//!     &settings,
//!     catalog.tracks().to_vec(),
//!     Default::default(),
//! )?;
//! let transport = Transport::new(&session, settings.session.seek_step_ms);
//! transport.switch_to(TrackSource::Catalog, 0)?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handle;
pub mod playlist;
pub mod session;
pub mod transport;

pub use cache::HandleCache;
pub use catalog::{Catalog, FsCatalog, TrackId, TrackPage, TrackRef};
pub use config::Settings;
pub use error::PlayerError;
pub use handle::{Handle, HandleOpener, SharedHandle};
pub use playlist::{PlaylistPersistence, PlaylistStore, TomlPlaylists};
pub use session::{
    PlaybackStatus, PlayerSession, SessionCmd, SessionEvent, SessionSnapshot, TrackSource,
};
pub use transport::{SessionControl, Transport};
