//! User-defined playlists: named, ordered track sequences.
//!
//! The session core treats playlists as an injected mapping; persistence is
//! a collaborator behind `PlaylistPersistence`.

mod persist;
mod store;

pub use persist::TomlPlaylists;
pub use store::{PlaylistPersistence, PlaylistStore};

#[cfg(test)]
mod tests;
