use std::time::Duration;

use tempfile::tempdir;

use super::*;
use crate::catalog::{TrackId, TrackRef};
use crate::error::PlayerError;

fn t(name: &str) -> TrackRef {
    TrackRef {
        id: TrackId(format!("/music/{name}.mp3")),
        display: name.to_string(),
        duration: Some(Duration::from_secs(180)),
    }
}

#[test]
fn create_rejects_duplicate_names() {
    let mut store = PlaylistStore::new();
    store.create("road trip").unwrap();
    let err = store.create("road trip").unwrap_err();
    assert!(matches!(err, PlayerError::PlaylistExists(_)));
    assert_eq!(store.names(), ["road trip"]);
}

#[test]
fn add_track_appends_in_order() {
    let mut store = PlaylistStore::new();
    store.create("mix").unwrap();
    store.add_track("mix", t("a")).unwrap();
    store.add_track("mix", t("b")).unwrap();
    store.add_track("mix", t("a")).unwrap();

    let names: Vec<&str> = store
        .get("mix")
        .unwrap()
        .iter()
        .map(|t| t.display.as_str())
        .collect();
    assert_eq!(names, ["a", "b", "a"]);
}

#[test]
fn add_track_to_unknown_playlist_fails() {
    let mut store = PlaylistStore::new();
    let err = store.add_track("nope", t("a")).unwrap_err();
    assert!(matches!(err, PlayerError::UnknownPlaylist(_)));
}

#[test]
fn reorder_moves_an_entry() {
    let mut store = PlaylistStore::new();
    store.create("mix").unwrap();
    for name in ["a", "b", "c"] {
        store.add_track("mix", t(name)).unwrap();
    }

    store.reorder("mix", 2, 0).unwrap();
    let names: Vec<&str> = store
        .get("mix")
        .unwrap()
        .iter()
        .map(|t| t.display.as_str())
        .collect();
    assert_eq!(names, ["c", "a", "b"]);

    let err = store.reorder("mix", 5, 0).unwrap_err();
    assert!(matches!(err, PlayerError::IndexOutOfRange { index: 5, len: 3 }));
}

#[test]
fn remove_drops_playlist_and_name() {
    let mut store = PlaylistStore::new();
    store.create("one").unwrap();
    store.create("two").unwrap();
    store.remove("one").unwrap();
    assert_eq!(store.names(), ["two"]);
    assert!(store.get("one").is_none());
    assert!(matches!(
        store.remove("one").unwrap_err(),
        PlayerError::UnknownPlaylist(_)
    ));
}

#[test]
fn toml_round_trip_preserves_order_and_fields() {
    let dir = tempdir().unwrap();
    let persist = TomlPlaylists::new(dir.path().join("playlists.toml"));

    persist.save("mix", &[t("b"), t("a")]).unwrap();
    persist.save("other", &[t("c")]).unwrap();
    // Overwriting one playlist leaves the rest untouched.
    persist.save("mix", &[t("a"), t("b"), t("c")]).unwrap();

    let map = persist.load_all().unwrap();
    assert_eq!(map.len(), 2);
    let mix: Vec<&str> = map["mix"].iter().map(|t| t.display.as_str()).collect();
    assert_eq!(mix, ["a", "b", "c"]);
    assert_eq!(map["mix"][0].duration, Some(Duration::from_secs(180)));
    assert_eq!(map["other"][0].id, TrackId::from("/music/c.mp3"));
}

#[test]
fn load_all_from_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let persist = TomlPlaylists::new(dir.path().join("absent.toml"));
    assert!(persist.load_all().unwrap().is_empty());
}

#[test]
fn from_map_lists_names_sorted() {
    let mut map = std::collections::HashMap::new();
    map.insert("zeta".to_string(), vec![t("a")]);
    map.insert("alpha".to_string(), vec![]);
    let store = PlaylistStore::from_map(map);
    assert_eq!(store.names(), ["alpha", "zeta"]);
}
