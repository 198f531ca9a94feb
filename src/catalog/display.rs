use std::path::Path;

use crate::config::TrackDisplayField;

/// Build a track's display name from the configured `fields` and separator.
///
/// Empty/whitespace-only fields are skipped; falls back to `title` when
/// nothing was produced.
pub(super) fn display_from_fields(
    path: &Path,
    title: &str,
    artist: Option<&str>,
    album: Option<&str>,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    let push = |parts: &mut Vec<String>, s: Option<&str>| {
        if let Some(v) = s.map(str::trim).filter(|v| !v.is_empty()) {
            parts.push(v.to_string());
        }
    };

    for f in fields {
        match f {
            TrackDisplayField::Title => push(&mut parts, Some(title)),
            TrackDisplayField::Artist => push(&mut parts, artist),
            TrackDisplayField::Album => push(&mut parts, album),
            TrackDisplayField::Filename => {
                push(&mut parts, path.file_stem().and_then(|s| s.to_str()))
            }
            TrackDisplayField::Path => parts.push(path.display().to_string()),
        }
    }

    if parts.is_empty() {
        title.to_string()
    } else {
        parts.join(sep)
    }
}
