use std::path::Path;

use crate::config::TrackDisplayField;

use super::model::Track;

/// Borrowed metadata that a display string can be composed from.
pub struct DisplayParts<'a> {
    pub path: Option<&'a Path>,
    pub title: &'a str,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
    /// Precomputed display text, if the track already has one.
    pub display: Option<&'a str>,
}

impl<'a> DisplayParts<'a> {
    pub fn of(track: &'a Track) -> Self {
        Self {
            path: track.locator(),
            title: &track.title,
            artist: track.artist.as_deref(),
            album: track.album.as_deref(),
            display: Some(&track.display),
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Join the requested `fields` with `sep`, skipping the ones that are blank.
///
/// Falls back to the title when nothing was produced.
pub fn compose(parts: &DisplayParts<'_>, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut out: Vec<String> = Vec::new();

    for field in fields {
        match field {
            TrackDisplayField::Display => match non_blank(parts.display) {
                Some(d) => out.push(d.to_string()),
                None => {
                    out.extend(non_blank(parts.artist).map(str::to_string));
                    out.extend(non_blank(Some(parts.title)).map(str::to_string));
                }
            },
            TrackDisplayField::Title => {
                out.extend(non_blank(Some(parts.title)).map(str::to_string));
            }
            TrackDisplayField::Artist => {
                out.extend(non_blank(parts.artist).map(str::to_string));
            }
            TrackDisplayField::Album => {
                out.extend(non_blank(parts.album).map(str::to_string));
            }
            TrackDisplayField::Filename => {
                let stem = parts
                    .path
                    .and_then(|p| p.file_stem())
                    .and_then(|s| s.to_str());
                out.extend(non_blank(stem).map(str::to_string));
            }
            TrackDisplayField::Path => {
                if let Some(p) = parts.path {
                    out.push(p.display().to_string());
                }
            }
        }
    }

    if out.is_empty() {
        parts.title.to_string()
    } else {
        out.join(sep)
    }
}
