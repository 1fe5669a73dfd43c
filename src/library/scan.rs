use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;

use lofty::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::{DisplayParts, compose};
use super::model::{Track, TrackId};

/// Lowercased extensions from the library settings, normalized once per scan.
struct Extensions(Vec<String>);

impl Extensions {
    fn new(settings: &LibrarySettings) -> Self {
        Self(
            settings
                .extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        )
    }

    fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            return false;
        };
        self.0.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn clean(v: Option<Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[derive(Default)]
struct Tags {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    duration: Duration,
}

fn read_tags(path: &Path) -> Tags {
    let tagged = match lofty::read_from_path(path) {
        Ok(t) => t,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no readable tags");
            return Tags::default();
        }
    };

    let mut tags = Tags {
        duration: tagged.properties().duration(),
        ..Tags::default()
    };

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        tags.title = clean(tag.title());
        tags.artist = clean(tag.artist());
        tags.album = clean(tag.album());
    }

    tags
}

/// Walk `dir` and build the track catalog, sorted case-insensitively by
/// display text. Ids are assigned in that order.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let extensions = Extensions::new(settings);
    let mut tracks: Vec<Track> = Vec::new();

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
        if !path.is_file()
            || (!settings.include_hidden && is_hidden(path))
            || !extensions.matches(path)
        {
            continue;
        }

        let tags = read_tags(path);
        let title = tags.title.unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("UNKNOWN")
                .to_string()
        });

        let display = compose(
            &DisplayParts {
                path: Some(path),
                title: &title,
                artist: tags.artist.as_deref(),
                album: tags.album.as_deref(),
                display: None,
            },
            &settings.display_fields,
            &settings.display_separator,
        );

        tracks.push(Track {
            id: TrackId(0),
            locator: Some(path.to_path_buf()),
            title,
            artist: tags.artist,
            album: tags.album,
            duration: tags.duration,
            display,
        });
    }

    tracks.sort_by_cached_key(|t| t.display.to_lowercase());
    for (i, t) in tracks.iter_mut().enumerate() {
        t.id = TrackId(i as u64);
    }

    info!(dir = %dir.display(), count = tracks.len(), "library scanned");
    tracks
}
