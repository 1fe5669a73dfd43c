use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Stable identity of a track within one library scan.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub id: TrackId,
    /// Where the audio lives. `None` means the track cannot be played.
    pub locator: Option<PathBuf>,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Authoritative display duration, read from tags at scan time.
    pub duration: Duration,
    pub display: String,
}

impl Track {
    pub fn locator(&self) -> Option<&Path> {
        self.locator.as_deref()
    }
}
