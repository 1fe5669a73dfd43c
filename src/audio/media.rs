//! The media-resource seam between the playback engine and an audio backend.
//!
//! The engine never talks to `rodio` directly. It drives a [`MediaResource`]
//! and reacts to the [`MediaEvent`]s it reports, which lets the whole state
//! machine run against an in-memory fake in tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Identity of one loaded source. Every `load` hands out a fresh id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SourceId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    /// The source is decodable. Carries the duration the decoder reports,
    /// if it knows one.
    MetadataReady(Option<Duration>),
    Started,
    Paused,
    /// Output stalled while playing.
    Buffering,
    TimeUpdate(Duration),
    Ended,
    Error(String),
    /// A play request was refused (no output device, autoplay policy...).
    PlayRejected(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub source: SourceId,
    pub kind: MediaEventKind,
}

impl MediaEvent {
    pub fn new(source: SourceId, kind: MediaEventKind) -> Self {
        Self { source, kind }
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("no audio output device: {0}")]
    NoOutputDevice(String),
}

/// A single-source playback backend.
///
/// Requests are fire-and-forget; their outcome comes back through
/// [`MediaResource::poll_events`]. Events must be tagged with the id of the
/// source they concern so stale ones can be told apart.
pub trait MediaResource {
    fn load(&mut self, locator: &Path) -> Result<SourceId, MediaError>;
    /// Drop a source handed out by `load`. Unknown ids are ignored.
    fn release(&mut self, id: SourceId);
    fn play(&mut self);
    fn pause(&mut self);
    fn set_position(&mut self, position: Duration);
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    /// Disconnect from the output. Nothing plays after this.
    fn detach(&mut self);
    fn poll_events(&mut self) -> Vec<MediaEvent>;
}
