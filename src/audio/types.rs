//! Audio-related small types shared between the audio thread and observers.
//!
//! This module defines the repeat and playback-state enums, the command set
//! understood by the audio thread and the snapshots it publishes.

use std::time::Duration;

use crate::config::RepeatModeSetting;
use crate::library::Track;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum RepeatMode {
    /// Stop at the end of the queue.
    #[default]
    Off,
    /// Wrap around to the start of the queue.
    All,
    /// Repeat the current track.
    One,
}

impl RepeatMode {
    /// `Off -> All -> One -> Off`.
    pub fn cycled(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

impl From<RepeatModeSetting> for RepeatMode {
    fn from(setting: RepeatModeSetting) -> Self {
        match setting {
            RepeatModeSetting::Off => Self::Off,
            RepeatModeSetting::All => Self::All,
            RepeatModeSetting::One => Self::One,
        }
    }
}

/// The playback state of the session. Exactly one is active.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Buffering,
    Playing,
    Paused,
}

#[derive(Debug)]
pub enum AudioCmd {
    /// Replace the queue and start playing at `start`.
    SetQueue { tracks: Vec<Track>, start: usize },
    /// Append a track to the queue.
    AddToQueue(Track),
    /// Empty the queue; playback continues.
    ClearQueue,
    Play,
    Pause,
    TogglePlay,
    Stop,
    /// Skip to the next track.
    Next,
    /// Go to the previous track, or restart the current one.
    Previous,
    /// Seek to an absolute position.
    SeekTo(Duration),
    /// Seek by a signed offset in microseconds.
    SeekBy(i64),
    /// Seek to a percentage of the track duration.
    SeekPercent(f64),
    SetVolume(f32),
    /// Change the volume relative to its current value.
    AdjustVolume(f32),
    ToggleMute,
    ToggleShuffle,
    SetShuffle(bool),
    ToggleRepeat,
    SetRepeat(RepeatMode),
    /// Tear down the media resource and exit the audio thread.
    Quit,
}

/// Read-only view of the playback session, published after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub track: Option<Track>,
    pub state: PlaybackState,
    pub progress: Duration,
    pub duration: Duration,
    /// Derived from `progress` and `duration`; zero when the duration is.
    pub progress_percent: f64,
    pub volume: f32,
    pub muted: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            track: None,
            state: PlaybackState::Stopped,
            progress: Duration::ZERO,
            duration: Duration::ZERO,
            progress_percent: 0.0,
            volume: 0.0,
            muted: false,
        }
    }
}

/// Read-only view of the queue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueSnapshot {
    /// Tracks in playback order (shuffled when shuffle is on).
    pub tracks: Vec<Track>,
    pub index: usize,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub can_play_next: bool,
    pub can_play_previous: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    /// A track could not be loaded.
    LoadFailed,
    /// The output refused to start playback.
    PlayRejected,
    /// Playback failed mid-track.
    PlaybackError,
}

/// A recoverable failure reported upward for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    /// Increments with every notice so repeats are still observable.
    pub seq: u64,
    pub kind: NoticeKind,
    pub message: String,
}
