//! The playback engine: one media resource, one session.
//!
//! The engine turns user requests into [`MediaResource`] calls and folds the
//! resource's events back into the session state. Requests that need the
//! resource to answer (`play`) only change state once the matching event
//! arrives; everything else is applied optimistically.

use std::time::Duration;

use tracing::{debug, warn};

use crate::library::Track;

use super::media::{MediaEvent, MediaEventKind, MediaResource, SourceId};
use super::progress::progress_percent;
use super::types::{NoticeKind, PlaybackState, SessionSnapshot};

pub const DEFAULT_VOLUME: f32 = 0.7;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// The track has no locator or the resource refused it. The session is
    /// left `Stopped`.
    NotLoaded,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    /// Stale (another source) or meaningless in the current state.
    Ignored,
    /// The current track played to the end; the queue decides what's next.
    TrackEnded,
}

pub struct Engine<M: MediaResource> {
    media: M,
    source: Option<SourceId>,
    track: Option<Track>,
    state: PlaybackState,
    progress: Duration,
    duration: Duration,
    volume: f32,
    muted: bool,
    /// The loaded source reported `MetadataReady`.
    ready: bool,
    /// Play as soon as the source is ready.
    pending_autoplay: bool,
    /// A play request is outstanding; only then does `Started` count.
    play_pending: bool,
    notices: Vec<(NoticeKind, String)>,
}

impl<M: MediaResource> Engine<M> {
    pub fn new(mut media: M) -> Self {
        media.set_volume(DEFAULT_VOLUME);
        media.set_muted(false);
        Self {
            media,
            source: None,
            track: None,
            state: PlaybackState::Stopped,
            progress: Duration::ZERO,
            duration: Duration::ZERO,
            volume: DEFAULT_VOLUME,
            muted: false,
            ready: false,
            pending_autoplay: false,
            play_pending: false,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn progress(&self) -> Duration {
        self.progress
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    #[cfg(test)]
    pub fn media(&self) -> &M {
        &self.media
    }

    #[cfg(test)]
    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            track: self.current_track().cloned(),
            state: self.state,
            progress: self.progress,
            duration: self.duration,
            progress_percent: progress_percent(self.progress, self.duration),
            volume: self.volume,
            muted: self.is_muted(),
        }
    }

    /// Failures recorded since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<(NoticeKind, String)> {
        std::mem::take(&mut self.notices)
    }

    fn notice(&mut self, kind: NoticeKind, message: String) {
        warn!(?kind, "{message}");
        self.notices.push((kind, message));
    }

    fn release_source(&mut self) {
        if let Some(id) = self.source.take() {
            self.media.release(id);
        }
    }

    fn force_stopped(&mut self) {
        self.state = PlaybackState::Stopped;
        self.progress = Duration::ZERO;
        self.pending_autoplay = false;
        self.play_pending = false;
    }

    pub fn load_track(&mut self, track: Track, autoplay: bool) -> LoadOutcome {
        self.release_source();

        self.state = PlaybackState::Buffering;
        self.progress = Duration::ZERO;
        self.duration = track.duration;
        self.ready = false;
        self.play_pending = false;
        self.pending_autoplay = autoplay;

        let locator = track.locator.clone();
        let title = track.display.clone();
        self.track = Some(track);

        let Some(path) = locator else {
            self.force_stopped();
            self.notice(
                NoticeKind::LoadFailed,
                format!("{title}: no audio source for this track"),
            );
            return LoadOutcome::NotLoaded;
        };

        match self.media.load(&path) {
            Ok(id) => {
                debug!(source = id.0, ?path, autoplay, "loaded track");
                self.source = Some(id);
                LoadOutcome::Loaded
            }
            Err(e) => {
                self.force_stopped();
                self.notice(NoticeKind::LoadFailed, format!("{title}: {e}"));
                LoadOutcome::NotLoaded
            }
        }
    }

    pub fn play(&mut self) {
        if self.track.is_none() || self.source.is_none() {
            return;
        }
        if !self.ready {
            // Still loading; play once metadata is in.
            self.pending_autoplay = true;
            return;
        }
        self.play_pending = true;
        self.media.play();
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Stopped {
            return;
        }
        self.pending_autoplay = false;
        self.play_pending = false;
        self.media.pause();
        self.state = PlaybackState::Paused;
    }

    /// Pause if playing or about to, otherwise play.
    pub fn toggle_play(&mut self) {
        if self.state == PlaybackState::Playing || self.play_pending || self.pending_autoplay {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn stop(&mut self) {
        if self.source.is_some() {
            self.media.pause();
            self.media.set_position(Duration::ZERO);
        }
        self.force_stopped();
    }

    /// Seek to `target`, clamped to the track. Ignored while stopped.
    pub fn seek(&mut self, target: Duration) {
        if self.state == PlaybackState::Stopped || self.source.is_none() {
            return;
        }
        let target = target.min(self.duration);
        self.media.set_position(target);
        self.progress = target;
    }

    pub fn seek_by_percent(&mut self, percent: f64) {
        if !percent.is_finite() {
            return;
        }
        let fraction = percent.clamp(0.0, 100.0) / 100.0;
        self.seek(self.duration.mul_f64(fraction));
    }

    /// Scrub relative to the current progress by `delta_micros`.
    pub fn seek_by(&mut self, delta_micros: i64) {
        let magnitude = Duration::from_micros(delta_micros.unsigned_abs());
        let target = if delta_micros < 0 {
            self.progress.saturating_sub(magnitude)
        } else {
            self.progress.saturating_add(magnitude)
        };
        self.seek(target);
    }

    /// Start the current track over, regardless of state.
    pub fn restart(&mut self) {
        if self.source.is_none() {
            return;
        }
        self.media.set_position(Duration::ZERO);
        self.progress = Duration::ZERO;
        self.play();
    }

    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        if self.muted && volume > 0.0 {
            self.muted = false;
            self.media.set_muted(false);
        }
        self.volume = volume;
        self.media.set_volume(volume);
    }

    pub fn adjust_volume(&mut self, delta: f32) {
        self.set_volume(self.volume + delta);
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.media.set_muted(self.muted);
    }

    pub fn shutdown(&mut self) {
        self.media.pause();
        self.media.detach();
        self.release_source();
        self.force_stopped();
    }

    pub fn poll_events(&mut self) -> Vec<MediaEvent> {
        self.media.poll_events()
    }

    pub fn handle_event(&mut self, event: MediaEvent) -> EventOutcome {
        if self.source != Some(event.source) {
            debug!(source = event.source.0, kind = ?event.kind, "dropping stale media event");
            return EventOutcome::Ignored;
        }

        match event.kind {
            MediaEventKind::MetadataReady(reported) => {
                if let Some(d) = reported.filter(|d| !d.is_zero()) {
                    self.duration = d;
                }
                self.ready = true;
                if self.state == PlaybackState::Buffering {
                    self.state = PlaybackState::Paused;
                }
                if self.pending_autoplay {
                    self.pending_autoplay = false;
                    self.play();
                }
                EventOutcome::Applied
            }
            MediaEventKind::Started => {
                if !self.play_pending {
                    return EventOutcome::Ignored;
                }
                self.play_pending = false;
                self.state = PlaybackState::Playing;
                EventOutcome::Applied
            }
            MediaEventKind::Paused => {
                if self.play_pending
                    || !matches!(
                        self.state,
                        PlaybackState::Playing | PlaybackState::Buffering
                    )
                {
                    return EventOutcome::Ignored;
                }
                self.state = PlaybackState::Paused;
                EventOutcome::Applied
            }
            MediaEventKind::Buffering => {
                if self.state != PlaybackState::Playing {
                    return EventOutcome::Ignored;
                }
                self.state = PlaybackState::Buffering;
                // Resuming from a stall is reported as a fresh `Started`.
                self.play_pending = true;
                EventOutcome::Applied
            }
            MediaEventKind::TimeUpdate(t) => {
                if self.state == PlaybackState::Stopped {
                    return EventOutcome::Ignored;
                }
                self.progress = if self.duration.is_zero() {
                    t
                } else {
                    t.min(self.duration)
                };
                EventOutcome::Applied
            }
            MediaEventKind::Ended => {
                if self.state == PlaybackState::Stopped {
                    return EventOutcome::Ignored;
                }
                EventOutcome::TrackEnded
            }
            MediaEventKind::Error(reason) => {
                self.force_stopped();
                let title = self
                    .track
                    .as_ref()
                    .map(|t| t.display.clone())
                    .unwrap_or_default();
                self.notice(NoticeKind::PlaybackError, format!("{title}: {reason}"));
                EventOutcome::Applied
            }
            MediaEventKind::PlayRejected(reason) => {
                self.play_pending = false;
                self.notice(NoticeKind::PlayRejected, format!("playback refused: {reason}"));
                EventOutcome::Applied
            }
        }
    }
}
