//! `rodio`-backed [`MediaResource`].
//!
//! One `Sink` per loaded file. `rodio` has no callbacks, so the events the
//! engine expects are synthesized: request-driven ones (`MetadataReady`,
//! `Started`, `Paused`) are queued when the request is made, and the
//! time-driven ones (`TimeUpdate`, `Ended`) are derived from the sink when
//! the audio thread polls.

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, error, warn};

use super::media::{MediaError, MediaEvent, MediaEventKind, MediaResource, SourceId};

struct Loaded {
    id: SourceId,
    path: PathBuf,
    sink: Sink,
}

pub struct RodioMedia {
    stream: Option<OutputStream>,
    loaded: Option<Loaded>,
    next_id: u64,
    volume: f32,
    muted: bool,
    playing: bool,
    ended_sent: bool,
    pending: VecDeque<MediaEvent>,
}

impl RodioMedia {
    /// Open the default output device. Without one the resource still works,
    /// but every load fails with [`MediaError::NoOutputDevice`].
    pub fn open() -> Self {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when OutputStream is dropped. That's useful in
                // debugging, but noisy for a TUI app.
                stream.log_on_drop(false);
                Some(stream)
            }
            Err(e) => {
                error!("no audio output device: {e}");
                None
            }
        };
        Self {
            stream,
            loaded: None,
            next_id: 0,
            volume: 1.0,
            muted: false,
            playing: false,
            ended_sent: false,
            pending: VecDeque::new(),
        }
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    fn push(&mut self, id: SourceId, kind: MediaEventKind) {
        self.pending.push_back(MediaEvent::new(id, kind));
    }

    /// Create a paused `Sink` for `path` that starts playback at `start_at`.
    /// Also returns the duration the decoder reports, if any.
    fn open_sink(
        &self,
        path: &Path,
        start_at: Duration,
    ) -> Result<(Sink, Option<Duration>), MediaError> {
        let Some(stream) = self.stream.as_ref() else {
            return Err(MediaError::NoOutputDevice("output stream unavailable".into()));
        };
        let file = File::open(path).map_err(|source| MediaError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|e| MediaError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let total = decoder.total_duration();

        let sink = Sink::connect_new(stream.mixer());
        sink.pause();
        sink.set_volume(self.effective_volume());
        // `skip_duration` is the fallback seeking primitive; Duration::ZERO is fine.
        sink.append(decoder.skip_duration(start_at));
        Ok((sink, total))
    }

    /// Swap in a fresh sink for the loaded file, positioned at `start_at`.
    /// Needed once a sink has drained: an empty sink can neither seek nor play.
    fn rebuild(&mut self, start_at: Duration) -> bool {
        let Some(path) = self.loaded.as_ref().map(|l| l.path.clone()) else {
            return false;
        };
        match self.open_sink(&path, start_at) {
            Ok((sink, _)) => {
                if self.playing {
                    sink.play();
                }
                if let Some(loaded) = self.loaded.as_mut() {
                    loaded.sink.stop();
                    loaded.sink = sink;
                }
                self.ended_sent = false;
                true
            }
            Err(e) => {
                if let Some(id) = self.loaded.as_ref().map(|l| l.id) {
                    self.push(id, MediaEventKind::Error(e.to_string()));
                }
                self.playing = false;
                false
            }
        }
    }
}

impl MediaResource for RodioMedia {
    fn load(&mut self, locator: &Path) -> Result<SourceId, MediaError> {
        let (sink, total) = self.open_sink(locator, Duration::ZERO)?;
        if let Some(old) = self.loaded.take() {
            old.sink.stop();
        }
        self.next_id += 1;
        let id = SourceId(self.next_id);
        self.loaded = Some(Loaded {
            id,
            path: locator.to_path_buf(),
            sink,
        });
        self.playing = false;
        self.ended_sent = false;
        self.push(id, MediaEventKind::MetadataReady(total));
        Ok(id)
    }

    fn release(&mut self, id: SourceId) {
        self.pending.retain(|e| e.source != id);
        if self.loaded.as_ref().is_some_and(|l| l.id == id) {
            if let Some(old) = self.loaded.take() {
                old.sink.stop();
            }
            self.playing = false;
        }
    }

    fn play(&mut self) {
        let Some((id, drained)) = self.loaded.as_ref().map(|l| (l.id, l.sink.empty())) else {
            return;
        };
        if self.stream.is_none() {
            self.push(id, MediaEventKind::PlayRejected("no audio output device".into()));
            return;
        }
        if drained && !self.rebuild(Duration::ZERO) {
            return;
        }
        if let Some(loaded) = self.loaded.as_ref() {
            loaded.sink.play();
        }
        self.playing = true;
        self.ended_sent = false;
        self.push(id, MediaEventKind::Started);
    }

    fn pause(&mut self) {
        let Some(loaded) = self.loaded.as_ref() else {
            return;
        };
        loaded.sink.pause();
        let id = loaded.id;
        if self.playing {
            self.playing = false;
            self.push(id, MediaEventKind::Paused);
        }
    }

    fn set_position(&mut self, position: Duration) {
        let Some(loaded) = self.loaded.as_ref() else {
            return;
        };
        if loaded.sink.empty() {
            self.rebuild(position);
            return;
        }
        if let Err(e) = loaded.sink.try_seek(position) {
            debug!("seek unsupported ({e}), rebuilding sink");
            self.rebuild(position);
            return;
        }
        self.ended_sent = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(loaded) = self.loaded.as_ref() {
            loaded.sink.set_volume(self.effective_volume());
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if let Some(loaded) = self.loaded.as_ref() {
            loaded.sink.set_volume(self.effective_volume());
        }
    }

    fn detach(&mut self) {
        if let Some(old) = self.loaded.take() {
            old.sink.stop();
        }
        self.pending.clear();
        self.playing = false;
        if self.stream.take().is_none() {
            warn!("detach without an output stream");
        }
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        let polled = self
            .loaded
            .as_ref()
            .filter(|_| self.playing)
            .map(|l| (l.id, l.sink.empty(), l.sink.get_pos()));
        if let Some((id, drained, pos)) = polled {
            if drained {
                if !self.ended_sent {
                    self.ended_sent = true;
                    self.playing = false;
                    self.push(id, MediaEventKind::Ended);
                }
            } else {
                self.push(id, MediaEventKind::TimeUpdate(pos));
            }
        }
        self.pending.drain(..).collect()
    }
}
