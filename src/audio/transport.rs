//! Queue navigation on top of the engine.
//!
//! [`Transport`] is what the audio thread drives: it owns the engine and the
//! queue, maps commands onto them, routes end-of-track back into the queue
//! and publishes snapshots for observers.

use std::ops::ControlFlow;
use std::time::Duration;

use tracing::{debug, info};

use crate::library::Track;
use crate::observe::{StateCell, Watch};

use super::engine::{Engine, EventOutcome};
use super::media::MediaResource;
use super::queue::Queue;
use super::types::{AudioCmd, Notice, QueueSnapshot, RepeatMode, SessionSnapshot};

/// Past this point `previous` restarts the current track instead.
pub const RESTART_THRESHOLD: Duration = Duration::from_secs(3);

/// The writable side of everything the audio thread publishes.
pub struct Outputs {
    pub session: StateCell<SessionSnapshot>,
    pub queue: StateCell<QueueSnapshot>,
    pub notice: StateCell<Option<Notice>>,
}

impl Default for Outputs {
    fn default() -> Self {
        Self {
            session: StateCell::new(SessionSnapshot::default()),
            queue: StateCell::new(QueueSnapshot::default()),
            notice: StateCell::new(None),
        }
    }
}

impl Outputs {
    pub fn watches(&self) -> (Watch<SessionSnapshot>, Watch<QueueSnapshot>, Watch<Option<Notice>>) {
        (self.session.watch(), self.queue.watch(), self.notice.watch())
    }
}

pub struct Transport<M: MediaResource> {
    engine: Engine<M>,
    queue: Queue,
    queue_dirty: bool,
    notice_seq: u64,
}

impl<M: MediaResource> Transport<M> {
    pub fn new(media: M) -> Self {
        Self::with_queue(media, Queue::default())
    }

    pub fn with_queue(media: M, queue: Queue) -> Self {
        Self {
            engine: Engine::new(media),
            queue,
            queue_dirty: true,
            notice_seq: 0,
        }
    }

    pub fn engine(&self) -> &Engine<M> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<M> {
        &mut self.engine
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn set_queue(&mut self, tracks: Vec<Track>, start: usize) {
        self.queue.replace(tracks, start);
        self.queue_dirty = true;
        if let Some(track) = self.queue.current().cloned() {
            info!(track = %track.display, len = self.queue.len(), "queue replaced");
            self.engine.load_track(track, true);
        }
    }

    pub fn add_to_queue(&mut self, track: Track) {
        self.queue.push(track);
        self.queue_dirty = true;
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.queue_dirty = true;
    }

    pub fn toggle_shuffle(&mut self) {
        self.set_shuffle(!self.queue.shuffle());
    }

    pub fn set_shuffle(&mut self, on: bool) {
        let playing = self.engine.current_track().map(|t| t.id);
        if self.queue.set_shuffle(on, playing) {
            debug!(shuffle = on, "shuffle changed");
            self.queue_dirty = true;
        }
    }

    pub fn toggle_repeat(&mut self) {
        self.set_repeat(self.queue.repeat().cycled());
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.queue.set_repeat(mode);
        self.queue_dirty = true;
    }

    pub fn can_play_next(&self) -> bool {
        self.queue.can_play_next()
    }

    pub fn can_play_previous(&self) -> bool {
        self.queue.can_play_previous()
    }

    pub fn next(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        if self.queue.repeat() == RepeatMode::One {
            self.engine.restart();
            return;
        }
        let wrap = self.queue.repeat() == RepeatMode::All;
        if let Some(track) = self.queue.advance(wrap).cloned() {
            self.queue_dirty = true;
            self.engine.load_track(track, true);
        }
    }

    pub fn previous(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        if self.engine.progress() > RESTART_THRESHOLD {
            self.engine.seek(Duration::ZERO);
            return;
        }
        if self.queue.repeat() == RepeatMode::One {
            self.engine.restart();
            return;
        }
        let wrap = self.queue.repeat() == RepeatMode::All;
        if let Some(track) = self.queue.retreat(wrap).cloned() {
            self.queue_dirty = true;
            self.engine.load_track(track, true);
        }
    }

    /// Like `next`, except that running off the end stops the session.
    pub fn on_track_ended(&mut self) {
        if self.queue.repeat() == RepeatMode::One {
            self.engine.restart();
            return;
        }
        let wrap = self.queue.repeat() == RepeatMode::All;
        match self.queue.advance(wrap).cloned() {
            Some(track) => {
                self.queue_dirty = true;
                self.engine.load_track(track, true);
            }
            None => {
                info!("end of queue");
                self.engine.stop();
            }
        }
    }

    /// Apply one command. Breaks on `Quit`, after shutting the engine down.
    pub fn apply(&mut self, cmd: AudioCmd) -> ControlFlow<()> {
        debug!(?cmd, "audio command");
        match cmd {
            AudioCmd::SetQueue { tracks, start } => self.set_queue(tracks, start),
            AudioCmd::AddToQueue(track) => self.add_to_queue(track),
            AudioCmd::ClearQueue => self.clear_queue(),
            AudioCmd::Play => self.engine.play(),
            AudioCmd::Pause => self.engine.pause(),
            AudioCmd::TogglePlay => self.engine.toggle_play(),
            AudioCmd::Stop => self.engine.stop(),
            AudioCmd::Next => self.next(),
            AudioCmd::Previous => self.previous(),
            AudioCmd::SeekTo(t) => self.engine.seek(t),
            AudioCmd::SeekBy(micros) => self.engine.seek_by(micros),
            AudioCmd::SeekPercent(p) => self.engine.seek_by_percent(p),
            AudioCmd::SetVolume(v) => self.engine.set_volume(v),
            AudioCmd::AdjustVolume(delta) => self.engine.adjust_volume(delta),
            AudioCmd::ToggleMute => self.engine.toggle_mute(),
            AudioCmd::ToggleShuffle => self.toggle_shuffle(),
            AudioCmd::SetShuffle(on) => self.set_shuffle(on),
            AudioCmd::ToggleRepeat => self.toggle_repeat(),
            AudioCmd::SetRepeat(mode) => self.set_repeat(mode),
            AudioCmd::Quit => {
                self.engine.shutdown();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Drain pending media events into the engine.
    pub fn pump(&mut self) {
        for event in self.engine.poll_events() {
            if self.engine.handle_event(event) == EventOutcome::TrackEnded {
                self.on_track_ended();
            }
        }
    }

    pub fn queue_snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            tracks: self.queue.active().to_vec(),
            index: self.queue.index(),
            shuffle: self.queue.shuffle(),
            repeat: self.queue.repeat(),
            can_play_next: self.can_play_next(),
            can_play_previous: self.can_play_previous(),
        }
    }

    pub fn publish(&mut self, out: &Outputs) {
        out.session.set(self.engine.snapshot());
        if self.queue_dirty {
            out.queue.set(self.queue_snapshot());
            self.queue_dirty = false;
        }
        for (kind, message) in self.engine.take_notices() {
            self.notice_seq += 1;
            out.notice.set(Some(Notice {
                seq: self.notice_seq,
                kind,
                message,
            }));
        }
    }
}
