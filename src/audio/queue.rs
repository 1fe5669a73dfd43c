//! The play queue: original order, active (possibly shuffled) order and the
//! cursor into the active order.
//!
//! This type only does bookkeeping. Deciding what to load and when is the
//! transport's job.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::library::{Track, TrackId};

use super::types::RepeatMode;

pub struct Queue {
    original: Vec<Track>,
    active: Vec<Track>,
    index: usize,
    shuffle: bool,
    repeat: RepeatMode,
    rng: StdRng,
}

impl Default for Queue {
    fn default() -> Self {
        Self::with_seed(rand::random())
    }
}

impl Queue {
    /// A queue with a deterministic shuffle sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            original: Vec::new(),
            active: Vec::new(),
            index: 0,
            shuffle: false,
            repeat: RepeatMode::Off,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn active(&self) -> &[Track] {
        &self.active
    }

    pub fn original(&self) -> &[Track] {
        &self.original
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn set_repeat(&mut self, repeat: RepeatMode) {
        self.repeat = repeat;
    }

    pub fn current(&self) -> Option<&Track> {
        self.active.get(self.index)
    }

    /// Replace the queue. An out-of-range `start` is treated as `0`.
    pub fn replace(&mut self, tracks: Vec<Track>, start: usize) {
        let start = if start < tracks.len() { start } else { 0 };
        self.original = tracks.clone();
        self.active = tracks;
        self.index = start;
        if self.shuffle {
            let anchor = self.active.get(start).map(|t| t.id);
            self.permute_keeping(anchor);
        }
    }

    pub fn push(&mut self, track: Track) {
        self.original.push(track.clone());
        self.active.push(track);
    }

    pub fn clear(&mut self) {
        self.original.clear();
        self.active.clear();
        self.index = 0;
    }

    /// Turn shuffle on or off around the `playing` track. Returns `false`
    /// when nothing changed.
    ///
    /// Enabling moves `playing` to the front of the new order; disabling puts
    /// the cursor back on it. Without a playing track the cursor goes to 0.
    pub fn set_shuffle(&mut self, on: bool, playing: Option<TrackId>) -> bool {
        if self.shuffle == on {
            return false;
        }
        self.shuffle = on;
        if on {
            self.original = self.active.clone();
            self.permute_keeping(playing);
        } else {
            self.active = self.original.clone();
            self.index = self.position_of(playing).unwrap_or(0);
        }
        true
    }

    fn position_of(&self, id: Option<TrackId>) -> Option<usize> {
        let id = id?;
        self.active.iter().position(|t| t.id == id)
    }

    // Fisher-Yates over the whole order, then move `anchor` to the front.
    fn permute_keeping(&mut self, anchor: Option<TrackId>) {
        self.index = 0;
        if self.active.is_empty() {
            return;
        }
        self.active.shuffle(&mut self.rng);
        if let Some(pos) = self.position_of(anchor) {
            self.active.swap(0, pos);
        }
    }

    pub fn has_next(&self) -> bool {
        !self.active.is_empty() && self.index + 1 < self.active.len()
    }

    pub fn has_previous(&self) -> bool {
        !self.active.is_empty() && self.index > 0
    }

    pub fn can_play_next(&self) -> bool {
        match self.repeat {
            RepeatMode::All | RepeatMode::One => true,
            RepeatMode::Off => self.has_next(),
        }
    }

    pub fn can_play_previous(&self) -> bool {
        match self.repeat {
            RepeatMode::All | RepeatMode::One => true,
            RepeatMode::Off => self.has_previous(),
        }
    }

    /// Move the cursor forward, wrapping when `wrap` is set.
    pub fn advance(&mut self, wrap: bool) -> Option<&Track> {
        if self.active.is_empty() {
            return None;
        }
        if self.has_next() {
            self.index += 1;
        } else if wrap {
            self.index = 0;
        } else {
            return None;
        }
        self.active.get(self.index)
    }

    /// Move the cursor back, wrapping when `wrap` is set.
    pub fn retreat(&mut self, wrap: bool) -> Option<&Track> {
        if self.active.is_empty() {
            return None;
        }
        if self.has_previous() {
            self.index -= 1;
        } else if wrap {
            self.index = self.active.len() - 1;
        } else {
            return None;
        }
        self.active.get(self.index)
    }
}
