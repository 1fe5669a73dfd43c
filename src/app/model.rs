//! Application model types: `App` and `View`.
//!
//! The `App` struct holds the library, the cursor, filter state and the
//! read-only views of what the audio thread publishes.

use std::time::{Duration, Instant};

use crate::audio::{Notice, QueueSnapshot, SessionSnapshot};
use crate::library::Track;
use crate::observe::Watch;

/// Which list the main pane shows.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Library,
    Queue,
}

/// The main application model.
pub struct App {
    pub tracks: Vec<Track>,
    pub selected: usize,
    /// Cursor into the active queue order.
    pub queue_selected: usize,
    pub view: View,

    lower_titles: Option<Vec<String>>,

    pub follow_playback: bool,
    pub filter_mode: bool,
    pub filter_query: String,
    pub current_dir: Option<String>,
    pub metadata_window: bool,

    session: Option<Watch<SessionSnapshot>>,
    queue: Option<Watch<QueueSnapshot>>,
    notice: Option<Watch<Option<Notice>>>,
    /// Sequence number of the last notice and when it first showed up.
    notice_seen: Option<(u64, Instant)>,
}

impl App {
    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    /// Create a new `App` with the provided list of `tracks`.
    pub fn new(tracks: Vec<Track>) -> Self {
        // Optimization: for larger libraries, precompute lowercase titles to speed up fuzzy
        // filtering (avoid per-char lowercase conversions on every redraw/keystroke).
        let lower_titles = if tracks.len() > 100 {
            Some(
                tracks
                    .iter()
                    .map(|t| t.display.to_ascii_lowercase())
                    .collect(),
            )
        } else {
            None
        };

        Self {
            tracks,
            selected: 0,
            queue_selected: 0,
            view: View::Library,

            lower_titles,

            follow_playback: true,
            filter_mode: false,
            filter_query: String::new(),
            current_dir: None,
            metadata_window: false,

            session: None,
            queue: None,
            notice: None,
            notice_seen: None,
        }
    }

    /// Attach the audio thread's published state.
    pub fn attach(
        &mut self,
        session: Watch<SessionSnapshot>,
        queue: Watch<QueueSnapshot>,
        notice: Watch<Option<Notice>>,
    ) {
        self.session = Some(session);
        self.queue = Some(queue);
        self.notice = Some(notice);
    }

    pub fn session(&self) -> SessionSnapshot {
        self.session
            .as_ref()
            .and_then(Watch::get)
            .unwrap_or_default()
    }

    pub fn queue(&self) -> QueueSnapshot {
        self.queue.as_ref().and_then(Watch::get).unwrap_or_default()
    }

    /// The latest failure notice, for `ttl` after it was first seen.
    pub fn visible_notice(&mut self, ttl: Duration) -> Option<Notice> {
        let notice = self.notice.as_ref().and_then(Watch::get).flatten()?;
        let now = Instant::now();
        let first_seen = match self.notice_seen {
            Some((seq, at)) if seq == notice.seq => at,
            _ => {
                self.notice_seen = Some((notice.seq, now));
                now
            }
        };
        (now.duration_since(first_seen) < ttl).then_some(notice)
    }

    /// Enable following playback (cursor follows currently playing track).
    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }
    /// Disable follow-playback.
    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }
    /// Record the current directory in the app state.
    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            View::Library => View::Queue,
            View::Queue => View::Library,
        };
    }

    /// Move the cursors onto the playing track, if following playback.
    pub fn follow(&mut self) {
        if !self.follow_playback || self.filter_mode {
            return;
        }
        let queue = self.queue();
        if !queue.tracks.is_empty() {
            self.queue_selected = queue.index.min(queue.tracks.len() - 1);
        }
        let Some(playing) = self.session().track else {
            return;
        };
        if let Some(idx) = self.tracks.iter().position(|t| t.id == playing.id) {
            if self.selected != idx {
                self.set_selected(idx);
            }
        }
    }

    /// Return the display order of library indices, taking active filtering
    /// into account.
    pub fn display_indices(&self) -> Vec<usize> {
        let base = 0..self.tracks.len();

        // Apply filtering (retain only indices that match filter)
        let query = self.filter_query.trim();
        if query.is_empty() {
            base.collect()
        } else {
            match self.lower_titles.as_deref() {
                Some(lower_titles) => {
                    let query_lower = query.to_ascii_lowercase();
                    base.filter(|&i| {
                        Self::fuzzy_match_positions_lower(&lower_titles[i], &query_lower).is_some()
                    })
                    .collect()
                }
                None => base
                    .filter(|&i| {
                        Self::fuzzy_match_positions(&self.tracks[i].display, query).is_some()
                    })
                    .collect(),
            }
        }
    }

    /// The visible tracks as a new queue, starting at the cursor.
    pub fn queue_from_selection(&self) -> Option<(Vec<Track>, usize)> {
        let display = self.display_indices();
        let start = display.iter().position(|&i| i == self.selected)?;
        let tracks = display.iter().map(|&i| self.tracks[i].clone()).collect();
        Some((tracks, start))
    }

    /// The active queue, restarted at the queue cursor.
    pub fn queue_from_queue_cursor(&self) -> Option<(Vec<Track>, usize)> {
        let queue = self.queue();
        if queue.tracks.is_empty() {
            return None;
        }
        let start = self.queue_selected.min(queue.tracks.len() - 1);
        Some((queue.tracks, start))
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected)
    }

    /// The track under the cursor of the current view.
    pub fn focused_track(&self) -> Option<Track> {
        match self.view {
            View::Library => self.selected_track().cloned(),
            View::Queue => self.queue().tracks.get(self.queue_selected).cloned(),
        }
    }

    /// Return true if this `App` uses precomputed lowercase titles.
    pub fn uses_lower_titles(&self) -> bool {
        self.lower_titles.is_some()
    }

    /// Fuzzy-match `query_lower` against a specific track by index.
    ///
    /// Returns the character positions that match, or `None` when there is no match.
    pub fn fuzzy_match_positions_for_track_lower(
        &self,
        track_index: usize,
        query_lower: &str,
    ) -> Option<Vec<usize>> {
        if query_lower.is_empty() {
            return Some(Vec::new());
        }

        match self.lower_titles.as_deref() {
            Some(lower_titles) => {
                Self::fuzzy_match_positions_lower(&lower_titles[track_index], query_lower)
            }
            None => Self::fuzzy_match_positions(&self.tracks[track_index].display, query_lower),
        }
    }

    /// Return the next visible index in the current display order after `current`.
    /// Wraps around to the first element.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Return the previous visible index in the current display order before `current`.
    /// Wraps around to the last element.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(0) => Some(display[display.len() - 1]),
            Some(p) => Some(display[p - 1]),
            None => Some(display[display.len() - 1]),
        }
    }

    /// Set the selected track index and ensure it is visible in the display.
    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.ensure_selected_visible();
    }
    /// Return true if the library contains any tracks.
    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Fuzzy/subsequence match: return the character positions in `title`
    /// that match `query`, or `None` if not matched.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        if query.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title.chars().enumerate();

        for qc in query.chars() {
            let qc_low = qc.to_ascii_lowercase();
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc.to_ascii_lowercase() == qc_low => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    fn fuzzy_match_positions_lower(title_lower: &str, query_lower: &str) -> Option<Vec<usize>> {
        if query_lower.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title_lower.chars().enumerate();

        for qc in query_lower.chars() {
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc == qc => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    /// Enter filter mode. The filter applies to the library view.
    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.view = View::Library;
        self.follow_playback_off();
        self.ensure_selected_visible();
    }
    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }
    /// Clear the active filter and restore selection visibility.
    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }
    /// Append a character to the filter query and refresh view.
    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }
    /// Remove the last character from the filter query and refresh view.
    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Ensure that `selected` is part of the current filtered view,
    /// otherwise move selection to the first visible track.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            self.selected = 0;
            return;
        }

        if !display.contains(&self.selected) {
            self.selected = display[0];
        }
    }

    /// Move the cursor of the current view down.
    pub fn next(&mut self) {
        match self.view {
            View::Library => {
                if let Some(next) = self.next_in_view_from(self.selected) {
                    self.selected = next;
                }
            }
            View::Queue => {
                let len = self.queue().tracks.len();
                if len > 0 {
                    self.queue_selected = (self.queue_selected + 1) % len;
                }
            }
        }
    }

    /// Move the cursor of the current view up.
    pub fn prev(&mut self) {
        match self.view {
            View::Library => {
                if let Some(prev) = self.prev_in_view_from(self.selected) {
                    self.selected = prev;
                }
            }
            View::Queue => {
                let len = self.queue().tracks.len();
                if len > 0 {
                    self.queue_selected = (self.queue_selected + len - 1) % len;
                }
            }
        }
    }

    /// Jump to the top of the current view.
    pub fn first(&mut self) {
        match self.view {
            View::Library => {
                if let Some(&first) = self.display_indices().first() {
                    self.set_selected(first);
                }
            }
            View::Queue => self.queue_selected = 0,
        }
    }

    /// Jump to the bottom of the current view.
    pub fn last(&mut self) {
        match self.view {
            View::Library => {
                if let Some(&last) = self.display_indices().last() {
                    self.set_selected(last);
                }
            }
            View::Queue => self.queue_selected = self.queue().tracks.len().saturating_sub(1),
        }
    }
}
