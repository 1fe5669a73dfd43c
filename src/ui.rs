//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, View};
use crate::audio::{
    Notice, NoticeKind, PlaybackState, QueueSnapshot, RepeatMode, SessionSnapshot, format_clock,
    remaining,
};
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::library::{DisplayParts, Track, compose};

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("gg/G", "top/bottom");
    map.insert("enter", "play from here");
    map.insert("a", "add to queue");
    map.insert("c", "clear queue");
    map.insert("space/p", "play/pause");
    map.insert("x", "stop");
    map.insert("h/l", "prev/next");
    // H/L is filled dynamically from config.
    map.insert("0-9", "seek 0-90%");
    map.insert("+/-", "volume");
    map.insert("m", "mute");
    map.insert("s", "shuffle");
    map.insert("r", "repeat");
    map.insert("tab", "library/queue");
    map.insert("/", "filter");
    map.insert("K", "metadata");
    map.insert("q", "quit");
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "h/l", "H/L", "enter", "a", "c", "space/p", "x", "0-9", "+/-", "m", "s", "r",
        "tab", "gg/G", "K", "/", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Build the "now playing" track text according to `ui` settings.
fn now_playing_track_text(track: &Track, ui: &UiSettings) -> String {
    compose(
        &DisplayParts::of(track),
        &ui.now_playing_track_fields,
        &ui.now_playing_track_separator,
    )
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(elapsed: Duration, total: Duration, ui: &UiSettings) -> Option<String> {
    let known = !total.is_zero();
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_clock(elapsed)),
            TimeField::Total => known.then(|| format_clock(total)),
            TimeField::Remaining => {
                known.then(|| format!("-{}", format_clock(remaining(elapsed, total))))
            }
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

fn state_label(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Stopped => "Stopped",
        PlaybackState::Buffering => "Buffering",
        PlaybackState::Playing => "Playing",
        PlaybackState::Paused => "Paused",
    }
}

fn repeat_label(repeat: RepeatMode) -> &'static str {
    match repeat {
        RepeatMode::Off => "REPEAT: Off",
        RepeatMode::All => "REPEAT: All",
        RepeatMode::One => "REPEAT: One",
    }
}

fn volume_label(session: &SessionSnapshot) -> String {
    if session.muted {
        "Vol: muted".to_string()
    } else {
        format!("Vol: {:.0}%", session.volume * 100.0)
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format a duration, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Duration) -> String {
    if d.is_zero() {
        return "-".to_string();
    }

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02} ({}s)", minutes, seconds, total_secs)
}

/// Upper-case the fuzzy-matched characters of `title`.
fn highlight_matches(title: &str, positions: Vec<usize>) -> String {
    let mut rendered = String::new();
    let mut pos_iter = positions.into_iter();
    let mut next_pos = pos_iter.next();

    for (ci, ch) in title.chars().enumerate() {
        if next_pos == Some(ci) {
            rendered.extend(ch.to_uppercase());
            next_pos = pos_iter.next();
        } else {
            rendered.push(ch);
        }
    }
    rendered
}

/// Center the selected row when possible. Returns `(start, end, selected_in_window)`.
fn visible_window(total: usize, height: usize, sel_pos: usize) -> (usize, usize, usize) {
    if total <= height || height == 0 {
        return (0, total, sel_pos);
    }
    let half = height / 2;
    let mut start = sel_pos.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height, sel_pos - start)
}

/// Everything the frame shows that comes from the audio thread.
pub struct PlaybackView<'a> {
    pub session: &'a SessionSnapshot,
    pub queue: &'a QueueSnapshot,
    pub notice: Option<&'a Notice>,
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    playback: &PlaybackView<'_>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" encore ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    draw_status(frame, chunks[1], app, playback.queue);

    match app.view {
        View::Library => draw_library(frame, chunks[2], app, playback.session),
        View::Queue => draw_queue(frame, chunks[2], app, playback.queue),
    }

    // Overlay metadata popup (keeps list visible under it)
    if app.metadata_window {
        draw_metadata(frame, chunks[2], app.focused_track().as_ref());
    }

    draw_player_bar(frame, chunks[3], playback, ui_settings);

    let footer_text = controls_text(controls_settings.scrub_seconds);
    let footer = Paragraph::new(footer_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[4]);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App, queue: &QueueSnapshot) {
    let mut parts: Vec<String> = Vec::new();

    if app.follow_playback {
        parts.push(" CURSOR: Follow".to_string());
    } else {
        parts.push(" CURSOR: Free-roam".to_string());
    }
    parts.push(repeat_label(queue.repeat).to_string());
    parts.push(if queue.shuffle { "Shuffle: ON" } else { "Shuffle: OFF" }.to_string());
    parts.push(format!("Queue: {}", queue.tracks.len()));

    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        let mut filter_part = String::from("FILTER:");
        if !q.is_empty() {
            filter_part.push(' ');
            filter_part.push_str(q);
        }
        parts.push(filter_part);
    }

    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {}", dir));
    }

    let status = Paragraph::new(parts.join(" • "))
        .block(Block::bordered().title(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, area);
}

fn draw_library(frame: &mut Frame, area: Rect, app: &App, session: &SessionSnapshot) {
    let display = app.display_indices();
    let q = app.filter_query.trim();
    let query_lower = if !q.is_empty() && app.uses_lower_titles() {
        Some(q.to_ascii_lowercase())
    } else {
        None
    };
    let playing = session.track.as_ref().map(|t| t.id);

    // Important: only build ListItems for the visible window (avoid allocating the entire list).
    let total = display.len();
    let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
    let (start, end, selected_in_window) = visible_window(total, area.height as usize, sel_pos);

    let items: Vec<ListItem> = display[start..end]
        .iter()
        .map(|&i| {
            let track = &app.tracks[i];
            let title = &track.display;
            let text = if q.is_empty() {
                title.clone()
            } else {
                let positions = match query_lower.as_deref() {
                    Some(ql) => app.fuzzy_match_positions_for_track_lower(i, ql),
                    None => App::fuzzy_match_positions(title, q),
                };
                positions
                    .map(|p| highlight_matches(title, p))
                    .unwrap_or_else(|| title.clone())
            };
            let item = ListItem::new(text);
            if playing == Some(track.id) {
                item.bold()
            } else {
                item
            }
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" library "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if total > 0 {
        state.select(Some(selected_in_window));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_queue(frame: &mut Frame, area: Rect, app: &App, queue: &QueueSnapshot) {
    let total = queue.tracks.len();
    let sel_pos = app.queue_selected.min(total.saturating_sub(1));
    let (start, end, selected_in_window) = visible_window(total, area.height as usize, sel_pos);

    let items: Vec<ListItem> = queue.tracks[start..end]
        .iter()
        .enumerate()
        .map(|(offset, track)| {
            let pos = start + offset;
            let marker = if pos == queue.index { "♪ " } else { "  " };
            let item = ListItem::new(format!("{marker}{:>3}. {}", pos + 1, track.display));
            if pos == queue.index {
                item.bold()
            } else {
                item
            }
        })
        .collect();

    let title = if queue.shuffle {
        " queue (shuffled) "
    } else {
        " queue "
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if total > 0 {
        state.select(Some(selected_in_window));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_metadata(frame: &mut Frame, list_area: Rect, track: Option<&Track>) {
    // Keep the popup inside the list area so it doesn't cover header/status/footer.
    let popup_area = centered_rect_sized(72, 9, list_area);
    frame.render_widget(Clear, popup_area);

    let meta = if let Some(track) = track {
        format!(
            "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nPath: {}",
            track.title,
            track.artist.as_deref().unwrap_or("-"),
            track.album.as_deref().unwrap_or("-"),
            format_duration_mmss_ceil(track.duration),
            track
                .locator()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string()),
        )
    } else {
        "No track selected".to_string()
    };
    let meta_paragraph = Paragraph::new(meta)
        .block(
            Block::default()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .borders(Borders::ALL)
                .title(" metadata (K closes) "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(meta_paragraph, popup_area);
}

/// The line above the progress gauge: track, state, volume, or the latest notice.
fn notice_label(kind: NoticeKind) -> &'static str {
    match kind {
        NoticeKind::LoadFailed => "Cannot play",
        NoticeKind::PlayRejected => "Blocked",
        NoticeKind::PlaybackError => "Playback error",
    }
}

fn player_line(playback: &PlaybackView<'_>, ui: &UiSettings) -> String {
    if let Some(notice) = playback.notice {
        return format!("! {}: {}", notice_label(notice.kind), notice.message);
    }
    let session = playback.session;
    let song = session
        .track
        .as_ref()
        .map(|t| now_playing_track_text(t, ui))
        .unwrap_or_else(|| "Nothing playing".to_string());
    format!(
        "{} • {} • {}",
        song,
        state_label(session.state),
        volume_label(session)
    )
}

fn draw_player_bar(
    frame: &mut Frame,
    area: Rect,
    playback: &PlaybackView<'_>,
    ui: &UiSettings,
) {
    let block = Block::bordered()
        .padding(Padding {
            left: 1,
            right: 1,
            top: 0,
            bottom: 0,
        })
        .title(" now playing ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let line = Paragraph::new(player_line(playback, ui));
    let line = if playback.notice.is_some() {
        line.fg(Color::Red)
    } else {
        line
    };
    frame.render_widget(line, rows[0]);

    let session = playback.session;
    let label = now_playing_time_text(session.progress, session.duration, ui).unwrap_or_default();
    let ratio = (session.progress_percent / 100.0).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, rows[1]);
}
