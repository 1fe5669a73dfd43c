use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, View};
use crate::audio::{AudioCmd, AudioPlayer};
use crate::config;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::runtime::mpris_sync::update_mpris;
use crate::ui;

const MICROS_PER_SEC: i64 = 1_000_000;

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Two-key prefixes: `gg` jumps to the top, `zz` back to the playing track.
    pending_gg: bool,
    pending_zz: bool,
}

impl EventLoopState {
    fn clear_prefixes(&mut self) {
        self.pending_gg = false;
        self.pending_zz = false;
    }
}

/// Main terminal event loop: handles input, UI drawing and the MPRIS bridge.
/// Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    let notice_ttl = Duration::from_secs(settings.ui.notice_seconds);
    let session_changes = audio_player.session().subscribe();
    let queue_changes = audio_player.queue().subscribe();
    update_mpris(mpris, app);

    loop {
        // Only touch MPRIS when the audio thread published something new.
        let session_changed = session_changes.try_iter().count() > 0;
        let queue_changed = queue_changes.try_iter().count() > 0;
        if session_changed || queue_changed {
            update_mpris(mpris, app);
        }
        app.follow();

        let session = app.session();
        let queue = app.queue();
        let notice = app.visible_notice(notice_ttl);
        let playback = ui::PlaybackView {
            session: &session,
            queue: &queue,
            notice: notice.as_ref(),
        };
        terminal.draw(|f| ui::draw(f, app, &playback, &settings.ui, &settings.controls))?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, app, audio_player) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, audio_player, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Translate a desktop control request into the audio command it stands for.
/// `Play` with nothing loaded starts the library selection instead.
fn control_to_audio(cmd: ControlCmd, app: &App) -> Option<AudioCmd> {
    let cmd = match cmd {
        ControlCmd::Quit => return None,
        ControlCmd::Play => {
            if app.session().track.is_none() {
                return play_from_selection(app);
            }
            AudioCmd::Play
        }
        ControlCmd::Pause => AudioCmd::Pause,
        ControlCmd::PlayPause => AudioCmd::TogglePlay,
        ControlCmd::Stop => AudioCmd::Stop,
        ControlCmd::Next => AudioCmd::Next,
        ControlCmd::Prev => AudioCmd::Previous,
        ControlCmd::Seek(micros) => AudioCmd::SeekBy(micros),
        ControlCmd::SetVolume(v) => AudioCmd::SetVolume(v as f32),
        ControlCmd::SetShuffle(on) => AudioCmd::SetShuffle(on),
        ControlCmd::SetRepeat(mode) => AudioCmd::SetRepeat(mode),
    };
    Some(cmd)
}

fn play_from_selection(app: &App) -> Option<AudioCmd> {
    if !app.has_tracks() {
        return None;
    }
    app.queue_from_selection()
        .map(|(tracks, start)| AudioCmd::SetQueue { tracks, start })
}

fn play_from_cursor(app: &App) -> Option<AudioCmd> {
    let (tracks, start) = match app.view {
        View::Library => app.queue_from_selection()?,
        View::Queue => app.queue_from_queue_cursor()?,
    };
    Some(AudioCmd::SetQueue { tracks, start })
}

/// Returns true once the app should exit.
fn handle_control_cmd(cmd: ControlCmd, app: &mut App, audio_player: &AudioPlayer) -> bool {
    if cmd == ControlCmd::Quit {
        audio_player.quit();
        return true;
    }
    if !app.filter_mode {
        app.follow_playback_on();
    }
    if let Some(audio_cmd) = control_to_audio(cmd, app) {
        let _ = audio_player.send(audio_cmd);
    }
    false
}

fn handle_filter_key(key: KeyEvent, app: &mut App, audio_player: &AudioPlayer) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.clear_filter(),
        KeyCode::Backspace => app.pop_filter_char(),
        KeyCode::Char('j') | KeyCode::Char('n') if ctrl => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Char('p') if ctrl => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Char(c) => {
            if !c.is_control() {
                app.push_filter_char(c);
            }
        }
        KeyCode::Enter => {
            let Some(cmd) = play_from_selection(app) else {
                return;
            };
            app.exit_filter_mode();
            app.follow_playback_on();
            let _ = audio_player.send(cmd);
        }
        _ => {}
    }
}

/// Returns true once the app should exit.
fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
    state: &mut EventLoopState,
) -> bool {
    if app.filter_mode {
        state.clear_prefixes();
        handle_filter_key(key, app, audio_player);
        return false;
    }

    match key.code {
        KeyCode::Char('g') => {
            state.pending_zz = false;
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.first();
            } else {
                state.pending_gg = true;
            }
            return false;
        }
        KeyCode::Char('z') => {
            state.pending_gg = false;
            if state.pending_zz {
                state.pending_zz = false;
                app.follow_playback_on();
                app.follow();
            } else {
                state.pending_zz = true;
            }
            return false;
        }
        _ => state.clear_prefixes(),
    }

    let volume_step = settings.audio.volume_step;
    let scrub = i64::try_from(settings.controls.scrub_seconds)
        .unwrap_or(i64::MAX)
        .saturating_mul(MICROS_PER_SEC);

    let cmd = match key.code {
        KeyCode::Char('q') => {
            audio_player.quit();
            return true;
        }
        KeyCode::Char('/') => {
            app.enter_filter_mode();
            None
        }
        KeyCode::Tab => {
            app.toggle_view();
            None
        }
        KeyCode::Char('K') => {
            app.toggle_metadata_window();
            None
        }
        KeyCode::Char('j') => {
            app.follow_playback_off();
            app.next();
            None
        }
        KeyCode::Char('k') => {
            app.follow_playback_off();
            app.prev();
            None
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.last();
            None
        }
        KeyCode::Enter => {
            app.follow_playback_on();
            play_from_cursor(app)
        }
        KeyCode::Char('a') => app.focused_track().map(AudioCmd::AddToQueue),
        KeyCode::Char('c') => Some(AudioCmd::ClearQueue),
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            app.follow_playback_on();
            Some(AudioCmd::TogglePlay)
        }
        KeyCode::Char('x') => Some(AudioCmd::Stop),
        KeyCode::Char('l') => {
            app.follow_playback_on();
            Some(AudioCmd::Next)
        }
        KeyCode::Char('h') => {
            app.follow_playback_on();
            Some(AudioCmd::Previous)
        }
        KeyCode::Char('L') => Some(AudioCmd::SeekBy(scrub)),
        KeyCode::Char('H') => Some(AudioCmd::SeekBy(-scrub)),
        KeyCode::Char(c @ '0'..='9') => {
            let tenths = c.to_digit(10).unwrap_or(0);
            Some(AudioCmd::SeekPercent(f64::from(tenths) * 10.0))
        }
        KeyCode::Char('+') | KeyCode::Char('=') => Some(AudioCmd::AdjustVolume(volume_step)),
        KeyCode::Char('-') => Some(AudioCmd::AdjustVolume(-volume_step)),
        KeyCode::Char('m') => Some(AudioCmd::ToggleMute),
        KeyCode::Char('s') => Some(AudioCmd::ToggleShuffle),
        KeyCode::Char('r') => Some(AudioCmd::ToggleRepeat),
        _ => None,
    };

    if let Some(cmd) = cmd {
        let _ = audio_player.send(cmd);
    }
    false
}
