//! MPRIS (D-Bus) remote control.
//!
//! Method calls and property writes become [`ControlCmd`]s on a channel that
//! the event loop drains. Property reads are served from a [`SharedState`]
//! that the event loop refreshes from the audio thread's snapshots.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, warn};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::audio::{PlaybackState, QueueSnapshot, RepeatMode, SessionSnapshot};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.encore";

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in microseconds.
    Seek(i64),
    SetVolume(f64),
    SetShuffle(bool),
    SetRepeat(RepeatMode),
}

#[derive(Debug, Default, Clone, PartialEq)]
struct SharedState {
    playback: PlaybackState,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
    position_micros: i64,
    volume: f64,
    shuffle: bool,
    repeat: RepeatMode,
    can_go_next: bool,
    can_go_previous: bool,
}

fn micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

impl SharedState {
    fn from_snapshots(session: &SessionSnapshot, queue: &QueueSnapshot) -> Self {
        let track = session.track.as_ref();
        Self {
            playback: session.state,
            title: track.map(|t| t.title.clone()),
            artist: track.and_then(|t| t.artist.clone()).into_iter().collect(),
            album: track.and_then(|t| t.album.clone()),
            url: track
                .and_then(|t| t.locator())
                .map(|p| format!("file://{}", p.display())),
            length_micros: (!session.duration.is_zero()).then(|| micros(session.duration)),
            track_id: track.and_then(|t| {
                OwnedObjectPath::try_from(format!("{OBJECT_PATH}/track/{}", t.id)).ok()
            }),
            position_micros: micros(session.progress),
            volume: if session.muted {
                0.0
            } else {
                f64::from(session.volume)
            },
            shuffle: queue.shuffle,
            repeat: queue.repeat,
            can_go_next: queue.can_play_next,
            can_go_previous: queue.can_play_previous,
        }
    }
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    /// Refresh the exported state. Listeners are only told about changes other
    /// than the position, which MPRIS clients poll.
    pub fn sync(&self, session: &SessionSnapshot, queue: &QueueSnapshot) {
        let next = SharedState::from_snapshots(session, queue);
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        let changed = SharedState {
            position_micros: s.position_micros,
            ..next.clone()
        } != *s;
        *s = next;
        if changed {
            let _ = self.notify.send(());
        }
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "encore"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn read<T>(&self, f: impl FnOnce(&SharedState) -> T, fallback: T) -> T {
        self.state.lock().map(|s| f(&s)).unwrap_or(fallback)
    }
}

fn owned<'a>(v: impl Into<Value<'a>>) -> Option<OwnedValue> {
    OwnedValue::try_from(v.into()).ok()
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    fn seek(&self, offset: i64) {
        let _ = self.tx.send(ControlCmd::Seek(offset));
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        match self.read(|s| s.playback, PlaybackState::Stopped) {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Playing => "Playing",
            // MPRIS has no buffering status.
            PlaybackState::Paused | PlaybackState::Buffering => "Paused",
        }
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        match self.read(|s| s.repeat, RepeatMode::Off) {
            RepeatMode::Off => "None",
            RepeatMode::One => "Track",
            RepeatMode::All => "Playlist",
        }
    }

    #[zbus(property)]
    fn set_loop_status(&mut self, status: String) {
        let mode = match status.as_str() {
            "Track" => RepeatMode::One,
            "Playlist" => RepeatMode::All,
            _ => RepeatMode::Off,
        };
        let _ = self.tx.send(ControlCmd::SetRepeat(mode));
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.read(|s| s.shuffle, false)
    }

    #[zbus(property)]
    fn set_shuffle(&mut self, on: bool) {
        let _ = self.tx.send(ControlCmd::SetShuffle(on));
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.read(|s| s.volume, 0.0)
    }

    #[zbus(property)]
    fn set_volume(&mut self, volume: f64) {
        let _ = self.tx.send(ControlCmd::SetVolume(volume));
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.read(|s| s.position_micros, 0)
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        self.read(|s| s.track_id.is_some(), false)
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        self.read(|s| s.can_go_next, false)
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        self.read(|s| s.can_go_previous, false)
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let track_id = s.track_id.clone().map(OwnedObjectPath::into_inner).unwrap_or_else(|| {
            ObjectPath::from_static_str_unchecked("/org/mpris/MediaPlayer2/TrackList/NoTrack")
        });
        map.extend(owned(track_id).map(|v| ("mpris:trackid".to_string(), v)));
        map.extend(
            owned(s.title.clone().unwrap_or_default()).map(|v| ("xesam:title".to_string(), v)),
        );
        if !s.artist.is_empty() {
            map.extend(owned(s.artist.clone()).map(|v| ("xesam:artist".to_string(), v)));
        }
        if let Some(album) = s.album.clone() {
            map.extend(owned(album).map(|v| ("xesam:album".to_string(), v)));
        }
        if let Some(url) = s.url.clone() {
            map.extend(owned(url).map(|v| ("xesam:url".to_string(), v)));
        }
        if let Some(len) = s.length_micros {
            map.extend(owned(len).map(|v| ("mpris:length".to_string(), v)));
        }
        map
    }
}

/// Serve MPRIS on the session bus from a background thread. Failing to reach
/// the bus is logged and otherwise ignored.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            if let Err(e) = serve(tx, state_for_thread, notify_rx).await {
                warn!("MPRIS unavailable: {e}");
            }
        });
    });

    MprisHandle { state, notify }
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify_rx: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    debug!("MPRIS registered as {BUS_NAME}");

    let player = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;

    loop {
        let mut dirty = false;
        loop {
            match notify_rx.try_recv() {
                Ok(()) => dirty = true,
                Err(TryRecvError::Empty) => break,
                // The app is gone.
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        if dirty {
            let emitter = player.signal_emitter();
            let iface = player.get().await;
            iface.playback_status_changed(emitter).await?;
            iface.metadata_changed(emitter).await?;
            iface.loop_status_changed(emitter).await?;
            iface.shuffle_changed(emitter).await?;
            iface.volume_changed(emitter).await?;
            iface.can_go_next_changed(emitter).await?;
            iface.can_go_previous_changed(emitter).await?;
            iface.can_seek_changed(emitter).await?;
        }

        Timer::after(Duration::from_millis(250)).await;
    }
}
