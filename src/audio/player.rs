use std::io;
use std::sync::Mutex;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use crate::config::AudioSettings;
use crate::observe::Watch;

use super::thread::spawn_audio_thread;
use super::transport::Outputs;
use super::types::{AudioCmd, Notice, QueueSnapshot, SessionSnapshot};

/// Handle to the audio thread: a command sender plus read-only views of what
/// the thread publishes.
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    session: Watch<SessionSnapshot>,
    queue: Watch<QueueSnapshot>,
    notice: Watch<Option<Notice>>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    pub fn new(audio_settings: AudioSettings) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let outputs = Outputs::default();
        let (session, queue, notice) = outputs.watches();

        let audio_handle = spawn_audio_thread(rx, outputs, audio_settings)?;

        Ok(Self {
            tx,
            session,
            queue,
            notice,
            join: Mutex::new(Some(audio_handle)),
        })
    }

    pub fn session(&self) -> Watch<SessionSnapshot> {
        self.session.clone()
    }

    pub fn queue(&self) -> Watch<QueueSnapshot> {
        self.queue.clone()
    }

    pub fn notice(&self) -> Watch<Option<Notice>> {
        self.notice.clone()
    }

    pub fn sender(&self) -> Sender<AudioCmd> {
        self.tx.clone()
    }

    pub fn send(&self, cmd: AudioCmd) -> Result<(), mpsc::SendError<AudioCmd>> {
        self.tx.send(cmd)
    }

    /// Ask the audio thread to shut the engine down and wait for it.
    pub fn quit(&self) {
        let _ = self.send(AudioCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}
