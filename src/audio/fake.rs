//! In-memory [`MediaResource`] for driving the engine deterministically.
//!
//! Records every request and only emits the events a test injects, so each
//! step of an asynchronous exchange can be played out explicitly.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::media::{MediaError, MediaEvent, MediaEventKind, MediaResource, SourceId};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(PathBuf),
    Release(SourceId),
    Play,
    Pause,
    SetPosition(Duration),
    SetVolume(f32),
    SetMuted(bool),
    Detach,
}

#[derive(Default)]
pub struct FakeMedia {
    pub calls: Vec<Call>,
    pub current: Option<SourceId>,
    /// Locators whose `load` fails.
    pub broken: HashSet<PathBuf>,
    next_id: u64,
    events: Vec<MediaEvent>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the currently loaded source.
    pub fn emit(&mut self, kind: MediaEventKind) {
        if let Some(id) = self.current {
            self.events.push(MediaEvent::new(id, kind));
        }
    }

    /// Queue an event for an arbitrary source.
    pub fn emit_for(&mut self, id: SourceId, kind: MediaEventKind) {
        self.events.push(MediaEvent::new(id, kind));
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn loads(&self) -> Vec<PathBuf> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Load(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }
}

impl MediaResource for FakeMedia {
    fn load(&mut self, locator: &Path) -> Result<SourceId, MediaError> {
        self.calls.push(Call::Load(locator.to_path_buf()));
        if self.broken.contains(locator) {
            return Err(MediaError::Decode {
                path: locator.to_path_buf(),
                reason: "unsupported format".into(),
            });
        }
        self.next_id += 1;
        let id = SourceId(self.next_id);
        self.current = Some(id);
        Ok(id)
    }

    fn release(&mut self, id: SourceId) {
        self.calls.push(Call::Release(id));
        if self.current == Some(id) {
            self.current = None;
        }
    }

    fn play(&mut self) {
        self.calls.push(Call::Play);
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
    }

    fn set_position(&mut self, position: Duration) {
        self.calls.push(Call::SetPosition(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.calls.push(Call::SetVolume(volume));
    }

    fn set_muted(&mut self, muted: bool) {
        self.calls.push(Call::SetMuted(muted));
    }

    fn detach(&mut self) {
        self.calls.push(Call::Detach);
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        std::mem::take(&mut self.events)
    }
}
