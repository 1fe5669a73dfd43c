//! Playback: the engine state machine, the queue and the thread that owns them.

mod engine;
mod media;
mod player;
mod progress;
mod queue;
mod sink;
mod thread;
mod transport;
mod types;

#[cfg(test)]
mod fake;
#[cfg(test)]
mod tests;

pub use player::AudioPlayer;
pub use progress::{format_clock, remaining};
pub use types::{
    AudioCmd, Notice, NoticeKind, PlaybackState, QueueSnapshot, RepeatMode, SessionSnapshot,
};
