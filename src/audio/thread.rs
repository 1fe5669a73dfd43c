use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info};

use crate::config::AudioSettings;

use super::media::MediaResource;
use super::sink::RodioMedia;
use super::transport::{Outputs, Transport};
use super::types::AudioCmd;

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    outputs: Outputs,
    audio_settings: AudioSettings,
) -> io::Result<JoinHandle<()>> {
    let tick = Duration::from_millis(audio_settings.tick_ms.max(10));
    thread::Builder::new()
        .name("encore-audio".into())
        .spawn(move || {
            // The output stream is not `Send`; it has to be opened on this thread.
            let transport = Transport::new(RodioMedia::open());
            run(transport, &rx, &outputs, tick);
        })
}

/// The audio thread's loop: commands first, then media events, then publish.
///
/// Everything that touches the session goes through here, so user commands
/// and media events are applied one at a time in arrival order.
pub(super) fn run<M: MediaResource>(
    mut transport: Transport<M>,
    rx: &Receiver<AudioCmd>,
    outputs: &Outputs,
    tick: Duration,
) {
    transport.publish(outputs);
    loop {
        match rx.recv_timeout(tick) {
            Ok(cmd) => {
                if transport.apply(cmd).is_break() {
                    transport.publish(outputs);
                    info!("audio thread quitting");
                    return;
                }
                // Take whatever else is already queued before looking at the media.
                while let Ok(cmd) = rx.try_recv() {
                    if transport.apply(cmd).is_break() {
                        transport.publish(outputs);
                        info!("audio thread quitting");
                        return;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("command channel closed");
                transport.engine_mut().shutdown();
                transport.publish(outputs);
                return;
            }
        }
        transport.pump();
        transport.publish(outputs);
    }
}
