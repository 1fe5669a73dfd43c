use crate::audio::{AudioCmd, AudioPlayer, RepeatMode};
use crate::config;

/// Configured startup state for the audio thread, in the order it is sent.
pub fn playback_defaults(settings: &config::Settings) -> Vec<AudioCmd> {
    vec![
        AudioCmd::SetVolume(settings.audio.default_volume),
        AudioCmd::SetShuffle(settings.playback.shuffle),
        AudioCmd::SetRepeat(RepeatMode::from(settings.playback.repeat)),
    ]
}

pub fn apply_playback_defaults(audio_player: &AudioPlayer, settings: &config::Settings) {
    for cmd in playback_defaults(settings) {
        let _ = audio_player.send(cmd);
    }
}
