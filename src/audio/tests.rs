use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use super::fake::{Call, FakeMedia};
use super::media::{MediaEventKind, SourceId};
use super::queue::Queue;
use super::thread::run;
use super::transport::{Outputs, Transport};
use super::types::{AudioCmd, NoticeKind, PlaybackState, RepeatMode};
use super::engine::{Engine, LoadOutcome};
use crate::library::{Track, TrackId};

fn track(id: u64) -> Track {
    Track {
        id: TrackId(id),
        locator: Some(PathBuf::from(format!("/music/{id}.flac"))),
        title: format!("Track {id}"),
        artist: None,
        album: None,
        duration: Duration::from_secs(200),
        display: format!("Track {id}"),
    }
}

fn tracks(n: u64) -> Vec<Track> {
    (0..n).map(track).collect()
}

fn ids(tracks: &[Track]) -> Vec<u64> {
    tracks.iter().map(|t| t.id.0).collect()
}

fn transport() -> Transport<FakeMedia> {
    Transport::with_queue(FakeMedia::new(), Queue::with_seed(7))
}

fn media(t: &mut Transport<FakeMedia>) -> &mut FakeMedia {
    t.engine_mut().media_mut()
}

/// Let the loaded source report ready, then confirm the play request.
fn start_playing(t: &mut Transport<FakeMedia>) {
    media(t).emit(MediaEventKind::MetadataReady(None));
    media(t).emit(MediaEventKind::Started);
    t.pump();
}

fn current_id(t: &Transport<FakeMedia>) -> Option<u64> {
    t.engine().current_track().map(|tr| tr.id.0)
}

#[test]
fn load_goes_through_buffering_then_plays_on_autoplay() {
    let mut t = transport();
    t.set_queue(tracks(3), 0);
    assert_eq!(t.engine().state(), PlaybackState::Buffering);
    assert_eq!(media(&mut t).count(&Call::Play), 0);

    media(&mut t).emit(MediaEventKind::MetadataReady(None));
    t.pump();
    assert_eq!(t.engine().state(), PlaybackState::Paused);
    assert_eq!(media(&mut t).count(&Call::Play), 1);

    media(&mut t).emit(MediaEventKind::Started);
    t.pump();
    assert_eq!(t.engine().state(), PlaybackState::Playing);
}

#[test]
fn metadata_duration_replaces_track_duration_only_when_reported() {
    let mut t = transport();
    t.set_queue(tracks(2), 0);
    media(&mut t).emit(MediaEventKind::MetadataReady(Some(Duration::from_secs(187))));
    t.pump();
    assert_eq!(t.engine().duration(), Duration::from_secs(187));

    t.next();
    media(&mut t).emit(MediaEventKind::MetadataReady(None));
    t.pump();
    assert_eq!(t.engine().duration(), Duration::from_secs(200));
}

#[test]
fn stopped_session_has_zero_progress() {
    let mut t = transport();
    t.set_queue(tracks(1), 0);
    start_playing(&mut t);
    media(&mut t).emit(MediaEventKind::TimeUpdate(Duration::from_secs(40)));
    t.pump();
    assert_eq!(t.engine().progress(), Duration::from_secs(40));

    t.engine_mut().stop();
    assert_eq!(t.engine().state(), PlaybackState::Stopped);
    assert_eq!(t.engine().progress(), Duration::ZERO);

    // Late time updates do not revive progress.
    media(&mut t).emit(MediaEventKind::TimeUpdate(Duration::from_secs(41)));
    t.pump();
    assert_eq!(t.engine().progress(), Duration::ZERO);
}

#[test]
fn play_without_a_track_does_nothing() {
    let mut engine = Engine::new(FakeMedia::new());
    engine.play();
    engine.toggle_play();
    assert!(engine.current_track().is_none());
    assert_eq!(engine.state(), PlaybackState::Stopped);
    assert_eq!(engine.media().count(&Call::Play), 0);
}

#[test]
fn pause_is_idempotent() {
    let mut t = transport();
    t.set_queue(tracks(1), 0);
    start_playing(&mut t);

    t.engine_mut().pause();
    t.engine_mut().pause();
    media(&mut t).emit(MediaEventKind::Paused);
    t.pump();
    assert_eq!(t.engine().state(), PlaybackState::Paused);
}

#[test]
fn pause_while_stopped_is_a_no_op() {
    let mut t = transport();
    t.set_queue(tracks(1), 0);
    start_playing(&mut t);
    t.engine_mut().stop();
    let pauses = media(&mut t).count(&Call::Pause);

    t.engine_mut().pause();
    assert_eq!(t.engine().state(), PlaybackState::Stopped);
    assert_eq!(media(&mut t).count(&Call::Pause), pauses);
}

#[test]
fn pause_cancels_pending_autoplay() {
    let mut t = transport();
    t.set_queue(tracks(2), 0);
    t.engine_mut().pause();

    media(&mut t).emit(MediaEventKind::MetadataReady(None));
    t.pump();
    assert_eq!(t.engine().state(), PlaybackState::Paused);
    assert_eq!(media(&mut t).count(&Call::Play), 0);
}

#[test]
fn unrequested_started_is_ignored() {
    let mut t = transport();
    t.set_queue(tracks(1), 0);
    start_playing(&mut t);
    t.engine_mut().pause();

    media(&mut t).emit(MediaEventKind::Started);
    t.pump();
    assert_eq!(t.engine().state(), PlaybackState::Paused);
}

#[test]
fn events_from_a_replaced_source_are_dropped() {
    let mut t = transport();
    t.set_queue(tracks(2), 0);
    start_playing(&mut t);
    let first = SourceId(1);

    t.next();
    assert_eq!(media(&mut t).calls.last(), Some(&Call::Load("/music/1.flac".into())));
    assert!(media(&mut t).calls.contains(&Call::Release(first)));

    media(&mut t).emit_for(first, MediaEventKind::Started);
    media(&mut t).emit_for(first, MediaEventKind::Ended);
    media(&mut t).emit_for(first, MediaEventKind::Error("gone".into()));
    t.pump();

    assert_eq!(t.engine().state(), PlaybackState::Buffering);
    assert_eq!(current_id(&t), Some(1));
    assert_eq!(t.queue().index(), 1);
}

#[test]
fn two_track_queue_runs_to_the_end_and_stops() {
    let mut t = transport();
    t.set_queue(vec![track(10), track(11)], 0);
    start_playing(&mut t);

    media(&mut t).emit(MediaEventKind::Ended);
    t.pump();
    assert_eq!(current_id(&t), Some(11));
    assert_eq!(t.queue().index(), 1);
    start_playing(&mut t);
    assert_eq!(t.engine().state(), PlaybackState::Playing);

    media(&mut t).emit(MediaEventKind::TimeUpdate(Duration::from_secs(199)));
    media(&mut t).emit(MediaEventKind::Ended);
    t.pump();
    assert_eq!(t.engine().state(), PlaybackState::Stopped);
    assert_eq!(t.engine().progress(), Duration::ZERO);
    assert_eq!(current_id(&t), Some(11));
    assert_eq!(media(&mut t).loads().len(), 2);
}

#[test]
fn single_track_next_is_a_no_op_without_repeat() {
    let mut t = transport();
    t.set_queue(tracks(1), 0);
    start_playing(&mut t);
    assert!(!t.can_play_next());
    assert!(!t.can_play_previous());

    t.next();
    assert_eq!(media(&mut t).loads().len(), 1);
    assert_eq!(t.queue().index(), 0);
    assert_eq!(t.engine().state(), PlaybackState::Playing);
}

#[test]
fn repeat_one_restarts_on_end() {
    let mut t = transport();
    t.set_queue(tracks(3), 1);
    t.set_repeat(RepeatMode::One);
    start_playing(&mut t);
    let plays = media(&mut t).count(&Call::Play);

    media(&mut t).emit(MediaEventKind::TimeUpdate(Duration::from_secs(200)));
    media(&mut t).emit(MediaEventKind::Ended);
    t.pump();

    assert_eq!(media(&mut t).loads().len(), 1);
    assert_eq!(media(&mut t).calls.last(), Some(&Call::Play));
    assert_eq!(media(&mut t).count(&Call::Play), plays + 1);
    assert!(media(&mut t).calls.contains(&Call::SetPosition(Duration::ZERO)));
    assert_eq!(t.engine().progress(), Duration::ZERO);
    assert_eq!(t.queue().index(), 1);
}

#[test]
fn repeat_all_wraps_both_ways() {
    let mut t = transport();
    t.set_queue(tracks(3), 2);
    t.set_repeat(RepeatMode::All);
    start_playing(&mut t);
    assert!(t.can_play_next());

    t.next();
    assert_eq!(t.queue().index(), 0);
    assert_eq!(current_id(&t), Some(0));

    t.previous();
    assert_eq!(t.queue().index(), 2);
    assert_eq!(current_id(&t), Some(2));
}

#[test]
fn repeat_all_end_of_last_track_wraps_and_autoplays() {
    let mut t = transport();
    t.set_queue(tracks(3), 2);
    t.set_repeat(RepeatMode::All);
    start_playing(&mut t);
    let plays = media(&mut t).count(&Call::Play);

    media(&mut t).emit(MediaEventKind::Ended);
    t.pump();
    assert_eq!(t.queue().index(), 0);
    assert_eq!(current_id(&t), Some(0));
    assert_eq!(media(&mut t).loads().len(), 2);
    assert_eq!(t.engine().state(), PlaybackState::Buffering);

    media(&mut t).emit(MediaEventKind::MetadataReady(None));
    t.pump();
    assert_eq!(media(&mut t).count(&Call::Play), plays + 1);
    media(&mut t).emit(MediaEventKind::Started);
    t.pump();
    assert_eq!(t.engine().state(), PlaybackState::Playing);
}

#[test]
fn repeat_one_next_and_previous_restart_in_place() {
    let mut t = transport();
    t.set_queue(tracks(3), 1);
    t.set_repeat(RepeatMode::One);
    start_playing(&mut t);
    media(&mut t).emit(MediaEventKind::TimeUpdate(Duration::from_secs(2)));
    t.pump();
    let plays = media(&mut t).count(&Call::Play);

    t.next();
    assert_eq!(t.queue().index(), 1);
    assert_eq!(t.engine().progress(), Duration::ZERO);
    assert_eq!(media(&mut t).calls.last(), Some(&Call::Play));
    assert_eq!(media(&mut t).count(&Call::Play), plays + 1);

    t.previous();
    assert_eq!(t.queue().index(), 1);
    assert_eq!(media(&mut t).count(&Call::Play), plays + 2);
    assert_eq!(media(&mut t).loads().len(), 1);
    assert_eq!(current_id(&t), Some(1));
}

#[test]
fn queue_edges_are_playable_under_repeat() {
    let mut t = transport();
    t.set_queue(tracks(3), 0);
    assert!(t.can_play_next());
    assert!(!t.can_play_previous());
    for mode in [RepeatMode::One, RepeatMode::All] {
        t.set_repeat(mode);
        assert!(t.can_play_next());
        assert!(t.can_play_previous());
    }

    t.set_repeat(RepeatMode::Off);
    t.set_queue(tracks(3), 2);
    assert!(!t.can_play_next());
    assert!(t.can_play_previous());
    for mode in [RepeatMode::One, RepeatMode::All] {
        t.set_repeat(mode);
        assert!(t.can_play_next());
        assert!(t.can_play_previous());
    }
}

#[test]
fn previous_after_three_seconds_restarts_current() {
    let mut t = transport();
    t.set_queue(tracks(4), 2);
    start_playing(&mut t);
    media(&mut t).emit(MediaEventKind::TimeUpdate(Duration::from_secs(5)));
    t.pump();

    t.previous();
    assert_eq!(t.queue().index(), 2);
    assert_eq!(t.engine().progress(), Duration::ZERO);
    assert_eq!(media(&mut t).calls.last(), Some(&Call::SetPosition(Duration::ZERO)));
    assert_eq!(media(&mut t).loads().len(), 1);

    // Near the start it moves back instead.
    t.previous();
    assert_eq!(t.queue().index(), 1);
    assert_eq!(current_id(&t), Some(1));
}

#[test]
fn previous_at_first_track_without_repeat_is_a_no_op() {
    let mut t = transport();
    t.set_queue(tracks(2), 0);
    start_playing(&mut t);
    t.previous();
    assert_eq!(t.queue().index(), 0);
    assert_eq!(media(&mut t).loads().len(), 1);
}

#[test]
fn empty_queue_navigation_is_a_no_op() {
    let mut t = transport();
    t.next();
    t.previous();
    assert!(media(&mut t).calls.iter().all(|c| !matches!(c, Call::Load(_))));
    assert!(!t.can_play_next());
    assert!(!t.can_play_previous());
}

#[test]
fn previous_on_an_emptied_queue_does_not_seek() {
    let mut t = transport();
    t.set_queue(tracks(2), 0);
    start_playing(&mut t);
    media(&mut t).emit(MediaEventKind::TimeUpdate(Duration::from_secs(10)));
    t.pump();

    t.clear_queue();
    t.previous();
    assert_eq!(t.engine().progress(), Duration::from_secs(10));
    assert_eq!(media(&mut t).count(&Call::SetPosition(Duration::ZERO)), 0);
}

#[test]
fn shuffle_keeps_current_first_and_round_trips() {
    let mut t = transport();
    t.set_queue(tracks(6), 3);
    let before = ids(t.queue().active());

    t.toggle_shuffle();
    assert!(t.queue().shuffle());
    assert_eq!(t.queue().index(), 0);
    assert_eq!(t.queue().active()[0].id, TrackId(3));
    let mut sorted = ids(t.queue().active());
    sorted.sort_unstable();
    assert_eq!(sorted, before);

    t.toggle_shuffle();
    assert_eq!(ids(t.queue().active()), before);
    assert_eq!(t.queue().index(), 3);
    // Shuffling never reloads the playing track.
    assert_eq!(media(&mut t).loads().len(), 1);
}

#[test]
fn shuffled_set_queue_starts_with_the_chosen_track() {
    let mut t = transport();
    t.set_shuffle(true);
    t.set_queue(tracks(5), 4);
    assert_eq!(t.queue().index(), 0);
    assert_eq!(t.queue().active()[0].id, TrackId(4));
    assert_eq!(ids(t.queue().original()), vec![0, 1, 2, 3, 4]);
    assert_eq!(current_id(&t), Some(4));
}

#[test]
fn queue_orders_hold_the_same_tracks() {
    let mut t = transport();
    t.set_queue(tracks(4), 0);
    t.toggle_shuffle();
    t.add_to_queue(track(9));
    t.toggle_shuffle();
    t.toggle_shuffle();

    let mut active = ids(t.queue().active());
    let mut original = ids(t.queue().original());
    active.sort_unstable();
    original.sort_unstable();
    assert_eq!(active, original);
    assert_eq!(active, vec![0, 1, 2, 3, 9]);
}

#[test]
fn queue_orders_stay_permutations_across_seeds() {
    for seed in 0..16u64 {
        let mut t = Transport::with_queue(FakeMedia::new(), Queue::with_seed(seed));
        let mut expected: Vec<u64> = Vec::new();
        for step in 0..24u64 {
            match (seed * 7 + step * 3) % 5 {
                0 => {
                    let n = step % 5 + 1;
                    t.set_queue(tracks(n), (step % n) as usize);
                    expected = (0..n).collect();
                }
                1 | 4 => {
                    t.add_to_queue(track(100 + step));
                    expected.push(100 + step);
                }
                2 => t.toggle_shuffle(),
                _ => t.next(),
            }

            let mut active = ids(t.queue().active());
            let mut original = ids(t.queue().original());
            active.sort_unstable();
            original.sort_unstable();
            assert_eq!(active, original, "seed {seed} step {step}");
            let mut want = expected.clone();
            want.sort_unstable();
            assert_eq!(active, want, "seed {seed} step {step}");
            if !t.queue().is_empty() {
                assert!(t.queue().index() < t.queue().len());
            }
        }
    }
}

#[test]
fn shuffle_follows_the_playing_track_not_the_cursor() {
    let mut t = transport();
    t.set_queue(tracks(3), 1);
    start_playing(&mut t);

    t.clear_queue();
    for tr in tracks(3) {
        t.add_to_queue(tr);
    }
    assert_eq!(t.queue().index(), 0);
    assert_eq!(current_id(&t), Some(1));

    t.toggle_shuffle();
    assert_eq!(t.queue().index(), 0);
    assert_eq!(t.queue().active()[0].id, TrackId(1));

    t.toggle_shuffle();
    assert_eq!(ids(t.queue().active()), vec![0, 1, 2]);
    assert_eq!(t.queue().index(), 1);

    t.next();
    assert_eq!(current_id(&t), Some(2));
}

#[test]
fn shuffle_without_a_playing_track_starts_at_zero() {
    let mut t = transport();
    for tr in tracks(4) {
        t.add_to_queue(tr);
    }
    t.toggle_shuffle();
    assert_eq!(t.queue().index(), 0);
    t.toggle_shuffle();
    assert_eq!(ids(t.queue().active()), vec![0, 1, 2, 3]);
    assert_eq!(t.queue().index(), 0);
}

#[test]
fn clear_queue_leaves_playback_alone() {
    let mut t = transport();
    t.set_queue(tracks(3), 1);
    start_playing(&mut t);

    t.clear_queue();
    assert!(t.queue().is_empty());
    assert_eq!(t.queue().index(), 0);
    assert_eq!(t.engine().state(), PlaybackState::Playing);
    assert_eq!(current_id(&t), Some(1));

    // With nothing left to play, the end of the track stops the session.
    media(&mut t).emit(MediaEventKind::Ended);
    t.pump();
    assert_eq!(t.engine().state(), PlaybackState::Stopped);
}

#[test]
fn out_of_range_start_plays_first_track() {
    let mut t = transport();
    t.set_queue(tracks(3), 9);
    assert_eq!(t.queue().index(), 0);
    assert_eq!(current_id(&t), Some(0));
}

#[test]
fn repeat_cycles_off_all_one() {
    let mut t = transport();
    assert_eq!(t.queue().repeat(), RepeatMode::Off);
    t.toggle_repeat();
    assert_eq!(t.queue().repeat(), RepeatMode::All);
    t.toggle_repeat();
    assert_eq!(t.queue().repeat(), RepeatMode::One);
    t.toggle_repeat();
    assert_eq!(t.queue().repeat(), RepeatMode::Off);
}

#[test]
fn volume_and_mute_interact() {
    let mut engine = Engine::new(FakeMedia::new());
    assert_eq!(engine.volume(), 0.7);

    engine.set_volume(0.5);
    engine.toggle_mute();
    assert!(engine.is_muted());
    assert_eq!(engine.volume(), 0.5);

    engine.set_volume(0.8);
    assert!(!engine.is_muted());
    assert_eq!(engine.volume(), 0.8);
    assert_eq!(engine.media().calls.last(), Some(&Call::SetVolume(0.8)));

    engine.set_volume(7.0);
    assert_eq!(engine.volume(), 1.0);
    engine.set_volume(-1.0);
    assert_eq!(engine.volume(), 0.0);
}

#[test]
fn raising_volume_from_zero_stays_unmuted() {
    let mut engine = Engine::new(FakeMedia::new());
    engine.set_volume(0.0);
    assert!(!engine.is_muted());

    engine.set_volume(0.3);
    assert_eq!(engine.volume(), 0.3);
    assert!(!engine.is_muted());
}

#[test]
fn zero_volume_keeps_mute() {
    let mut engine = Engine::new(FakeMedia::new());
    engine.toggle_mute();
    engine.set_volume(0.0);
    assert!(engine.is_muted());
}

#[test]
fn seek_clamps_to_track() {
    let mut t = transport();
    t.set_queue(tracks(1), 0);
    start_playing(&mut t);

    t.engine_mut().seek(Duration::from_secs(500));
    assert_eq!(t.engine().progress(), Duration::from_secs(200));

    t.engine_mut().seek_by_percent(50.0);
    assert_eq!(t.engine().progress(), Duration::from_secs(100));

    t.engine_mut().seek_by(-1_000_000_000);
    assert_eq!(t.engine().progress(), Duration::ZERO);

    t.engine_mut().seek_by(15_000_000);
    assert_eq!(t.engine().progress(), Duration::from_secs(15));
    assert_eq!(
        media(&mut t).calls.last(),
        Some(&Call::SetPosition(Duration::from_secs(15)))
    );
}

#[test]
fn relative_seek_keeps_sub_second_offsets() {
    let mut t = transport();
    t.set_queue(tracks(1), 0);
    start_playing(&mut t);
    t.engine_mut().seek(Duration::from_secs(10));

    t.apply(AudioCmd::SeekBy(250_000));
    assert_eq!(t.engine().progress(), Duration::from_millis(10_250));

    t.apply(AudioCmd::SeekBy(-7_500_000));
    assert_eq!(t.engine().progress(), Duration::from_millis(2_750));
}

#[test]
fn seek_while_stopped_is_ignored() {
    let mut t = transport();
    t.set_queue(tracks(1), 0);
    start_playing(&mut t);
    t.engine_mut().stop();

    t.engine_mut().seek(Duration::from_secs(30));
    assert_eq!(t.engine().progress(), Duration::ZERO);
}

#[test]
fn track_without_locator_is_not_loaded() {
    let mut engine = Engine::new(FakeMedia::new());
    let mut lost = track(1);
    lost.locator = None;

    assert_eq!(engine.load_track(lost, true), LoadOutcome::NotLoaded);
    assert_eq!(engine.state(), PlaybackState::Stopped);
    assert!(engine.media().loads().is_empty());
    let notices = engine.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, NoticeKind::LoadFailed);
}

#[test]
fn refused_locator_is_reported() {
    let mut t = transport();
    media(&mut t).broken.insert("/music/0.flac".into());
    let outputs = Outputs::default();
    let (session, _, notice) = outputs.watches();

    t.set_queue(tracks(2), 0);
    t.publish(&outputs);

    let session = session.get().unwrap_or_default();
    assert_eq!(session.state, PlaybackState::Stopped);
    let notice = notice.get().flatten().expect("a notice");
    assert_eq!(notice.kind, NoticeKind::LoadFailed);
    assert_eq!(notice.seq, 1);

    // The queue is still usable.
    t.next();
    assert_eq!(t.engine().state(), PlaybackState::Buffering);
}

#[test]
fn media_error_stops_and_reports() {
    let mut t = transport();
    t.set_queue(tracks(2), 0);
    start_playing(&mut t);
    media(&mut t).emit(MediaEventKind::TimeUpdate(Duration::from_secs(12)));
    media(&mut t).emit(MediaEventKind::Error("device unplugged".into()));
    t.pump();

    assert_eq!(t.engine().state(), PlaybackState::Stopped);
    assert_eq!(t.engine().progress(), Duration::ZERO);
    let notices = t.engine_mut().take_notices();
    assert_eq!(notices[0].0, NoticeKind::PlaybackError);
}

#[test]
fn rejected_play_keeps_state_and_reports() {
    let mut t = transport();
    t.set_queue(tracks(1), 0);
    media(&mut t).emit(MediaEventKind::MetadataReady(None));
    media(&mut t).emit(MediaEventKind::PlayRejected("no device".into()));
    t.pump();

    assert_eq!(t.engine().state(), PlaybackState::Paused);
    let notices = t.engine_mut().take_notices();
    assert_eq!(notices[0].0, NoticeKind::PlayRejected);

    // A late Started for the refused request is not believed.
    media(&mut t).emit(MediaEventKind::Started);
    t.pump();
    assert_eq!(t.engine().state(), PlaybackState::Paused);
}

#[test]
fn stall_and_resume() {
    let mut t = transport();
    t.set_queue(tracks(1), 0);
    start_playing(&mut t);

    media(&mut t).emit(MediaEventKind::Buffering);
    t.pump();
    assert_eq!(t.engine().state(), PlaybackState::Buffering);

    media(&mut t).emit(MediaEventKind::Started);
    t.pump();
    assert_eq!(t.engine().state(), PlaybackState::Playing);
}

#[test]
fn toggle_play_flips_between_playing_and_paused() {
    let mut t = transport();
    t.set_queue(tracks(1), 0);
    start_playing(&mut t);

    t.engine_mut().toggle_play();
    assert_eq!(t.engine().state(), PlaybackState::Paused);

    t.engine_mut().toggle_play();
    media(&mut t).emit(MediaEventKind::Started);
    t.pump();
    assert_eq!(t.engine().state(), PlaybackState::Playing);
}

#[test]
fn snapshot_reports_progress_percent() {
    let mut t = transport();
    t.set_queue(tracks(1), 0);
    start_playing(&mut t);
    media(&mut t).emit(MediaEventKind::TimeUpdate(Duration::from_secs(50)));
    t.pump();

    let snap = t.engine().snapshot();
    assert!((snap.progress_percent - 25.0).abs() < 1e-9);
    assert_eq!(snap.track.map(|tr| tr.id), Some(TrackId(0)));
}

#[test]
fn shutdown_detaches_and_releases() {
    let mut t = transport();
    t.set_queue(tracks(1), 0);
    start_playing(&mut t);

    t.engine_mut().shutdown();
    let calls = &media(&mut t).calls;
    assert!(calls.contains(&Call::Detach));
    assert!(calls.contains(&Call::Release(SourceId(1))));
    assert_eq!(t.engine().state(), PlaybackState::Stopped);
}

#[test]
fn audio_loop_applies_commands_in_order_until_quit() {
    let (tx, rx) = mpsc::channel();
    let outputs = Outputs::default();
    let (session, queue, _) = outputs.watches();

    tx.send(AudioCmd::SetVolume(0.4)).unwrap();
    tx.send(AudioCmd::SetShuffle(false)).unwrap();
    tx.send(AudioCmd::SetRepeat(RepeatMode::All)).unwrap();
    tx.send(AudioCmd::SetQueue {
        tracks: tracks(3),
        start: 1,
    })
    .unwrap();
    tx.send(AudioCmd::Next).unwrap();
    tx.send(AudioCmd::ToggleMute).unwrap();
    tx.send(AudioCmd::Quit).unwrap();

    run(transport(), &rx, &outputs, Duration::from_millis(10));

    let session = session.get().unwrap_or_default();
    assert_eq!(session.state, PlaybackState::Stopped);
    assert_eq!(session.volume, 0.4);
    assert!(session.muted);
    assert_eq!(session.track.map(|tr| tr.id), Some(TrackId(2)));

    let queue = queue.get().unwrap_or_default();
    assert_eq!(queue.index, 2);
    assert_eq!(queue.repeat, RepeatMode::All);
    assert!(queue.can_play_next);
}

#[test]
fn audio_loop_exits_when_senders_are_gone() {
    let (tx, rx) = mpsc::channel::<AudioCmd>();
    drop(tx);
    let outputs = Outputs::default();
    run(transport(), &rx, &outputs, Duration::from_millis(10));
}
