use cuewatch_core::{
    AudioState, Cue, CueIndex, CueSynchronizer, PlaybackError, PlaybackSink, Tip,
};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SinkCall {
    SetSource(String),
    Play,
    Pause,
}

#[derive(Default)]
struct FakeSink {
    calls: Vec<SinkCall>,
    block_autoplay: bool,
}

impl FakeSink {
    fn played(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::SetSource(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }
}

impl PlaybackSink for FakeSink {
    fn set_source(&mut self, url: &str) {
        self.calls.push(SinkCall::SetSource(url.to_string()));
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.calls.push(SinkCall::Play);
        if self.block_autoplay {
            Err(PlaybackError::Blocked("user gesture required".into()))
        } else {
            Ok(())
        }
    }

    fn pause(&mut self) {
        self.calls.push(SinkCall::Pause);
    }
}

fn index_at(timestamps: &[f64]) -> CueIndex {
    let tips = timestamps
        .iter()
        .map(|&t| Tip::new(t, format!("tip at {t}"), "general"))
        .collect();
    let audio: Vec<String> = (0..timestamps.len()).map(|i| format!("clip-{i}.mp3")).collect();
    CueIndex::from_parallel(tips, &audio)
}

fn synchronizer(timestamps: &[f64]) -> CueSynchronizer<FakeSink> {
    CueSynchronizer::new(index_at(timestamps), FakeSink::default())
}

fn run(sync: &mut CueSynchronizer<FakeSink>, samples: &[f64]) -> Vec<(f64, usize)> {
    samples
        .iter()
        .filter_map(|&t| sync.tick(t).map(|index| (t, index)))
        .collect()
}

#[test]
fn index_preserves_positional_audio_alignment() {
    let tips = vec![
        Tip::new(30.0, "late", "a"),
        Tip::new(5.0, "early", "b"),
        Tip::new(12.0, "middle", "c"),
    ];
    let audio = vec!["late.mp3".to_string(), String::new()];

    let index = CueIndex::from_parallel(tips, &audio);
    let pairs: Vec<(&str, Option<&str>)> = index
        .iter()
        .map(|cue| (cue.tip.text.as_str(), cue.audio_url.as_deref()))
        .collect();

    assert_eq!(
        pairs,
        vec![("early", None), ("middle", None), ("late", Some("late.mp3"))]
    );
}

#[test]
fn inline_audio_fills_missing_parallel_entry() {
    let mut tip = Tip::new(1.0, "inline", "a");
    tip.audio_url = Some("inline.mp3".into());
    let index = CueIndex::from_parallel(vec![tip], &[String::new()]);

    assert_eq!(index.get(0).and_then(|c| c.audio_url.as_deref()), Some("inline.mp3"));
}

#[test]
fn windows_are_capped_by_next_tip() {
    let index = index_at(&[10.0, 40.0, 40.5]);

    assert_eq!(index.window(0), Some(10.0..13.0));
    assert_eq!(index.window(1), Some(40.0..40.5));
    assert_eq!(index.window(2), Some(40.5..43.5));
    assert_eq!(index.window(3), None);
    assert_eq!(index.cue_at(12.99), Some(0));
    assert_eq!(index.cue_at(13.0), None);
    assert_eq!(index.cue_at(40.5), Some(2));
}

#[test]
fn non_finite_timestamps_are_dropped() {
    let index = CueIndex::new(vec![
        Cue {
            tip: Tip::new(f64::NAN, "bad", "a"),
            audio_url: Some("bad.mp3".into()),
        },
        Cue {
            tip: Tip::new(2.0, "good", "a"),
            audio_url: Some("good.mp3".into()),
        },
    ]);

    assert_eq!(index.len(), 1);
}

#[test]
fn monotonic_playback_fires_each_cue_once_inside_its_window() {
    let mut sync = synchronizer(&[2.0, 5.0, 5.5, 20.0]);
    let samples: Vec<f64> = (0..300).map(|i| f64::from(i) * 0.1).collect();

    let fires = run(&mut sync, &samples);

    let indices: Vec<usize> = fires.iter().map(|&(_, i)| i).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    for (time, index) in fires {
        let window = sync.index().window(index).unwrap();
        assert!(window.contains(&time), "cue {index} fired at {time} outside {window:?}");
    }
}

#[test]
fn firing_preempts_the_current_clip() {
    let mut sync = synchronizer(&[1.0, 2.0]);
    sync.tick(1.0);
    sync.tick(2.0);

    assert_eq!(
        sync.sink().calls,
        vec![
            SinkCall::SetSource("clip-0.mp3".into()),
            SinkCall::Play,
            SinkCall::Pause,
            SinkCall::SetSource("clip-1.mp3".into()),
            SinkCall::Play,
        ]
    );
    assert_eq!(sync.audio_state(), AudioState::Playing(1));
}

#[test]
fn jumping_past_cues_does_not_play_them() {
    let mut sync = synchronizer(&[10.0, 40.0, 40.5]);

    let fires = run(&mut sync, &[9.9, 10.1, 12.0, 15.0, 41.0]);

    assert_eq!(fires, vec![(10.1, 0)]);
    assert_eq!(sync.sink().played(), vec!["clip-0.mp3".to_string()]);
}

#[test]
fn seeking_directly_to_a_tip_plays_it() {
    let mut sync = synchronizer(&[10.0, 40.0]);

    let fires = run(&mut sync, &[1.0, 40.0, 40.2]);

    assert_eq!(fires, vec![(40.0, 1)]);
}

#[test]
fn backward_seek_rearms_only_cues_ahead() {
    let mut sync = synchronizer(&[10.0, 20.0, 30.0]);
    let forward: Vec<f64> = (0..=70).map(|i| f64::from(i) * 0.5).collect();
    run(&mut sync, &forward);
    assert_eq!(sync.fired().collect::<Vec<_>>(), vec![0, 1, 2]);

    assert_eq!(sync.tick(15.0), None);
    assert!(sync.is_fired(0));
    assert!(!sync.is_fired(1));
    assert!(!sync.is_fired(2));

    let replay: Vec<f64> = (31..=70).map(|i| f64::from(i) * 0.5).collect();
    let fires = run(&mut sync, &replay);
    let indices: Vec<usize> = fires.iter().map(|&(_, i)| i).collect();
    assert_eq!(indices, vec![1, 2]);
}

#[test]
fn backward_seek_into_a_window_replays_that_cue() {
    let mut sync = synchronizer(&[10.0, 20.0]);
    run(&mut sync, &[9.5, 10.0, 10.5, 11.0, 11.5, 12.0]);
    assert!(sync.is_fired(0));

    assert_eq!(sync.tick(10.0), Some(0));
}

#[test]
fn small_backward_jitter_is_not_a_seek() {
    let mut sync = synchronizer(&[10.0]);
    run(&mut sync, &[10.0, 10.5]);

    assert_eq!(sync.tick(10.2), None);
    assert!(sync.is_fired(0));
}

#[test]
fn disabled_synchronizer_fires_nothing_and_pauses_clip() {
    let mut sync = synchronizer(&[1.0, 5.0]);
    sync.tick(1.0);
    assert_eq!(sync.audio_state(), AudioState::Playing(0));

    sync.set_enabled(false);
    assert_eq!(sync.audio_state(), AudioState::Paused(0));
    assert_eq!(sync.sink().calls.last(), Some(&SinkCall::Pause));

    let fires = run(&mut sync, &[2.0, 3.0, 4.0, 5.0, 5.5]);
    assert!(fires.is_empty());
    assert!(sync.is_fired(0));
}

#[test]
fn reenabling_skips_elapsed_windows_but_keeps_current_one() {
    let mut sync = synchronizer(&[2.0, 8.0, 12.0, 30.0]);
    sync.set_enabled(false);
    let samples: Vec<f64> = (0..=25).map(|i| f64::from(i) * 0.5).collect();
    run(&mut sync, &samples);

    sync.set_enabled(true);
    assert!(sync.is_fired(0));
    assert!(sync.is_fired(1));
    assert!(!sync.is_fired(2));
    assert!(!sync.is_fired(3));

    let fires = run(&mut sync, &[12.5, 13.0, 20.0, 29.0, 30.0]);
    let indices: Vec<usize> = fires.iter().map(|&(_, i)| i).collect();
    assert_eq!(indices, vec![2, 3]);
}

#[test]
fn blocked_autoplay_is_swallowed_and_not_retried() {
    let sink = FakeSink {
        block_autoplay: true,
        ..FakeSink::default()
    };
    let mut sync = CueSynchronizer::new(index_at(&[1.0]), sink);

    assert_eq!(sync.tick(1.0), Some(0));
    assert_eq!(sync.audio_state(), AudioState::Idle);
    assert_eq!(sync.tick(1.5), None);
}

#[test]
fn tips_without_audio_never_fire() {
    let tips = vec![Tip::new(1.0, "silent", "a"), Tip::new(3.0, "voiced", "a")];
    let mut sync = CueSynchronizer::new(
        CueIndex::from_parallel(tips, &[String::new(), "voiced.mp3".into()]),
        FakeSink::default(),
    );

    let fires = run(&mut sync, &[0.5, 1.0, 2.0, 3.0]);

    assert_eq!(fires, vec![(3.0, 1)]);
    assert_eq!(sync.sink().played(), vec!["voiced.mp3".to_string()]);
}

#[test]
fn clip_end_and_stop_release_the_resource() {
    let mut sync = synchronizer(&[1.0]);
    sync.tick(1.0);
    sync.clip_ended();
    assert_eq!(sync.audio_state(), AudioState::Ended(0));

    sync.stop();
    assert_eq!(sync.audio_state(), AudioState::Idle);
    assert_eq!(sync.sink().calls.last(), Some(&SinkCall::Play));
}
