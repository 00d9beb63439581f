use std::collections::BTreeSet;

use cuewatch_logging::{cw_debug, cw_info};

use crate::{CueIndex, CUE_WINDOW_SECONDS};

/// Backward movement smaller than this is jitter, not a seek.
pub const SEEK_TOLERANCE_SECONDS: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// Autoplay policy or similar refusal. Not an application error.
    #[error("playback blocked: {0}")]
    Blocked(String),
    #[error("playback failed: {0}")]
    Failed(String),
}

/// The single audio output the synchronizer owns.
pub trait PlaybackSink {
    fn set_source(&mut self, url: &str);
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
}

/// State of the shared audio resource; the payload is the cue index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioState {
    #[default]
    Idle,
    Playing(usize),
    Paused(usize),
    Ended(usize),
}

/// Fires voice-over cues as playback time crosses tip windows.
///
/// Driven synchronously by [`CueSynchronizer::tick`] on every time sample.
/// Each cue fires at most once per pass over its window; backward seeks
/// re-arm the cues ahead of the new position.
pub struct CueSynchronizer<S> {
    index: CueIndex,
    sink: S,
    fired: BTreeSet<usize>,
    last_time: Option<f64>,
    enabled: bool,
    audio: AudioState,
}

impl<S: PlaybackSink> CueSynchronizer<S> {
    pub fn new(index: CueIndex, sink: S) -> Self {
        Self {
            index,
            sink,
            fired: BTreeSet::new(),
            last_time: None,
            enabled: true,
            audio: AudioState::Idle,
        }
    }

    pub fn index(&self) -> &CueIndex {
        &self.index
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn audio_state(&self) -> AudioState {
        self.audio
    }

    pub fn is_fired(&self, index: usize) -> bool {
        self.fired.contains(&index)
    }

    pub fn fired(&self) -> impl Iterator<Item = usize> + '_ {
        self.fired.iter().copied()
    }

    /// Feeds one playback position sample. Returns the cue fired, if any.
    pub fn tick(&mut self, current_time: f64) -> Option<usize> {
        if !current_time.is_finite() {
            return None;
        }
        if let Some(previous) = self.last_time {
            if current_time < previous - SEEK_TOLERANCE_SECONDS {
                self.rewind_to(current_time);
            } else if current_time > previous + CUE_WINDOW_SECONDS {
                self.skip_to(current_time);
            }
        }
        self.last_time = Some(current_time);

        if !self.enabled {
            return None;
        }
        let index = self.index.cue_at(current_time)?;
        if self.fired.contains(&index) {
            return None;
        }
        self.fire(index)
    }

    /// Turns voice-over on or off.
    ///
    /// Off pauses the current clip and keeps the fired set. On marks every cue
    /// whose window closed before the last observed time as fired.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            if let AudioState::Playing(index) = self.audio {
                self.sink.pause();
                self.audio = AudioState::Paused(index);
            }
            return;
        }

        let Some(now) = self.last_time else {
            return;
        };
        for index in 0..self.index.len() {
            let Some(window) = self.index.window(index) else {
                break;
            };
            if window.start > now {
                break;
            }
            if window.end + SEEK_TOLERANCE_SECONDS < now {
                self.fired.insert(index);
            }
        }
    }

    /// The sink reports the current clip finished on its own.
    pub fn clip_ended(&mut self) {
        if let AudioState::Playing(index) = self.audio {
            self.audio = AudioState::Ended(index);
        }
    }

    /// Releases the audio resource on teardown.
    pub fn stop(&mut self) {
        if let AudioState::Playing(_) = self.audio {
            self.sink.pause();
        }
        self.audio = AudioState::Idle;
    }

    /// Backward seek: only cues strictly behind `time` stay fired.
    fn rewind_to(&mut self, time: f64) {
        cw_debug!("Seek backward detected to {:.2}s", time);
        let index = &self.index;
        self.fired.retain(|&i| index.get(i).is_some_and(|cue| cue.timestamp() < time));
    }

    /// Forward seek: cues that start before `time` were jumped past.
    fn skip_to(&mut self, time: f64) {
        cw_debug!("Seek forward detected to {:.2}s", time);
        for (index, cue) in self.index.iter().enumerate() {
            if cue.timestamp() >= time {
                break;
            }
            self.fired.insert(index);
        }
    }

    fn fire(&mut self, index: usize) -> Option<usize> {
        let url = self.index.get(index)?.audio_url.clone()?;
        if let AudioState::Playing(_) = self.audio {
            self.sink.pause();
        }
        self.sink.set_source(&url);
        self.fired.insert(index);
        match self.sink.play() {
            Ok(()) => {
                cw_info!("Cue {} playing {}", index, url);
                self.audio = AudioState::Playing(index);
            }
            Err(err) => {
                cw_debug!("Cue {} not played: {}", index, err);
                self.audio = AudioState::Idle;
            }
        }
        Some(index)
    }
}
