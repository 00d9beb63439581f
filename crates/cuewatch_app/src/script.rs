//! Offline playback scripts for the cue synchronizer.
//!
//! A script is one step per line:
//!
//! ```text
//! # comments and blank lines are skipped
//! 0
//! 10.1
//! voice off
//! 42.5
//! voice on
//! ended
//! ```
//!
//! A bare number is a playback position in seconds, `voice on`/`voice off`
//! toggles voice-over and `ended` reports that the current clip finished.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use cuewatch_core::{CueIndex, CueSynchronizer, PlaybackError, PlaybackSink};
use cuewatch_logging::cw_debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ScriptStep {
    Time(f64),
    Voice(bool),
    Ended,
}

/// A cue the synchronizer fired during a replay.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FiredCue {
    pub at: f64,
    pub cue: usize,
    pub text: String,
    pub audio_url: String,
}

pub(crate) fn read(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading playback script from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("reading playback script {}", path.display()))
}

pub(crate) fn parse(text: &str) -> anyhow::Result<Vec<ScriptStep>> {
    let mut steps = Vec::new();
    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step = match line {
            "voice on" => ScriptStep::Voice(true),
            "voice off" => ScriptStep::Voice(false),
            "ended" => ScriptStep::Ended,
            _ => match line.parse::<f64>() {
                Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => ScriptStep::Time(seconds),
                _ => bail!("line {}: unrecognized step {:?}", number + 1, line),
            },
        };
        steps.push(step);
    }
    Ok(steps)
}

/// Runs `steps` through a synchronizer over `index`, collecting fired cues.
pub(crate) fn replay(index: CueIndex, voice_over: bool, steps: &[ScriptStep]) -> Vec<FiredCue> {
    let mut sync = CueSynchronizer::new(index, ConsoleSink::default());
    sync.set_enabled(voice_over);

    let mut fired = Vec::new();
    for step in steps {
        match *step {
            ScriptStep::Time(at) => {
                let Some(cue) = sync.tick(at) else {
                    continue;
                };
                if let Some(entry) = sync.index().get(cue) {
                    fired.push(FiredCue {
                        at,
                        cue,
                        text: entry.tip.text.clone(),
                        audio_url: entry.audio_url.clone().unwrap_or_default(),
                    });
                }
            }
            ScriptStep::Voice(enabled) => sync.set_enabled(enabled),
            ScriptStep::Ended => sync.clip_ended(),
        }
    }
    sync.stop();
    fired
}

/// Stands in for an audio element: tracks the source and logs transport calls.
#[derive(Debug, Default)]
pub(crate) struct ConsoleSink {
    source: Option<String>,
    playing: bool,
}

impl PlaybackSink for ConsoleSink {
    fn set_source(&mut self, url: &str) {
        self.source = Some(url.to_string());
        self.playing = false;
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        let Some(source) = &self.source else {
            return Err(PlaybackError::Failed("no source loaded".to_string()));
        };
        cw_debug!("play {}", source);
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        if self.playing {
            cw_debug!("pause {}", self.source.as_deref().unwrap_or_default());
        }
        self.playing = false;
    }
}
