use std::ops::Range;

use cuewatch_logging::cw_warn;

use crate::{JobDetail, Tip};

/// Longest a tip's trigger window can stay open, in seconds.
pub const CUE_WINDOW_SECONDS: f64 = 3.0;

/// A tip paired with its optional voice-over clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub tip: Tip,
    pub audio_url: Option<String>,
}

impl Cue {
    pub fn timestamp(&self) -> f64 {
        self.tip.timestamp_seconds
    }
}

/// Timestamp-ordered cues. Read-only once built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CueIndex {
    cues: Vec<Cue>,
}

impl CueIndex {
    /// Builds an index from already-paired cues, dropping non-finite timestamps
    /// and sorting stably by timestamp.
    pub fn new(cues: Vec<Cue>) -> Self {
        let mut cues: Vec<Cue> = cues
            .into_iter()
            .filter(|cue| {
                let finite = cue.timestamp().is_finite();
                if !finite {
                    cw_warn!("Dropping tip with invalid timestamp: {:?}", cue.tip.text);
                }
                finite
            })
            .collect();
        cues.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
        Self { cues }
    }

    /// Pairs `tips[i]` with `audio_urls[i]` before any reordering.
    ///
    /// A missing or empty entry means the tip has no clip, unless the tip
    /// carries its own `audio_url`.
    pub fn from_parallel(tips: Vec<Tip>, audio_urls: &[String]) -> Self {
        let cues = tips
            .into_iter()
            .enumerate()
            .map(|(i, tip)| {
                let audio_url = audio_urls
                    .get(i)
                    .filter(|url| !url.is_empty())
                    .cloned()
                    .or_else(|| tip.audio_url.clone().filter(|url| !url.is_empty()));
                Cue { tip, audio_url }
            })
            .collect();
        Self::new(cues)
    }

    pub fn from_detail(detail: &JobDetail) -> Self {
        Self::from_parallel(detail.tips.clone(), &detail.audio_urls)
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Cue> {
        self.cues.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cue> {
        self.cues.iter()
    }

    /// Half-open window `[t_i, min(t_i + 3, t_{i+1}))`.
    pub fn window(&self, index: usize) -> Option<Range<f64>> {
        let start = self.cues.get(index)?.timestamp();
        let next = self
            .cues
            .get(index + 1)
            .map_or(f64::INFINITY, Cue::timestamp);
        Some(start..(start + CUE_WINDOW_SECONDS).min(next))
    }

    /// Index of the cue whose window contains `time`. Windows never overlap.
    pub fn cue_at(&self, time: f64) -> Option<usize> {
        for (index, cue) in self.cues.iter().enumerate() {
            if cue.timestamp() > time {
                break;
            }
            if self.window(index).is_some_and(|w| w.contains(&time)) {
                return Some(index);
            }
        }
        None
    }
}
