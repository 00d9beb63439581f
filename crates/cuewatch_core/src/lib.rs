//! Cuewatch core: pure poll state machine, cue index and cue synchronizer.
mod cues;
mod effect;
mod job;
mod msg;
mod schedule;
mod state;
mod sync;
mod update;
mod view_model;

pub use cues::{Cue, CueIndex, CUE_WINDOW_SECONDS};
pub use effect::PollEffect;
pub use job::{
    FetchFailure, JobDetail, JobId, JobStatus, PollError, Stage, StatusReport, Tip,
    DEFAULT_JOB_ERROR, NOT_FOUND_MESSAGE,
};
pub use msg::PollMsg;
pub use schedule::{next_delay, PollSchedule};
pub use state::{PollPhase, PollSession, PollState};
pub use sync::{AudioState, CueSynchronizer, PlaybackError, PlaybackSink, SEEK_TOLERANCE_SECONDS};
pub use update::update;
pub use view_model::PollView;
