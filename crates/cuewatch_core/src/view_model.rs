use crate::{JobId, JobStatus, PollError, PollPhase, Stage};

/// Snapshot of the controller handed to the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollView {
    pub job_id: Option<JobId>,
    pub phase: PollPhase,
    pub status: Option<JobStatus>,
    pub stage: Option<Stage>,
    pub error: Option<PollError>,
    pub media_url: Option<String>,
    pub tip_count: usize,
    pub transient_failures: u32,
}

impl PollView {
    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}
