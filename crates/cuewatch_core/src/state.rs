use std::time::Duration;

use crate::view_model::PollView;
use crate::{CueIndex, JobDetail, JobId, JobStatus, PollError, PollSchedule, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    /// First detail fetch in flight.
    InitialFetch,
    /// Status endpoint loop.
    Polling,
    /// Job reported complete; fetching the final payload.
    Finalizing,
    Complete,
    Failed,
}

impl PollPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, PollPhase::Complete | PollPhase::Failed)
    }
}

/// Which continuation the controller is waiting on. At most one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pending {
    Detail,
    Status,
    Timer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSession {
    pub job_id: JobId,
    pub started_at: Duration,
    pub cancelled: bool,
    pub last_known_status: Option<JobStatus>,
}

impl PollSession {
    fn new(job_id: JobId, started_at: Duration) -> Self {
        Self {
            job_id,
            started_at,
            cancelled: false,
            last_known_status: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollState {
    schedule: PollSchedule,
    phase: PollPhase,
    session: Option<PollSession>,
    pending: Option<Pending>,
    stage: Option<Stage>,
    error: Option<PollError>,
    media_url: Option<String>,
    result: Option<JobDetail>,
    transient_failures: u32,
    dirty: bool,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedule(schedule: PollSchedule) -> Self {
        Self {
            schedule,
            ..Self::default()
        }
    }

    pub fn schedule(&self) -> PollSchedule {
        self.schedule
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&PollSession> {
        self.session.as_ref()
    }

    pub fn job_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.job_id.as_str())
    }

    pub fn status(&self) -> Option<JobStatus> {
        self.session.as_ref().and_then(|s| s.last_known_status)
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.stage.as_ref()
    }

    pub fn error(&self) -> Option<&PollError> {
        self.error.as_ref()
    }

    pub fn media_url(&self) -> Option<&str> {
        self.media_url.as_deref()
    }

    pub fn result(&self) -> Option<&JobDetail> {
        self.result.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn transient_failures(&self) -> u32 {
        self.transient_failures
    }

    /// Cue index built from the final payload, once the job is complete.
    pub fn cue_index(&self) -> Option<CueIndex> {
        self.result.as_ref().map(CueIndex::from_detail)
    }

    pub fn view(&self) -> PollView {
        PollView {
            job_id: self.job_id().map(ToOwned::to_owned),
            phase: self.phase,
            status: self.status(),
            stage: self.stage.clone(),
            error: self.error.clone(),
            media_url: self.media_url.clone(),
            tip_count: self.result.as_ref().map_or(0, |r| r.tips.len()),
            transient_failures: self.transient_failures,
        }
    }

    /// Returns whether anything visible changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub(crate) fn pending(&self) -> Option<Pending> {
        self.pending
    }

    pub(crate) fn set_pending(&mut self, pending: Option<Pending>) {
        self.pending = pending;
    }

    pub(crate) fn set_phase(&mut self, phase: PollPhase) {
        if self.phase != phase {
            self.phase = phase;
            self.dirty = true;
        }
    }

    /// Replaces any previous session with a fresh one. The schedule survives.
    pub(crate) fn begin_session(&mut self, job_id: JobId, at: Duration) {
        *self = Self::with_schedule(self.schedule);
        self.session = Some(PollSession::new(job_id, at));
        self.dirty = true;
    }

    pub(crate) fn mark_cancelled(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.cancelled = true;
        }
        self.pending = None;
    }

    pub(crate) fn elapsed(&self, at: Duration) -> Duration {
        self.session
            .as_ref()
            .map_or(Duration::ZERO, |s| at.saturating_sub(s.started_at))
    }

    pub(crate) fn record_status(&mut self, status: JobStatus) {
        if let Some(session) = self.session.as_mut() {
            if session.last_known_status != Some(status) {
                session.last_known_status = Some(status);
                self.dirty = true;
            }
        }
    }

    pub(crate) fn set_stage(&mut self, stage: Option<Stage>) {
        if self.stage != stage {
            self.stage = stage;
            self.dirty = true;
        }
    }

    /// First non-empty value wins for the lifetime of the session.
    pub(crate) fn seed_media_url(&mut self, url: Option<&str>) {
        if self.media_url.is_some() {
            return;
        }
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.media_url = Some(url.to_owned());
            self.dirty = true;
        }
    }

    pub(crate) fn note_transient(&mut self) -> u32 {
        self.transient_failures += 1;
        self.dirty = true;
        self.transient_failures
    }

    pub(crate) fn clear_transient(&mut self) {
        if self.transient_failures != 0 {
            self.transient_failures = 0;
            self.dirty = true;
        }
    }

    pub(crate) fn finish(&mut self, detail: JobDetail) {
        self.record_status(JobStatus::Complete);
        self.stage = None;
        self.result = Some(detail);
        self.pending = None;
        self.phase = PollPhase::Complete;
        self.dirty = true;
    }

    /// Terminal failure. Stage keeps its last value.
    pub(crate) fn fail(&mut self, error: PollError) {
        if error != PollError::NotFound {
            self.record_status(JobStatus::Error);
        }
        self.error = Some(error);
        self.pending = None;
        self.phase = PollPhase::Failed;
        self.dirty = true;
    }
}
