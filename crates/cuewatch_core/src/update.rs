use std::time::Duration;

use cuewatch_logging::{cw_debug, cw_info, cw_warn};

use crate::job::DEFAULT_JOB_ERROR;
use crate::state::Pending;
use crate::{
    FetchFailure, JobDetail, JobId, JobStatus, PollEffect, PollError, PollMsg, PollPhase,
    PollState, StatusReport,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages for another job id, for a cancelled session, for a terminal session,
/// or that do not answer the continuation currently awaited are dropped without
/// touching state.
pub fn update(mut state: PollState, msg: PollMsg) -> (PollState, Vec<PollEffect>) {
    let effects = match msg {
        PollMsg::Start { job_id, at } => start(&mut state, job_id, at),
        PollMsg::Cancel => cancel(&mut state),
        PollMsg::DetailLoaded { job_id, result, at } => {
            if !accepts(&state, &job_id, Pending::Detail) {
                return (state, Vec::new());
            }
            state.set_pending(None);
            match state.phase() {
                PollPhase::InitialFetch => initial_detail(&mut state, job_id, result),
                _ => final_detail(&mut state, job_id, result, at),
            }
        }
        PollMsg::StatusLoaded { job_id, result, at } => {
            if !accepts(&state, &job_id, Pending::Status) {
                return (state, Vec::new());
            }
            state.set_pending(None);
            status_loaded(&mut state, job_id, result, at)
        }
        PollMsg::TimerFired { job_id, .. } => {
            if !accepts(&state, &job_id, Pending::Timer) {
                return (state, Vec::new());
            }
            match state.phase() {
                PollPhase::Finalizing => request_detail(&mut state, job_id),
                _ => request_status(&mut state, job_id),
            }
        }
    };

    (state, effects)
}

fn accepts(state: &PollState, job_id: &str, expected: Pending) -> bool {
    let Some(session) = state.session() else {
        return false;
    };
    !session.cancelled
        && session.job_id == job_id
        && !state.is_terminal()
        && state.pending() == Some(expected)
}

fn start(state: &mut PollState, job_id: JobId, at: Duration) -> Vec<PollEffect> {
    if let Some(session) = state.session() {
        if session.job_id == job_id && !session.cancelled {
            return Vec::new();
        }
    }

    let mut effects = Vec::with_capacity(2);
    if state.pending() == Some(Pending::Timer) {
        effects.push(PollEffect::CancelTimer);
    }
    cw_info!("Poll session started job_id={}", job_id);
    state.begin_session(job_id.clone(), at);
    state.set_phase(PollPhase::InitialFetch);
    effects.extend(request_detail(state, job_id));
    effects
}

fn cancel(state: &mut PollState) -> Vec<PollEffect> {
    let Some(session) = state.session() else {
        return Vec::new();
    };
    if session.cancelled {
        return Vec::new();
    }
    cw_debug!("Poll session cancelled job_id={}", session.job_id);
    let had_timer = state.pending() == Some(Pending::Timer);
    state.mark_cancelled();
    if had_timer {
        vec![PollEffect::CancelTimer]
    } else {
        Vec::new()
    }
}

fn initial_detail(
    state: &mut PollState,
    job_id: JobId,
    result: Result<JobDetail, FetchFailure>,
) -> Vec<PollEffect> {
    match result {
        Ok(detail) => {
            state.clear_transient();
            state.seed_media_url(detail.media_url.as_deref());
            match detail.status {
                JobStatus::Processing => {
                    state.record_status(JobStatus::Processing);
                    state.set_phase(PollPhase::Polling);
                    request_status(state, job_id)
                }
                JobStatus::Complete => {
                    cw_info!("Job already complete job_id={}", job_id);
                    state.finish(detail);
                    Vec::new()
                }
                JobStatus::Error => {
                    fail_job(state, &job_id, detail.error);
                    Vec::new()
                }
            }
        }
        Err(FetchFailure::NotFound) => {
            not_found(state, &job_id);
            Vec::new()
        }
        Err(FetchFailure::Transient(reason)) => {
            let count = state.note_transient();
            cw_warn!(
                "Initial detail fetch failed job_id={} failures={} reason={}",
                job_id,
                count,
                reason
            );
            state.set_phase(PollPhase::Polling);
            request_status(state, job_id)
        }
    }
}

fn final_detail(
    state: &mut PollState,
    job_id: JobId,
    result: Result<JobDetail, FetchFailure>,
    at: Duration,
) -> Vec<PollEffect> {
    match result {
        Ok(detail) => {
            state.clear_transient();
            state.seed_media_url(detail.media_url.as_deref());
            match detail.status {
                JobStatus::Error => {
                    fail_job(state, &job_id, detail.error);
                    Vec::new()
                }
                JobStatus::Processing => {
                    cw_debug!("Detail still processing, resuming polling job_id={}", job_id);
                    state.record_status(JobStatus::Processing);
                    state.set_phase(PollPhase::Polling);
                    schedule_tick(state, job_id, at)
                }
                JobStatus::Complete => {
                    cw_info!(
                        "Job complete job_id={} tips={}",
                        job_id,
                        detail.tips.len()
                    );
                    state.finish(detail);
                    Vec::new()
                }
            }
        }
        Err(FetchFailure::NotFound) => {
            not_found(state, &job_id);
            Vec::new()
        }
        Err(FetchFailure::Transient(reason)) => {
            let count = state.note_transient();
            cw_warn!(
                "Final detail fetch failed job_id={} failures={} reason={}",
                job_id,
                count,
                reason
            );
            schedule_tick(state, job_id, at)
        }
    }
}

fn status_loaded(
    state: &mut PollState,
    job_id: JobId,
    result: Result<StatusReport, FetchFailure>,
    at: Duration,
) -> Vec<PollEffect> {
    match result {
        Ok(report) => {
            state.clear_transient();
            match report.status {
                JobStatus::Processing => {
                    state.record_status(JobStatus::Processing);
                    if state.stage() != report.stage.as_ref() {
                        if let Some(stage) = report.stage.as_ref() {
                            cw_info!("Stage changed job_id={} stage={}", job_id, stage.as_str());
                        }
                        state.set_stage(report.stage);
                    }
                    schedule_tick(state, job_id, at)
                }
                JobStatus::Complete => {
                    state.record_status(JobStatus::Complete);
                    state.set_stage(None);
                    state.set_phase(PollPhase::Finalizing);
                    request_detail(state, job_id)
                }
                JobStatus::Error => {
                    fail_job(state, &job_id, report.error);
                    Vec::new()
                }
            }
        }
        Err(FetchFailure::NotFound) => {
            not_found(state, &job_id);
            Vec::new()
        }
        Err(FetchFailure::Transient(reason)) => {
            let count = state.note_transient();
            cw_warn!(
                "Status poll failed job_id={} failures={} reason={}",
                job_id,
                count,
                reason
            );
            schedule_tick(state, job_id, at)
        }
    }
}

fn request_detail(state: &mut PollState, job_id: JobId) -> Vec<PollEffect> {
    state.set_pending(Some(Pending::Detail));
    vec![PollEffect::FetchDetail { job_id }]
}

fn request_status(state: &mut PollState, job_id: JobId) -> Vec<PollEffect> {
    state.set_pending(Some(Pending::Status));
    vec![PollEffect::FetchStatus { job_id }]
}

fn schedule_tick(state: &mut PollState, job_id: JobId, at: Duration) -> Vec<PollEffect> {
    let delay = state.schedule().next_delay(state.elapsed(at));
    cw_debug!("Next poll job_id={} delay_ms={}", job_id, delay.as_millis());
    state.set_pending(Some(Pending::Timer));
    vec![PollEffect::ScheduleTick { job_id, delay }]
}

fn fail_job(state: &mut PollState, job_id: &str, message: Option<String>) {
    let message = message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_JOB_ERROR.to_string());
    cw_warn!("Job failed job_id={} error={}", job_id, message);
    state.fail(PollError::JobFailed(message));
}

fn not_found(state: &mut PollState, job_id: &str) {
    cw_warn!("Job not found job_id={}", job_id);
    state.fail(PollError::NotFound);
}
