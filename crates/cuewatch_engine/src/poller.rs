use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use cuewatch_core::{
    update, FetchFailure, JobId, PollEffect, PollMsg, PollSchedule, PollState, PollView,
};
use cuewatch_logging::{cw_debug, cw_info};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::StatusSource;

/// Spawns poll sessions that execute the core controller's effects.
#[derive(Clone)]
pub struct JobPoller {
    source: Arc<dyn StatusSource>,
    schedule: PollSchedule,
}

impl JobPoller {
    pub fn new(source: Arc<dyn StatusSource>) -> Self {
        Self {
            source,
            schedule: PollSchedule::default(),
        }
    }

    pub fn with_schedule(mut self, schedule: PollSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Starts polling `job_id` on the current tokio runtime.
    pub fn spawn(&self, job_id: impl Into<JobId>) -> PollerHandle {
        let job_id = job_id.into();
        let cancel = CancellationToken::new();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_session(
            self.source.clone(),
            self.schedule,
            job_id.clone(),
            cancel.clone(),
            update_tx,
        ));

        PollerHandle {
            job_id,
            guard: cancel.clone().drop_guard(),
            cancel,
            updates: update_rx,
            task,
        }
    }
}

/// A live poll session. Dropping the handle cancels the session.
pub struct PollerHandle {
    job_id: JobId,
    cancel: CancellationToken,
    guard: DropGuard,
    updates: mpsc::UnboundedReceiver<PollView>,
    task: JoinHandle<PollState>,
}

impl PollerHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Next view snapshot; `None` once the session has ended and all updates were read.
    pub async fn next_update(&mut self) -> Option<PollView> {
        self.updates.recv().await
    }

    pub fn try_update(&mut self) -> Option<PollView> {
        self.updates.try_recv().ok()
    }

    /// Waits for the session to end and returns its final state.
    pub async fn finish(self) -> Result<PollState, JoinError> {
        let Self { task, guard, .. } = self;
        let state = task.await;
        drop(guard);
        state
    }
}

/// Keeps at most one poll session alive, switching when the job id changes.
pub struct JobWatcher {
    poller: JobPoller,
    current: Option<PollerHandle>,
}

impl JobWatcher {
    pub fn new(poller: JobPoller) -> Self {
        Self {
            poller,
            current: None,
        }
    }

    pub fn watch(&mut self, job_id: &str) -> &mut PollerHandle {
        let keep = self
            .current
            .as_ref()
            .is_some_and(|handle| handle.job_id() == job_id && !handle.is_cancelled());
        if !keep {
            if let Some(previous) = self.current.take() {
                cw_debug!("Switching job {} -> {}", previous.job_id(), job_id);
                previous.cancel();
            }
        }
        let poller = &self.poller;
        self.current.get_or_insert_with(|| poller.spawn(job_id))
    }

    pub fn current(&mut self) -> Option<&mut PollerHandle> {
        self.current.as_mut()
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.cancel();
        }
    }
}

async fn run_session(
    source: Arc<dyn StatusSource>,
    schedule: PollSchedule,
    job_id: JobId,
    cancel: CancellationToken,
    updates: mpsc::UnboundedSender<PollView>,
) -> PollState {
    let clock = Instant::now();
    let mut state = PollState::with_schedule(schedule);
    let mut queue = VecDeque::new();
    apply(
        &mut state,
        PollMsg::Start {
            job_id,
            at: Duration::ZERO,
        },
        &mut queue,
        &updates,
    );

    while let Some(effect) = queue.pop_front() {
        let msg = match effect {
            PollEffect::FetchDetail { job_id } => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => PollMsg::Cancel,
                    result = source.fetch_detail(&job_id) => PollMsg::DetailLoaded {
                        job_id: job_id.clone(),
                        result: result.map_err(FetchFailure::from),
                        at: clock.elapsed(),
                    },
                }
            }
            PollEffect::FetchStatus { job_id } => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => PollMsg::Cancel,
                    result = source.fetch_status(&job_id) => PollMsg::StatusLoaded {
                        job_id: job_id.clone(),
                        result: result.map_err(FetchFailure::from),
                        at: clock.elapsed(),
                    },
                }
            }
            PollEffect::ScheduleTick { job_id, delay } => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => PollMsg::Cancel,
                    _ = tokio::time::sleep(delay) => PollMsg::TimerFired {
                        job_id,
                        at: clock.elapsed(),
                    },
                }
            }
            // Timers live inside the select above; dropping it is the cancellation.
            PollEffect::CancelTimer => continue,
        };
        apply(&mut state, msg, &mut queue, &updates);
    }

    if state.is_cancelled() {
        cw_debug!("Poll session ended by cancellation");
    } else {
        cw_info!(
            "Poll session finished phase={:?} after {:?}",
            state.phase(),
            clock.elapsed()
        );
    }
    state
}

fn apply(
    state: &mut PollState,
    msg: PollMsg,
    queue: &mut VecDeque<PollEffect>,
    updates: &mpsc::UnboundedSender<PollView>,
) {
    let (next, effects) = update(std::mem::take(state), msg);
    *state = next;
    queue.extend(effects);
    if state.consume_dirty() {
        // The receiver may be gone if the view stopped listening.
        let _ = updates.send(state.view());
    }
}
