use anyhow::Context;
use cuewatch_core::{
    JobStatus, PollPhase, PollState, PollView, Stage, DEFAULT_JOB_ERROR,
};
use cuewatch_engine::JobPoller;
use cuewatch_logging::{cw_info, cw_warn};

/// Polls `job_id` to a terminal state, printing progress as it changes.
///
/// Ctrl-C cancels the session; the state returned is then non-terminal.
pub(crate) async fn run(poller: &JobPoller, job_id: &str) -> anyhow::Result<PollState> {
    let mut handle = poller.spawn(job_id);
    let mut printer = ProgressPrinter::default();
    let mut interrupted = false;

    loop {
        tokio::select! {
            update = handle.next_update() => match update {
                Some(view) => {
                    for line in printer.describe(&view) {
                        println!("{line}");
                    }
                }
                None => break,
            },
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                if let Err(err) = signal {
                    cw_warn!("Ctrl-C handler unavailable: {}", err);
                }
                cw_info!("Interrupted; cancelling poll for {}", job_id);
                interrupted = true;
                handle.cancel();
            }
        }
    }

    handle.finish().await.context("poll session task failed")
}

/// Turns successive view snapshots into progress lines, printing only changes.
#[derive(Debug, Default)]
pub(crate) struct ProgressPrinter {
    status: Option<JobStatus>,
    stage: Option<Stage>,
    transient_failures: u32,
    finished: bool,
}

impl ProgressPrinter {
    pub fn describe(&mut self, view: &PollView) -> Vec<String> {
        let mut lines = Vec::new();
        if self.finished {
            return lines;
        }

        if view.status.is_some() && view.status != self.status {
            self.status = view.status;
            if view.status == Some(JobStatus::Processing) {
                lines.push("status: processing".to_string());
            }
        }
        if view.stage.is_some() && view.stage != self.stage {
            if let Some(stage) = &view.stage {
                lines.push(format!("stage: {stage}"));
            }
        }
        self.stage = view.stage.clone();

        if view.transient_failures > self.transient_failures {
            lines.push(format!(
                "server unreachable, retrying ({} failed attempts)",
                view.transient_failures
            ));
        }
        self.transient_failures = view.transient_failures;

        match view.phase {
            PollPhase::Complete => {
                self.finished = true;
                lines.push(format!("complete: {} tips", view.tip_count));
                if let Some(url) = &view.media_url {
                    lines.push(format!("media: {url}"));
                }
            }
            PollPhase::Failed => {
                self.finished = true;
                let message = view
                    .error_message()
                    .unwrap_or_else(|| DEFAULT_JOB_ERROR.to_string());
                lines.push(format!("failed: {message}"));
            }
            PollPhase::Idle | PollPhase::InitialFetch | PollPhase::Polling | PollPhase::Finalizing => {}
        }
        lines
    }
}
