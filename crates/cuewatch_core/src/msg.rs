use std::time::Duration;

use crate::{FetchFailure, JobDetail, JobId, StatusReport};

/// Inputs to the poll controller. `at` is time on the driver's monotonic clock.
#[derive(Debug, Clone, PartialEq)]
pub enum PollMsg {
    /// View mounted with a job id, or the job id changed.
    Start { job_id: JobId, at: Duration },
    /// Detail endpoint resolved.
    DetailLoaded {
        job_id: JobId,
        result: Result<JobDetail, FetchFailure>,
        at: Duration,
    },
    /// Status endpoint resolved.
    StatusLoaded {
        job_id: JobId,
        result: Result<StatusReport, FetchFailure>,
        at: Duration,
    },
    /// A scheduled tick elapsed.
    TimerFired { job_id: JobId, at: Duration },
    /// View torn down.
    Cancel,
}
