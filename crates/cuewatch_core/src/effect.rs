use std::time::Duration;

use crate::JobId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEffect {
    FetchDetail { job_id: JobId },
    FetchStatus { job_id: JobId },
    ScheduleTick { job_id: JobId, delay: Duration },
    CancelTimer,
}
