//! Cuewatch engine: HTTP status source and the async poll driver.
mod poller;
mod source;
mod types;
mod wire;

pub use poller::{JobPoller, JobWatcher, PollerHandle};
pub use source::{ApiSettings, ReqwestStatusSource, StatusSource};
pub use types::{FailureKind, FetchError};
