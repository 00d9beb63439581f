use std::fmt;

pub type JobId = String;

/// Message used when either endpoint answers 404.
pub const NOT_FOUND_MESSAGE: &str = "Analysis not found";
/// Message used when the server reports `error` without saying why.
pub const DEFAULT_JOB_ERROR: &str = "Analysis failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Processing,
    Complete,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Complete => write!(f, "complete"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// Sub-phase of a processing job. Display only; never gates polling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stage(String);

impl Stage {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human label for known stage ids; unknown ids are shown verbatim.
    pub fn label(&self) -> &str {
        match self.0.as_str() {
            "parsing_demo" => "Parsing replay",
            "uploading_video" => "Uploading video",
            "analyzing" => "Analyzing gameplay",
            "validating" => "Validating tips",
            "generating_thumbnail" => "Generating thumbnail",
            "generating_audio" => "Generating voice-over",
            other => other,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A timestamped annotation on the media timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Tip {
    pub timestamp_seconds: f64,
    pub timestamp_display: Option<String>,
    pub text: String,
    pub category: String,
    pub reasoning: Option<String>,
    pub confidence: Option<f64>,
    /// Inline clip reference, used when the parallel audio list has no entry.
    pub audio_url: Option<String>,
}

impl Tip {
    pub fn new(timestamp_seconds: f64, text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            timestamp_seconds,
            timestamp_display: None,
            text: text.into(),
            category: category.into(),
            reasoning: None,
            confidence: None,
            audio_url: None,
        }
    }
}

/// Lightweight status endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: JobStatus,
    pub stage: Option<Stage>,
    pub error: Option<String>,
}

impl StatusReport {
    pub fn processing(stage: Option<&str>) -> Self {
        Self {
            status: JobStatus::Processing,
            stage: stage.map(Stage::new),
            error: None,
        }
    }

    pub fn complete() -> Self {
        Self {
            status: JobStatus::Complete,
            stage: None,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Error,
            stage: None,
            error: Some(message.into()),
        }
    }
}

/// Full detail endpoint response.
///
/// `audio_urls[i]` belongs to `tips[i]`; an empty string marks a tip without audio.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDetail {
    pub id: JobId,
    pub status: JobStatus,
    pub title: Option<String>,
    pub media_url: Option<String>,
    pub tips: Vec<Tip>,
    pub audio_urls: Vec<String>,
    pub error: Option<String>,
}

impl JobDetail {
    pub fn new(id: impl Into<JobId>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
            title: None,
            media_url: None,
            tips: Vec::new(),
            audio_urls: Vec::new(),
            error: None,
        }
    }
}

/// What the controller needs to know about a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    NotFound,
    Transient(String),
}

/// Terminal errors surfaced to the view layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollError {
    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,
    #[error("{0}")]
    JobFailed(String),
}
