//! JSON shapes returned by the analysis API.
//!
//! Field names follow the backend (`snake_case`); camelCase aliases are
//! accepted so a proxy that renames fields still decodes.

use cuewatch_core::{JobDetail, JobStatus, Stage, StatusReport, Tip};
use serde::Deserialize;

/// Missing status means an older record that predates job tracking: complete.
/// Unrecognized values keep the client polling.
fn job_status(status: Option<&str>) -> JobStatus {
    match status {
        None | Some("complete") => JobStatus::Complete,
        Some("error") => JobStatus::Error,
        Some(_) => JobStatus::Processing,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusPayload {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl From<StatusPayload> for StatusReport {
    fn from(payload: StatusPayload) -> Self {
        let status = job_status(payload.status.as_deref());
        let stage = match status {
            JobStatus::Processing => payload.stage.filter(|s| !s.is_empty()).map(Stage::new),
            _ => None,
        };
        StatusReport {
            status,
            stage,
            error: payload.error,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TipPayload {
    #[serde(alias = "timestampSeconds")]
    timestamp_seconds: f64,
    #[serde(default, alias = "timestampDisplay")]
    timestamp_display: Option<String>,
    #[serde(alias = "text")]
    tip: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default, alias = "audioUrl")]
    audio_url: Option<String>,
}

impl From<TipPayload> for Tip {
    fn from(payload: TipPayload) -> Self {
        Tip {
            timestamp_seconds: payload.timestamp_seconds,
            timestamp_display: payload.timestamp_display,
            text: payload.tip,
            category: payload.category.unwrap_or_default(),
            reasoning: payload.reasoning,
            confidence: payload.confidence,
            audio_url: payload.audio_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailPayload {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(
        default,
        alias = "videoSignedUrl",
        alias = "media_url",
        alias = "mediaUrl"
    )]
    video_signed_url: Option<String>,
    #[serde(default)]
    tips: Option<Vec<TipPayload>>,
    #[serde(default, alias = "audioUrls")]
    audio_urls: Option<Vec<Option<String>>>,
    #[serde(default)]
    error: Option<String>,
}

impl DetailPayload {
    /// `requested_id` stands in when the payload omits its own id.
    pub(crate) fn into_detail(self, requested_id: &str) -> JobDetail {
        JobDetail {
            id: self.id.unwrap_or_else(|| requested_id.to_string()),
            status: job_status(self.status.as_deref()),
            title: self.title,
            media_url: self.video_signed_url.filter(|url| !url.is_empty()),
            tips: self
                .tips
                .unwrap_or_default()
                .into_iter()
                .map(Tip::from)
                .collect(),
            // Null entries keep their slot so indices stay aligned with `tips`.
            audio_urls: self
                .audio_urls
                .unwrap_or_default()
                .into_iter()
                .map(Option::unwrap_or_default)
                .collect(),
            error: self.error,
        }
    }
}
