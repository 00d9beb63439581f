use std::time::Duration;

use cuewatch_core::{JobDetail, StatusReport};
use cuewatch_logging::cw_trace;
use serde::de::DeserializeOwned;
use url::Url;

use crate::wire::{DetailPayload, StatusPayload};
use crate::{FailureKind, FetchError};

const JOB_ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Path template for the lightweight status endpoint; `{id}` is the job id.
    pub status_path: String,
    /// Path template for the full detail endpoint.
    pub detail_path: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            status_path: "/api/analysis/{id}/status".to_string(),
            detail_path: "/api/analysis/{id}".to_string(),
        }
    }
}

/// Remote job status endpoints.
#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &str) -> Result<StatusReport, FetchError>;

    async fn fetch_detail(&self, job_id: &str) -> Result<JobDetail, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestStatusSource {
    settings: ApiSettings,
    client: reqwest::Client,
}

impl ReqwestStatusSource {
    pub fn new(settings: ApiSettings) -> Result<Self, FetchError> {
        parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// Expands a path template onto the base url, encoding the job id as one segment.
    pub fn endpoint(&self, template: &str, job_id: &str) -> Result<Url, FetchError> {
        let mut url = parse_base_url(&self.settings.base_url)?;
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                FetchError::new(FailureKind::InvalidUrl, "base url cannot carry a path")
            })?;
            segments.pop_if_empty();
            for part in template.split('/').filter(|part| !part.is_empty()) {
                if part == JOB_ID_PLACEHOLDER {
                    segments.push(job_id);
                } else {
                    segments.push(part);
                }
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        cw_trace!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::new(FailureKind::NotFound, status.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&body)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl StatusSource for ReqwestStatusSource {
    async fn fetch_status(&self, job_id: &str) -> Result<StatusReport, FetchError> {
        let url = self.endpoint(&self.settings.status_path, job_id)?;
        let payload: StatusPayload = self.get_json(url).await?;
        Ok(payload.into())
    }

    async fn fetch_detail(&self, job_id: &str) -> Result<JobDetail, FetchError> {
        let url = self.endpoint(&self.settings.detail_path, job_id)?;
        let payload: DetailPayload = self.get_json(url).await?;
        Ok(payload.into_detail(job_id))
    }
}

/// Only http(s) urls that can carry a path are usable as a base.
fn parse_base_url(base_url: &str) -> Result<Url, FetchError> {
    let url = Url::parse(base_url)
        .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(FetchError::new(
            FailureKind::InvalidUrl,
            format!("expected an http or https base url, got {base_url:?}"),
        ));
    }
    Ok(url)
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return FetchError::new(FailureKind::Decode, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
