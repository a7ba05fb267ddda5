//! Remote backend: the stateless ATS service over HTTP.
//!
//! One attempt per call. The configured timeout is the whole-request deadline.

use std::time::Duration;

use async_trait::async_trait;
use ats_engine::ATSEvaluationResponse;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{BackendError, BackendKind, EvaluationBackend};

const EVALUATE_PATH: &str = "/api/v1/ats/evaluate";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateBody<'a> {
    resume_text: &'a str,
    job_description_text: &'a str,
}

/// `{"error": {"code", "message"}}` as emitted by the service.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Clone)]
pub struct RemoteBackend {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl RemoteBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}{EVALUATE_PATH}", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else {
            BackendError::Unavailable(format!("request to {} failed: {err}", self.endpoint))
        }
    }
}

#[async_trait]
impl EvaluationBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn evaluate(
        &self,
        resume_text: &str,
        jd_text: &str,
    ) -> Result<ATSEvaluationResponse, BackendError> {
        debug!("POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&EvaluateBody {
                resume_text,
                job_description_text: jd_text,
            })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<ATSEvaluationResponse>()
                .await
                .map_err(|e| match self.transport_error(e) {
                    BackendError::Unavailable(message) => {
                        BackendError::Unavailable(format!("malformed response body: {message}"))
                    }
                    other => other,
                });
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| {
                debug!("Remote error code {}", e.error.code);
                e.error.message
            })
            .unwrap_or(body);

        match status {
            StatusCode::BAD_REQUEST => Err(BackendError::Validation(message)),
            StatusCode::UNPROCESSABLE_ENTITY => Err(BackendError::Parse(message)),
            _ => {
                warn!("Remote backend returned {status}: {message}");
                Err(BackendError::Unavailable(format!(
                    "remote returned {status}: {message}"
                )))
            }
        }
    }
}
