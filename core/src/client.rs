use reqwest::StatusCode;
use serde::Serialize;
use tracing::trace;

use crate::config::ScanConfig;
use crate::error::Error;
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Wire shape of one scan request. The gateway picks the model; callers
/// only steer the token budget and temperature.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub format: &'static str,
    pub stream: bool,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>, llm_max_tokens: u32, llm_temperature: f32) -> Self {
        Self {
            messages,
            format: "json",
            stream: false,
            llm_max_tokens,
            llm_temperature,
        }
    }
}

/// One gateway reply: the status plus the body as untrusted text, no
/// matter what content type the gateway claims.
#[derive(Debug)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Transient gateway conditions worth retrying with a smaller payload.
/// Anything else in the error range means shrinking will not help.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Thin HTTP client for the scan gateway. Stateless per request; safe to
/// share between sequential calls of one driver.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// POST one chat request. Transport failures surface as
    /// [`Error::Http`]; every HTTP status comes back as a
    /// [`GatewayResponse`] for the caller to triage.
    pub async fn chat(&self, request: &ChatRequest) -> Result<GatewayResponse> {
        let url = format!("{}/v1/crs/run", self.base_url);
        trace!(url = %url, messages = request.messages.len(), "posting scan request");
        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok(GatewayResponse { status, body })
    }

    /// Liveness probe; a run can check the gateway once before burning
    /// through a file list.
    pub async fn healthz(&self) -> Result<()> {
        let url = format!("{}/healthz", self.base_url);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::UnexpectedStatus {
                status,
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}
