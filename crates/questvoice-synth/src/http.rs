//! Synthesis endpoint client.
//!
//! `POST {endpoint}` with `{ "text", "voiceId", "modelId" }`. A 2xx response
//! whose content type contains `audio` carries the clip; anything else is an
//! error, with the message taken from a JSON `{ "error" }` body when present.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use questvoice_core::{AudioClip, GenerationError, SynthesisPort, SynthesisRequest};

use crate::config::SynthClientConfig;
use crate::error::{SynthError, SynthResult};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Pull a readable message out of a failed response.
pub(crate) async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&body).map_or_else(
        |_| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body
            }
        },
        |parsed| parsed.error,
    )
}

pub(crate) fn build_client(
    timeout: std::time::Duration,
    user_agent: &str,
) -> SynthResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()?)
}

/// reqwest-backed [`SynthesisPort`].
#[derive(Debug, Clone)]
pub struct HttpSynthesisClient {
    http: reqwest::Client,
    endpoint: Url,
    token: Option<String>,
}

impl HttpSynthesisClient {
    pub fn new(config: &SynthClientConfig) -> Result<Self, GenerationError> {
        Self::build(config).map_err(SynthError::into_synthesis_error)
    }

    fn build(config: &SynthClientConfig) -> SynthResult<Self> {
        Ok(Self {
            http: build_client(config.timeout, &config.user_agent)?,
            endpoint: Url::parse(&config.endpoint)?,
            token: config.token.clone(),
        })
    }

    async fn fetch(&self, request: &SynthesisRequest) -> SynthResult<AudioClip> {
        let mut builder = self.http.post(self.endpoint.clone()).json(request);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthError::Status {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("audio") {
            // JSON errors can also arrive with a 2xx status
            let message = error_message(response).await;
            warn!(target: "questvoice.synth", %content_type, %message, "Synthesis returned non-audio body");
            return Err(SynthError::NotAudio { content_type });
        }

        let bytes = response.bytes().await?;
        debug!(target: "questvoice.synth", bytes = bytes.len(), %content_type, "Synthesis complete");
        Ok(AudioClip::new(bytes, content_type))
    }
}

#[async_trait]
impl SynthesisPort for HttpSynthesisClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioClip, GenerationError> {
        self.fetch(request)
            .await
            .map_err(SynthError::into_synthesis_error)
    }
}
