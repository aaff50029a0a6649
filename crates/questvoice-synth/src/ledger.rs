//! Cost-deduction client.
//!
//! `POST {endpoint}` with `{ "requestId", "units" }` and an `Idempotency-Key`
//! header equal to the request id, so a retried deduction is never charged
//! twice server-side.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use questvoice_core::{CostLedgerPort, GenerationError, SpeechRequestId};

use crate::config::LedgerClientConfig;
use crate::error::{SynthError, SynthResult};
use crate::http::{build_client, error_message};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeductBody<'a> {
    request_id: &'a str,
    units: u32,
}

/// reqwest-backed [`CostLedgerPort`].
#[derive(Debug, Clone)]
pub struct HttpCostLedger {
    http: reqwest::Client,
    endpoint: Url,
    token: Option<String>,
    units: u32,
}

impl HttpCostLedger {
    pub fn new(config: &LedgerClientConfig) -> Result<Self, GenerationError> {
        Self::build(config).map_err(SynthError::into_deduction_error)
    }

    fn build(config: &LedgerClientConfig) -> SynthResult<Self> {
        Ok(Self {
            http: build_client(config.timeout, concat!("questvoice/", env!("CARGO_PKG_VERSION")))?,
            endpoint: Url::parse(&config.endpoint)?,
            token: config.token.clone(),
            units: config.units,
        })
    }

    async fn post(&self, id: &SpeechRequestId) -> SynthResult<()> {
        let body = DeductBody {
            request_id: id.as_str(),
            units: self.units,
        };
        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .header("Idempotency-Key", id.as_str())
            .json(&body);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            debug!(target: "questvoice.ledger", %id, units = self.units, "Cost deducted");
            return Ok(());
        }

        let message = error_message(response).await;
        warn!(target: "questvoice.ledger", %id, status = status.as_u16(), %message, "Cost deduction rejected");
        Err(SynthError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl CostLedgerPort for HttpCostLedger {
    async fn deduct(&self, id: &SpeechRequestId) -> Result<(), GenerationError> {
        self.post(id).await.map_err(SynthError::into_deduction_error)
    }
}
