//! Cost deduction port.

use async_trait::async_trait;

use crate::domain::SpeechRequestId;
use crate::error::GenerationError;

/// Charges one cost unit for a generated speech request.
///
/// Callers guarantee at most one successful `deduct` per request id.
/// Failures must be reported as [`GenerationError::CostDeduction`].
#[async_trait]
pub trait CostLedgerPort: Send + Sync {
    async fn deduct(&self, id: &SpeechRequestId) -> Result<(), GenerationError>;
}

/// Ledger that never charges. Used when no billing endpoint is configured.
#[derive(Debug, Clone, Default)]
pub struct NoopCostLedger;

#[async_trait]
impl CostLedgerPort for NoopCostLedger {
    async fn deduct(&self, _id: &SpeechRequestId) -> Result<(), GenerationError> {
        Ok(())
    }
}
