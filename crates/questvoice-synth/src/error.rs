//! Internal error types for the HTTP adapters.
//!
//! These never leave the crate: they are mapped to
//! [`GenerationError`] at the port boundary.

use questvoice_core::GenerationError;
use thiserror::Error;

pub type SynthResult<T> = Result<T, SynthError>;

#[derive(Debug, Error)]
pub enum SynthError {
    /// Non-2xx response. `message` is the JSON `error` field when present.
    #[error("endpoint returned {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx response whose content type is not audio.
    #[error("expected audio, got '{content_type}'")]
    NotAudio { content_type: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl SynthError {
    /// Map a synthesis failure.
    pub(crate) fn into_synthesis_error(self) -> GenerationError {
        match self {
            Self::Status { status, message } => GenerationError::Endpoint { status, message },
            Self::NotAudio { content_type } => GenerationError::NotAudio { content_type },
            Self::Network(e) => GenerationError::Network(e.to_string()),
            Self::InvalidUrl(e) => GenerationError::Network(e.to_string()),
        }
    }

    /// Map a cost-deduction failure. Every ledger failure aborts generation.
    pub(crate) fn into_deduction_error(self) -> GenerationError {
        match self {
            Self::Status { message, .. } => GenerationError::CostDeduction(message),
            other => GenerationError::CostDeduction(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_endpoint_error() {
        let err = SynthError::Status {
            status: 429,
            message: "rate limited".into(),
        };
        assert_eq!(
            err.into_synthesis_error(),
            GenerationError::Endpoint {
                status: 429,
                message: "rate limited".into()
            }
        );
    }

    #[test]
    fn test_ledger_failures_are_deduction_errors() {
        let status = SynthError::Status {
            status: 402,
            message: "insufficient balance".into(),
        };
        assert_eq!(
            status.into_deduction_error(),
            GenerationError::CostDeduction("insufficient balance".into())
        );

        let url = SynthError::InvalidUrl(url::ParseError::EmptyHost);
        assert!(matches!(
            url.into_deduction_error(),
            GenerationError::CostDeduction(_)
        ));
    }
}
