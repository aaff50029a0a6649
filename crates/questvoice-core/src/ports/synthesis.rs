//! Text-to-speech synthesis backend port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::audio::AudioClip;
use crate::error::GenerationError;

/// Body sent to the synthesis endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
}

/// Synthesizes speech for already-sanitized text.
///
/// Implementations return the raw audio payload; size and emptiness checks
/// belong to the caller.
#[async_trait]
pub trait SynthesisPort: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioClip, GenerationError>;
}
