//! The audio factory handed to speech sites.
//!
//! For each generation [`SpeechProducer`] runs, in order:
//!
//! 1. sanitize the message text (empty after sanitizing is an error)
//! 2. call the synthesis endpoint
//! 3. validate the payload is non-empty and within the size ceiling
//! 4. load a playable handle under the readiness timeout
//! 5. deduct cost, once per distinct request id
//!
//! Audio that never becomes playable is never charged. A failed deduction
//! releases the loaded handle and aborts the generation, so nothing is
//! cached for it.
//! Cache hits and replays never reach the producer and are never charged.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use questvoice_core::{
    AudioFactoryPort, AudioFuture, AudioLoader, CostLedgerPort, GenerationError, SharedAudio,
    SpeechRequestId, SynthesisPort, SynthesisRequest, TtsError, TtsSettings,
};

use crate::text::sanitize_for_speech;

struct ProducerInner {
    synth: Arc<dyn SynthesisPort>,
    ledger: Arc<dyn CostLedgerPort>,
    loader: Arc<dyn AudioLoader>,
    voice_id: String,
    model_id: String,
    max_audio_bytes: usize,
    readiness_timeout: Duration,
    /// Ids already charged in this session.
    charged: Mutex<HashSet<SpeechRequestId>>,
}

/// Synthesis-backed [`AudioFactoryPort`].
#[derive(Clone)]
pub struct SpeechProducer {
    inner: Arc<ProducerInner>,
}

impl fmt::Debug for SpeechProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechProducer")
            .field("voice_id", &self.inner.voice_id)
            .field("model_id", &self.inner.model_id)
            .field("max_audio_bytes", &self.inner.max_audio_bytes)
            .field("readiness_timeout", &self.inner.readiness_timeout)
            .finish_non_exhaustive()
    }
}

impl SpeechProducer {
    pub fn new(
        synth: Arc<dyn SynthesisPort>,
        ledger: Arc<dyn CostLedgerPort>,
        loader: Arc<dyn AudioLoader>,
        settings: &TtsSettings,
    ) -> Self {
        Self {
            inner: Arc::new(ProducerInner {
                synth,
                ledger,
                loader,
                voice_id: settings.effective_voice_id().to_string(),
                model_id: settings.effective_model_id().to_string(),
                max_audio_bytes: settings.effective_max_audio_bytes(),
                readiness_timeout: settings.effective_readiness_timeout(),
                charged: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Whether `id` has been charged.
    pub fn is_charged(&self, id: &SpeechRequestId) -> bool {
        self.inner.charged().contains(id)
    }

    /// Run one generation to completion.
    pub async fn generate(&self, id: &SpeechRequestId, text: &str) -> Result<SharedAudio, TtsError> {
        self.inner.generate(id, text).await
    }
}

impl ProducerInner {
    fn charged(&self) -> std::sync::MutexGuard<'_, HashSet<SpeechRequestId>> {
        self.charged.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn generate(&self, id: &SpeechRequestId, text: &str) -> Result<SharedAudio, TtsError> {
        let text = sanitize_for_speech(text);
        if text.is_empty() {
            return Err(GenerationError::EmptyText.into());
        }

        info!(target: "questvoice.synth", %id, chars = text.len(), voice = %self.voice_id, "Generating speech");
        let request = SynthesisRequest {
            text,
            voice_id: self.voice_id.clone(),
            model_id: self.model_id.clone(),
        };
        let clip = self.synth.synthesize(&request).await?;

        if clip.is_empty() {
            return Err(GenerationError::EmptyPayload.into());
        }
        if clip.len() > self.max_audio_bytes {
            return Err(GenerationError::TooLarge {
                size: clip.len(),
                limit: self.max_audio_bytes,
            }
            .into());
        }

        let audio = tokio::time::timeout(self.readiness_timeout, self.loader.load(clip))
            .await
            .map_err(|_| TtsError::LoadTimeout(self.readiness_timeout))??;

        // Charge only for audio that is confirmed playable
        let already_charged = self.charged().contains(id);
        if !already_charged {
            if let Err(e) = self.ledger.deduct(id).await {
                audio.release();
                return Err(e.into());
            }
            self.charged().insert(id.clone());
        }
        debug!(target: "questvoice.synth", %id, charged = !already_charged, "Audio ready");
        Ok(audio)
    }
}

impl AudioFactoryPort for SpeechProducer {
    fn produce(&self, id: &SpeechRequestId, text: &str) -> AudioFuture {
        let inner = Arc::clone(&self.inner);
        let id = id.clone();
        let text = text.to_string();
        Box::pin(async move { inner.generate(&id, &text).await })
    }
}
