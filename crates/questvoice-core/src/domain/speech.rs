//! Speech request identity and the request descriptor handed to the engine.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TtsError;
use crate::ports::SharedAudio;

/// Number of hex characters of the content digest kept in an id.
const FINGERPRINT_LEN: usize = 12;

/// Stable identity of one logical speech request.
///
/// Built from the message position plus a fingerprint of its content, so the
/// same message always maps to the same id across re-renders while edited or
/// regenerated content gets a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeechRequestId(String);

impl SpeechRequestId {
    /// Wrap an arbitrary id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the id for a displayed message.
    #[must_use]
    pub fn for_message(position: usize, content: &str) -> Self {
        let digest = Sha256::digest(content.as_bytes());
        let fingerprint: String = digest
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>()
            .chars()
            .take(FINGERPRINT_LEN)
            .collect();
        Self(format!("msg-{position}-{fingerprint}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeechRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpeechRequestId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Future resolving to a playable handle.
pub type AudioFuture = Pin<Box<dyn Future<Output = Result<SharedAudio, TtsError>> + Send>>;

/// Lazy audio factory. Only invoked when nothing is cached or in flight.
pub type ProduceAudio = Arc<dyn Fn() -> AudioFuture + Send + Sync>;

/// A request to produce and play audio for one displayed message.
///
/// Callers construct a fresh descriptor every time they want audio; the
/// engine and request store key everything off [`SpeechRequest::id`].
#[derive(Clone)]
pub struct SpeechRequest {
    pub id: SpeechRequestId,
    pub produce_audio: ProduceAudio,
    /// Message position. Diagnostics only.
    pub priority_index: usize,
    /// `true` for autoplay, `false` for a user click.
    pub is_automatic: bool,
}

impl SpeechRequest {
    pub fn new(id: SpeechRequestId, produce_audio: ProduceAudio, priority_index: usize) -> Self {
        Self {
            id,
            produce_audio,
            priority_index,
            is_automatic: false,
        }
    }

    /// Tag this request as autoplay.
    #[must_use]
    pub const fn automatic(mut self) -> Self {
        self.is_automatic = true;
        self
    }

    /// Tag this request as user-triggered.
    #[must_use]
    pub const fn manual(mut self) -> Self {
        self.is_automatic = false;
        self
    }
}

impl fmt::Debug for SpeechRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechRequest")
            .field("id", &self.id)
            .field("priority_index", &self.priority_index)
            .field("is_automatic", &self.is_automatic)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never_called() -> ProduceAudio {
        Arc::new(|| Box::pin(async { Err(TtsError::Disposed) }))
    }

    #[test]
    fn test_id_stable_for_same_content() {
        let a = SpeechRequestId::for_message(3, "The door creaks open.");
        let b = SpeechRequestId::for_message(3, "The door creaks open.");
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("msg-3-"));
        assert_eq!(a.as_str().len(), "msg-3-".len() + FINGERPRINT_LEN);
    }

    #[test]
    fn test_id_differs_for_content_and_position() {
        let base = SpeechRequestId::for_message(3, "The door creaks open.");
        assert_ne!(base, SpeechRequestId::for_message(3, "The door slams shut."));
        assert_ne!(base, SpeechRequestId::for_message(4, "The door creaks open."));
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = SpeechRequestId::new("m1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"m1\"");
    }

    #[test]
    fn test_request_flags() {
        let req = SpeechRequest::new("m1".into(), never_called(), 0);
        assert!(!req.is_automatic);
        let req = req.automatic();
        assert!(req.is_automatic);
        assert!(!req.manual().is_automatic);
    }

    #[test]
    fn test_request_debug_omits_factory() {
        let req = SpeechRequest::new("m1".into(), never_called(), 7);
        let dbg = format!("{req:?}");
        assert!(dbg.contains("m1"));
        assert!(dbg.contains("priority_index: 7"));
    }
}
