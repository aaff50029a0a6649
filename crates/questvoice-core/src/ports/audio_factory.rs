//! Audio production port used by speech sites to build `produce_audio`.

use crate::domain::{AudioFuture, SpeechRequestId};

/// Produces playable audio for a message's text.
///
/// The returned future performs the whole pipeline (sanitize, synthesize,
/// validate, charge, load). It is lazy: nothing happens until polled.
pub trait AudioFactoryPort: Send + Sync {
    fn produce(&self, id: &SpeechRequestId, text: &str) -> AudioFuture;
}
