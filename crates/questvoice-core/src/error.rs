//! Error taxonomy for speech generation and playback.
//!
//! Every failure that can happen between "a message wants audio" and "the
//! audio finished playing" is expressed as a [`TtsError`]. The playback engine
//! catches all of them at its boundary; UI code only ever sees status fields,
//! `last_error` strings and `RequestFailed` events.
//!
//! Both error types are `Clone` because a single in-flight generation is
//! shared between every caller waiting on the same request id.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the TTS pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TtsError {
    /// Audio could not be generated (synthesis, validation or cost deduction).
    #[error("Speech generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Audio was fetched but never became playable in time.
    #[error("Audio did not become playable within {}ms", .0.as_millis())]
    LoadTimeout(Duration),

    /// Playback started but never signalled completion.
    #[error("Playback did not complete within {}s", .0.as_secs())]
    PlaybackTimeout(Duration),

    /// The audio output reported an error mid-play.
    #[error("Audio output error: {0}")]
    PlaybackRuntime(String),

    /// The owning speech session was torn down.
    #[error("Speech session has been disposed")]
    Disposed,
}

/// Coarse classification used for logging and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsErrorKind {
    Generation,
    LoadTimeout,
    PlaybackTimeout,
    PlaybackRuntime,
    Disposed,
}

impl TtsError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> TtsErrorKind {
        match self {
            Self::Generation(_) => TtsErrorKind::Generation,
            Self::LoadTimeout(_) => TtsErrorKind::LoadTimeout,
            Self::PlaybackTimeout(_) => TtsErrorKind::PlaybackTimeout,
            Self::PlaybackRuntime(_) => TtsErrorKind::PlaybackRuntime,
            Self::Disposed => TtsErrorKind::Disposed,
        }
    }

    /// Whether the engine's retry policy applies.
    ///
    /// Everything except teardown is retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Disposed)
    }
}

/// Reasons audio generation can fail.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// Nothing left to speak after sanitizing the message text.
    #[error("Message has no speakable text")]
    EmptyText,

    /// The synthesis endpoint answered with an error status.
    #[error("Synthesis endpoint returned {status}: {message}")]
    Endpoint { status: u16, message: String },

    /// The synthesis endpoint could not be reached.
    #[error("Synthesis request failed: {0}")]
    Network(String),

    /// The endpoint answered 2xx but not with audio.
    #[error("Expected audio content, got '{content_type}'")]
    NotAudio { content_type: String },

    /// The endpoint answered with an empty body.
    #[error("Synthesis returned an empty audio payload")]
    EmptyPayload,

    /// The audio payload exceeded the configured ceiling.
    #[error("Audio payload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    /// Charging for the generation failed; no audio is produced.
    #[error("Cost deduction failed: {0}")]
    CostDeduction(String),

    /// The payload could not be decoded into playable audio.
    #[error("Audio could not be decoded: {0}")]
    Undecodable(String),
}
