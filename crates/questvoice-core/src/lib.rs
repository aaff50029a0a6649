#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    AudioFuture, DisplayedMessage, MessageAuthor, ProduceAudio, SpeechRequest, SpeechRequestId,
    StoryContext,
};
pub use error::{GenerationError, TtsError, TtsErrorKind};
pub use events::{PlaybackStatus, TtsEvent};
pub use ports::{
    AudioClip, AudioFactoryPort, AudioHandle, AudioLoader, ChannelEmitter, CostLedgerPort,
    NoopCostLedger, NoopEmitter, PlaybackNotifier, PlaybackOutcome, PlaybackSignal, SharedAudio,
    SynthesisPort, SynthesisRequest, TtsEventEmitter,
};
pub use settings::{SettingsError, TtsSettings, TtsSettingsUpdate, validate_settings};

// Silence unused dev-dependency warnings until we add mock-based tests
#[cfg(test)]
use mockall as _;
