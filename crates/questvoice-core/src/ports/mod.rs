//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces the playback engine and speech sites expect
//! from infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No HTTP or audio-device types in any signature
//! - Only the playback engine calls [`AudioHandle::start`] / [`AudioHandle::stop`]
//! - Adapters map their own errors into [`crate::GenerationError`]

pub mod audio;
pub mod audio_factory;
pub mod cost_ledger;
pub mod event_emitter;
pub mod synthesis;

pub use audio::{
    AudioClip, AudioHandle, AudioLoader, PlaybackNotifier, PlaybackOutcome, PlaybackSignal,
    SharedAudio,
};
pub use audio_factory::AudioFactoryPort;
pub use cost_ledger::{CostLedgerPort, NoopCostLedger};
pub use event_emitter::{ChannelEmitter, NoopEmitter, TtsEventEmitter};
pub use synthesis::{SynthesisPort, SynthesisRequest};
