#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod engine;
pub mod output;
pub mod queue;
pub mod session;
pub mod site;
pub mod store;
pub mod timing;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{EngineConfig, EngineSnapshot, EnqueueOutcome, PlaybackEngine, ToggleOutcome};
pub use output::FileOutput;
#[cfg(feature = "local-output")]
pub use output::SpeakerOutput;
pub use queue::SpeechQueue;
pub use session::SpeechSession;
pub use site::{AutoplayDecision, SpeechIndicator, SpeechSite};
pub use store::{PendingAudio, RequestStore};
pub use timing::delay_unless_cancelled;

// Silence unused dev-dependency warnings for deps only used by integration tests
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tokio_test as _;
