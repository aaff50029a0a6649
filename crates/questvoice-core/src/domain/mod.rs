//! Domain types for speech requests and the story messages they belong to.
//!
//! These are pure data types; nothing here performs I/O or touches audio.

mod message;
mod speech;

pub use message::{DisplayedMessage, MessageAuthor, StoryContext};
pub use speech::{AudioFuture, ProduceAudio, SpeechRequest, SpeechRequestId};
