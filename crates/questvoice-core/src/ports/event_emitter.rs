//! Event emitter trait for TTS state broadcasting.
//!
//! Implementations handle transport details (channels, UI bridges, logs).

use tokio::sync::mpsc;

use crate::events::TtsEvent;

/// Trait for emitting TTS events.
///
/// # Implementations
///
/// - `NoopEmitter` - For tests and contexts without a listener
/// - `ChannelEmitter` - Forwards into an unbounded tokio channel
pub trait TtsEventEmitter: Send + Sync {
    /// Emit an event. Must not block.
    fn emit(&self, event: TtsEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn TtsEventEmitter>;
}

/// A no-op event emitter.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    pub const fn new() -> Self {
        Self
    }
}

impl TtsEventEmitter for NoopEmitter {
    fn emit(&self, _event: TtsEvent) {}

    fn clone_box(&self) -> Box<dyn TtsEventEmitter> {
        Box::new(self.clone())
    }
}

/// Emitter that forwards events into an unbounded channel.
///
/// Events emitted after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<TtsEvent>,
}

impl ChannelEmitter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TtsEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TtsEventEmitter for ChannelEmitter {
    fn emit(&self, event: TtsEvent) {
        let _ = self.tx.send(event);
    }

    fn clone_box(&self) -> Box<dyn TtsEventEmitter> {
        Box::new(self.clone())
    }
}
