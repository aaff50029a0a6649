//! Playable audio handles and the loaders that produce them.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::oneshot;

use crate::error::TtsError;

/// How a started playback ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Played through to the end.
    Ended,
    /// The output reported an error mid-play.
    Failed(String),
}

/// Completion signal returned by [`AudioHandle::start`].
#[derive(Debug)]
pub struct PlaybackSignal {
    rx: oneshot::Receiver<PlaybackOutcome>,
}

/// Sending half of a [`PlaybackSignal`], held by the output.
#[derive(Debug)]
pub struct PlaybackNotifier {
    tx: oneshot::Sender<PlaybackOutcome>,
}

impl PlaybackSignal {
    /// Create a linked notifier/signal pair.
    #[must_use]
    pub fn channel() -> (PlaybackNotifier, Self) {
        let (tx, rx) = oneshot::channel();
        (PlaybackNotifier { tx }, Self { rx })
    }

    /// A signal that has already fired.
    #[must_use]
    pub fn resolved(outcome: PlaybackOutcome) -> Self {
        let (notifier, signal) = Self::channel();
        notifier.notify(outcome);
        signal
    }

    /// Wait for playback to finish.
    ///
    /// A notifier dropped without reporting counts as a runtime failure.
    pub async fn wait(self) -> PlaybackOutcome {
        self.rx.await.unwrap_or_else(|_| {
            PlaybackOutcome::Failed("audio output went away before playback finished".into())
        })
    }
}

impl PlaybackNotifier {
    /// Report the outcome. Ignored if nobody is listening anymore.
    pub fn notify(self, outcome: PlaybackOutcome) {
        let _ = self.tx.send(outcome);
    }
}

/// A loaded, playable unit of audio.
///
/// Handles are opaque to the engine. Cached handles are owned by the request
/// store and may be started again for replay after a `stop`.
pub trait AudioHandle: Send + Sync + Debug {
    /// Start playback from the beginning.
    fn start(&self) -> Result<PlaybackSignal, TtsError>;

    /// Pause and rewind. A pending completion signal may be dropped.
    fn stop(&self);

    /// Free underlying resources. The handle is unusable afterwards.
    fn release(&self);
}

/// Shared handle as stored in the cache and handed to the engine.
pub type SharedAudio = Arc<dyn AudioHandle>;

/// Raw audio bytes returned by a synthesis backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Bytes,
    pub content_type: String,
}

impl AudioClip {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Turns fetched audio bytes into a playable handle.
///
/// Implementations resolve only once the audio is confirmed playable
/// (decoded, written, or otherwise ready), not merely received.
#[async_trait]
pub trait AudioLoader: Send + Sync {
    async fn load(&self, clip: AudioClip) -> Result<SharedAudio, TtsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_signal() {
        let outcome = tokio_test::block_on(PlaybackSignal::resolved(PlaybackOutcome::Ended).wait());
        assert_eq!(outcome, PlaybackOutcome::Ended);
    }

    #[tokio::test]
    async fn test_dropped_notifier_is_failure() {
        let (notifier, signal) = PlaybackSignal::channel();
        drop(notifier);
        assert!(matches!(signal.wait().await, PlaybackOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_notify_after_signal_dropped_is_ignored() {
        let (notifier, signal) = PlaybackSignal::channel();
        drop(signal);
        notifier.notify(PlaybackOutcome::Ended);
    }

    #[test]
    fn test_clip_len() {
        let clip = AudioClip::new(vec![1u8, 2, 3], "audio/mpeg");
        assert_eq!(clip.len(), 3);
        assert!(!clip.is_empty());
        assert!(AudioClip::new(Vec::new(), "audio/mpeg").is_empty());
    }
}
