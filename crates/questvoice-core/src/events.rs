//! Event union observed by UI layers.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "request_failed", "requestId": "msg-3-1a2b3c4d5e6f", "error": "...", "attempt": 1, "willRetry": true }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::SpeechRequestId;

/// Engine status as shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    #[default]
    Idle,
    /// Resolving audio for the current request.
    Loading,
    Playing,
    /// The last request played through. Transient; followed by `Idle` or `Loading`.
    Completed,
    /// The last request failed terminally.
    Error,
}

impl PlaybackStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events emitted by the playback engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TtsEvent {
    /// Engine status changed.
    StatusChanged { status: PlaybackStatus },

    /// A request was appended to the queue.
    RequestQueued {
        #[serde(rename = "requestId")]
        request_id: SpeechRequestId,
        /// Zero-based queue position after insertion.
        position: usize,
    },

    /// A handle started playing.
    PlaybackStarted {
        #[serde(rename = "requestId")]
        request_id: SpeechRequestId,
        /// Replayed from cache rather than freshly generated.
        cached: bool,
    },

    /// A handle played through to the end.
    PlaybackFinished {
        #[serde(rename = "requestId")]
        request_id: SpeechRequestId,
    },

    /// Playback (or loading) was stopped by the user or a preempting toggle.
    PlaybackStopped {
        #[serde(rename = "requestId")]
        request_id: SpeechRequestId,
    },

    /// An attempt failed.
    RequestFailed {
        #[serde(rename = "requestId")]
        request_id: SpeechRequestId,
        error: String,
        attempt: u32,
        #[serde(rename = "willRetry")]
        will_retry: bool,
    },

    /// The drained hook delay elapsed with nothing left to play.
    QueueDrained,
}

impl TtsEvent {
    /// Event name as used in the wire `type` tag.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::StatusChanged { .. } => "status_changed",
            Self::RequestQueued { .. } => "request_queued",
            Self::PlaybackStarted { .. } => "playback_started",
            Self::PlaybackFinished { .. } => "playback_finished",
            Self::PlaybackStopped { .. } => "playback_stopped",
            Self::RequestFailed { .. } => "request_failed",
            Self::QueueDrained => "queue_drained",
        }
    }

    /// Convenience constructor for status changes.
    pub const fn status(status: PlaybackStatus) -> Self {
        Self::StatusChanged { status }
    }
}
