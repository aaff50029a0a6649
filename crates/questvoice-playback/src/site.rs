//! Per-message speech integration.
//!
//! A [`SpeechSite`] lives as long as its message is displayed. It builds the
//! stable [`SpeechRequest`] for the message, decides whether the message
//! should auto-play, exposes the manual play/pause toggle, and reports
//! indicator state for icon selection.
//!
//! # Autoplay eligibility
//!
//! All of:
//!
//! 1. voice output is enabled for the session
//! 2. the message is system-authored, complete, and not a placeholder
//! 3. it is the first system message of a freshly started story, or it is
//!    the latest message and this site has not fired yet
//! 4. its audio is not already cached
//! 5. for a story's opening message, the session's opener guard is unset
//!
//! An eligible message is enqueued as automatic after the settle delay. The
//! delay is cancelled when the site is unmounted or dropped.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use questvoice_core::{
    DisplayedMessage, ProduceAudio, SpeechRequest, SpeechRequestId, StoryContext,
};

use crate::engine::ToggleOutcome;
use crate::session::SessionShared;
use crate::timing::delay_unless_cancelled;

/// Why a render did or did not schedule autoplay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoplayDecision {
    /// Autoplay scheduled after the settle delay.
    Eligible,
    VoiceDisabled,
    /// User message, placeholder, or still streaming.
    NotSpeakable,
    /// Neither the fresh story's opener nor the latest message.
    NotCurrent,
    /// This site already fired autoplay.
    AlreadyFired,
    AlreadyCached,
    OpenerAlreadyPlayed,
    SessionDisposed,
}

/// Indicator state for one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechIndicator {
    pub playing: bool,
    /// This message is the engine's current cycle and still resolving.
    pub loading: bool,
    pub cached: bool,
    /// Generation in flight, whether or not the engine is waiting on it.
    pub pending: bool,
    pub played: bool,
}

/// Speech integration point for one displayed message.
pub struct SpeechSite {
    shared: Arc<SessionShared>,
    message: DisplayedMessage,
    request: SpeechRequest,
    fired: bool,
    unmount: CancellationToken,
}

impl std::fmt::Debug for SpeechSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSite")
            .field("id", &self.request.id)
            .field("position", &self.message.position)
            .field("fired", &self.fired)
            .finish_non_exhaustive()
    }
}

impl SpeechSite {
    pub(crate) fn new(shared: Arc<SessionShared>, message: DisplayedMessage) -> Self {
        let request = build_request(&shared, &message);
        Self {
            shared,
            message,
            request,
            fired: false,
            unmount: CancellationToken::new(),
        }
    }

    pub const fn id(&self) -> &SpeechRequestId {
        &self.request.id
    }

    pub const fn message(&self) -> &DisplayedMessage {
        &self.message
    }

    pub const fn has_fired(&self) -> bool {
        self.fired
    }

    /// Replace the displayed message (streamed chunks, edits).
    ///
    /// The request id follows the content; the fired flag is kept for the
    /// lifetime of the site.
    pub fn update(&mut self, message: DisplayedMessage) {
        if message.position != self.message.position || message.content != self.message.content {
            self.request = build_request(&self.shared, &message);
        }
        self.message = message;
    }

    /// Evaluate the autoplay rules without side effects.
    pub fn autoplay_decision(&self, story: &StoryContext) -> AutoplayDecision {
        let engine = &self.shared.engine;
        let position = self.message.position;

        if engine.is_disposed() {
            return AutoplayDecision::SessionDisposed;
        }
        if !self.shared.voice_enabled() {
            return AutoplayDecision::VoiceDisabled;
        }
        if !self.message.is_speakable() {
            return AutoplayDecision::NotSpeakable;
        }

        let fresh_opener = story.is_fresh_story && story.is_opener(position);
        if !fresh_opener {
            if !story.is_latest(position) {
                return AutoplayDecision::NotCurrent;
            }
            if self.fired {
                return AutoplayDecision::AlreadyFired;
            }
        }

        if engine.is_cached(&self.request.id) {
            return AutoplayDecision::AlreadyCached;
        }
        if story.is_opener(position) && self.shared.opener_played(&story.story_id) {
            return AutoplayDecision::OpenerAlreadyPlayed;
        }
        AutoplayDecision::Eligible
    }

    /// Apply the autoplay rules for this render.
    ///
    /// When eligible, marks the site fired, sets the opener guard and
    /// schedules an automatic enqueue after the settle delay. Must be called
    /// from within a tokio runtime.
    pub fn on_render(&mut self, story: &StoryContext) -> AutoplayDecision {
        let decision = self.autoplay_decision(story);
        if decision != AutoplayDecision::Eligible {
            return decision;
        }

        if story.is_opener(self.message.position) && !self.shared.claim_opener(&story.story_id) {
            return AutoplayDecision::OpenerAlreadyPlayed;
        }
        self.fired = true;

        let engine = Arc::clone(&self.shared.engine);
        let request = self.request.clone().automatic();
        let cancel = self.unmount.clone();
        let delay = self.shared.settle_delay();
        debug!(
            target: "questvoice.site",
            id = %request.id,
            delay_ms = delay.as_millis(),
            "Autoplay scheduled"
        );
        tokio::spawn(async move {
            if delay_unless_cancelled(delay, &cancel).await {
                let outcome = engine.enqueue(request);
                debug!(target: "questvoice.site", ?outcome, "Autoplay enqueued");
            }
        });
        decision
    }

    /// Manual play/pause.
    ///
    /// Returns `None` when the message has no speech control (user messages
    /// and placeholders). Users may always replay, even already played audio.
    pub fn toggle(&self) -> Option<ToggleOutcome> {
        if !self.message.is_system() || self.message.is_placeholder {
            return None;
        }
        Some(self.shared.engine.toggle(self.request.clone().manual()))
    }

    pub fn indicator(&self) -> SpeechIndicator {
        let engine = &self.shared.engine;
        let id = &self.request.id;
        SpeechIndicator {
            playing: engine.is_playing_request(id),
            loading: engine.is_loading_request(id),
            cached: engine.is_cached(id),
            pending: engine.is_pending(id),
            played: engine.was_played(id),
        }
    }

    /// Cancel any scheduled autoplay. Dropping the site does the same.
    pub fn unmount(self) {}
}

impl Drop for SpeechSite {
    fn drop(&mut self) {
        self.unmount.cancel();
    }
}

fn build_request(shared: &SessionShared, message: &DisplayedMessage) -> SpeechRequest {
    let id = SpeechRequestId::for_message(message.position, &message.content);
    let factory = Arc::clone(&shared.factory);
    let text = message.content.clone();
    let produce_id = id.clone();
    let produce: ProduceAudio = Arc::new(move || factory.produce(&produce_id, &text));
    SpeechRequest::new(id, produce, message.position)
}
