//! Speech session: the explicitly constructed owner of all TTS state.
//!
//! A session owns the request store, the playback engine, the settings and
//! the "opener already auto-played" guard. Sites are created from a session
//! and keep it alive through a shared handle; tearing the session down with
//! [`SpeechSession::dispose`] (or dropping it) stops audio, cancels timers
//! and releases every cached handle.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tracing::info;

use questvoice_core::{
    AudioFactoryPort, DisplayedMessage, SettingsError, TtsEventEmitter, TtsSettings,
    TtsSettingsUpdate, validate_settings,
};

use crate::engine::{EngineConfig, PlaybackEngine};
use crate::site::SpeechSite;
use crate::store::RequestStore;

/// State shared between a session and its sites.
pub(crate) struct SessionShared {
    pub(crate) engine: Arc<PlaybackEngine>,
    pub(crate) factory: Arc<dyn AudioFactoryPort>,
    settings: RwLock<TtsSettings>,
    /// Story ids whose opening line already auto-played.
    openers: Mutex<HashSet<String>>,
}

impl SessionShared {
    fn settings(&self) -> TtsSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn voice_enabled(&self) -> bool {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .effective_voice_enabled()
    }

    pub(crate) fn settle_delay(&self) -> Duration {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .effective_settle_delay()
    }

    pub(crate) fn opener_played(&self, story_id: &str) -> bool {
        self.openers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(story_id)
    }

    /// Set the opener guard. Returns `false` if it was already set.
    pub(crate) fn claim_opener(&self, story_id: &str) -> bool {
        self.openers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(story_id.to_string())
    }
}

/// Owner of one play session's speech state.
pub struct SpeechSession {
    shared: Arc<SessionShared>,
}

impl std::fmt::Debug for SpeechSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechSession")
            .field("engine", &self.shared.engine)
            .field("settings", &self.shared.settings())
            .finish_non_exhaustive()
    }
}

impl SpeechSession {
    /// Validate settings and start a session.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create(
        settings: TtsSettings,
        factory: Arc<dyn AudioFactoryPort>,
        emitter: Arc<dyn TtsEventEmitter>,
    ) -> Result<Self, SettingsError> {
        validate_settings(&settings)?;

        let engine = PlaybackEngine::create(
            RequestStore::new(),
            EngineConfig::from_settings(&settings),
            emitter,
        );
        info!(
            target: "questvoice.session",
            voice_enabled = settings.effective_voice_enabled(),
            voice = settings.effective_voice_id(),
            "Speech session created"
        );

        Ok(Self {
            shared: Arc::new(SessionShared {
                engine,
                factory,
                settings: RwLock::new(settings),
                openers: Mutex::new(HashSet::new()),
            }),
        })
    }

    pub fn engine(&self) -> &Arc<PlaybackEngine> {
        &self.shared.engine
    }

    pub fn settings(&self) -> TtsSettings {
        self.shared.settings()
    }

    pub fn voice_enabled(&self) -> bool {
        self.shared.voice_enabled()
    }

    /// Apply a partial settings update.
    ///
    /// Only the voice switch and the settle delay can change on a live
    /// session. Engine timings and producer settings are fixed at creation,
    /// so an update that changes one of them is rejected with
    /// [`SettingsError::FixedAtCreation`].
    pub fn update_settings(&self, update: &TtsSettingsUpdate) -> Result<TtsSettings, SettingsError> {
        let current = self.shared.settings();
        let mut next = current.clone();
        next.merge(update);
        validate_settings(&next)?;
        if let Some(field) = changed_fixed_field(&current, &next) {
            return Err(SettingsError::FixedAtCreation { field });
        }

        let was_enabled = self.voice_enabled();
        *self
            .shared
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next.clone();

        if was_enabled && !next.effective_voice_enabled() {
            self.silence();
        }
        Ok(next)
    }

    /// Flip the global voice output switch.
    ///
    /// Turning voice off stops playback and drops queued requests.
    pub fn set_voice_enabled(&self, enabled: bool) {
        self.shared
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .voice_enabled = Some(enabled);
        if !enabled {
            self.silence();
        }
        info!(target: "questvoice.session", enabled, "Voice output toggled");
    }

    fn silence(&self) {
        self.shared.engine.discard_queued();
        self.shared.engine.stop_current();
    }

    /// Create the speech site for a displayed message.
    pub fn site(&self, message: DisplayedMessage) -> SpeechSite {
        SpeechSite::new(Arc::clone(&self.shared), message)
    }

    pub fn set_drained_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.shared.engine.set_drained_hook(hook);
    }

    /// Tear the session down. Idempotent.
    pub fn dispose(&self) {
        if self.shared.engine.is_disposed() {
            return;
        }
        self.shared.engine.dispose();
        self.shared
            .openers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        info!(target: "questvoice.session", "Speech session disposed");
    }
}

impl Drop for SpeechSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// First setting that differs between `current` and `next` but cannot be
/// applied after creation.
fn changed_fixed_field(current: &TtsSettings, next: &TtsSettings) -> Option<&'static str> {
    let durations = [
        ("load_timeout_ms", current.effective_load_timeout(), next.effective_load_timeout()),
        (
            "playback_timeout_ms",
            current.effective_playback_timeout(),
            next.effective_playback_timeout(),
        ),
        ("retry_backoff_ms", current.effective_retry_backoff(), next.effective_retry_backoff()),
        ("drain_delay_ms", current.effective_drain_delay(), next.effective_drain_delay()),
        (
            "readiness_timeout_ms",
            current.effective_readiness_timeout(),
            next.effective_readiness_timeout(),
        ),
    ];
    if current.effective_voice_id() != next.effective_voice_id() {
        return Some("voice_id");
    }
    if current.effective_model_id() != next.effective_model_id() {
        return Some("model_id");
    }
    if current.effective_max_attempts() != next.effective_max_attempts() {
        return Some("max_attempts");
    }
    if current.effective_max_audio_bytes() != next.effective_max_audio_bytes() {
        return Some("max_audio_bytes");
    }
    durations
        .into_iter()
        .find(|(_, before, after)| before != after)
        .map(|(field, _, _)| field)
}
