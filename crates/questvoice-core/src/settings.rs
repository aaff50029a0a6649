//! TTS settings domain types and validation.
//!
//! All durations are stored as milliseconds so the struct stays trivially
//! serializable; `effective_*` getters hand out [`Duration`]s.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Resolving audio must finish within this window.
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 30_000;

/// A started playback must signal completion within this window.
pub const DEFAULT_PLAYBACK_TIMEOUT_MS: u64 = 300_000;

/// Total attempts per request, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry back-off unit; attempt `n` waits `n * unit`.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1_000;

/// Delay between the queue draining and the drained hook firing.
pub const DEFAULT_DRAIN_DELAY_MS: u64 = 1_000;

/// Pause before an automatic request is enqueued.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 400;

/// Largest accepted audio payload.
pub const DEFAULT_MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

/// Producer-side readiness guard for loading a fetched clip.
pub const DEFAULT_READINESS_TIMEOUT_MS: u64 = 10_000;

pub const DEFAULT_VOICE_ID: &str = "narrator";
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";

/// Speech settings for one session.
///
/// All fields are optional to support partial updates and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TtsSettings {
    /// Global "voice output enabled" switch.
    pub voice_enabled: Option<bool>,
    pub voice_id: Option<String>,
    pub model_id: Option<String>,
    pub load_timeout_ms: Option<u64>,
    pub playback_timeout_ms: Option<u64>,
    /// Total attempts per request (1-10).
    pub max_attempts: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
    pub drain_delay_ms: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub max_audio_bytes: Option<usize>,
    pub readiness_timeout_ms: Option<u64>,
}

const fn or_ms(value: Option<u64>, default: u64) -> Duration {
    match value {
        Some(ms) => Duration::from_millis(ms),
        None => Duration::from_millis(default),
    }
}

impl TtsSettings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            voice_enabled: Some(true),
            voice_id: Some(DEFAULT_VOICE_ID.to_string()),
            model_id: Some(DEFAULT_MODEL_ID.to_string()),
            load_timeout_ms: Some(DEFAULT_LOAD_TIMEOUT_MS),
            playback_timeout_ms: Some(DEFAULT_PLAYBACK_TIMEOUT_MS),
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            retry_backoff_ms: Some(DEFAULT_RETRY_BACKOFF_MS),
            drain_delay_ms: Some(DEFAULT_DRAIN_DELAY_MS),
            settle_delay_ms: Some(DEFAULT_SETTLE_DELAY_MS),
            max_audio_bytes: Some(DEFAULT_MAX_AUDIO_BYTES),
            readiness_timeout_ms: Some(DEFAULT_READINESS_TIMEOUT_MS),
        }
    }

    #[must_use]
    pub const fn effective_voice_enabled(&self) -> bool {
        match self.voice_enabled {
            Some(enabled) => enabled,
            None => true,
        }
    }

    #[must_use]
    pub fn effective_voice_id(&self) -> &str {
        self.voice_id.as_deref().unwrap_or(DEFAULT_VOICE_ID)
    }

    #[must_use]
    pub fn effective_model_id(&self) -> &str {
        self.model_id.as_deref().unwrap_or(DEFAULT_MODEL_ID)
    }

    #[must_use]
    pub const fn effective_load_timeout(&self) -> Duration {
        or_ms(self.load_timeout_ms, DEFAULT_LOAD_TIMEOUT_MS)
    }

    #[must_use]
    pub const fn effective_playback_timeout(&self) -> Duration {
        or_ms(self.playback_timeout_ms, DEFAULT_PLAYBACK_TIMEOUT_MS)
    }

    #[must_use]
    pub const fn effective_max_attempts(&self) -> u32 {
        match self.max_attempts {
            Some(n) => n,
            None => DEFAULT_MAX_ATTEMPTS,
        }
    }

    #[must_use]
    pub const fn effective_retry_backoff(&self) -> Duration {
        or_ms(self.retry_backoff_ms, DEFAULT_RETRY_BACKOFF_MS)
    }

    #[must_use]
    pub const fn effective_drain_delay(&self) -> Duration {
        or_ms(self.drain_delay_ms, DEFAULT_DRAIN_DELAY_MS)
    }

    #[must_use]
    pub const fn effective_settle_delay(&self) -> Duration {
        or_ms(self.settle_delay_ms, DEFAULT_SETTLE_DELAY_MS)
    }

    #[must_use]
    pub const fn effective_max_audio_bytes(&self) -> usize {
        match self.max_audio_bytes {
            Some(n) => n,
            None => DEFAULT_MAX_AUDIO_BYTES,
        }
    }

    #[must_use]
    pub const fn effective_readiness_timeout(&self) -> Duration {
        or_ms(self.readiness_timeout_ms, DEFAULT_READINESS_TIMEOUT_MS)
    }

    /// Merge an update into these settings, only touching fields that are Some.
    pub fn merge(&mut self, other: &TtsSettingsUpdate) {
        if let Some(ref enabled) = other.voice_enabled {
            self.voice_enabled = *enabled;
        }
        if let Some(ref voice) = other.voice_id {
            self.voice_id.clone_from(voice);
        }
        if let Some(ref model) = other.model_id {
            self.model_id.clone_from(model);
        }
        if let Some(ref ms) = other.load_timeout_ms {
            self.load_timeout_ms = *ms;
        }
        if let Some(ref ms) = other.playback_timeout_ms {
            self.playback_timeout_ms = *ms;
        }
        if let Some(ref n) = other.max_attempts {
            self.max_attempts = *n;
        }
        if let Some(ref ms) = other.retry_backoff_ms {
            self.retry_backoff_ms = *ms;
        }
        if let Some(ref ms) = other.drain_delay_ms {
            self.drain_delay_ms = *ms;
        }
        if let Some(ref ms) = other.settle_delay_ms {
            self.settle_delay_ms = *ms;
        }
        if let Some(ref n) = other.max_audio_bytes {
            self.max_audio_bytes = *n;
        }
        if let Some(ref ms) = other.readiness_timeout_ms {
            self.readiness_timeout_ms = *ms;
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = reset field to its default
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtsSettingsUpdate {
    pub voice_enabled: Option<Option<bool>>,
    pub voice_id: Option<Option<String>>,
    pub model_id: Option<Option<String>>,
    pub load_timeout_ms: Option<Option<u64>>,
    pub playback_timeout_ms: Option<Option<u64>>,
    pub max_attempts: Option<Option<u32>>,
    pub retry_backoff_ms: Option<Option<u64>>,
    pub drain_delay_ms: Option<Option<u64>>,
    pub settle_delay_ms: Option<Option<u64>>,
    pub max_audio_bytes: Option<Option<usize>>,
    pub readiness_timeout_ms: Option<Option<u64>>,
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Max attempts must be between 1 and 10, got {0}")]
    InvalidMaxAttempts(u32),

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("Max audio size must be between 1 KiB and 50 MiB, got {0} bytes")]
    InvalidMaxAudioBytes(usize),

    #[error("Voice id cannot be empty")]
    EmptyVoiceId,

    #[error("Model id cannot be empty")]
    EmptyModelId,

    #[error("{field} is fixed when the session is created")]
    FixedAtCreation { field: &'static str },
}

/// Validate settings values.
pub fn validate_settings(settings: &TtsSettings) -> Result<(), SettingsError> {
    if let Some(n) = settings.max_attempts {
        if !(1..=10).contains(&n) {
            return Err(SettingsError::InvalidMaxAttempts(n));
        }
    }

    let timeouts = [
        ("load_timeout_ms", settings.load_timeout_ms),
        ("playback_timeout_ms", settings.playback_timeout_ms),
        ("readiness_timeout_ms", settings.readiness_timeout_ms),
    ];
    for (field, value) in timeouts {
        if value == Some(0) {
            return Err(SettingsError::ZeroTimeout { field });
        }
    }

    if let Some(bytes) = settings.max_audio_bytes {
        if !(1024..=50 * 1024 * 1024).contains(&bytes) {
            return Err(SettingsError::InvalidMaxAudioBytes(bytes));
        }
    }

    if settings
        .voice_id
        .as_ref()
        .is_some_and(|v| v.trim().is_empty())
    {
        return Err(SettingsError::EmptyVoiceId);
    }

    if settings
        .model_id
        .as_ref()
        .is_some_and(|m| m.trim().is_empty())
    {
        return Err(SettingsError::EmptyModelId);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = TtsSettings::with_defaults();
        assert_eq!(settings.effective_load_timeout(), Duration::from_secs(30));
        assert_eq!(settings.effective_playback_timeout(), Duration::from_secs(300));
        assert_eq!(settings.effective_max_attempts(), 3);
        assert_eq!(settings.effective_settle_delay(), Duration::from_millis(400));
        assert_eq!(settings.effective_max_audio_bytes(), 10 * 1024 * 1024);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_empty_settings_fall_back() {
        let settings = TtsSettings::default();
        assert!(settings.effective_voice_enabled());
        assert_eq!(settings.effective_voice_id(), DEFAULT_VOICE_ID);
        assert_eq!(settings.effective_drain_delay(), Duration::from_secs(1));
        assert_eq!(settings.effective_readiness_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_merge() {
        let mut settings = TtsSettings::with_defaults();
        let update = TtsSettingsUpdate {
            voice_enabled: Some(Some(false)),
            voice_id: Some(Some("bard".into())),
            max_attempts: Some(None),
            ..Default::default()
        };
        settings.merge(&update);

        assert_eq!(settings.voice_enabled, Some(false));
        assert_eq!(settings.effective_voice_id(), "bard");
        assert_eq!(settings.max_attempts, None);
        assert_eq!(settings.effective_max_attempts(), DEFAULT_MAX_ATTEMPTS);
        // Untouched
        assert_eq!(settings.settle_delay_ms, Some(DEFAULT_SETTLE_DELAY_MS));
    }

    #[test]
    fn test_validate_max_attempts() {
        let settings = TtsSettings {
            max_attempts: Some(0),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&settings),
            Err(SettingsError::InvalidMaxAttempts(0))
        );
    }

    #[test]
    fn test_validate_zero_timeout() {
        let settings = TtsSettings {
            playback_timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::ZeroTimeout {
                field: "playback_timeout_ms"
            })
        ));
    }

    #[test]
    fn test_validate_audio_bytes_and_ids() {
        let too_big = TtsSettings {
            max_audio_bytes: Some(100 * 1024 * 1024),
            ..Default::default()
        };
        assert!(validate_settings(&too_big).is_err());

        let blank_voice = TtsSettings {
            voice_id: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(
            validate_settings(&blank_voice),
            Err(SettingsError::EmptyVoiceId)
        );
    }

    #[test]
    fn test_partial_json() {
        let settings: TtsSettings =
            serde_json::from_str(r#"{"voice_enabled":false,"settle_delay_ms":250}"#).unwrap();
        assert!(!settings.effective_voice_enabled());
        assert_eq!(settings.effective_settle_delay(), Duration::from_millis(250));
        assert_eq!(settings.effective_max_attempts(), DEFAULT_MAX_ATTEMPTS);
    }
}
