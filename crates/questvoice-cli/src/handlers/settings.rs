//! `questvoice settings`: print the effective settings.

use std::time::Duration;

use anyhow::Result;
use serde_json::json;

use crate::bootstrap::CliConfig;

pub fn execute(config: &CliConfig) -> Result<()> {
    let settings = config.settings()?;
    let effective = json!({
        "voiceEnabled": settings.effective_voice_enabled(),
        "voiceId": settings.effective_voice_id(),
        "modelId": settings.effective_model_id(),
        "loadTimeoutMs": millis(settings.effective_load_timeout()),
        "playbackTimeoutMs": millis(settings.effective_playback_timeout()),
        "maxAttempts": settings.effective_max_attempts(),
        "retryBackoffMs": millis(settings.effective_retry_backoff()),
        "drainDelayMs": millis(settings.effective_drain_delay()),
        "settleDelayMs": millis(settings.effective_settle_delay()),
        "maxAudioBytes": settings.effective_max_audio_bytes(),
        "readinessTimeoutMs": millis(settings.effective_readiness_timeout()),
    });
    println!("{}", serde_json::to_string_pretty(&effective)?);
    Ok(())
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
