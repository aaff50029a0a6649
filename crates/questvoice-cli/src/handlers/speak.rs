//! `questvoice speak`: play one line of narration.

use anyhow::Result;

use questvoice_core::DisplayedMessage;
use questvoice_playback::ToggleOutcome;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::wait_until_quiet;

pub async fn execute(ctx: &CliContext, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(CliError::Arguments("nothing to speak".into()).into());
    }

    let site = ctx.session.site(DisplayedMessage::system(0, text));
    match site.toggle() {
        Some(ToggleOutcome::Started) => {}
        other => {
            return Err(CliError::Speech(format!("playback did not start: {other:?}")).into());
        }
    }

    wait_until_quiet(ctx).await;

    let engine = ctx.session.engine();
    if !site.indicator().cached {
        let reason = engine
            .last_error()
            .unwrap_or_else(|| "no audio was produced".to_string());
        return Err(CliError::Speech(reason).into());
    }
    println!("Spoke {}", site.id());
    Ok(())
}
