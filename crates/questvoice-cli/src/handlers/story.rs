//! `questvoice story`: replay a transcript through per-message sites.
//!
//! Messages arrive one at a time. Each new message gets a site and renders
//! against the story context at that moment, so the autoplay rules decide
//! what is spoken, exactly as they would for a live reader.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::bootstrap::CliContext;
use crate::handlers::wait_until_quiet;
use crate::transcript::Transcript;

pub async fn execute(ctx: &CliContext, path: &Path, gap: Duration) -> Result<()> {
    let transcript = Transcript::load(path)?;
    info!(
        target: "questvoice.cli",
        story = %transcript.story_id,
        messages = transcript.messages.len(),
        "Replaying transcript"
    );

    let mut sites = Vec::with_capacity(transcript.messages.len());
    for (index, message) in transcript.messages.iter().enumerate() {
        if index > 0 && !gap.is_zero() {
            tokio::time::sleep(gap).await;
        }
        let mut site = ctx.session.site(message.clone());
        let decision = site.on_render(&transcript.context_at(index));
        debug!(target: "questvoice.cli", position = message.position, ?decision, "Rendered");
        sites.push(site);
    }

    wait_until_quiet(ctx).await;

    println!("{:<5} {:<24} {:<7} Status", "Pos", "Request", "Author");
    for site in &sites {
        let message = site.message();
        let indicator = site.indicator();
        let status = if indicator.played {
            "played"
        } else if indicator.cached {
            "cached"
        } else {
            "-"
        };
        let author = if message.is_system() { "system" } else { "user" };
        println!("{:<5} {:<24} {author:<7} {status}", message.position, site.id().as_str());
    }
    if let Some(err) = ctx.session.engine().last_error() {
        println!("\nLast error: {err}");
    }
    Ok(())
}
