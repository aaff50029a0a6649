//! Command handlers.

pub mod settings;
pub mod speak;
pub mod story;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use questvoice_core::TtsEvent;
use questvoice_playback::PlaybackEngine;

use crate::bootstrap::CliContext;

const SETTLE_GRACE: Duration = Duration::from_millis(50);

/// Wait until the engine has nothing left to do.
///
/// Waits one settle delay first so autoplay scheduled by the last render
/// has reached the queue. After that, every drained signal re-checks the
/// engine, so a drain from earlier work does not end the wait.
pub async fn wait_until_quiet(ctx: &CliContext) {
    let settle = ctx.session.settings().effective_settle_delay();
    tokio::time::sleep(settle + SETTLE_GRACE).await;
    while !is_quiet(ctx.session.engine()) {
        ctx.drained.notified().await;
    }
}

fn is_quiet(engine: &PlaybackEngine) -> bool {
    !engine.is_processing() && engine.queued_ids().is_empty()
}

/// Forward engine events to stdout (JSON lines) or the log.
pub fn spawn_event_printer(
    mut events: mpsc::UnboundedReceiver<TtsEvent>,
    json: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if json {
                if let Ok(line) = serde_json::to_string(&event) {
                    println!("{line}");
                }
            } else {
                info!(target: "questvoice.events", event = event.event_name(), "{event:?}");
            }
        }
    })
}
