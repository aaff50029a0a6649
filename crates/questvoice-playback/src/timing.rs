//! Cancellable delays shared by the settle, back-off and drain timers.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Sleep for `delay` unless `cancel` fires first.
///
/// Returns `true` if the full delay elapsed, `false` if cancelled.
pub async fn delay_unless_cancelled(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        () = tokio::time::sleep(delay) => true,
    }
}
