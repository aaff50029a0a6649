//! Playback engine: sequential, exclusive execution of speech requests.
//!
//! # Architecture
//!
//! - **Engine**: owns the queue, the active cycle and the status fields
//! - **Runner**: one long-lived task that dequeues a request, resolves its
//!   audio, plays it and advances
//! - **Store**: memoizes generated audio (see [`crate::store`])
//!
//! # Concurrency Model
//!
//! - Single long-lived runner, woken through `Notify`
//! - Every cycle carries a lease; a completion whose lease no longer matches
//!   the active cycle is ignored
//! - Each cycle has its own `CancellationToken`, child of the engine's
//!   shutdown token
//! - State lives behind a `std::sync::Mutex`, never held across `.await`
//! - Lock order: engine state → store
//!
//! # Cycle
//!
//! `Idle → Loading → Playing → {Completed | Error} → Idle | Loading(next)`
//!
//! Resolving audio is bounded by the load timeout and playback by the
//! playback timeout. Failures are retried at the front of the queue with a
//! linear back-off until `max_attempts` is reached; then the request is
//! marked played and the queue advances.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use questvoice_core::{
    PlaybackOutcome, PlaybackStatus, SharedAudio, SpeechRequest, SpeechRequestId, TtsError,
    TtsEvent, TtsEventEmitter, TtsSettings,
};

use crate::queue::SpeechQueue;
use crate::store::RequestStore;
use crate::timing::delay_unless_cancelled;

/// Callback fired once the queue has drained.
pub type DrainedHook = Arc<dyn Fn() + Send + Sync>;

/// Timing and retry policy for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub load_timeout: Duration,
    pub playback_timeout: Duration,
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    /// Attempt `n` waits `n * retry_backoff` before retrying.
    pub retry_backoff: Duration,
    pub drain_delay: Duration,
}

impl EngineConfig {
    pub const fn from_settings(settings: &TtsSettings) -> Self {
        Self {
            load_timeout: settings.effective_load_timeout(),
            playback_timeout: settings.effective_playback_timeout(),
            max_attempts: settings.effective_max_attempts(),
            retry_backoff: settings.effective_retry_backoff(),
            drain_delay: settings.effective_drain_delay(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_settings(&TtsSettings::default())
    }
}

/// Result of [`PlaybackEngine::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Appended at this zero-based queue position.
    Queued { position: usize },
    AlreadyQueued,
    /// The id is the cycle currently loading or playing.
    AlreadyActive,
    /// Automatic request for an id that has already played.
    SuppressedAlreadyPlayed,
    Disposed,
}

/// Result of [`PlaybackEngine::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Queue cleared; the request will be processed next.
    Started,
    /// The request was playing and has been stopped.
    Stopped,
    /// The request is already loading; everything queued behind it was dropped.
    AlreadyLoading,
    Disposed,
}

/// Point-in-time view of the engine for UI rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub status: PlaybackStatus,
    pub is_playing: bool,
    pub is_processing: bool,
    pub active_request_id: Option<SpeechRequestId>,
    pub current_request_id: Option<SpeechRequestId>,
    pub queued: Vec<SpeechRequestId>,
    pub last_error: Option<String>,
}

/// Lease ID for tracking the active cycle.
///
/// Used to prevent stale commits when a cycle is stopped or replaced while
/// it is still resolving or playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct LeaseId(u64);

/// The request currently being resolved or played.
struct ActiveCycle {
    lease: LeaseId,
    request: SpeechRequest,
    cancel: CancellationToken,
    /// Set once the handle has started. `Some` means playing.
    audio: Option<SharedAudio>,
}

struct EngineState {
    queue: SpeechQueue,
    active: Option<ActiveCycle>,
    status: PlaybackStatus,
    last_error: Option<String>,
    /// Retry back-off in progress.
    backoff: Option<CancellationToken>,
    /// Drained hook timer in progress.
    drain: Option<CancellationToken>,
    /// Set by `stop_current`; the runner idles until new work is submitted.
    halted: bool,
    disposed: bool,
}

/// How a cycle ended when it was not cancelled.
enum CycleEnd {
    Finished,
    /// Lease no longer matched; someone else already cleaned up.
    Superseded,
}

/// What the runner should do after committing a cycle.
struct RetryPlan {
    delay: Duration,
    cancel: CancellationToken,
}

/// Sequential, exclusive speech playback.
pub struct PlaybackEngine {
    store: RequestStore,
    config: EngineConfig,
    emitter: Arc<dyn TtsEventEmitter>,
    state: Mutex<EngineState>,
    drained_hook: Mutex<Option<DrainedHook>>,
    /// Counter for generating lease IDs.
    lease_counter: AtomicU64,
    /// Notifier for waking the runner when work is available.
    queue_notify: Notify,
    runner_started: AtomicBool,
    /// Parent of every cycle and timer token.
    shutdown: CancellationToken,
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl PlaybackEngine {
    /// Create an engine and start its runner.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create(
        store: RequestStore,
        config: EngineConfig,
        emitter: Arc<dyn TtsEventEmitter>,
    ) -> Arc<Self> {
        let engine = Arc::new(Self {
            store,
            config,
            emitter,
            state: Mutex::new(EngineState {
                queue: SpeechQueue::new(),
                active: None,
                status: PlaybackStatus::Idle,
                last_error: None,
                backoff: None,
                drain: None,
                halted: false,
                disposed: false,
            }),
            drained_hook: Mutex::new(None),
            lease_counter: AtomicU64::new(0),
            queue_notify: Notify::new(),
            runner_started: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        });
        engine.ensure_runner();
        engine
    }

    pub const fn store(&self) -> &RequestStore {
        &self.store
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the status and emit a change event.
    fn set_status(&self, state: &mut EngineState, status: PlaybackStatus) {
        if state.status != status {
            state.status = status;
            self.emitter.emit(TtsEvent::status(status));
        }
    }

    // ── Commands ───────────────────────────────────────────────────

    /// Append a request to the queue.
    ///
    /// No-op if the id is already queued, is the current cycle, or is an
    /// automatic request for an id that has already played.
    pub fn enqueue(&self, request: SpeechRequest) -> EnqueueOutcome {
        let id = request.id.clone();
        let position = {
            let mut state = self.state();
            if state.disposed {
                return EnqueueOutcome::Disposed;
            }
            if state.queue.contains(&id) {
                return EnqueueOutcome::AlreadyQueued;
            }
            if state.active.as_ref().is_some_and(|a| a.request.id == id) {
                return EnqueueOutcome::AlreadyActive;
            }
            if request.is_automatic && self.store.was_played(&id) {
                debug!(target: "questvoice.engine", id = %id, "Suppressing automatic replay");
                return EnqueueOutcome::SuppressedAlreadyPlayed;
            }

            self.store.touch(&id);
            let Some(position) = state.queue.push_back(request) else {
                return EnqueueOutcome::AlreadyQueued;
            };
            state.halted = false;
            if let Some(drain) = state.drain.take() {
                drain.cancel();
            }
            if state.active.is_none() && state.backoff.is_none() {
                self.set_status(&mut state, PlaybackStatus::Loading);
            }
            self.emitter.emit(TtsEvent::RequestQueued {
                request_id: id.clone(),
                position,
            });
            position
        };

        debug!(target: "questvoice.engine", id = %id, position, "Request queued");
        self.queue_notify.notify_one();
        EnqueueOutcome::Queued { position }
    }

    /// Manual play/pause for a request.
    ///
    /// Stops the request if it is playing. Otherwise it preempts everything:
    /// the queue is cleared, whatever is active is stopped, the id's retry
    /// budget is reset and it is processed next. A request that is already
    /// loading keeps loading and only the queue behind it is dropped.
    pub fn toggle(&self, request: SpeechRequest) -> ToggleOutcome {
        let id = request.id.clone();
        let mut state = self.state();
        if state.disposed {
            return ToggleOutcome::Disposed;
        }

        let same_id_playing = state
            .active
            .as_ref()
            .filter(|a| a.request.id == id)
            .map(|a| a.audio.is_some());
        match same_id_playing {
            Some(true) => {
                if let Some(active) = state.active.take() {
                    self.stop_cycle(active);
                }
                state.halted = true;
                self.set_status(&mut state, PlaybackStatus::Idle);
                info!(target: "questvoice.engine", id = %id, "Playback stopped by toggle");
                return ToggleOutcome::Stopped;
            }
            Some(false) => {
                let dropped = state.queue.clear();
                debug!(target: "questvoice.engine", id = %id, dropped, "Toggle joined loading request");
                return ToggleOutcome::AlreadyLoading;
            }
            None => {}
        }

        let dropped = state.queue.clear();
        if let Some(active) = state.active.take() {
            self.stop_cycle(active);
        }
        if let Some(backoff) = state.backoff.take() {
            backoff.cancel();
        }
        if let Some(drain) = state.drain.take() {
            drain.cancel();
        }

        self.store.reset_retries(&id);
        state.queue.push_back(request);
        state.halted = false;
        self.set_status(&mut state, PlaybackStatus::Loading);
        drop(state);

        info!(target: "questvoice.engine", id = %id, dropped, "Toggle started request");
        self.queue_notify.notify_one();
        ToggleOutcome::Started
    }

    /// Stop whatever is loading or playing.
    ///
    /// The cache is untouched and an in-flight generation keeps running into
    /// it. Queued requests stay queued, but the runner halts until the next
    /// `enqueue` or `toggle`.
    pub fn stop_current(&self) {
        let mut state = self.state();
        if let Some(active) = state.active.take() {
            info!(target: "questvoice.engine", id = %active.request.id, "Stopping current request");
            self.stop_cycle(active);
        }
        if let Some(backoff) = state.backoff.take() {
            backoff.cancel();
        }
        state.halted = true;
        self.set_status(&mut state, PlaybackStatus::Idle);
    }

    /// Drop all queued requests without touching the active cycle.
    pub fn discard_queued(&self) -> usize {
        self.state().queue.clear()
    }

    /// Stop the current request, drop queued work and release the store.
    pub fn clear_queue(&self) {
        {
            let mut state = self.state();
            if let Some(active) = state.active.take() {
                self.stop_cycle(active);
            }
            for token in [state.backoff.take(), state.drain.take()].into_iter().flatten() {
                token.cancel();
            }
            let dropped = state.queue.clear();
            state.halted = false;
            state.last_error = None;
            self.set_status(&mut state, PlaybackStatus::Idle);
            info!(target: "questvoice.engine", dropped, "Cleared speech queue");
        }
        self.store.release_all();
    }

    /// Register the callback fired after the queue drains.
    ///
    /// Replaces any previous hook.
    pub fn set_drained_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self
            .drained_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(hook));
    }

    pub fn clear_drained_hook(&self) {
        *self
            .drained_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Tear the engine down.
    ///
    /// Stops audio, cancels every timer and the runner, drops the queue and
    /// releases the store. Later commands return `Disposed`.
    pub fn dispose(&self) {
        {
            let mut state = self.state();
            if state.disposed {
                return;
            }
            state.disposed = true;
            if let Some(active) = state.active.take() {
                self.stop_cycle(active);
            }
            state.backoff = None;
            state.drain = None;
            state.queue.clear();
            self.set_status(&mut state, PlaybackStatus::Idle);
        }
        self.shutdown.cancel();
        self.store.release_all();
        self.clear_drained_hook();
        info!(target: "questvoice.engine", "Playback engine disposed");
    }

    /// Cancel a cycle and stop its handle. Caller holds the state lock.
    fn stop_cycle(&self, active: ActiveCycle) {
        active.cancel.cancel();
        if let Some(audio) = &active.audio {
            audio.stop();
        }
        self.emitter.emit(TtsEvent::PlaybackStopped {
            request_id: active.request.id,
        });
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn status(&self) -> PlaybackStatus {
        self.state().status
    }

    /// A handle is currently started.
    pub fn is_playing(&self) -> bool {
        self.state().active.as_ref().is_some_and(|a| a.audio.is_some())
    }

    /// A cycle or retry back-off is in flight.
    pub fn is_processing(&self) -> bool {
        let state = self.state();
        state.active.is_some() || state.backoff.is_some()
    }

    /// Id currently playing. `Some` exactly when [`Self::is_playing`].
    pub fn active_request_id(&self) -> Option<SpeechRequestId> {
        self.state()
            .active
            .as_ref()
            .filter(|a| a.audio.is_some())
            .map(|a| a.request.id.clone())
    }

    /// Id of the current cycle, loading or playing.
    pub fn current_request_id(&self) -> Option<SpeechRequestId> {
        self.state().active.as_ref().map(|a| a.request.id.clone())
    }

    pub fn queued_ids(&self) -> Vec<SpeechRequestId> {
        self.state().queue.ids()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }

    pub fn is_playing_request(&self, id: &SpeechRequestId) -> bool {
        self.state()
            .active
            .as_ref()
            .is_some_and(|a| &a.request.id == id && a.audio.is_some())
    }

    /// `id` is the current cycle and still resolving audio.
    pub fn is_loading_request(&self, id: &SpeechRequestId) -> bool {
        self.state()
            .active
            .as_ref()
            .is_some_and(|a| &a.request.id == id && a.audio.is_none())
    }

    pub fn is_cached(&self, id: &SpeechRequestId) -> bool {
        self.store.has(id)
    }

    pub fn is_pending(&self, id: &SpeechRequestId) -> bool {
        self.store.is_pending(id)
    }

    pub fn was_played(&self, id: &SpeechRequestId) -> bool {
        self.store.was_played(id)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.state();
        let current = state.active.as_ref();
        EngineSnapshot {
            status: state.status,
            is_playing: current.is_some_and(|a| a.audio.is_some()),
            is_processing: current.is_some() || state.backoff.is_some(),
            active_request_id: current
                .filter(|a| a.audio.is_some())
                .map(|a| a.request.id.clone()),
            current_request_id: current.map(|a| a.request.id.clone()),
            queued: state.queue.ids(),
            last_error: state.last_error.clone(),
        }
    }

    // ── Runner ─────────────────────────────────────────────────────

    /// Ensure the runner is started.
    ///
    /// Idempotent. The runner lives until the engine is disposed.
    fn ensure_runner(self: &Arc<Self>) {
        if self
            .runner_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let engine = Arc::clone(self);
            tokio::spawn(async move {
                engine.run_loop().await;
            });
        }
    }

    /// The main runner loop.
    async fn run_loop(self: Arc<Self>) {
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let Some((lease, request, cancel)) = self.next_cycle() else {
                tokio::select! {
                    () = self.shutdown.cancelled() => break,
                    () = self.queue_notify.notified() => {}
                }
                continue;
            };

            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                result = self.drive(lease, &request) => Some(result),
            };

            let Some(result) = result else {
                debug!(target: "questvoice.engine", id = %request.id, "Cycle cancelled");
                continue;
            };

            if let Some(retry) = self.finish_cycle(lease, &request, result) {
                debug!(
                    target: "questvoice.engine",
                    id = %request.id,
                    delay_ms = retry.delay.as_millis(),
                    "Backing off before retry"
                );
                delay_unless_cancelled(retry.delay, &retry.cancel).await;
                self.state().backoff = None;
            }
        }
        debug!(target: "questvoice.engine", "Runner stopped");
    }

    /// Pop the next request and make it the active cycle.
    fn next_cycle(&self) -> Option<(LeaseId, SpeechRequest, CancellationToken)> {
        let mut state = self.state();
        if state.halted || state.disposed || state.active.is_some() {
            return None;
        }
        let request = state.queue.pop_front()?;

        // Mint a new lease
        let lease = LeaseId(self.lease_counter.fetch_add(1, Ordering::Relaxed));
        let cancel = self.shutdown.child_token();

        if let Some(drain) = state.drain.take() {
            drain.cancel();
        }
        state.active = Some(ActiveCycle {
            lease,
            request: request.clone(),
            cancel: cancel.clone(),
            audio: None,
        });
        self.set_status(&mut state, PlaybackStatus::Loading);

        debug!(
            target: "questvoice.engine",
            id = %request.id,
            index = request.priority_index,
            automatic = request.is_automatic,
            lease = lease.0,
            "Cycle started"
        );
        Some((lease, request, cancel))
    }

    /// Resolve, start and wait for one request.
    async fn drive(&self, lease: LeaseId, request: &SpeechRequest) -> Result<CycleEnd, TtsError> {
        let from_cache = self.store.has(&request.id);
        let pending = self
            .store
            .get_or_create_pending(&request.id, &request.produce_audio);

        let audio = tokio::time::timeout(self.config.load_timeout, pending)
            .await
            .map_err(|_| TtsError::LoadTimeout(self.config.load_timeout))??;

        let signal = {
            let mut state = self.state();
            let Some(active) = state.active.as_mut().filter(|a| a.lease == lease) else {
                return Ok(CycleEnd::Superseded);
            };
            let signal = audio.start()?;
            active.audio = Some(Arc::clone(&audio));
            self.set_status(&mut state, PlaybackStatus::Playing);
            self.emitter.emit(TtsEvent::PlaybackStarted {
                request_id: request.id.clone(),
                cached: from_cache,
            });
            signal
        };
        info!(target: "questvoice.engine", id = %request.id, cached = from_cache, "Playback started");

        match tokio::time::timeout(self.config.playback_timeout, signal.wait()).await {
            Err(_) => Err(TtsError::PlaybackTimeout(self.config.playback_timeout)),
            Ok(PlaybackOutcome::Ended) => Ok(CycleEnd::Finished),
            Ok(PlaybackOutcome::Failed(message)) => Err(TtsError::PlaybackRuntime(message)),
        }
    }

    /// Commit a cycle's result.
    ///
    /// Verifies the lease to prevent stale commits. Returns a retry plan when
    /// the request was re-queued behind a back-off.
    fn finish_cycle(
        self: &Arc<Self>,
        lease: LeaseId,
        request: &SpeechRequest,
        result: Result<CycleEnd, TtsError>,
    ) -> Option<RetryPlan> {
        let id = &request.id;
        let mut state = self.state();

        if matches!(result, Ok(CycleEnd::Superseded))
            || !state.active.as_ref().is_some_and(|a| a.lease == lease)
        {
            debug!(target: "questvoice.engine", id = %id, "Ignoring stale finish (lease mismatch)");
            return None;
        }
        let active = state.active.take()?;
        if let Some(audio) = &active.audio {
            audio.stop();
        }

        match result {
            Ok(_) => {
                self.store.mark_played(id);
                self.store.reset_retries(id);
                state.last_error = None;
                self.emitter.emit(TtsEvent::PlaybackFinished {
                    request_id: id.clone(),
                });
                info!(target: "questvoice.engine", id = %id, "Playback finished");
                self.set_status(&mut state, PlaybackStatus::Completed);
                if state.queue.is_empty() {
                    self.set_status(&mut state, PlaybackStatus::Idle);
                    self.schedule_drain(&mut state);
                }
                None
            }
            Err(error) => {
                let attempt = self.store.record_failure(id);
                let will_retry = error.is_retryable() && attempt < self.config.max_attempts;
                warn!(
                    target: "questvoice.engine",
                    id = %id,
                    attempt,
                    will_retry,
                    error = %error,
                    "Speech request failed"
                );
                self.emitter.emit(TtsEvent::RequestFailed {
                    request_id: id.clone(),
                    error: error.to_string(),
                    attempt,
                    will_retry,
                });

                if will_retry {
                    state.queue.push_front(request.clone());
                    self.set_status(&mut state, PlaybackStatus::Loading);
                    let cancel = self.shutdown.child_token();
                    state.backoff = Some(cancel.clone());
                    return Some(RetryPlan {
                        delay: self.config.retry_backoff * attempt,
                        cancel,
                    });
                }

                self.store.mark_played(id);
                state.last_error = Some(error.to_string());
                self.set_status(&mut state, PlaybackStatus::Error);
                if state.queue.is_empty() {
                    self.schedule_drain(&mut state);
                }
                None
            }
        }
    }

    /// Start the drained-hook timer. Caller holds the state lock.
    fn schedule_drain(self: &Arc<Self>, state: &mut EngineState) {
        if let Some(previous) = state.drain.take() {
            previous.cancel();
        }
        let cancel = self.shutdown.child_token();
        state.drain = Some(cancel.clone());

        let engine = Arc::downgrade(self);
        let delay = self.config.drain_delay;
        tokio::spawn(async move {
            if delay_unless_cancelled(delay, &cancel).await {
                if let Some(engine) = engine.upgrade() {
                    engine.fire_drained(&cancel);
                }
            }
        });
    }

    fn fire_drained(&self, cancel: &CancellationToken) {
        {
            let mut state = self.state();
            // New work may have arrived after the timer elapsed.
            if cancel.is_cancelled() || state.active.is_some() || !state.queue.is_empty() {
                return;
            }
            state.drain = None;
        }

        let hook = self
            .drained_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.emitter.emit(TtsEvent::QueueDrained);
        debug!(target: "questvoice.engine", has_hook = hook.is_some(), "Speech queue drained");
        if let Some(hook) = hook {
            hook();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Probe, producing};
    use questvoice_core::{ChannelEmitter, NoopEmitter};

    const GEN: Duration = Duration::from_millis(500);
    const PLAY: Duration = Duration::from_secs(2);

    fn engine() -> Arc<PlaybackEngine> {
        PlaybackEngine::create(
            RequestStore::new(),
            EngineConfig::default(),
            Arc::new(NoopEmitter::new()),
        )
    }

    /// Let spawned tasks run without advancing past any real timer.
    async fn tick() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn req(id: &str, probe: &Arc<Probe>) -> SpeechRequest {
        SpeechRequest::new(id.into(), producing(probe, GEN, PLAY), 0)
    }

    #[test]
    fn lease_id_equality() {
        assert_eq!(LeaseId(1), LeaseId(1));
        assert_ne!(LeaseId(1), LeaseId(2));
    }

    #[test]
    fn test_config_from_settings() {
        let config = EngineConfig::from_settings(&TtsSettings::with_defaults());
        assert_eq!(config.load_timeout, Duration::from_secs(30));
        assert_eq!(config.playback_timeout, Duration::from_secs(300));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_backoff, Duration::from_secs(1));
        assert_eq!(config, EngineConfig::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_outcomes() {
        let engine = engine();
        let probe = Probe::new();

        assert_eq!(
            engine.enqueue(req("a", &probe)),
            EnqueueOutcome::Queued { position: 0 }
        );
        assert_eq!(engine.status(), PlaybackStatus::Loading);
        assert_eq!(
            engine.enqueue(req("b", &probe)),
            EnqueueOutcome::Queued { position: 1 }
        );
        assert_eq!(engine.enqueue(req("b", &probe)), EnqueueOutcome::AlreadyQueued);

        tick().await;
        assert_eq!(engine.current_request_id(), Some("a".into()));
        assert_eq!(engine.enqueue(req("a", &probe)), EnqueueOutcome::AlreadyActive);
        engine.dispose();
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_id_tracks_playing_only() {
        let engine = engine();
        let probe = Probe::new();
        engine.enqueue(req("a", &probe));
        tick().await;

        assert!(engine.is_processing());
        assert!(!engine.is_playing());
        assert_eq!(engine.active_request_id(), None);
        assert!(engine.is_loading_request(&"a".into()));

        tokio::time::sleep(GEN + Duration::from_millis(10)).await;
        assert!(engine.is_playing());
        assert_eq!(engine.active_request_id(), Some("a".into()));
        assert!(engine.is_playing_request(&"a".into()));
        engine.dispose();
    }

    #[tokio::test(start_paused = true)]
    async fn test_disposed_engine_rejects_commands() {
        let engine = engine();
        let probe = Probe::new();
        engine.dispose();
        engine.dispose();

        assert!(engine.is_disposed());
        assert_eq!(engine.enqueue(req("a", &probe)), EnqueueOutcome::Disposed);
        assert_eq!(engine.toggle(req("a", &probe)), ToggleOutcome::Disposed);
        assert_eq!(probe.produced(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_serializes() {
        let (emitter, _rx) = ChannelEmitter::new();
        let engine = PlaybackEngine::create(
            RequestStore::new(),
            EngineConfig::default(),
            Arc::new(emitter),
        );
        let probe = Probe::new();
        engine.enqueue(req("a", &probe));
        engine.enqueue(req("b", &probe));
        tick().await;

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.current_request_id, Some("a".into()));
        assert_eq!(snapshot.queued, vec![SpeechRequestId::new("b")]);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "loading");
        assert_eq!(json["currentRequestId"], "a");
        assert_eq!(json["activeRequestId"], serde_json::Value::Null);
        engine.dispose();
    }
}
