//! Per-request memoization of generated audio.
//!
//! The store is the single source of truth for "is this audio cached, being
//! generated, or already played". It is session scoped: records are only
//! destroyed in bulk by [`RequestStore::release_all`].
//!
//! # In-flight generation
//!
//! [`RequestStore::get_or_create_pending`] hands out a [`PendingAudio`], a
//! cloneable shared future. Concurrent callers for the same id receive the
//! same future, so the factory runs once. A background task drives every
//! generation to completion even if all waiters stop listening; the result
//! lands in the cache for later replay.
//!
//! # Teardown
//!
//! `release_all` cancels outstanding generations through the session token
//! (waiters observe [`TtsError::Disposed`]) and bumps an epoch. A generation
//! that settles against an older epoch releases its handle instead of
//! caching it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use questvoice_core::{ProduceAudio, SharedAudio, SpeechRequestId, TtsError};

/// Shared, cloneable future resolving to a playable handle.
pub type PendingAudio = Shared<BoxFuture<'static, Result<SharedAudio, TtsError>>>;

#[derive(Default)]
struct RequestRecord {
    cached_audio: Option<SharedAudio>,
    pending: Option<PendingAudio>,
    retry_count: u32,
    ever_played: bool,
}

struct StoreInner {
    records: HashMap<SpeechRequestId, RequestRecord>,
    epoch: u64,
    session: CancellationToken,
}

/// Session-scoped request table. Cheap to clone.
#[derive(Clone)]
pub struct RequestStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl Default for RequestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("RequestStore")
            .field("records", &inner.records.len())
            .field("epoch", &inner.epoch)
            .finish()
    }
}

impl RequestStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                records: HashMap::new(),
                epoch: 0,
                session: CancellationToken::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached audio exists for `id`.
    pub fn has(&self, id: &SpeechRequestId) -> bool {
        self.lock()
            .records
            .get(id)
            .is_some_and(|r| r.cached_audio.is_some())
    }

    /// Generation for `id` is in flight.
    pub fn is_pending(&self, id: &SpeechRequestId) -> bool {
        self.lock()
            .records
            .get(id)
            .is_some_and(|r| r.pending.is_some())
    }

    /// Playback of `id` completed (or its retries were exhausted) at least once.
    pub fn was_played(&self, id: &SpeechRequestId) -> bool {
        self.lock().records.get(id).is_some_and(|r| r.ever_played)
    }

    pub fn retry_count(&self, id: &SpeechRequestId) -> u32 {
        self.lock().records.get(id).map_or(0, |r| r.retry_count)
    }

    /// Create the record for `id` if this is the first time it is seen.
    pub fn touch(&self, id: &SpeechRequestId) {
        self.lock().records.entry(id.clone()).or_default();
    }

    pub fn mark_played(&self, id: &SpeechRequestId) {
        self.lock().records.entry(id.clone()).or_default().ever_played = true;
    }

    /// Count a failed attempt. Returns the new total.
    pub fn record_failure(&self, id: &SpeechRequestId) -> u32 {
        let mut inner = self.lock();
        let record = inner.records.entry(id.clone()).or_default();
        record.retry_count += 1;
        record.retry_count
    }

    pub fn reset_retries(&self, id: &SpeechRequestId) {
        self.lock().records.entry(id.clone()).or_default().retry_count = 0;
    }

    /// Resolve audio for `id`, generating it at most once.
    ///
    /// Returns the cached handle as a ready future, the in-flight generation
    /// if there is one, or starts a new generation via `factory`. Must be
    /// called from within a tokio runtime.
    ///
    /// `factory` runs under the store lock and must only construct its
    /// future, never call back into the store.
    pub fn get_or_create_pending(
        &self,
        id: &SpeechRequestId,
        factory: &ProduceAudio,
    ) -> PendingAudio {
        let mut inner = self.lock();
        let epoch = inner.epoch;
        let session = inner.session.clone();
        let record = inner.records.entry(id.clone()).or_default();

        if let Some(audio) = &record.cached_audio {
            let audio = Arc::clone(audio);
            return async move { Ok::<_, TtsError>(audio) }.boxed().shared();
        }
        if let Some(pending) = &record.pending {
            debug!(target: "questvoice.store", id = %id, "Joining in-flight generation");
            return pending.clone();
        }

        debug!(target: "questvoice.store", id = %id, epoch, "Starting generation");
        let produce = factory();
        let store = Arc::downgrade(&self.inner);
        let key = id.clone();
        let pending = async move {
            let result = tokio::select! {
                biased;
                () = session.cancelled() => Err(TtsError::Disposed),
                result = produce => result,
            };
            settle(&store, &key, epoch, &result);
            result
        }
        .boxed()
        .shared();

        record.pending = Some(pending.clone());
        drop(inner);

        tokio::spawn(pending.clone().map(|_| ()));
        pending
    }

    /// Stop and release every cached handle, cancel in-flight generations,
    /// and drop all records.
    pub fn release_all(&self) {
        let (records, epoch) = {
            let mut inner = self.lock();
            inner.session.cancel();
            inner.session = CancellationToken::new();
            inner.epoch += 1;
            (std::mem::take(&mut inner.records), inner.epoch)
        };

        let mut released = 0usize;
        for record in records.into_values() {
            if let Some(audio) = record.cached_audio {
                audio.stop();
                audio.release();
                released += 1;
            }
        }
        debug!(target: "questvoice.store", released, epoch, "Released all speech requests");
    }
}

/// Commit a finished generation back into the store.
fn settle(
    store: &Weak<Mutex<StoreInner>>,
    id: &SpeechRequestId,
    epoch: u64,
    result: &Result<SharedAudio, TtsError>,
) {
    let Some(inner) = store.upgrade() else {
        if let Ok(audio) = result {
            audio.release();
        }
        return;
    };
    let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);

    if inner.epoch != epoch || !inner.records.contains_key(id) {
        drop(inner);
        debug!(target: "questvoice.store", id = %id, epoch, "Discarding late generation result");
        if let Ok(audio) = result {
            audio.release();
        }
        return;
    }

    if let Some(record) = inner.records.get_mut(id) {
        record.pending = None;
        if let Ok(audio) = result {
            record.cached_audio = Some(Arc::clone(audio));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::testing::{Probe, failing, producing};

    const GEN: Duration = Duration::from_millis(500);
    const PLAY: Duration = Duration::from_secs(2);

    #[tokio::test(start_paused = true)]
    async fn test_generation_is_cached() {
        let store = RequestStore::new();
        let probe = Probe::new();
        let factory = producing(&probe, GEN, PLAY);
        let id = SpeechRequestId::new("m1");

        let pending = store.get_or_create_pending(&id, &factory);
        assert!(store.is_pending(&id));
        assert!(!store.has(&id));

        pending.await.unwrap();
        assert!(!store.is_pending(&id));
        assert!(store.has(&id));

        // Cache hit does not call the factory again
        store.get_or_create_pending(&id, &factory).await.unwrap();
        assert_eq!(probe.produced(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_generation() {
        let store = RequestStore::new();
        let probe = Probe::new();
        let factory = producing(&probe, GEN, PLAY);
        let id = SpeechRequestId::new("m1");

        let a = store.get_or_create_pending(&id, &factory);
        let b = store.get_or_create_pending(&id, &factory);
        let (a, b) = tokio::join!(a, b);

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(probe.produced(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_finishes_without_waiters() {
        let store = RequestStore::new();
        let probe = Probe::new();
        let id = SpeechRequestId::new("m1");

        drop(store.get_or_create_pending(&id, &producing(&probe, GEN, PLAY)));
        tokio::time::sleep(GEN * 2).await;

        assert!(store.has(&id));
        assert!(!store.is_pending(&id));
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let store = RequestStore::new();
        let probe = Probe::new();
        let id = SpeechRequestId::new("m1");
        let factory = failing(&probe);

        assert!(store.get_or_create_pending(&id, &factory).await.is_err());
        assert!(!store.has(&id));
        assert!(!store.is_pending(&id));

        // A later call retries
        assert!(store.get_or_create_pending(&id, &factory).await.is_err());
        assert_eq!(probe.produced(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_all_during_generation() {
        let store = RequestStore::new();
        let probe = Probe::new();
        let id = SpeechRequestId::new("m1");

        let pending = store.get_or_create_pending(&id, &producing(&probe, GEN, PLAY));
        tokio::time::sleep(GEN / 2).await;
        store.release_all();

        assert!(matches!(pending.await, Err(TtsError::Disposed)));
        tokio::time::sleep(GEN * 2).await;
        assert!(!store.has(&id));
        assert!(!store.is_pending(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_all_releases_cached_handles() {
        let store = RequestStore::new();
        let probe = Probe::new();
        let id = SpeechRequestId::new("m1");

        store
            .get_or_create_pending(&id, &producing(&probe, GEN, PLAY))
            .await
            .unwrap();
        store.mark_played(&id);
        store.release_all();

        assert!(!store.has(&id));
        assert!(!store.was_played(&id));
        assert_eq!(probe.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_late_result_from_old_epoch_is_released() {
        let store = RequestStore::new();
        let probe = Probe::new();
        let id = SpeechRequestId::new("m1");
        store.touch(&id);
        store.release_all();
        store.touch(&id);

        let audio = crate::testing::FakeAudio::new(&probe, PLAY);
        let result: Result<SharedAudio, TtsError> = Ok(audio.clone());
        settle(&Arc::downgrade(&store.inner), &id, 0, &result);

        assert!(audio.is_released());
        assert!(!store.has(&id));
    }

    #[test]
    fn test_retry_bookkeeping() {
        let store = RequestStore::new();
        let id = SpeechRequestId::new("m1");
        assert_eq!(store.record_failure(&id), 1);
        assert_eq!(store.record_failure(&id), 2);
        store.reset_retries(&id);
        assert_eq!(store.retry_count(&id), 0);

        assert!(!store.was_played(&id));
        store.mark_played(&id);
        assert!(store.was_played(&id));
    }
}
