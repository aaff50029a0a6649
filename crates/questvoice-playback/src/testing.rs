//! Shared fakes for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use questvoice_core::{
    AudioHandle, PlaybackNotifier, PlaybackOutcome, PlaybackSignal, ProduceAudio, SharedAudio,
    SpeechRequest, SpeechRequestId, TtsError,
};

/// Session-wide counters across every fake handle.
#[derive(Debug, Default)]
pub struct Probe {
    pub live: AtomicUsize,
    pub max_live: AtomicUsize,
    pub starts: AtomicUsize,
    pub releases: AtomicUsize,
    pub produced: AtomicUsize,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn produced(&self) -> usize {
        self.produced.load(Ordering::SeqCst)
    }
}

type Slot = Arc<Mutex<Option<PlaybackNotifier>>>;

/// Fake handle that "plays" for a fixed duration of (tokio) time.
#[derive(Debug)]
pub struct FakeAudio {
    probe: Arc<Probe>,
    play_for: Duration,
    started: AtomicBool,
    released: AtomicBool,
    slot: Mutex<Option<Slot>>,
}

impl FakeAudio {
    pub fn new(probe: &Arc<Probe>, play_for: Duration) -> Arc<Self> {
        Arc::new(Self {
            probe: Arc::clone(probe),
            play_for,
            started: AtomicBool::new(false),
            released: AtomicBool::new(false),
            slot: Mutex::new(None),
        })
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl AudioHandle for FakeAudio {
    fn start(&self) -> Result<PlaybackSignal, TtsError> {
        if !self.started.swap(true, Ordering::SeqCst) {
            let live = self.probe.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.probe.max_live.fetch_max(live, Ordering::SeqCst);
        }
        self.probe.starts.fetch_add(1, Ordering::SeqCst);

        let (notifier, signal) = PlaybackSignal::channel();
        let slot: Slot = Arc::new(Mutex::new(Some(notifier)));
        *self.slot.lock().unwrap() = Some(Arc::clone(&slot));

        let play_for = self.play_for;
        tokio::spawn(async move {
            tokio::time::sleep(play_for).await;
            if let Some(notifier) = slot.lock().unwrap().take() {
                notifier.notify(PlaybackOutcome::Ended);
            }
        });
        Ok(signal)
    }

    fn stop(&self) {
        if self.started.swap(false, Ordering::SeqCst) {
            self.probe.live.fetch_sub(1, Ordering::SeqCst);
        }
        if let Some(slot) = self.slot.lock().unwrap().take() {
            slot.lock().unwrap().take();
        }
    }

    fn release(&self) {
        self.stop();
        self.released.store(true, Ordering::SeqCst);
        self.probe.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Factory producing a fresh [`FakeAudio`] after `generate_for`.
pub fn producing(probe: &Arc<Probe>, generate_for: Duration, play_for: Duration) -> ProduceAudio {
    let probe = Arc::clone(probe);
    Arc::new(move || {
        let probe = Arc::clone(&probe);
        Box::pin(async move {
            probe.produced.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(generate_for).await;
            let audio: SharedAudio = FakeAudio::new(&probe, play_for);
            Ok(audio)
        })
    })
}

/// Factory that always fails.
pub fn failing(probe: &Arc<Probe>) -> ProduceAudio {
    let probe = Arc::clone(probe);
    Arc::new(move || {
        let probe = Arc::clone(&probe);
        Box::pin(async move {
            probe.produced.fetch_add(1, Ordering::SeqCst);
            Err(TtsError::PlaybackRuntime("synthetic failure".into()))
        })
    })
}

/// A manual request whose factory must never be called.
pub fn request(id: &str) -> SpeechRequest {
    let produce: ProduceAudio =
        Arc::new(|| Box::pin(async { Err(TtsError::PlaybackRuntime("unexpected".into())) }));
    SpeechRequest::new(SpeechRequestId::new(id), produce, 0)
}

/// Audio factory handing out [`FakeAudio`] handles.
#[derive(Debug)]
pub struct FakeFactory {
    pub probe: Arc<Probe>,
    pub generate_for: Duration,
    pub play_for: Duration,
}

impl FakeFactory {
    pub fn new(probe: &Arc<Probe>) -> Arc<Self> {
        Arc::new(Self {
            probe: Arc::clone(probe),
            generate_for: Duration::from_millis(500),
            play_for: Duration::from_secs(2),
        })
    }
}

impl questvoice_core::AudioFactoryPort for FakeFactory {
    fn produce(&self, _id: &SpeechRequestId, _text: &str) -> questvoice_core::AudioFuture {
        (producing(&self.probe, self.generate_for, self.play_for))()
    }
}
