//! Speaker output on a dedicated audio thread.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so the stream and all
//! sinks live on one OS thread. [`SpeakerOutput`] and every [`SpeakerAudio`]
//! handle talk to it through an `mpsc` command channel.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread;

use async_trait::async_trait;
use bytes::Bytes;
use rodio::{Decoder, OutputStream, Sink};
use tracing::{debug, info};

use questvoice_core::{
    AudioClip, AudioHandle, AudioLoader, GenerationError, PlaybackNotifier, PlaybackOutcome,
    PlaybackSignal, SharedAudio, TtsError,
};

// ── Commands ───────────────────────────────────────────────────────

enum AudioCommand {
    /// Start a clip from the beginning, replacing any sink it already has.
    Play {
        clip_id: u64,
        bytes: Bytes,
        reply: mpsc::Sender<Result<PlaybackSignal, TtsError>>,
    },

    /// Stop a clip's sink. Its completion signal is dropped.
    Stop { clip_id: u64 },

    Shutdown,
}

struct ActiveSink {
    sink: Arc<Sink>,
    stopped: Arc<AtomicBool>,
}

// ── Audio thread ───────────────────────────────────────────────────

struct AudioThread {
    cmd_tx: Mutex<mpsc::Sender<AudioCommand>>,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl AudioThread {
    fn spawn() -> Result<Self, TtsError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), TtsError>>();

        let thread = thread::Builder::new()
            .name("questvoice-audio".into())
            .spawn(move || Self::run(&cmd_rx, &init_tx))
            .map_err(|e| TtsError::PlaybackRuntime(format!("failed to spawn audio thread: {e}")))?;

        init_rx.recv().map_err(|_| audio_thread_died())??;

        Ok(Self {
            cmd_tx: Mutex::new(cmd_tx),
            thread: Mutex::new(Some(thread)),
        })
    }

    fn send(&self, cmd: AudioCommand) -> Result<(), TtsError> {
        self.cmd_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(cmd)
            .map_err(|_| audio_thread_died())
    }

    fn play(&self, clip_id: u64, bytes: Bytes) -> Result<PlaybackSignal, TtsError> {
        let (reply, rx) = mpsc::channel();
        self.send(AudioCommand::Play {
            clip_id,
            bytes,
            reply,
        })?;
        rx.recv().map_err(|_| audio_thread_died())?
    }

    fn run(cmd_rx: &mpsc::Receiver<AudioCommand>, init_tx: &mpsc::Sender<Result<(), TtsError>>) {
        let (_stream, handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                let _ = init_tx.send(Err(TtsError::PlaybackRuntime(e.to_string())));
                return;
            }
        };
        if init_tx.send(Ok(())).is_err() {
            return;
        }
        info!(target: "questvoice.output", "Audio output initialized on default device");

        let mut sinks: HashMap<u64, ActiveSink> = HashMap::new();

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                AudioCommand::Play {
                    clip_id,
                    bytes,
                    reply,
                } => {
                    stop_sink(&mut sinks, clip_id);
                    let result = Sink::try_new(&handle)
                        .map_err(|e| TtsError::PlaybackRuntime(e.to_string()))
                        .and_then(|sink| {
                            let source = decode(bytes)?;
                            sink.append(source);
                            Ok(sink)
                        })
                        .map(|sink| {
                            let (notifier, signal) = PlaybackSignal::channel();
                            let active = ActiveSink {
                                sink: Arc::new(sink),
                                stopped: Arc::new(AtomicBool::new(false)),
                            };
                            spawn_completion_watcher(&active, notifier);
                            sinks.insert(clip_id, active);
                            signal
                        });
                    let _ = reply.send(result);
                }

                AudioCommand::Stop { clip_id } => stop_sink(&mut sinks, clip_id),

                AudioCommand::Shutdown => break,
            }
        }

        for (_, active) in sinks.drain() {
            active.stopped.store(true, Ordering::SeqCst);
            active.sink.stop();
        }
        debug!(target: "questvoice.output", "Audio thread shutting down");
    }
}

impl Drop for AudioThread {
    fn drop(&mut self) {
        let _ = self.send(AudioCommand::Shutdown);
        if let Some(handle) = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = handle.join();
        }
    }
}

fn audio_thread_died() -> TtsError {
    TtsError::PlaybackRuntime("audio thread is not running".into())
}

fn decode(bytes: Bytes) -> Result<Decoder<Cursor<Bytes>>, TtsError> {
    Decoder::new(Cursor::new(bytes))
        .map_err(|e| GenerationError::Undecodable(e.to_string()).into())
}

fn stop_sink(sinks: &mut HashMap<u64, ActiveSink>, clip_id: u64) {
    if let Some(active) = sinks.remove(&clip_id) {
        active.stopped.store(true, Ordering::SeqCst);
        active.sink.stop();
    }
}

/// Block a helper thread until the sink drains, then report `Ended` unless
/// the sink was stopped.
fn spawn_completion_watcher(active: &ActiveSink, notifier: PlaybackNotifier) {
    let sink = Arc::clone(&active.sink);
    let stopped = Arc::clone(&active.stopped);
    thread::spawn(move || {
        sink.sleep_until_end();
        if stopped.load(Ordering::SeqCst) {
            return;
        }
        debug!(target: "questvoice.output", "Playback finished naturally");
        notifier.notify(PlaybackOutcome::Ended);
    });
}

// ── Loader / handle ────────────────────────────────────────────────

/// Plays clips through the default output device.
pub struct SpeakerOutput {
    audio: Arc<AudioThread>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for SpeakerOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeakerOutput").finish_non_exhaustive()
    }
}

impl SpeakerOutput {
    /// Open the default output device.
    pub fn open() -> Result<Self, TtsError> {
        Ok(Self {
            audio: Arc::new(AudioThread::spawn()?),
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl AudioLoader for SpeakerOutput {
    async fn load(&self, clip: AudioClip) -> Result<SharedAudio, TtsError> {
        // Decode once up front so a bad payload fails the load, not the play.
        let probe = clip.bytes.clone();
        tokio::task::spawn_blocking(move || decode(probe).map(drop))
            .await
            .map_err(|e| TtsError::PlaybackRuntime(e.to_string()))??;

        let clip_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(SpeakerAudio {
            clip_id,
            bytes: Mutex::new(Some(clip.bytes)),
            audio: Arc::clone(&self.audio),
        }))
    }
}

/// A decoded-once clip owned by the audio thread while playing.
pub struct SpeakerAudio {
    clip_id: u64,
    bytes: Mutex<Option<Bytes>>,
    audio: Arc<AudioThread>,
}

impl std::fmt::Debug for SpeakerAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeakerAudio")
            .field("clip_id", &self.clip_id)
            .finish_non_exhaustive()
    }
}

impl AudioHandle for SpeakerAudio {
    fn start(&self) -> Result<PlaybackSignal, TtsError> {
        let bytes = self
            .bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| TtsError::PlaybackRuntime("audio handle was released".into()))?;
        self.audio.play(self.clip_id, bytes)
    }

    fn stop(&self) {
        let _ = self.audio.send(AudioCommand::Stop {
            clip_id: self.clip_id,
        });
    }

    fn release(&self) {
        self.stop();
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
