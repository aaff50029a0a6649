use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{debug, warn};

use questvoice_core::{
    AudioClip, AudioHandle, AudioLoader, GenerationError, PlaybackOutcome, PlaybackSignal,
    SharedAudio, TtsError,
};

use super::AudioFormat;

/// Writes clips into a directory instead of a speaker.
///
/// A clip counts as playable once it is fully written. Starting a handle
/// finishes immediately.
#[derive(Debug)]
pub struct FileOutput {
    dir: PathBuf,
    next_id: AtomicU64,
    keep_files: bool,
}

impl FileOutput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next_id: AtomicU64::new(1),
            keep_files: false,
        }
    }

    /// Leave written files in place when handles are released.
    #[must_use]
    pub const fn keep_files(mut self, keep: bool) -> Self {
        self.keep_files = keep;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl AudioLoader for FileOutput {
    async fn load(&self, clip: AudioClip) -> Result<SharedAudio, TtsError> {
        let format = AudioFormat::detect(&clip.bytes).ok_or_else(|| {
            GenerationError::Undecodable(format!(
                "unrecognised audio container ({})",
                clip.content_type
            ))
        })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| TtsError::PlaybackRuntime(format!("create {}: {e}", self.dir.display())))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let path = self.dir.join(format!("clip-{id:04}.{}", format.extension()));
        tokio::fs::write(&path, &clip.bytes)
            .await
            .map_err(|e| TtsError::PlaybackRuntime(format!("write {}: {e}", path.display())))?;

        debug!(target: "questvoice.output", path = %path.display(), bytes = clip.len(), "Clip written");
        Ok(Arc::new(FileAudio {
            path,
            remove_on_release: !self.keep_files,
            released: AtomicBool::new(false),
        }))
    }
}

/// A clip on disk.
#[derive(Debug)]
pub struct FileAudio {
    path: PathBuf,
    remove_on_release: bool,
    released: AtomicBool,
}

impl FileAudio {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl AudioHandle for FileAudio {
    fn start(&self) -> Result<PlaybackSignal, TtsError> {
        if self.is_released() {
            return Err(TtsError::PlaybackRuntime("audio handle was released".into()));
        }
        Ok(PlaybackSignal::resolved(PlaybackOutcome::Ended))
    }

    fn stop(&self) {}

    fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) || !self.remove_on_release {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(target: "questvoice.output", path = %self.path.display(), error = %e, "Failed to remove clip");
        }
    }
}
