//! Audio outputs: [`AudioLoader`](questvoice_core::AudioLoader) implementations.
//!
//! - [`FileOutput`] writes each clip to a directory and reports playback as
//!   finished immediately. Used for headless runs and exports.
//! - `SpeakerOutput` (feature `local-output`) plays through the default
//!   output device on a dedicated audio thread.

mod file;
#[cfg(feature = "local-output")]
mod speaker;

pub use file::{FileAudio, FileOutput};
#[cfg(feature = "local-output")]
pub use speaker::{SpeakerAudio, SpeakerOutput};

/// Container formats recognised from the leading bytes of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Ogg,
    Flac,
}

impl AudioFormat {
    /// Sniff the format from magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [b'I', b'D', b'3', ..] => Some(Self::Mp3),
            // MPEG frame sync
            [0xFF, second, ..] if second & 0xE0 == 0xE0 => Some(Self::Mp3),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Some(Self::Wav),
            [b'O', b'g', b'g', b'S', ..] => Some(Self::Ogg),
            [b'f', b'L', b'a', b'C', ..] => Some(Self::Flac),
            _ => None,
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Flac => "flac",
        }
    }
}
