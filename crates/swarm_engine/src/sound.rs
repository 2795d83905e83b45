//! # Sounds
//!
//! The engine never touches an audio device itself. A host supplies an
//! [`AudioBackend`]: `decode` runs on the caller's thread when a sound is
//! registered, `play` runs on the tick thread when a `PlaySound` command
//! is applied.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::{DecodeError, DecodeResult};

/// Container formats recognised by [`sniff_format`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundFormat {
    /// RIFF/WAVE.
    Wav,
    /// Ogg container.
    Ogg,
    /// MPEG layer III, with or without an ID3 tag.
    Mp3,
}

/// A sound ready to hand to the backend.
///
/// Cheap to clone; the bytes are shared.
#[derive(Clone)]
pub struct DecodedSound {
    format: SoundFormat,
    data: Arc<[u8]>,
}

impl DecodedSound {
    /// Wraps backend-specific decoded data.
    #[must_use]
    pub fn new(format: SoundFormat, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            format,
            data: data.into(),
        }
    }

    /// Source container format.
    #[must_use]
    pub const fn format(&self) -> SoundFormat {
        self.format
    }

    /// Decoded data, in whatever layout the backend produced.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for DecodedSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedSound")
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Where sounds are decoded and played.
pub trait AudioBackend: Send + Sync {
    /// Turns file contents into something `play` accepts.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the data can't be used.
    fn decode(&self, bytes: &[u8]) -> DecodeResult<DecodedSound>;

    /// Starts playing a sound. Must not block the tick thread.
    fn play(&self, sound: &DecodedSound, volume: f64);
}

/// Identifies a sound container from its first bytes.
///
/// # Errors
///
/// [`DecodeError::Corrupt`] for data too short to hold a header,
/// [`DecodeError::UnsupportedFormat`] for anything unrecognised.
pub fn sniff_format(bytes: &[u8]) -> DecodeResult<SoundFormat> {
    if bytes.len() < 4 {
        return Err(DecodeError::Corrupt(format!("{} bytes is too short", bytes.len())));
    }
    if bytes.starts_with(b"RIFF") {
        return if bytes.len() >= 12 && &bytes[8..12] == b"WAVE" {
            Ok(SoundFormat::Wav)
        } else {
            Err(DecodeError::Corrupt("RIFF file without WAVE tag".to_string()))
        };
    }
    if bytes.starts_with(b"OggS") {
        return Ok(SoundFormat::Ogg);
    }
    // ID3v2 tag, or a bare MPEG frame sync.
    if bytes.starts_with(b"ID3") || (bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0) {
        return Ok(SoundFormat::Mp3);
    }
    Err(DecodeError::UnsupportedFormat(format!(
        "unknown header {:02x?}",
        &bytes[..4]
    )))
}

/// Backend that checks formats and counts plays, producing no audio.
///
/// Used headless and in tests; real hosts plug in a device backend.
#[derive(Debug, Default)]
pub struct SilentAudio {
    plays: AtomicU64,
}

impl SilentAudio {
    /// Creates a silent backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `play` calls so far.
    #[must_use]
    pub fn plays(&self) -> u64 {
        self.plays.load(Ordering::Relaxed)
    }
}

impl AudioBackend for SilentAudio {
    fn decode(&self, bytes: &[u8]) -> DecodeResult<DecodedSound> {
        let format = sniff_format(bytes)?;
        Ok(DecodedSound::new(format, bytes))
    }

    fn play(&self, sound: &DecodedSound, volume: f64) {
        self.plays.fetch_add(1, Ordering::Relaxed);
        debug!(format = ?sound.format(), volume, "silent play");
    }
}

/// Registered sounds by name. Owned by the tick thread.
#[derive(Debug, Default)]
pub struct SoundBank {
    sounds: HashMap<String, DecodedSound>,
}

impl SoundBank {
    /// Creates an empty bank.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sound, replacing any with the same name.
    pub fn insert(&mut self, name: String, sound: DecodedSound) {
        self.sounds.insert(name, sound);
    }

    /// Sound registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DecodedSound> {
        self.sounds.get(name)
    }

    /// Number of sounds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    /// Whether the bank is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}
