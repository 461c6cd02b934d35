//! The audio output device and sound loading.

use std::path::Path;
use std::sync::Arc;

use rodio::{OutputStream, OutputStreamHandle};
use tracing::debug;

use crate::error::Result;
use crate::sound::RodioSound;

/// An open audio output device.
///
/// Sounds loaded from an output play through it. The output must outlive
/// playback: dropping it silences every sound created from it. The
/// underlying stream is not `Send`, so keep the output on the thread that
/// opened it and hand the loaded sounds to the dispatcher instead.
///
/// # Example
///
/// ```ignore
/// use pitlane_core::{SoundDispatcher, SoundHandle};
/// use pitlane_rodio::AudioOutput;
///
/// let output = AudioOutput::new()?;
/// let engine: SoundHandle = output.load("engine", "assets/engine.ogg")?;
///
/// let dispatcher = SoundDispatcher::new()?;
/// let id = dispatcher.loop_sound(&engine, 0.6, 1.0)?;
/// dispatcher.set_pitch(id, 1.4);
/// ```
pub struct AudioOutput {
    /// Kept alive for audio to play.
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl AudioOutput {
    /// Open the default audio output device.
    ///
    /// Returns an error if no output device is available.
    pub fn new() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()?;
        debug!("Opened default audio output");
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    /// Load a sound from a file.
    ///
    /// The file is read into memory and checked for a supported format
    /// (WAV, MP3, OGG Vorbis, FLAC). Each playback decodes from the
    /// in-memory copy.
    pub fn load<P: AsRef<Path>>(&self, name: &str, path: P) -> Result<Arc<RodioSound>> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        debug!(sound = name, path = %path.display(), bytes = data.len(), "Loaded sound file");
        self.load_bytes(name, data)
    }

    /// Load a sound from encoded bytes already in memory.
    pub fn load_bytes(&self, name: &str, data: Vec<u8>) -> Result<Arc<RodioSound>> {
        let data: Arc<[u8]> = Arc::from(data);
        RodioSound::validate(&data)?;
        Ok(Arc::new(RodioSound::new(
            name.to_string(),
            data,
            self.handle.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RodioError;
    use pitlane_core::Sound;
    use std::io::Write;

    /// A short mono 16-bit PCM WAV of silence.
    fn silent_wav(samples: u32) -> Vec<u8> {
        let sample_rate: u32 = 8000;
        let data_len = samples * 2;
        let mut wav = Vec::with_capacity(44 + data_len as usize);
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&1u16.to_le_bytes()); // mono
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        wav.resize(44 + data_len as usize, 0);
        wav
    }

    #[test]
    fn test_validate_accepts_wav() {
        let data: Arc<[u8]> = Arc::from(silent_wav(800));
        assert!(RodioSound::validate(&data).is_ok());
    }

    #[test]
    fn test_audio_output_creation() {
        // May fail in CI without an audio device
        let result = AudioOutput::new();
        if let Ok(output) = result {
            let sound = output.load_bytes("blip", silent_wav(800)).unwrap();
            assert_eq!(sound.name(), "blip");
            assert_eq!(sound.playing_count(), 0);
        }
    }

    #[test]
    fn test_load_missing_file() {
        if let Ok(output) = AudioOutput::new() {
            let dir = tempfile::tempdir().unwrap();
            let result = output.load("missing", dir.path().join("missing.wav"));
            assert!(matches!(result, Err(RodioError::Io(_))));
        }
    }

    #[test]
    fn test_load_from_file() {
        if let Ok(output) = AudioOutput::new() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(&silent_wav(800)).unwrap();
            let sound = output.load("file", file.path()).unwrap();
            assert_eq!(sound.max_instances(), crate::DEFAULT_MAX_INSTANCES);
        }
    }

    #[test]
    fn test_load_rejects_garbage() {
        if let Ok(output) = AudioOutput::new() {
            let result = output.load_bytes("noise", vec![1, 2, 3, 4, 5]);
            assert!(matches!(result, Err(RodioError::AudioLoad(_))));
        }
    }

    #[test]
    fn test_instance_limit() {
        if let Ok(output) = AudioOutput::new() {
            let sound = output.load_bytes("hit", silent_wav(80_000)).unwrap();
            sound.set_max_instances(2);

            let first = sound.play(1.0, 1.0, 0.0).unwrap();
            let second = sound.play(1.0, 1.0, 0.0).unwrap();
            assert_ne!(first, second);
            assert!(sound.play(1.0, 1.0, 0.0).is_err());

            sound.stop(first);
            assert!(sound.play(1.0, 1.0, 0.0).is_ok());
            sound.stop_all();
            assert_eq!(sound.playing_count(), 0);
        }
    }
}
