//! Looping masking sound playback

use crate::error::{AppError, AppResult};
use rodio::{Decoder, OutputStream, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Anything whose output volume the controller can steer
pub trait VolumeSink {
    /// Set the output volume, `0.0..=1.0`
    fn set_volume(&self, volume: f32);
}

/// Masking sound looping forever on the default output device
pub struct MaskingPlayer {
    // Dropping the stream silences the sink
    _stream: OutputStream,
    sink: Sink,
}

impl MaskingPlayer {
    /// Decode `path`, start looping it at `initial_volume`
    pub fn open(path: &Path, initial_volume: f32) -> AppResult<Self> {
        let source_error = |reason: String| AppError::MaskingSource {
            path: path.display().to_string(),
            reason,
        };

        // Decode before touching the output device so a bad file fails first
        let file = File::open(path).map_err(|e| source_error(e.to_string()))?;
        let source =
            Decoder::new_looped(BufReader::new(file)).map_err(|e| source_error(e.to_string()))?;

        let (stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;
        sink.set_volume(initial_volume);
        sink.append(source);
        sink.play();

        tracing::info!(path = %path.display(), initial_volume, "masking sound playing");

        Ok(Self {
            _stream: stream,
            sink,
        })
    }

    /// Stop playback for good
    pub fn stop(&self) {
        self.sink.stop();
        tracing::debug!("masking sound stopped");
    }
}

impl VolumeSink for MaskingPlayer {
    fn set_volume(&self, volume: f32) {
        self.sink.set_volume(volume.clamp(0.0, 1.0));
    }
}
