//! Sequential audio playback
//!
//! Wraps a rodio sink. Queued clips drain strictly one at a time, so
//! synthesized replies play in the order the server produced them.

use std::io::Cursor;

use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, info};

use super::ClientAudioError;

/// Sequential playback sink for synthesized replies.
///
/// Holds the output device for its whole lifetime; [`AudioSink::dispose`]
/// (or drop) releases it.
pub struct AudioSink {
    // The stream must outlive the sink or playback goes silent.
    _stream: OutputStream,
    _handle: OutputStreamHandle,
    sink: Sink,
    sample_rate: u32,
}

impl AudioSink {
    /// Open the default output device.
    ///
    /// `sample_rate` is assumed for raw PCM16 payloads; container formats
    /// carry their own.
    pub fn new(sample_rate: u32) -> Result<Self, ClientAudioError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| ClientAudioError::DeviceUnavailable(e.to_string()))?;
        let sink =
            Sink::try_new(&handle).map_err(|e| ClientAudioError::StreamFailed(e.to_string()))?;

        info!(sample_rate, "Audio output opened");
        Ok(Self {
            _stream: stream,
            _handle: handle,
            sink,
            sample_rate,
        })
    }

    /// Whether this host has a usable output device.
    pub fn is_supported() -> bool {
        OutputStream::try_default().is_ok()
    }

    /// Play one clip and block until it finishes.
    ///
    /// Anything already queued drains first; playback order is always
    /// arrival order.
    pub fn play(&self, audio: &[u8], format: &str) -> Result<(), ClientAudioError> {
        self.queue(audio, format)?;
        self.sink.sleep_until_end();
        Ok(())
    }

    /// Enqueue one clip and return immediately.
    pub fn queue(&self, audio: &[u8], format: &str) -> Result<(), ClientAudioError> {
        debug!(bytes = audio.len(), format, "Queueing clip");

        if is_raw_pcm(format) {
            let samples = pcm16_samples(audio);
            if samples.is_empty() {
                return Err(ClientAudioError::DecodeFailed(
                    "Empty PCM payload".to_string(),
                ));
            }
            self.sink
                .append(SamplesBuffer::new(1, self.sample_rate, samples));
        } else {
            let decoder = Decoder::new(Cursor::new(audio.to_vec()))
                .map_err(|e| ClientAudioError::DecodeFailed(e.to_string()))?;
            self.sink.append(decoder.convert_samples::<i16>());
        }

        Ok(())
    }

    /// Halt the current clip and drop everything queued behind it.
    ///
    /// The sink stays usable for later clips.
    pub fn stop(&self) {
        self.sink.stop();
    }

    /// True when nothing is playing or queued.
    pub fn is_idle(&self) -> bool {
        self.sink.empty()
    }

    /// Release the output device.
    pub fn dispose(self) {
        self.sink.stop();
        // Dropping self closes the output stream.
    }
}

fn is_raw_pcm(format: &str) -> bool {
    matches!(
        format.to_lowercase().as_str(),
        "linear16" | "pcm" | "pcm16" | "pcm_s16le"
    )
}

fn pcm16_samples(audio: &[u8]) -> Vec<i16> {
    audio
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
