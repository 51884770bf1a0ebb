//! Microphone capture
//!
//! Wraps a cpal input stream and hands captured audio to a per-frame
//! callback as 16-bit little-endian PCM, the wire format expected on the
//! binary audio path.

use bytes::Bytes;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tracing::{error, info, warn};

use super::ClientAudioError;

/// Requested capture parameters.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
        }
    }
}

/// Microphone capture handle.
///
/// The underlying stream runs on an audio thread owned by the host layer;
/// dropping the handle (or calling [`AudioCapture::stop`]) ends it.
pub struct AudioCapture {
    config: CaptureConfig,
    stream: Option<cpal::Stream>,
}

impl AudioCapture {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            stream: None,
        }
    }

    /// Whether this host has a usable input device.
    pub fn is_supported() -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    /// True while a capture stream is running.
    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    /// Start capturing and invoke `on_frame` with each PCM16 frame.
    ///
    /// Starting while already recording is a no-op.
    pub fn start<F>(&mut self, mut on_frame: F) -> Result<(), ClientAudioError>
    where
        F: FnMut(Bytes) + Send + 'static,
    {
        if self.stream.is_some() {
            warn!("Capture already running, ignoring start request");
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host.default_input_device().ok_or_else(|| {
            ClientAudioError::DeviceUnavailable("No default input device".to_string())
        })?;

        let sample_format = device
            .default_input_config()
            .map_err(|e| ClientAudioError::DeviceUnavailable(e.to_string()))?
            .sample_format();

        let stream_config = StreamConfig {
            channels: self.config.channels,
            sample_rate: SampleRate(self.config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_handler = |e| error!("Capture stream error: {e}");

        let stream = match sample_format {
            SampleFormat::F32 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        on_frame(Bytes::from(f32_to_pcm16(data)));
                    },
                    err_handler,
                    None,
                ),
            SampleFormat::I16 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        on_frame(Bytes::from(i16_to_pcm16(data)));
                    },
                    err_handler,
                    None,
                ),
            SampleFormat::U16 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[u16], _: &cpal::InputCallbackInfo| {
                        on_frame(Bytes::from(u16_to_pcm16(data)));
                    },
                    err_handler,
                    None,
                ),
            other => {
                return Err(ClientAudioError::StreamFailed(format!(
                    "Unsupported input sample format: {other:?}"
                )));
            }
        }
        .map_err(|e| ClientAudioError::StreamFailed(e.to_string()))?;

        stream
            .play()
            .map_err(|e| ClientAudioError::StreamFailed(e.to_string()))?;

        info!(
            sample_rate = self.config.sample_rate,
            channels = self.config.channels,
            "Microphone capture started"
        );
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop capturing. Stopping while not recording is a no-op.
    pub fn stop(&mut self) {
        match self.stream.take() {
            Some(stream) => {
                drop(stream);
                info!("Microphone capture stopped");
            }
            None => warn!("Capture not running, ignoring stop request"),
        }
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stream.take();
    }
}

fn f32_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        pcm.extend_from_slice(&value.to_le_bytes());
    }
    pcm
}

fn i16_to_pcm16(samples: &[i16]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        pcm.extend_from_slice(&sample.to_le_bytes());
    }
    pcm
}

fn u16_to_pcm16(samples: &[u16]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample as i32 - 32768) as i16;
        pcm.extend_from_slice(&value.to_le_bytes());
    }
    pcm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_conversion_clamps_overdrive() {
        let pcm = f32_to_pcm16(&[0.0, 1.0, -1.0, 2.0, -2.0]);

        let samples: Vec<i16> = pcm
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(samples, vec![0, 32767, -32767, 32767, -32768]);
    }

    #[test]
    fn test_i16_conversion_is_little_endian() {
        let pcm = i16_to_pcm16(&[0x0102, -1]);

        assert_eq!(pcm, vec![0x02, 0x01, 0xFF, 0xFF]);
    }

    #[test]
    fn test_u16_conversion_centers_on_zero() {
        let pcm = u16_to_pcm16(&[32768, 0, 65535]);

        let samples: Vec<i16> = pcm
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(samples, vec![0, -32768, 32767]);
    }
}
