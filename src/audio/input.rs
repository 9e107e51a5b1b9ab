//! Audio input sources.
//!
//! Live capture goes through cpal when the `live-audio` feature is enabled:
//! the device callback down-mixes interleaved frames to mono and pushes them
//! into a lock-free ring buffer, which the frame thread drains without
//! waiting.

#[cfg(not(feature = "live-audio"))]
use super::synth::SyntheticInput;

/// Errors that can occur while acquiring audio input.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("No audio input device available")]
    NoDevice,

    #[error("No input device matching: {0}")]
    DeviceNotFound(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to start input stream: {0}")]
    Stream(String),
}

/// A source of mono samples.
pub trait AudioInput {
    /// Acquire the source. Returns its sample rate in Hz.
    fn open(&mut self) -> Result<u32, AudioError>;

    /// Append every sample that has arrived since the last call. Never blocks.
    ///
    /// Returns the number of samples appended.
    fn read_available(&mut self, out: &mut Vec<f32>) -> usize;

    /// Release the source. Safe to call when not open.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// The input used when nothing else is configured.
///
/// `device` selects a capture device by case-insensitive substring match.
/// Builds without `live-audio` have no hardware access, so the returned
/// input always fails to open.
pub fn default_input(device: Option<&str>) -> Box<dyn AudioInput> {
    #[cfg(feature = "live-audio")]
    {
        Box::new(live::CpalInput::new(device))
    }

    #[cfg(not(feature = "live-audio"))]
    {
        if let Some(device) = device {
            log::debug!("Ignoring audio device '{}': built without live-audio", device);
        }
        Box::new(SyntheticInput::unavailable())
    }
}

#[cfg(feature = "live-audio")]
pub use live::CpalInput;

#[cfg(feature = "live-audio")]
mod live {
    use super::{AudioError, AudioInput};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{Sample, SampleFormat};
    use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
    use ringbuf::HeapRb;

    /// Capture from a cpal input device.
    pub struct CpalInput {
        device_query: Option<String>,
        stream: Option<cpal::Stream>,
        consumer: Option<ringbuf::HeapCons<f32>>,
    }

    impl CpalInput {
        pub fn new(device_query: Option<&str>) -> Self {
            Self {
                device_query: device_query.map(str::to_string),
                stream: None,
                consumer: None,
            }
        }
    }

    impl AudioInput for CpalInput {
        fn open(&mut self) -> Result<u32, AudioError> {
            self.close();

            let host = cpal::default_host();
            let device = select_input_device(&host, self.device_query.as_deref())?;
            let supported = device
                .default_input_config()
                .map_err(|e| AudioError::Stream(e.to_string()))?;
            let sample_rate = supported.sample_rate().0;
            let channels = supported.channels() as usize;
            let config: cpal::StreamConfig = supported.clone().into();

            // One second of headroom between polls
            let rb = HeapRb::<f32>::new(sample_rate as usize);
            let (mut prod, cons) = rb.split();

            let err_fn = |err| log::warn!("Audio stream error: {}", err);

            let stream = match supported.sample_format() {
                SampleFormat::F32 => device.build_input_stream(
                    &config,
                    move |data: &[f32], _| push_interleaved(data, channels, &mut prod),
                    err_fn,
                    None,
                ),
                SampleFormat::I16 => device.build_input_stream(
                    &config,
                    move |data: &[i16], _| push_interleaved(data, channels, &mut prod),
                    err_fn,
                    None,
                ),
                SampleFormat::U16 => device.build_input_stream(
                    &config,
                    move |data: &[u16], _| push_interleaved(data, channels, &mut prod),
                    err_fn,
                    None,
                ),
                fmt => return Err(AudioError::UnsupportedFormat(format!("{fmt:?}"))),
            }
            .map_err(|e| AudioError::Stream(e.to_string()))?;

            stream.play().map_err(|e| AudioError::Stream(e.to_string()))?;

            log::info!(
                "Audio input '{}' open: {} Hz, {} channels",
                device.name().unwrap_or_else(|_| "unknown".into()),
                sample_rate,
                channels
            );
            self.stream = Some(stream);
            self.consumer = Some(cons);
            Ok(sample_rate)
        }

        fn read_available(&mut self, out: &mut Vec<f32>) -> usize {
            let Some(cons) = self.consumer.as_mut() else {
                return 0;
            };
            let before = out.len();
            while let Some(s) = cons.try_pop() {
                out.push(s);
            }
            out.len() - before
        }

        fn close(&mut self) {
            // Dropping the stream stops the device callback
            if self.stream.take().is_some() {
                log::info!("Audio input closed");
            }
            self.consumer = None;
        }

        fn is_open(&self) -> bool {
            self.stream.is_some()
        }
    }

    fn select_input_device(
        host: &cpal::Host,
        device_query: Option<&str>,
    ) -> Result<cpal::Device, AudioError> {
        if let Some(query) = device_query {
            let want = query.to_lowercase();
            let devices = host
                .input_devices()
                .map_err(|e| AudioError::Stream(e.to_string()))?;
            for device in devices {
                if device
                    .name()
                    .map(|n| n.to_lowercase().contains(&want))
                    .unwrap_or(false)
                {
                    return Ok(device);
                }
            }
            return Err(AudioError::DeviceNotFound(query.to_string()));
        }

        host.default_input_device().ok_or(AudioError::NoDevice)
    }

    fn push_interleaved<T: Sample<Float = f32> + Copy>(
        data: &[T],
        channels: usize,
        prod: &mut ringbuf::HeapProd<f32>,
    ) {
        let channels = channels.max(1);
        for frame in data.chunks(channels) {
            let sum: f32 = frame.iter().map(|s| s.to_float_sample()).sum();
            // Oldest data is kept when the consumer falls behind
            let _ = prod.try_push(sum / channels as f32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "live-audio"))]
    #[test]
    fn test_default_input_without_hardware_fails_to_open() {
        let mut input = default_input(Some("usb"));
        assert!(matches!(input.open(), Err(AudioError::NoDevice)));
        assert!(!input.is_open());
    }

    #[test]
    fn test_error_messages_name_the_device() {
        let err = AudioError::DeviceNotFound("Scarlett".into());
        assert!(err.to_string().contains("Scarlett"));
    }
}
