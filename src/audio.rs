//! Audio device handling and capture stream processing

use crate::error::{AppError, AppResult};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use tokio::sync::mpsc::UnboundedSender;

/// Audio configuration and device information
pub struct AudioConfig {
    pub device_name: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub sample_format: SampleFormat,
}

impl AudioConfig {
    pub fn stream_config(&self) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels: self.channels,
            sample_rate: cpal::SampleRate(self.sample_rate),
            buffer_size: crate::constants::audio::BUFFER_SIZE,
        }
    }
}

/// Messages from the capture callback to the control loop
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// One full mono block, in capture order
    Block(Vec<f32>),
    /// The stream reported an error and may have stopped
    Failed(String),
}

/// List the names of all input devices on the default host
pub fn list_input_devices() -> AppResult<Vec<String>> {
    let host = cpal::default_host();
    Ok(host.input_devices()?.filter_map(|d| d.name().ok()).collect())
}

/// Find and configure an audio input device
pub fn setup_audio_device(
    device_name: Option<&str>,
    sample_rate: u32,
) -> AppResult<(cpal::Device, AudioConfig)> {
    let host = cpal::default_host();

    let device = if let Some(name) = device_name {
        host.input_devices()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| AppError::AudioDevice(format!("Input device '{}' not found", name)))?
    } else {
        host.default_input_device()
            .ok_or_else(|| AppError::AudioDevice("No default input device available".to_string()))?
    };

    let device_name = device.name()?;

    let ranges: Vec<cpal::SupportedStreamConfigRange> = device
        .supported_input_configs()?
        .filter(|r| is_supported_format(r.sample_format()))
        .collect();

    // Prefer mono, then the fewest channels; within that, one covering the rate
    let range = ranges
        .iter()
        .min_by_key(|r| {
            let covers = r.min_sample_rate().0 <= sample_rate && r.max_sample_rate().0 >= sample_rate;
            (
                r.channels() != crate::constants::audio::DEFAULT_CHANNELS,
                r.channels(),
                !covers,
                r.sample_format() != SampleFormat::F32,
            )
        })
        .ok_or_else(|| AppError::AudioDevice("No supported input configs found".to_string()))?;

    let chosen_rate = sample_rate.clamp(range.min_sample_rate().0, range.max_sample_rate().0);
    if chosen_rate != sample_rate {
        tracing::warn!(
            requested = sample_rate,
            using = chosen_rate,
            "input device does not support the requested sample rate"
        );
    }

    let audio_config = AudioConfig {
        device_name,
        sample_rate: chosen_rate,
        channels: range.channels(),
        sample_format: range.sample_format(),
    };

    Ok((device, audio_config))
}

fn is_supported_format(format: SampleFormat) -> bool {
    matches!(format, SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16)
}

/// Build an input stream that delivers fixed-size mono blocks over `tx`
pub fn build_capture_stream(
    device: &cpal::Device,
    audio_config: &AudioConfig,
    block_size: usize,
    tx: UnboundedSender<CaptureEvent>,
) -> AppResult<cpal::Stream> {
    let config = audio_config.stream_config();
    let channels = audio_config.channels as usize;

    match audio_config.sample_format {
        SampleFormat::F32 => build_typed_stream::<f32>(device, &config, channels, block_size, tx),
        SampleFormat::I16 => build_typed_stream::<i16>(device, &config, channels, block_size, tx),
        SampleFormat::U16 => build_typed_stream::<u16>(device, &config, channels, block_size, tx),
        other => Err(AppError::AudioStream(format!(
            "Unsupported sample format {:?}",
            other
        ))),
    }
}

fn build_typed_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    block_size: usize,
    tx: UnboundedSender<CaptureEvent>,
) -> AppResult<cpal::Stream>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let mut assembler = BlockAssembler::new(channels, block_size);
    let data_tx = tx.clone();

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            assembler.push_interleaved(data.iter().map(|&s| f32::from_sample(s)), |block| {
                // Only fails once the control loop is gone
                let _ = data_tx.send(CaptureEvent::Block(block));
            });
        },
        move |err| {
            tracing::error!("Audio stream error: {}", err);
            let _ = tx.send(CaptureEvent::Failed(err.to_string()));
        },
        None,
    )?;

    Ok(stream)
}

/// Downmixes interleaved frames to mono and cuts them into fixed-size blocks
/// independent of how the device sizes its callbacks.
pub struct BlockAssembler {
    channels: usize,
    block_size: usize,
    block: Vec<f32>,
    frame_sum: f32,
    frame_fill: usize,
}

impl BlockAssembler {
    pub fn new(channels: usize, block_size: usize) -> Self {
        let channels = channels.max(1);
        let block_size = block_size.max(1);
        Self {
            channels,
            block_size,
            block: Vec::with_capacity(block_size),
            frame_sum: 0.0,
            frame_fill: 0,
        }
    }

    /// Feed interleaved samples; `emit` receives every completed block.
    ///
    /// Frames split across callbacks are carried over to the next call.
    pub fn push_interleaved<I, F>(&mut self, samples: I, mut emit: F)
    where
        I: IntoIterator<Item = f32>,
        F: FnMut(Vec<f32>),
    {
        for sample in samples {
            self.frame_sum += sample;
            self.frame_fill += 1;
            if self.frame_fill < self.channels {
                continue;
            }

            self.block.push(self.frame_sum / self.channels as f32);
            self.frame_sum = 0.0;
            self.frame_fill = 0;

            if self.block.len() == self.block_size {
                let full = std::mem::replace(&mut self.block, Vec::with_capacity(self.block_size));
                emit(full);
            }
        }
    }

    /// Mono samples waiting for the current block to fill
    #[cfg(test)]
    pub fn buffered(&self) -> usize {
        self.block.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(assembler: &mut BlockAssembler, samples: &[f32]) -> Vec<Vec<f32>> {
        let mut blocks = Vec::new();
        assembler.push_interleaved(samples.iter().copied(), |b| blocks.push(b));
        blocks
    }

    #[test]
    fn test_mono_blocks_are_cut_to_size() {
        let mut assembler = BlockAssembler::new(1, 4);
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let blocks = collect(&mut assembler, &samples);

        assert_eq!(blocks, vec![vec![0.0, 1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0, 7.0]]);
        assert_eq!(assembler.buffered(), 2);
    }

    #[test]
    fn test_blocks_span_callbacks_in_order() {
        let mut assembler = BlockAssembler::new(1, 3);
        assert!(collect(&mut assembler, &[1.0, 2.0]).is_empty());
        let blocks = collect(&mut assembler, &[3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(blocks, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(assembler.buffered(), 1);
    }

    #[test]
    fn test_stereo_is_averaged_to_mono() {
        let mut assembler = BlockAssembler::new(2, 2);
        let blocks = collect(&mut assembler, &[1.0, 0.0, -0.5, -0.5]);
        assert_eq!(blocks, vec![vec![0.5, -0.5]]);
    }

    #[test]
    fn test_frame_split_across_callbacks() {
        let mut assembler = BlockAssembler::new(2, 1);
        assert!(collect(&mut assembler, &[0.25]).is_empty());
        assert_eq!(collect(&mut assembler, &[0.75]), vec![vec![0.5]]);
    }

    #[test]
    fn test_zero_sizes_are_clamped() {
        let mut assembler = BlockAssembler::new(0, 0);
        assert_eq!(collect(&mut assembler, &[0.1, 0.2]), vec![vec![0.1], vec![0.2]]);
    }

    #[test]
    fn test_sample_conversion_to_float() {
        assert_eq!(f32::from_sample(0i16), 0.0);
        assert!((f32::from_sample(i16::MIN) + 1.0).abs() < 1e-6);
        assert!(f32::from_sample(u16::MAX) > 0.99);
    }
}
