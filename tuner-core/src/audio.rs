//! # Audio Capture Module
//!
//! Real-time capture from the default input device using CPAL
//! (Cross-Platform Audio Library). Device callbacks deliver small chunks;
//! they are accumulated into whole [`AudioBuffer`]s of `rate × duration`
//! samples and handed to the analysis side over a channel.
//!
//! ## Features
//! - Default device selection
//! - 16-bit or 32-bit float mono capture, native sample scale preserved
//! - Buffers are dropped, never queued, when the consumer lags

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SupportedBufferSize, SupportedStreamConfigRange};
use crossbeam_channel::{Sender, TrySendError};
use anyhow::{Result, anyhow, bail};

use crate::AudioBuffer;
use crate::config::{SampleFormat, TunerConfig};

/// Collects device chunks into fixed-length buffers.
pub(crate) struct FrameAccumulator {
    pending: Vec<f32>,
    frame_len: usize,
    sample_rate: u32,
    sender: Sender<AudioBuffer>,
    dropped: u64,
}

impl FrameAccumulator {
    pub(crate) fn new(frame_len: usize, sample_rate: u32, sender: Sender<AudioBuffer>) -> Self {
        Self {
            pending: Vec::with_capacity(frame_len * 2),
            frame_len,
            sample_rate,
            sender,
            dropped: 0,
        }
    }

    /// Appends samples and sends every complete frame.
    pub(crate) fn push(&mut self, samples: impl IntoIterator<Item = f32>) {
        self.pending.extend(samples);

        while self.pending.len() >= self.frame_len {
            let frame: Vec<f32> = self.pending.drain(..self.frame_len).collect();
            match self.sender.try_send(AudioBuffer::new(frame, self.sample_rate)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.dropped += 1;
                    log::debug!("Analysis busy, dropped buffer ({} so far)", self.dropped);
                }
                Err(TrySendError::Disconnected(_)) => {
                    self.pending.clear();
                    return;
                }
            }
        }
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Starts audio capture from the default input device.
///
/// This function:
/// 1. Selects the default audio input device
/// 2. Picks a mono stream of the configured sample format and rate
/// 3. Streams complete buffers to `sender`
///
/// The returned stream stops capturing when dropped, so the caller must keep
/// it alive on the thread that created it.
///
/// # Arguments
/// * `config` - Sample format, rate, chunk size and buffer length
/// * `sender` - Receives each complete buffer; full slots drop the buffer
///
/// # Returns
/// * `Ok(stream)` - The playing input stream
///
/// # Errors
/// If no device is available or none supports the configured format/rate.
pub fn start_audio_capture(config: &TunerConfig, sender: Sender<AudioBuffer>) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host.default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    log::info!("Using audio input device: {}", device.name()?);

    let format = match config.sample_format {
        SampleFormat::I16 => cpal::SampleFormat::I16,
        SampleFormat::F32 => cpal::SampleFormat::F32,
    };
    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, format, config.sample_rate)
        .ok_or_else(|| anyhow!("No mono {:?} input format found", format))?;

    if !(supported_config.min_sample_rate().0..=supported_config.max_sample_rate().0)
        .contains(&config.sample_rate)
    {
        bail!(
            "Device cannot capture at {} Hz (supports {}..={} Hz)",
            config.sample_rate,
            supported_config.min_sample_rate().0,
            supported_config.max_sample_rate().0
        );
    }

    let chunk = config.chunk_size as u32;
    let chunk_supported = matches!(
        supported_config.buffer_size(),
        SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&chunk)
    );
    let mut stream_config: cpal::StreamConfig = supported_config
        .with_sample_rate(cpal::SampleRate(config.sample_rate))
        .into();
    if chunk_supported {
        stream_config.buffer_size = cpal::BufferSize::Fixed(chunk);
    }

    log::info!(
        "Capturing {:?} at {} Hz, {} samples per buffer",
        format,
        config.sample_rate,
        config.buffer_len()
    );

    let err_fn = |err: cpal::StreamError| log::warn!("An error occurred on the audio stream: {}", err);
    let mut accumulator = FrameAccumulator::new(config.buffer_len(), config.sample_rate, sender);

    let stream = match config.sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                accumulator.push(data.iter().map(|&s| s as f32));
            },
            err_fn,
            None,
        )?,
        SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                accumulator.push(data.iter().copied());
            },
            err_fn,
            None,
        )?,
    };

    stream.play()?;

    Ok(stream)
}

/// Finds the best supported mono configuration of the requested format.
///
/// Ranges containing `target_rate` win; otherwise the range whose nearest
/// end is closest.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    format: cpal::SampleFormat,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == format)
        .min_by_key(|c| {
            let (min, max) = (c.min_sample_rate().0, c.max_sample_rate().0);
            if (min..=max).contains(&target_rate) {
                0
            } else {
                min.abs_diff(target_rate).min(max.abs_diff(target_rate))
            }
        })
}
