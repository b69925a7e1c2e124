use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::error;

use super::AudioSource;

/// Captures from the default input device. The stream lives only for the
/// requested window: build, play, wait, drop. Called from the blocking pool,
/// so the in-line wait is fine.
pub struct CpalAudioSource;

impl CpalAudioSource {
    pub fn new() -> Self {
        Self
    }
}

impl AudioSource for CpalAudioSource {
    fn sample(&self, duration: Duration, sample_rate: u32, channels: u16) -> Result<Vec<f32>> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("no default audio input device"))?;

        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let writer = Arc::clone(&buffer);

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut samples) = writer.lock() {
                    samples.extend_from_slice(data);
                }
            },
            |err| error!("audio input stream error: {err}"),
            None,
        )?;

        stream.play()?;
        std::thread::sleep(duration);
        drop(stream);

        let mut samples = buffer
            .lock()
            .map_err(|_| anyhow!("audio capture buffer poisoned"))?;
        Ok(std::mem::take(&mut *samples))
    }
}

/// A microphone that hears nothing. Stands in for real capture when no input
/// device is wanted; still blocks for the window so the sampling cadence is
/// preserved.
pub struct SilentAudioSource;

impl AudioSource for SilentAudioSource {
    fn sample(&self, duration: Duration, sample_rate: u32, channels: u16) -> Result<Vec<f32>> {
        std::thread::sleep(duration);
        let len = (sample_rate as u64 * channels as u64 * duration.as_secs()) as usize;
        Ok(vec![0.0; len])
    }
}
