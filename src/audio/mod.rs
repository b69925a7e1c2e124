pub mod capture;
pub mod sampler;

pub use capture::{CpalAudioSource, SilentAudioSource};
pub use sampler::NoiseMonitor;

use std::time::Duration;

use anyhow::Result;

/// Acquisition window per sampling cycle. The sampler's pacing is implicit in
/// this blocking acquisition; there is no separate sleep.
pub const SAMPLE_WINDOW: Duration = Duration::from_secs(1);

pub const SAMPLE_RATE: u32 = 44_100;
pub const CHANNELS: u16 = 1;

/// Ambient level above which the environment counts as noisy, in dBFS.
pub const NOISE_THRESHOLD_DB: f64 = -45.0;

/// Microphone-side collaborator: blocks for roughly `duration` and returns
/// the amplitude buffer captured in that window, samples normalized to
/// [-1.0, 1.0].
pub trait AudioSource: Send + Sync {
    fn sample(&self, duration: Duration, sample_rate: u32, channels: u16) -> Result<Vec<f32>>;
}
