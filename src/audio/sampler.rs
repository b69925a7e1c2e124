use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::{error, info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::context::SessionContext;

use super::{AudioSource, CHANNELS, NOISE_THRESHOLD_DB, SAMPLE_RATE, SAMPLE_WINDOW};

/// Root-mean-square amplitude of a buffer; zero for an empty buffer.
pub fn rms_amplitude(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| s as f64 * s as f64).sum();
    (sum_sq / samples.len() as f64).sqrt()
}

/// Full-scale decibel level for an RMS amplitude. Defined as `0.0` at zero
/// amplitude rather than negative infinity.
pub fn decibel_level(rms: f64) -> f64 {
    if rms > 0.0 {
        20.0 * rms.log10()
    } else {
        0.0
    }
}

/// Owns the background noise-sampling task for one session.
pub struct NoiseMonitor {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl NoiseMonitor {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start(&mut self, ctx: Arc<SessionContext>, source: Arc<dyn AudioSource>) -> Result<()> {
        if self.handle.is_some() {
            bail!("noise sampler already active");
        }

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(sampler_loop(ctx, source, token_clone));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("noise sampler task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

/// One cycle per acquisition window: capture, reduce to a decibel level,
/// publish the noisy/quiet verdict. The stop flag and the cancel token are
/// checked once per cycle, so the worst-case exit latency is one in-flight
/// acquisition.
async fn sampler_loop(
    ctx: Arc<SessionContext>,
    source: Arc<dyn AudioSource>,
    cancel_token: CancellationToken,
) {
    info!("noise sampler started");
    loop {
        if ctx.stop_requested() || cancel_token.is_cancelled() {
            break;
        }

        let source_ref = Arc::clone(&source);
        let acquired =
            tokio::task::spawn_blocking(move || source_ref.sample(SAMPLE_WINDOW, SAMPLE_RATE, CHANNELS))
                .await;

        match acquired {
            Ok(Ok(samples)) => {
                let rms = rms_amplitude(&samples);
                ctx.set_noisy(decibel_level(rms) > NOISE_THRESHOLD_DB);
            }
            Ok(Err(err)) => {
                // Microphone failure is fatal to the whole session, not just
                // to this task; the streaming loop picks the stop flag up at
                // its next iteration and still writes the report.
                error!("ambient noise acquisition failed: {err:?}");
                ctx.request_stop();
                break;
            }
            Err(err) => {
                error!("noise sampling worker join failed: {err}");
                ctx.request_stop();
                break;
            }
        }
    }
    info!("noise sampler stopped");
}
