use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use focuswatch::audio::{AudioSource, CpalAudioSource, SilentAudioSource};
use focuswatch::context::SessionContext;
use focuswatch::detect::stubs::{
    CyclingFaceDetector, CyclingObjectDetector, SyntheticFrameSource,
};
use focuswatch::server::{self, AppState};
use focuswatch::settings;
use focuswatch::stream::{HudAnnotator, StreamPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("focuswatch starting up...");

    let settings_path = PathBuf::from(
        std::env::var("FOCUSWATCH_SETTINGS").unwrap_or_else(|_| "focuswatch.json".to_string()),
    );
    let settings = settings::load(&settings_path);
    if !settings_path.exists() {
        if let Err(err) = settings::persist(&settings_path, &settings) {
            warn!("could not write default settings file: {err:?}");
        }
    }

    let audio: Arc<dyn AudioSource> = if settings.demo.use_microphone {
        Arc::new(CpalAudioSource::new())
    } else {
        Arc::new(SilentAudioSource)
    };

    // TODO: swap the demo capture and detection stubs for real camera and
    // inference backends once those land.
    let pipeline = StreamPipeline {
        frames: Arc::new(SyntheticFrameSource::new(
            settings.demo.frame_width,
            settings.demo.frame_height,
        )),
        faces: Arc::new(CyclingFaceDetector::new(vec![true])),
        objects: Arc::new(CyclingObjectDetector::new(
            demo_object_pattern(),
            settings.target_class_id,
        )),
        annotator: Arc::new(HudAnnotator),
        audio,
        target_class_id: settings.target_class_id,
    };

    let ctx = Arc::new(SessionContext::new());
    let shutdown = CancellationToken::new();

    {
        let ctx = Arc::clone(&ctx);
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested; stopping active session");
                ctx.request_stop();
                shutdown.cancel();
            }
        });
    }

    let state = AppState {
        ctx,
        pipeline,
        report_dir: settings.report_dir.clone(),
    };

    server::serve(state, &settings.server.host, settings.server.port, shutdown).await
}

/// Mostly present with periodic dips so the demo stream shows real focus
/// transitions and a few committed distraction intervals.
fn demo_object_pattern() -> Vec<bool> {
    let mut pattern = vec![true; 20];
    pattern.extend([false; 6]);
    pattern
}
