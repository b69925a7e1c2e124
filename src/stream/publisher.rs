use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::audio::{AudioSource, NoiseMonitor};
use crate::context::SessionContext;
use crate::detect::{
    matching_objects, BoundingBox, FaceDetector, Frame, FrameSource, ObjectDetector,
};
use crate::metrics::{FrameTimings, PublisherMetrics};
use crate::monitor::{format_hms, FocusTracker};
use crate::report;

use super::mjpeg;
use super::overlay::{FrameAnnotator, Overlay};

/// Display cadence, decoupled from capture/processing speed.
const FRAME_INTERVAL: Duration = Duration::from_millis(500);
const FRAME_QUEUE_DEPTH: usize = 2;
const JPEG_QUALITY: u8 = 80;
const METRICS_LOG_EVERY: u64 = 120;

/// The collaborators one session streams from.
#[derive(Clone)]
pub struct StreamPipeline {
    pub frames: Arc<dyn FrameSource>,
    pub faces: Arc<dyn FaceDetector>,
    pub objects: Arc<dyn ObjectDetector>,
    pub annotator: Arc<dyn FrameAnnotator>,
    pub audio: Arc<dyn AudioSource>,
    pub target_class_id: u32,
}

/// Drives one session: capture, detect, track, annotate, encode, emit, pace.
/// Runs as a producer task feeding a bounded channel; the HTTP response writer
/// drains it, and transport backpressure shows up here as a blocked send.
pub struct StreamPublisher {
    ctx: Arc<SessionContext>,
    pipeline: StreamPipeline,
    report_dir: PathBuf,
    frame_interval: Duration,
}

struct DetectedFrame {
    frame: Frame,
    face_boxes: Vec<BoundingBox>,
    object_boxes: Vec<BoundingBox>,
    capture_ms: u128,
    detect_ms: u128,
}

impl StreamPublisher {
    pub fn new(ctx: Arc<SessionContext>, pipeline: StreamPipeline, report_dir: PathBuf) -> Self {
        Self {
            ctx,
            pipeline,
            report_dir,
            frame_interval: FRAME_INTERVAL,
        }
    }

    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    /// Spawn the producer task. The returned receiver yields one framed
    /// multipart chunk per emitted frame; the channel closing means the
    /// session is over and its report has been written.
    pub fn spawn(self) -> mpsc::Receiver<Vec<u8>> {
        let (tx, rx) = mpsc::channel(FRAME_QUEUE_DEPTH);
        tokio::spawn(self.run(tx));
        rx
    }

    async fn run(self, tx: mpsc::Sender<Vec<u8>>) {
        let mut tracker = FocusTracker::new(Utc::now(), Instant::now());
        info!("session {} started", tracker.session().id);

        let mut noise = NoiseMonitor::new();
        if let Err(err) = noise.start(Arc::clone(&self.ctx), Arc::clone(&self.pipeline.audio)) {
            error!("failed to start noise sampler: {err:?}");
        }

        // Collaborator faults land here as errors; the session still ends in
        // a report either way.
        if let Err(err) = self.stream_frames(&tx, &mut tracker).await {
            error!("streaming loop aborted: {err:?}");
        }

        if let Err(err) = noise.stop().await {
            error!("failed to stop noise sampler: {err:?}");
        }

        let session = tracker.finish(Utc::now());
        info!(
            "session {} ended: focused {}, distracted {}, total {}",
            session.id,
            format_hms(session.focused_secs),
            format_hms(session.distraction_secs),
            format_hms(session.total_secs()),
        );

        if let Err(err) = report::write_report(&self.report_dir, &session) {
            error!("failed to write session report: {err:?}");
        }
        // The pipeline, and with it the capture source, is released when the
        // task returns.
    }

    async fn stream_frames(
        &self,
        tx: &mpsc::Sender<Vec<u8>>,
        tracker: &mut FocusTracker,
    ) -> Result<()> {
        let mut ticker = tokio::time::interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut metrics = PublisherMetrics::new();

        loop {
            ticker.tick().await;

            if self.ctx.stop_requested() {
                info!("stop signal observed; ending session");
                break;
            }

            let step = {
                let pipeline = self.pipeline.clone();
                tokio::task::spawn_blocking(move || capture_and_detect(&pipeline))
                    .await
                    .context("capture worker join failed")??
            };
            let Some(step) = step else {
                info!("frame source exhausted; ending session");
                break;
            };

            tracker.observe(
                !step.face_boxes.is_empty(),
                !step.object_boxes.is_empty(),
                Utc::now(),
                Instant::now(),
            );
            let noisy = self.ctx.is_noisy();
            if noisy {
                tracker.mark_noisy();
            }
            let overlay = Overlay::compose(tracker.session(), tracker.is_focused(), noisy);

            let DetectedFrame {
                mut frame,
                face_boxes,
                object_boxes,
                capture_ms,
                detect_ms,
            } = step;
            let annotator = Arc::clone(&self.pipeline.annotator);
            let (jpeg, encode_ms) =
                tokio::task::spawn_blocking(move || -> Result<(Vec<u8>, u128)> {
                    let encode_start = Instant::now();
                    annotator.annotate(&mut frame, &face_boxes, &object_boxes, &overlay);
                    let jpeg = encode_jpeg(&frame)?;
                    Ok((jpeg, encode_start.elapsed().as_millis()))
                })
                .await
                .context("encode worker join failed")??;

            if tx.send(mjpeg::encode_frame_part(&jpeg)).await.is_err() {
                info!("stream consumer disconnected; ending session");
                break;
            }

            metrics.record_frame(FrameTimings {
                capture_ms,
                detect_ms,
                encode_ms,
            });
            if metrics.frame_count() % METRICS_LOG_EVERY == 0 {
                let snapshot = metrics.snapshot();
                info!(
                    "published {} frames (capture {:.1}ms, detect {:.1}ms, encode {:.1}ms, cpu {:.1}%, rss {:.1}MB)",
                    snapshot.frame_count,
                    snapshot.avg_capture_ms,
                    snapshot.avg_detect_ms,
                    snapshot.avg_encode_ms,
                    snapshot.system.cpu_percent,
                    snapshot.system.memory_mb,
                );
            }
        }

        Ok(())
    }
}

fn capture_and_detect(pipeline: &StreamPipeline) -> Result<Option<DetectedFrame>> {
    let capture_start = Instant::now();
    let Some(frame) = pipeline.frames.next_frame()? else {
        return Ok(None);
    };
    let capture_ms = capture_start.elapsed().as_millis();

    let detect_start = Instant::now();
    let face_boxes = pipeline.faces.detect(&frame)?;
    let detections = pipeline.objects.detect(&frame)?;
    let object_boxes = matching_objects(&detections, pipeline.target_class_id);
    let detect_ms = detect_start.elapsed().as_millis();

    Ok(Some(DetectedFrame {
        frame,
        face_boxes,
        object_boxes,
        capture_ms,
        detect_ms,
    }))
}

fn encode_jpeg(frame: &Frame) -> Result<Vec<u8>> {
    let mut jpeg = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(frame)
        .context("jpeg encoding failed")?;
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::stubs::{CyclingFaceDetector, CyclingObjectDetector, SyntheticFrameSource};
    use crate::stream::overlay::HudAnnotator;
    use anyhow::anyhow;
    use std::path::Path;

    /// Instant quiet capture with a token pause so the sampler does not spin.
    struct QuietAudioSource;

    impl AudioSource for QuietAudioSource {
        fn sample(&self, _duration: Duration, _rate: u32, _channels: u16) -> Result<Vec<f32>> {
            std::thread::sleep(Duration::from_millis(1));
            Ok(vec![1e-4; 64])
        }
    }

    struct LoudAudioSource;

    impl AudioSource for LoudAudioSource {
        fn sample(&self, _duration: Duration, _rate: u32, _channels: u16) -> Result<Vec<f32>> {
            std::thread::sleep(Duration::from_millis(1));
            Ok(vec![0.5; 64])
        }
    }

    struct FailingFaceDetector;

    impl FaceDetector for FailingFaceDetector {
        fn detect(&self, _frame: &Frame) -> Result<Vec<BoundingBox>> {
            Err(anyhow!("model backend crashed"))
        }
    }

    fn make_pipeline(frames: SyntheticFrameSource) -> StreamPipeline {
        StreamPipeline {
            frames: Arc::new(frames),
            faces: Arc::new(CyclingFaceDetector::new(vec![true])),
            objects: Arc::new(CyclingObjectDetector::new(vec![true], 73)),
            annotator: Arc::new(HudAnnotator),
            audio: Arc::new(QuietAudioSource),
            target_class_id: 73,
        }
    }

    fn report_files(dir: &Path) -> Vec<std::path::PathBuf> {
        let mut files: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.file_name()
                    .unwrap()
                    .to_string_lossy()
                    .starts_with("study_session_report_")
            })
            .collect();
        files.sort();
        files
    }

    #[tokio::test]
    async fn test_stop_signal_ends_stream_and_writes_one_report() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Arc::new(SessionContext::new());
        let publisher = StreamPublisher::new(
            Arc::clone(&ctx),
            make_pipeline(SyntheticFrameSource::new(64, 48)),
            dir.path().to_path_buf(),
        )
        .with_frame_interval(Duration::from_millis(10));

        let mut rx = publisher.spawn();
        let first = rx.recv().await.expect("first frame");
        assert!(first.starts_with(b"--frame\r\n"));
        assert!(first
            .windows(b"Content-Type: image/jpeg".len())
            .any(|w| w == b"Content-Type: image/jpeg"));

        ctx.request_stop();
        // Drain until the producer closes the channel; by then the report is
        // already on disk.
        while rx.recv().await.is_some() {}
        assert_eq!(report_files(dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn test_capture_exhaustion_ends_stream_gracefully() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Arc::new(SessionContext::new());
        let publisher = StreamPublisher::new(
            Arc::clone(&ctx),
            make_pipeline(SyntheticFrameSource::new(64, 48).with_max_frames(3)),
            dir.path().to_path_buf(),
        )
        .with_frame_interval(Duration::from_millis(5));

        let mut rx = publisher.spawn();
        let mut parts = 0;
        while rx.recv().await.is_some() {
            parts += 1;
        }
        assert_eq!(parts, 3);

        let files = report_files(dir.path());
        assert_eq!(files.len(), 1);
        let contents = std::fs::read_to_string(&files[0]).unwrap();
        assert!(contents.starts_with("Study Session Report\n"));
    }

    #[tokio::test]
    async fn test_detector_failure_still_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Arc::new(SessionContext::new());
        let mut pipeline = make_pipeline(SyntheticFrameSource::new(64, 48));
        pipeline.faces = Arc::new(FailingFaceDetector);
        let publisher =
            StreamPublisher::new(Arc::clone(&ctx), pipeline, dir.path().to_path_buf())
                .with_frame_interval(Duration::from_millis(5));

        let mut rx = publisher.spawn();
        while rx.recv().await.is_some() {}
        assert_eq!(report_files(dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn test_noisy_environment_lands_in_report() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Arc::new(SessionContext::new());
        let mut pipeline = make_pipeline(SyntheticFrameSource::new(64, 48));
        pipeline.audio = Arc::new(LoudAudioSource);
        let publisher =
            StreamPublisher::new(Arc::clone(&ctx), pipeline, dir.path().to_path_buf())
                .with_frame_interval(Duration::from_millis(10));

        let mut rx = publisher.spawn();
        // Give the sampler a few cycles before stopping.
        for _ in 0..5 {
            if rx.recv().await.is_none() {
                break;
            }
        }
        ctx.request_stop();
        while rx.recv().await.is_some() {}

        let files = report_files(dir.path());
        assert_eq!(files.len(), 1);
        let contents = std::fs::read_to_string(&files[0]).unwrap();
        assert!(contents.contains("Noisy Environment: Yes"));
    }
}
