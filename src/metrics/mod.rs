mod types;

pub use types::{FrameTimings, MetricsSnapshot, SystemMetrics};

use sysinfo::{Pid, ProcessesToUpdate, System};

const MAX_RECENT_FRAMES: usize = 20;

/// Frame-pipeline timing collector for the streaming loop. Owned by the loop,
/// so no locking; process CPU/RSS come from sysinfo. Observability only:
/// nothing here feeds the focus decision.
pub struct PublisherMetrics {
    recent_frames: Vec<FrameTimings>,
    frame_count: u64,
    system: System,
    pid: Pid,
}

impl PublisherMetrics {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        // Initial refresh to establish the baseline for CPU deltas.
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        Self {
            recent_frames: Vec::with_capacity(MAX_RECENT_FRAMES),
            frame_count: 0,
            system,
            pid,
        }
    }

    pub fn record_frame(&mut self, timings: FrameTimings) {
        self.frame_count += 1;
        self.recent_frames.push(timings);
        if self.recent_frames.len() > MAX_RECENT_FRAMES {
            self.recent_frames.remove(0);
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn snapshot(&mut self) -> MetricsSnapshot {
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]));

        let system = if let Some(process) = self.system.process(self.pid) {
            SystemMetrics {
                cpu_percent: process.cpu_usage(),
                memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
            }
        } else {
            SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            }
        };

        MetricsSnapshot {
            system,
            frame_count: self.frame_count,
            avg_capture_ms: average(&self.recent_frames, |t| t.capture_ms),
            avg_detect_ms: average(&self.recent_frames, |t| t.detect_ms),
            avg_encode_ms: average(&self.recent_frames, |t| t.encode_ms),
        }
    }
}

fn average(frames: &[FrameTimings], field: impl Fn(&FrameTimings) -> u128) -> f64 {
    if frames.is_empty() {
        return 0.0;
    }
    frames.iter().map(|t| field(t) as f64).sum::<f64>() / frames.len() as f64
}
