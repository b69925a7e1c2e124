use serde::Serialize;

/// Stage timings for one published frame, in milliseconds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTimings {
    pub capture_ms: u128,
    pub detect_ms: u128,
    pub encode_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub system: SystemMetrics,
    pub frame_count: u64,
    pub avg_capture_ms: f64,
    pub avg_detect_ms: f64,
    pub avg_encode_ms: f64,
}
