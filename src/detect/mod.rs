pub mod stubs;

use anyhow::Result;
use image::RgbImage;

/// Raw camera frame as handed to the detectors and the annotator.
pub type Frame = RgbImage;

/// Detections with confidence at or below this are ignored.
pub const OBJECT_CONFIDENCE_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectDetection {
    pub class_id: u32,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Produces one frame per call. `Ok(None)` signals exhaustion, which the
/// streaming loop treats the same as an explicit stop request.
pub trait FrameSource: Send + Sync {
    fn next_frame(&self) -> Result<Option<Frame>>;
}

/// Face-detection inference. A non-empty box set means a face is present.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<BoundingBox>>;
}

/// Object-detection inference over the whole class vocabulary; filtering down
/// to the target class happens on this side of the boundary.
pub trait ObjectDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<ObjectDetection>>;
}

/// Boxes of detections that count: confidence above the threshold and the
/// class the session is watching for.
pub fn matching_objects(detections: &[ObjectDetection], target_class_id: u32) -> Vec<BoundingBox> {
    detections
        .iter()
        .filter(|d| d.confidence > OBJECT_CONFIDENCE_THRESHOLD && d.class_id == target_class_id)
        .map(|d| d.bbox)
        .collect()
}
