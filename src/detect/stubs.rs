//! Built-in collaborator implementations: a synthetic camera and detectors
//! driven by a repeating script. Real inference backends plug in behind the
//! same traits; these exist so the engine can run and be tested end to end
//! without a camera or a model file.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use anyhow::Result;
use image::{Rgb, RgbImage};
use rand::Rng;

use super::{BoundingBox, FaceDetector, Frame, FrameSource, ObjectDetection, ObjectDetector};

/// Generates a drifting gradient with a little speckle so consecutive frames
/// are visibly distinct in a viewer. Optionally exhausts after a fixed number
/// of frames, which exercises the end-of-capture path.
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    max_frames: Option<u64>,
    cursor: AtomicU64,
}

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            max_frames: None,
            cursor: AtomicU64::new(0),
        }
    }

    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }
}

impl FrameSource for SyntheticFrameSource {
    fn next_frame(&self) -> Result<Option<Frame>> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        if let Some(max) = self.max_frames {
            if index >= max {
                return Ok(None);
            }
        }

        let shift = (index * 7 % 256) as u32;
        let mut frame = RgbImage::from_fn(self.width, self.height, |x, y| {
            let r = ((x + shift) % 256) as u8;
            let g = ((y + shift) % 256) as u8;
            Rgb([r, g, 96])
        });

        let mut rng = rand::thread_rng();
        for _ in 0..64 {
            let x = rng.gen_range(0..self.width);
            let y = rng.gen_range(0..self.height);
            frame.put_pixel(x, y, Rgb([255, 255, 255]));
        }

        Ok(Some(frame))
    }
}

/// Reports a face according to a repeating boolean pattern, one step per call.
pub struct CyclingFaceDetector {
    pattern: Vec<bool>,
    cursor: AtomicUsize,
    bbox: BoundingBox,
}

impl CyclingFaceDetector {
    pub fn new(pattern: Vec<bool>) -> Self {
        Self {
            pattern,
            cursor: AtomicUsize::new(0),
            bbox: BoundingBox {
                x: 200,
                y: 120,
                width: 180,
                height: 220,
            },
        }
    }
}

impl FaceDetector for CyclingFaceDetector {
    fn detect(&self, _frame: &Frame) -> Result<Vec<BoundingBox>> {
        if self.pattern.is_empty() {
            return Ok(Vec::new());
        }
        let step = self.cursor.fetch_add(1, Ordering::SeqCst) % self.pattern.len();
        if self.pattern[step] {
            Ok(vec![self.bbox])
        } else {
            Ok(Vec::new())
        }
    }
}

/// Reports the configured object class according to a repeating pattern.
pub struct CyclingObjectDetector {
    pattern: Vec<bool>,
    cursor: AtomicUsize,
    detection: ObjectDetection,
}

impl CyclingObjectDetector {
    pub fn new(pattern: Vec<bool>, class_id: u32) -> Self {
        Self {
            pattern,
            cursor: AtomicUsize::new(0),
            detection: ObjectDetection {
                class_id,
                confidence: 0.9,
                bbox: BoundingBox {
                    x: 80,
                    y: 300,
                    width: 240,
                    height: 120,
                },
            },
        }
    }
}

impl ObjectDetector for CyclingObjectDetector {
    fn detect(&self, _frame: &Frame) -> Result<Vec<ObjectDetection>> {
        if self.pattern.is_empty() {
            return Ok(Vec::new());
        }
        let step = self.cursor.fetch_add(1, Ordering::SeqCst) % self.pattern.len();
        if self.pattern[step] {
            Ok(vec![self.detection])
        } else {
            Ok(Vec::new())
        }
    }
}
