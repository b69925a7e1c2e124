use image::Rgb;

use crate::detect::{BoundingBox, Frame};
use crate::monitor::{format_hms, Session};

const COLOR_LABEL: Rgb<u8> = Rgb([255, 255, 0]);
const COLOR_TOTAL: Rgb<u8> = Rgb([255, 255, 255]);
const COLOR_FOCUSED: Rgb<u8> = Rgb([0, 255, 0]);
const COLOR_ALERT: Rgb<u8> = Rgb([255, 0, 0]);
const COLOR_FACE_BOX: Rgb<u8> = Rgb([0, 255, 0]);
const COLOR_OBJECT_BOX: Rgb<u8> = Rgb([0, 0, 255]);

/// HUD content for one frame: the current focus verdict and the running
/// session clocks, already formatted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub focus_label: &'static str,
    pub total: String,
    pub focused: String,
    pub distraction: String,
    pub noisy: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLine {
    pub text: String,
    pub color: Rgb<u8>,
}

impl Overlay {
    pub fn compose(session: &Session, is_focused: bool, noisy: bool) -> Self {
        Self {
            focus_label: if is_focused { "Focused" } else { "Not Focused" },
            total: format_hms(session.total_secs()),
            focused: format_hms(session.focused_secs),
            distraction: format_hms(session.distraction_secs),
            noisy,
        }
    }

    /// HUD lines in draw order. The noise warning appears only while the
    /// flag is raised.
    pub fn lines(&self) -> Vec<OverlayLine> {
        let mut lines = vec![
            OverlayLine {
                text: self.focus_label.to_string(),
                color: COLOR_LABEL,
            },
            OverlayLine {
                text: format!("Total Time: {}", self.total),
                color: COLOR_TOTAL,
            },
            OverlayLine {
                text: format!("Focused Time: {}", self.focused),
                color: COLOR_FOCUSED,
            },
            OverlayLine {
                text: format!("Distraction Time: {}", self.distraction),
                color: COLOR_ALERT,
            },
        ];
        if self.noisy {
            lines.push(OverlayLine {
                text: "Noisy Environment".to_string(),
                color: COLOR_ALERT,
            });
        }
        lines
    }
}

/// Pixel-level drawing collaborator. The engine composes what to show; how it
/// is rasterized (fonts included) lives behind this seam, next to the other
/// vision collaborators.
pub trait FrameAnnotator: Send + Sync {
    fn annotate(
        &self,
        frame: &mut Frame,
        face_boxes: &[BoundingBox],
        object_boxes: &[BoundingBox],
        overlay: &Overlay,
    );
}

/// Built-in annotator: detection box outlines plus one color swatch per HUD
/// line in the top-left corner. Glyph rendering is left to richer annotator
/// implementations.
pub struct HudAnnotator;

impl FrameAnnotator for HudAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        face_boxes: &[BoundingBox],
        object_boxes: &[BoundingBox],
        overlay: &Overlay,
    ) {
        for bbox in face_boxes {
            draw_box_outline(frame, bbox, COLOR_FACE_BOX);
        }
        for bbox in object_boxes {
            draw_box_outline(frame, bbox, COLOR_OBJECT_BOX);
        }
        for (row, line) in overlay.lines().iter().enumerate() {
            fill_rect(frame, 10, 18 + 30 * row as i64, 18, 18, line.color);
        }
    }
}

fn fill_rect(frame: &mut Frame, x: i64, y: i64, width: u32, height: u32, color: Rgb<u8>) {
    let (fw, fh) = frame.dimensions();
    for dy in 0..height as i64 {
        for dx in 0..width as i64 {
            let px = x + dx;
            let py = y + dy;
            if px >= 0 && py >= 0 && (px as u32) < fw && (py as u32) < fh {
                frame.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

fn draw_box_outline(frame: &mut Frame, bbox: &BoundingBox, color: Rgb<u8>) {
    const THICKNESS: u32 = 2;
    let BoundingBox {
        x,
        y,
        width,
        height,
    } = *bbox;
    fill_rect(frame, x, y, width, THICKNESS, color);
    fill_rect(
        frame,
        x,
        y + height as i64 - THICKNESS as i64,
        width,
        THICKNESS,
        color,
    );
    fill_rect(frame, x, y, THICKNESS, height, color);
    fill_rect(
        frame,
        x + width as i64 - THICKNESS as i64,
        y,
        THICKNESS,
        height,
        color,
    );
}
