//! Wire format of the outgoing stream: `multipart/x-mixed-replace` with a
//! fixed boundary, one part per encoded frame.

pub const BOUNDARY: &str = "frame";

pub fn content_type() -> String {
    format!("multipart/x-mixed-replace; boundary={BOUNDARY}")
}

/// Frame one JPEG payload. Byte order is fixed: boundary marker, content-type
/// header, blank line, payload, trailing line separator.
pub fn encode_frame_part(jpeg: &[u8]) -> Vec<u8> {
    let mut part = Vec::with_capacity(jpeg.len() + 64);
    part.extend_from_slice(b"--frame\r\n");
    part.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    part
}
