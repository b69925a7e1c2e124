pub mod mjpeg;
pub mod overlay;
pub mod publisher;

pub use overlay::{FrameAnnotator, HudAnnotator, Overlay};
pub use publisher::{StreamPipeline, StreamPublisher};
