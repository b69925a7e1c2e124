pub mod session;
pub mod tracker;

pub use session::{format_hms, FocusState, Session, TimelineEntry};
pub use tracker::FocusTracker;
