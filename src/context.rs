use std::sync::atomic::{AtomicBool, Ordering};

/// Shared per-process session context, injected into both the streaming loop
/// and the noise sampler instead of being read from global state.
///
/// Holds exactly two independent flags. Neither participates in a cross-field
/// invariant, so plain atomic loads/stores are sufficient; all session counters
/// live in the streaming loop and are never touched from here.
#[derive(Debug)]
pub struct SessionContext {
    stop: AtomicBool,
    noisy: AtomicBool,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            noisy: AtomicBool::new(false),
        }
    }

    /// Ask both loops to wind down. Observed cooperatively at their next
    /// iteration boundary.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn clear_stop(&self) {
        self.stop.store(false, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Last-writer-wins; written once per sampling cycle by the noise sampler,
    /// read opportunistically by the overlay and the report.
    pub fn set_noisy(&self, noisy: bool) {
        self.noisy.store(noisy, Ordering::SeqCst);
    }

    pub fn is_noisy(&self) -> bool {
        self.noisy.load(Ordering::SeqCst)
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
