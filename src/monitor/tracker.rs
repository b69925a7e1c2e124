use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use super::session::{FocusState, Session, TimelineEntry};

/// Cadence of the timing accumulation, decoupled from the frame rate.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Minimum age an open distraction interval must reach before it is committed
/// to the distraction counter.
const DISTRACTION_COMMIT_THRESHOLD: Duration = Duration::from_secs(2);

/// Focus/distraction state machine. Consumes one pair of detection booleans
/// per processed frame, logs every transition immediately, and accumulates
/// focused/distraction seconds on a one-second cadence.
///
/// Accounting quirk carried over deliberately: a distraction interval that is
/// interrupted before it reaches two seconds is committed to neither counter,
/// so `focused_secs + distraction_secs` can fall short of the derived total.
#[derive(Debug)]
pub struct FocusTracker {
    session: Session,
    is_focused: bool,
    distraction_start: Option<Instant>,
    last_tick: Instant,
}

impl FocusTracker {
    /// `started_at` stamps the session; `now` anchors the accumulation cadence.
    pub fn new(started_at: DateTime<Utc>, now: Instant) -> Self {
        Self {
            session: Session::begin(started_at),
            is_focused: false,
            distraction_start: None,
            last_tick: now,
        }
    }

    pub fn is_focused(&self) -> bool {
        self.is_focused
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Record that the environment was noisy at some point during the session.
    /// Sticky for the session's lifetime.
    pub fn mark_noisy(&mut self) {
        self.session.ever_noisy = true;
    }

    /// Feed one processed frame's detection results into the state machine.
    ///
    /// `wall` is the wall-clock time used for timeline entries; `now` is the
    /// monotonic time used for interval arithmetic. Both are taken as
    /// parameters so the machine is clock-free and fully deterministic.
    pub fn observe(
        &mut self,
        face_detected: bool,
        object_detected: bool,
        wall: DateTime<Utc>,
        now: Instant,
    ) {
        let current = face_detected && object_detected;

        if current != self.is_focused {
            self.session.timeline.push(TimelineEntry {
                at: wall,
                state: if current {
                    FocusState::Focused
                } else {
                    FocusState::Distracted
                },
            });
        }
        self.is_focused = current;

        if current {
            // Drop any open interval on regaining focus. Letting it linger
            // would let a later distraction inherit the stale start and commit
            // time that was already counted as focused.
            self.distraction_start = None;
        } else if self.distraction_start.is_none() {
            self.distraction_start = Some(now);
        }

        if now.duration_since(self.last_tick) >= TICK_INTERVAL {
            if current {
                self.session.focused_secs += 1;
            } else if let Some(start) = self.distraction_start {
                let open = now.duration_since(start);
                if open >= DISTRACTION_COMMIT_THRESHOLD {
                    // The whole interval lands in one lump sum, whole seconds.
                    self.session.distraction_secs += open.as_secs();
                    self.distraction_start = None;
                }
            }
            self.last_tick = now;
        }
    }

    /// Finalize the session. The tracker is consumed; the returned session is
    /// immutable from the caller's point of view.
    pub fn finish(mut self, ended_at: DateTime<Utc>) -> Session {
        self.session.finalize(ended_at);
        self.session
    }
}
