use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FocusState {
    Focused,
    Distracted,
}

impl FocusState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusState::Focused => "Focused",
            FocusState::Distracted => "Distracted",
        }
    }
}

/// One focus-state transition. Appended by the tracker, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub at: DateTime<Utc>,
    pub state: FocusState,
}

/// Accumulated state of one monitoring session. Owned exclusively by the
/// streaming loop while it runs; finalized once the loop exits and handed to
/// the report writer as a read-only snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub focused_secs: u64,
    pub distraction_secs: u64,
    pub ever_noisy: bool,
    pub timeline: Vec<TimelineEntry>,
}

impl Session {
    pub fn begin(started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at,
            ended_at: None,
            focused_secs: 0,
            distraction_secs: 0,
            ever_noisy: false,
            timeline: Vec::new(),
        }
    }

    /// Elapsed wall-clock seconds since the session started. Derived at read
    /// time, never accumulated; clamps to zero if the clock moves backwards.
    pub fn total_secs(&self) -> u64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_seconds().max(0) as u64
    }

    /// Share of the session spent focused, in percent. Zero for an empty
    /// session rather than a division by zero.
    pub fn focus_percentage(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        self.focused_secs as f64 / total as f64 * 100.0
    }

    pub fn finalize(&mut self, ended_at: DateTime<Utc>) {
        self.ended_at = Some(ended_at);
    }
}

/// Format a duration in whole seconds as `HH:MM:SS`. Hours are not wrapped at
/// 24, so a marathon session reads `25:00:00` rather than rolling over.
pub fn format_hms(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn make_session(started: DateTime<Utc>) -> Session {
        Session::begin(started)
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(59), "00:00:59");
        assert_eq!(format_hms(61), "00:01:01");
        assert_eq!(format_hms(3661), "01:01:01");
        assert_eq!(format_hms(90_000), "25:00:00");
    }

    #[test]
    fn test_total_secs_uses_ended_at_once_finalized() {
        let started = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut session = make_session(started);
        session.finalize(started + chrono::Duration::seconds(90));
        assert_eq!(session.total_secs(), 90);
    }

    #[test]
    fn test_focus_percentage_guards_empty_session() {
        let started = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut session = make_session(started);
        session.finalize(started);
        assert_eq!(session.focus_percentage(), 0.0);
    }

    #[test]
    fn test_focus_percentage() {
        let started = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut session = make_session(started);
        session.focused_secs = 45;
        session.finalize(started + chrono::Duration::seconds(60));
        assert!((session.focus_percentage() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(FocusState::Focused.as_str(), "Focused");
        assert_eq!(FocusState::Distracted.as_str(), "Distracted");
    }
}
