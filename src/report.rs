use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;

use crate::monitor::{format_hms, Session};

/// Render and persist the session report. Called exactly once per session,
/// after both concurrent tasks have stopped, so plain file IO is enough.
/// The filename is stamped with the report's creation time, all times UTC.
pub fn write_report(dir: &Path, session: &Session) -> Result<PathBuf> {
    let stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S");
    let path = dir.join(format!("study_session_report_{stamp}.txt"));

    fs::write(&path, render_report(session)).with_context(|| {
        format!("failed to write session report to {}", path.display())
    })?;

    info!("session report saved as {}", path.display());
    Ok(path)
}

pub fn render_report(session: &Session) -> String {
    let ended = session.ended_at.unwrap_or(session.started_at);

    let mut out = String::new();
    let _ = writeln!(out, "Study Session Report");
    let _ = writeln!(out, "=====================");
    let _ = writeln!(
        out,
        "Start Time: {}",
        session.started_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "End Time: {}", ended.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(
        out,
        "Total Study Session Time: {}",
        format_hms(session.total_secs())
    );
    let _ = writeln!(
        out,
        "Total Focused Time: {}",
        format_hms(session.focused_secs)
    );
    let _ = writeln!(
        out,
        "Total Distraction Time: {}",
        format_hms(session.distraction_secs)
    );
    let _ = writeln!(
        out,
        "Focus Percentage: {:.2}%",
        session.focus_percentage()
    );
    let _ = writeln!(
        out,
        "Noisy Environment: {}",
        if session.ever_noisy { "Yes" } else { "No" }
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Focus and Distraction Timeline:");
    let _ = writeln!(out, "==============================");
    for entry in &session.timeline {
        let _ = writeln!(
            out,
            "{} - {}",
            entry.at.format("%H:%M:%S"),
            entry.state.as_str()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{FocusState, TimelineEntry};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn make_session() -> Session {
        let started = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut session = Session::begin(started);
        session.focused_secs = 90;
        session.distraction_secs = 20;
        session.ever_noisy = true;
        session.timeline = vec![
            TimelineEntry {
                at: started + chrono::Duration::seconds(1),
                state: FocusState::Focused,
            },
            TimelineEntry {
                at: started + chrono::Duration::seconds(95),
                state: FocusState::Distracted,
            },
        ];
        session.finalize(started + chrono::Duration::seconds(120));
        session
    }

    #[test]
    fn test_report_layout() {
        let rendered = render_report(&make_session());
        assert_eq!(
            rendered,
            "Study Session Report\n\
             =====================\n\
             Start Time: 2024-03-01 09:00:00\n\
             End Time: 2024-03-01 09:02:00\n\
             Total Study Session Time: 00:02:00\n\
             Total Focused Time: 00:01:30\n\
             Total Distraction Time: 00:00:20\n\
             Focus Percentage: 75.00%\n\
             Noisy Environment: Yes\n\
             \n\
             Focus and Distraction Timeline:\n\
             ==============================\n\
             09:00:01 - Focused\n\
             09:01:35 - Distracted\n"
        );
    }

    #[test]
    fn test_empty_session_reports_zero_percentage() {
        let started = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut session = Session::begin(started);
        session.finalize(started);
        let rendered = render_report(&session);
        assert!(rendered.contains("Focus Percentage: 0.00%"));
        assert!(rendered.contains("Noisy Environment: No"));
    }

    #[test]
    fn test_write_report_creates_named_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(dir.path(), &make_session()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("study_session_report_"));
        assert!(name.ends_with(".txt"));
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Study Session Report\n"));
    }
}
