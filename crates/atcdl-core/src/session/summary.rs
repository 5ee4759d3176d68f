//! Human-readable lines the controller hands to the reporter.

use std::path::Path;

use crate::planner::TimeInterval;
use crate::queue::QueueCounts;

use super::config::SessionConfig;
use super::phase::Phase;

pub(super) fn header(cfg: &SessionConfig, intervals: usize) -> Vec<String> {
    vec![
        format!("Starting download for {}", cfg.station),
        format!(
            "Time range: {} to {} UTC",
            cfg.start.format("%Y-%m-%d %H:%M"),
            cfg.end.format("%Y-%m-%d %H:%M")
        ),
        format!("Total intervals: {}", intervals),
        format!("Output folder: {}", cfg.destination.display()),
        format!("Using {} concurrent worker(s)", cfg.concurrency),
        format!(
            "Delay between downloads: {} seconds (per worker)",
            cfg.stagger_delay_secs
        ),
    ]
}

pub(super) fn unit_ok(done: usize, total: usize, interval: &TimeInterval, artifact: &Path) -> String {
    let name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| artifact.display().to_string());
    format!("[{}/{}] OK {} -> {}", done, total, interval, name)
}

pub(super) fn unit_failed(done: usize, total: usize, interval: &TimeInterval, reason: &str) -> String {
    format!("[{}/{}] FAILED {}: {}", done, total, interval, reason)
}

pub(super) fn progress(done: usize, total: usize, counts: &QueueCounts) -> String {
    format!(
        "Progress: {}/{} ({} OK, {} failed)",
        done, total, counts.completed, counts.failed
    )
}

/// Closing block logged when a session settles.
pub(super) fn settled_block(phase: Phase, counts: &QueueCounts) -> Vec<String> {
    match phase {
        Phase::Paused => vec![
            "=== Download Paused ===".to_string(),
            format!("Completed: {} files", counts.completed),
            format!("Failed: {} files", counts.failed),
            format!("Remaining: {} files", counts.pending),
        ],
        Phase::Cancelled => vec![
            "=== Download Stopped ===".to_string(),
            format!("Successfully downloaded: {} files", counts.completed),
            format!("Failed: {} files", counts.failed),
            format!("Abandoned: {} files", counts.pending),
        ],
        _ => vec![
            "=== Download Complete ===".to_string(),
            format!("Successfully downloaded: {} files", counts.completed),
            format!("Failed: {} files", counts.failed),
        ],
    }
}

/// One-line summary for a session event.
pub(super) fn one_line(phase: Phase, counts: &QueueCounts) -> String {
    match phase {
        Phase::Idle => "Ready".to_string(),
        Phase::Planning => "Planning intervals".to_string(),
        Phase::Running => format!(
            "Downloading: {} successful, {} failed, {} in flight, {} pending",
            counts.completed, counts.failed, counts.in_flight, counts.pending
        ),
        Phase::Paused => format!(
            "Download paused: {} successful, {} failed, {} remaining",
            counts.completed, counts.failed, counts.pending
        ),
        Phase::Cancelled => format!(
            "Download stopped: {} successful, {} failed",
            counts.completed, counts.failed
        ),
        Phase::Completed => format!(
            "Download complete: {} successful, {} failed",
            counts.completed, counts.failed
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn unit_lines_use_file_name_only() {
        let iv = TimeInterval::new(Utc.with_ymd_and_hms(2021, 10, 1, 1, 0, 0).unwrap());
        let line = unit_ok(3, 5, &iv, Path::new("/out/KPDX-Zse-Oct-01-2021-0100Z.mp3"));
        assert_eq!(line, "[3/5] OK Oct-01-2021 0100Z -> KPDX-Zse-Oct-01-2021-0100Z.mp3");
        assert_eq!(
            unit_failed(1, 5, &iv, "HTTP 404"),
            "[1/5] FAILED Oct-01-2021 0100Z: HTTP 404"
        );
    }

    #[test]
    fn paused_block_reports_remaining() {
        let counts = QueueCounts {
            planned: 5,
            pending: 2,
            in_flight: 0,
            completed: 2,
            failed: 1,
        };
        let block = settled_block(Phase::Paused, &counts);
        assert_eq!(block[0], "=== Download Paused ===");
        assert_eq!(block[3], "Remaining: 2 files");
        assert_eq!(
            one_line(Phase::Completed, &counts),
            "Download complete: 2 successful, 1 failed"
        );
    }
}
