//! I/O operations for persisted reports.
//!
//! `latest.json` uses overwrite semantics; the history directory is
//! append-only. Both live under the configured output directory, created on
//! demand.

use chrono::{DateTime, Utc};
use routebench_core::PersistedReport;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fixed name of the most-recent-run file.
pub const LATEST_FILE: &str = "latest.json";

/// Name of the append-only history directory.
pub const HISTORY_DIR: &str = "history";

/// Errors produced while persisting or loading reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A report file or directory could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A report file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A report could not be (de)serialized.
    #[error("report serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for report I/O.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Where one run's report ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPaths {
    /// The overwritten latest file.
    pub latest: PathBuf,
    /// The freshly created history file.
    pub history: PathBuf,
}

/// Persist a report: overwrite `latest.json`, append to `history/`.
pub fn write_report(report: &PersistedReport, output_dir: &Path) -> Result<WrittenPaths> {
    let history_dir = output_dir.join(HISTORY_DIR);
    std::fs::create_dir_all(&history_dir).map_err(|source| ReportError::Write {
        path: history_dir.clone(),
        source,
    })?;

    let payload = serde_json::to_vec_pretty(report)?;

    let latest = output_dir.join(LATEST_FILE);
    std::fs::write(&latest, &payload).map_err(|source| ReportError::Write {
        path: latest.clone(),
        source,
    })?;

    let history = unique_history_path(&history_dir, &report.timestamp);
    std::fs::write(&history, &payload).map_err(|source| ReportError::Write {
        path: history.clone(),
        source,
    })?;

    Ok(WrittenPaths { latest, history })
}

/// Load the most recent run from `latest.json`.
pub fn read_latest(output_dir: &Path) -> Result<PersistedReport> {
    let path = output_dir.join(LATEST_FILE);
    let raw = std::fs::read_to_string(&path).map_err(|source| ReportError::Read {
        path: path.clone(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Filesystem-safe history filename derived from the run timestamp.
fn history_filename(timestamp: &DateTime<Utc>) -> String {
    format!("report-{}.json", timestamp.format("%Y%m%dT%H%M%SZ"))
}

/// First non-existing history path for this timestamp.
///
/// Two runs completing within the same second get distinct files via a
/// numeric suffix; history entries are never overwritten.
fn unique_history_path(history_dir: &Path, timestamp: &DateTime<Utc>) -> PathBuf {
    let base = history_dir.join(history_filename(timestamp));
    if !base.exists() {
        return base;
    }
    let stem = format!("report-{}", timestamp.format("%Y%m%dT%H%M%SZ"));
    let mut counter = 1u32;
    loop {
        let candidate = history_dir.join(format!("{stem}-{counter}.json"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use routebench_core::{AppResult, PersistedReport};

    fn report_at(timestamp: DateTime<Utc>, duration_ms: u64) -> PersistedReport {
        let mut report = PersistedReport::assemble(
            3,
            duration_ms,
            vec![("app".to_string(), AppResult::default())],
        );
        report.timestamp = timestamp;
        report
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let report = report_at(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(), 42);

        write_report(&report, dir.path()).unwrap();
        let restored = read_latest(dir.path()).unwrap();
        assert_eq!(restored, report);
    }

    #[test]
    fn test_history_files_are_distinct_and_latest_reflects_newest() {
        let dir = tempfile::tempdir().unwrap();
        let first = report_at(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(), 1);
        let second = report_at(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 1).unwrap(), 2);

        let paths_a = write_report(&first, dir.path()).unwrap();
        let paths_b = write_report(&second, dir.path()).unwrap();

        assert_ne!(paths_a.history, paths_b.history);
        assert!(paths_a.history.exists());
        assert!(paths_b.history.exists());

        let latest = read_latest(dir.path()).unwrap();
        assert_eq!(latest.test_duration_ms, 2);
    }

    #[test]
    fn test_same_second_runs_get_suffixed_history_files() {
        let dir = tempfile::tempdir().unwrap();
        let stamp = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let first = report_at(stamp, 1);
        let second = report_at(stamp, 2);

        let paths_a = write_report(&first, dir.path()).unwrap();
        let paths_b = write_report(&second, dir.path()).unwrap();

        assert_ne!(paths_a.history, paths_b.history);
        assert!(paths_b
            .history
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("-1.json"));

        // The first history file still holds the first report.
        let raw = std::fs::read_to_string(&paths_a.history).unwrap();
        let restored: PersistedReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(restored.test_duration_ms, 1);
    }

    #[test]
    fn test_read_latest_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_latest(dir.path()).unwrap_err();
        assert!(matches!(err, ReportError::Read { .. }));
    }

    #[test]
    fn test_history_filename_is_filesystem_safe() {
        let stamp = Utc.with_ymd_and_hms(2025, 6, 1, 12, 34, 56).unwrap();
        let name = history_filename(&stamp);
        assert_eq!(name, "report-20250601T123456Z.json");
        assert!(!name.contains(':'));
    }
}
