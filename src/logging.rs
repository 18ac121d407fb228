//! Logging setup
//!
//! Log records go to a dated file in `<data dir>/logs`; files older than
//! seven days are removed on startup. Falls back to stderr when the log
//! directory is not writable.

use chrono::{Datelike, Local, NaiveDate};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const LOG_PREFIX: &str = "laeringsassistent-";
const RETENTION_DAYS: i64 = 7;

/// Initialize the global logger. Returns the log file path when logging to file.
pub fn init(data_dir: &Path, verbose: bool) -> Option<PathBuf> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .parse_env("LAERINGSASSISTENT_LOG")
        .format(|buf, record| {
            let now = Local::now();
            writeln!(
                buf,
                "[{}] [{}] {}",
                now.format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        });

    let log_dir = data_dir.join("logs");
    let log_path = fs::create_dir_all(&log_dir).ok().and_then(|_| {
        clean_old_logs(&log_dir, Local::now().date_naive());
        let path = log_dir.join(log_file_name(Local::now().date_naive()));
        let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
        Some(path)
    });

    // A second init (tests, embedding) keeps the existing logger
    let _ = builder.try_init();
    log_path
}

fn log_file_name(date: NaiveDate) -> String {
    format!(
        "{}{:04}-{:02}-{:02}.log",
        LOG_PREFIX,
        date.year(),
        date.month(),
        date.day()
    )
}

/// Remove `laeringsassistent-YYYY-MM-DD.log` files older than the retention window
fn clean_old_logs(log_dir: &Path, today: NaiveDate) {
    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };
    let cutoff = today - chrono::Duration::days(RETENTION_DAYS);

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(date_str) = name
            .strip_prefix(LOG_PREFIX)
            .and_then(|s| s.strip_suffix(".log"))
        else {
            continue;
        };
        if let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
            if date < cutoff {
                let _ = fs::remove_file(&path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_log_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(log_file_name(date), "laeringsassistent-2026-03-07.log");
    }

    #[test]
    fn test_clean_old_logs_keeps_recent_and_foreign_files() {
        let dir = tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();

        let old = dir.path().join("laeringsassistent-2026-03-01.log");
        let recent = dir.path().join("laeringsassistent-2026-03-18.log");
        let foreign = dir.path().join("notes-2026-01-01.log");
        for path in [&old, &recent, &foreign] {
            fs::write(path, "x").unwrap();
        }

        clean_old_logs(dir.path(), today);

        assert!(!old.exists());
        assert!(recent.exists());
        assert!(foreign.exists());
    }
}
