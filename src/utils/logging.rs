/// Diagnostics sink: `timestamp - LEVEL - message` lines appended to the configured log file

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use env_logger::{Builder, Env, Target};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

pub fn format_log_line(timestamp: DateTime<Local>, level: log::Level, message: &str) -> String {
    format!("{} - {} - {}", timestamp.format(TIMESTAMP_FORMAT), level, message)
}

/// Install the global logger writing to `log_file`. Level defaults to `info`, `RUST_LOG` overrides.
pub fn init_logging(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{}",
                format_log_line(Local::now(), record.level(), &record.args().to_string())
            )
        })
        .try_init()
        .context("Logger was already initialised")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_log_line() {
        let ts = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            format_log_line(ts, log::Level::Error, "Error killing process 7: no such process (pid=7)"),
            "2024-01-02 03:04:05,000 - ERROR - Error killing process 7: no such process (pid=7)"
        );
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending
        assert!(init_logging(dir.path()).is_err());
    }
}
