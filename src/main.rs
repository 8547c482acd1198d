// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! # tl — Timelog CLI
//!
//! Keeps a personal, append-only journal of what you spent your time on.
//! The log file lives at `$HOME/Documents/timelog.log` by default.
//!
//! ## Log format
//!
//! One entry per line:
//!
//! - `YYYY-MM-DD HH:MM: description`
//!
//! Each line records when an activity *ended*; it started when the previous line's
//! activity ended. A blank line breaks the chain; one is written automatically
//! before an entry that follows a gap of more than 24 hours or that is the first
//! at or after 04:00, when a new logical day begins.
//!
//! ## Usage
//!
//! | Command              | Description |
//! |----------------------|-------------|
//! | `tl <description>`   | Record that `<description>` just ended. |
//! | `tl -h`, `tl --help` | Show usage; writes nothing. |

mod cli;
mod timelog;

use anyhow::Context;
use cli::Invocation;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use timelog::{Activity, Timelog};
use tracing_subscriber::EnvFilter;
#[cfg(unix)]
use libc::{signal, SIG_IGN};

/// Default path segment under `$HOME` for the timelog file.
const DEFAULT_TIMELOG: &str = "Documents/timelog.log";

/// `$TIMELOG_FILE` if non-empty, else `$HOME/Documents/timelog.log`
/// (`./Documents/timelog.log` without `HOME`).
fn timelog_path_from(file: Option<OsString>, home: Option<OsString>) -> PathBuf {
    match file.filter(|f| !f.is_empty()) {
        Some(f) => PathBuf::from(f),
        None => home
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_TIMELOG),
    }
}

/// Returns the timelog path from the environment.
fn timelog_path() -> PathBuf {
    timelog_path_from(env::var_os("TIMELOG_FILE"), env::var_os("HOME"))
}

/// Debug logging to stderr when `TIMELOG_DEBUG` is set; otherwise `RUST_LOG` (default `warn`).
fn init_logging() {
    let filter = if env::var_os("TIMELOG_DEBUG").is_some() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Confirmation printed after a successful record.
fn confirmation(activity: &Activity) -> String {
    format!("Recorded: {} at {}", activity.description, activity.end_stamp())
}

/// Loads the timelog at `path` and records `description` as ending now.
fn cmd_record(description: &str, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("tl: cannot create directory {}", parent.display()))?;
    }
    let file = fs::OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("tl: cannot open {}", path.display()))?;
    let mut log =
        Timelog::load(file).with_context(|| format!("tl: cannot read {}", path.display()))?;
    tracing::debug!(path = %path.display(), activities = log.activities().len(), "recording");
    let activity = log
        .record_activity(description, None)
        .with_context(|| format!("tl: cannot write {}", path.display()))?;
    println!("{}", confirmation(activity));
    Ok(())
}

fn main() {
    init_logging();
    #[cfg(unix)]
    unsafe {
        signal(libc::SIGPIPE, SIG_IGN);
    }
    let args: Vec<String> = env::args().skip(1).collect();
    let description = match cli::parse_args(&args) {
        Ok(Invocation::Help) => {
            print!("{}", cli::usage());
            return;
        }
        Ok(Invocation::Proceed(description)) => description,
        Err(e) => {
            eprintln!("{}", e);
            eprint!("{}", cli::usage());
            process::exit(1);
        }
    };
    if let Err(e) = cmd_record(&description, &timelog_path()) {
        eprintln!("{:#}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timelog_path_uses_home() {
        let path = timelog_path_from(None, Some(OsString::from("/home/someone")));
        assert_eq!(path, PathBuf::from("/home/someone/Documents/timelog.log"));
    }

    #[test]
    fn test_timelog_path_without_home() {
        let path = timelog_path_from(None, None);
        assert_eq!(path, PathBuf::from("./Documents/timelog.log"));
    }

    #[test]
    fn test_timelog_path_override() {
        let path = timelog_path_from(
            Some(OsString::from("/tmp/work.log")),
            Some(OsString::from("/home/someone")),
        );
        assert_eq!(path, PathBuf::from("/tmp/work.log"));
    }

    #[test]
    fn test_timelog_path_empty_override_ignored() {
        let path = timelog_path_from(Some(OsString::new()), Some(OsString::from("/h")));
        assert_eq!(path, PathBuf::from("/h/Documents/timelog.log"));
    }

    #[test]
    fn test_confirmation() {
        let activity = Activity {
            start_time: None,
            end_time: chrono::NaiveDate::from_ymd_opt(2023, 5, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            description: "arrive".to_string(),
        };
        assert_eq!(confirmation(&activity), "Recorded: arrive at 2023-05-01 09:00");
    }

    #[test]
    fn test_cmd_record_creates_file_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Documents").join("timelog.log");
        let result = cmd_record("arrive", &path);
        assert!(result.is_ok());
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(": arrive"));
        assert!(timelog::parse_line(lines[0]).is_some());
    }

    #[test]
    fn test_cmd_record_appends_after_long_gap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timelog.log");
        let existing = "2000-01-01 09:00: arrive\n2000-01-01 10:00: email\n";
        fs::write(&path, existing).unwrap();
        let result = cmd_record("coding", &path);
        assert!(result.is_ok());
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(existing));
        let rest = &content[existing.len()..];
        assert!(rest.starts_with('\n'));
        let entry = timelog::parse_line(rest.trim_start_matches('\n')).unwrap();
        assert_eq!(entry.description, "coding");
    }

    #[test]
    fn test_cmd_record_twice_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timelog.log");
        cmd_record("a", &path).unwrap();
        cmd_record("b", &path).unwrap();
        let file = fs::OpenOptions::new().read(true).append(true).open(&path).unwrap();
        let log = Timelog::load(file).unwrap();
        assert_eq!(log.activities().len(), 1);
        assert_eq!(log.activities()[0].description, "b");
    }

    #[test]
    fn test_cmd_record_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let result = cmd_record("x", &blocker.join("timelog.log"));
        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("tl: cannot"));
    }
}
