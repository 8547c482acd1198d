// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Timelog core: rebuilds activities from the log stream and appends new ones.
//!
//! Each log line records when an activity *ended*; the activity started when
//! the previous line's activity ended. A blank or unrecognised line breaks that
//! chain, so the next valid line only marks a boundary.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, BufRead, BufReader, Read, Write};
use tracing::debug;

/// A new logical day starts at 04:00.
const DAY_BOUNDARY_HOUR: u32 = 4;

/// Timestamp layout used on every log line.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// `YYYY-MM-DD HH:MM: description`, anchored at the start of the line so a timestamp
/// buried in stray text does not count. The newline is stripped before matching, so a
/// final line without one still parses.
static LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2}) ([0-9]{2}):([0-9]{2}): (.*)$").unwrap()
});

/// One logged interval. `start_time` is `None` for the first activity of a chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Activity {
    pub(crate) start_time: Option<NaiveDateTime>,
    pub(crate) end_time: NaiveDateTime,
    pub(crate) description: String,
}

impl Activity {
    /// End time as written on the log line.
    pub(crate) fn end_stamp(&self) -> String {
        self.end_time.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// A single well-formed log line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LogEntry {
    pub(crate) timestamp: NaiveDateTime,
    pub(crate) description: String,
}

/// Parses one log line (with or without its trailing newline).
/// Returns `None` for blank lines, stray text, and timestamps that are not real dates.
pub(crate) fn parse_line(line: &str) -> Option<LogEntry> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    let caps = LINE_REGEX.captures(line)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;
    let timestamp = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
    Some(LogEntry {
        timestamp,
        description: caps[6].to_string(),
    })
}

/// Formats a log line without the trailing newline. Seconds are dropped.
pub(crate) fn format_line(end_time: NaiveDateTime, description: &str) -> String {
    format!("{}: {}", end_time.format(TIMESTAMP_FORMAT), description)
}

/// Drops seconds and sub-seconds so in-memory times match what the log can hold.
fn truncate_to_minute(t: NaiveDateTime) -> NaiveDateTime {
    t.date().and_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

/// More than 24 hours passed between the two entries.
fn more_than_a_day_passed(end_time: NaiveDateTime, previous_end_time: NaiveDateTime) -> bool {
    end_time - previous_end_time > Duration::hours(24)
}

/// Previous entry was before 04:00 and the new one is at or after 04:00.
fn crossed_day_boundary(end_time: NaiveDateTime, previous_end_time: NaiveDateTime) -> bool {
    previous_end_time.hour() < DAY_BOUNDARY_HOUR && end_time.hour() >= DAY_BOUNDARY_HOUR
}

/// Whether a blank separator line belongs before an entry ending at `end_time`.
fn needs_separator(end_time: NaiveDateTime, previous_end_time: NaiveDateTime) -> bool {
    more_than_a_day_passed(end_time, previous_end_time)
        || crossed_day_boundary(end_time, previous_end_time)
}

/// Parser state carried from one line to the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChainState {
    /// No start time known; the next valid line only sets a boundary.
    AwaitingFirstBoundary,
    /// The previous valid line ended at this time.
    InChain(NaiveDateTime),
}

impl ChainState {
    /// Consumes one line, pushing an activity when a full interval is known.
    fn advance(self, line: &str, activities: &mut Vec<Activity>) -> ChainState {
        let entry = match parse_line(line) {
            Some(e) => e,
            None => return ChainState::AwaitingFirstBoundary,
        };
        if let ChainState::InChain(start_time) = self {
            activities.push(Activity {
                start_time: Some(start_time),
                end_time: entry.timestamp,
                description: entry.description,
            });
        }
        ChainState::InChain(entry.timestamp)
    }
}

/// Activities parsed from a log stream, plus the stream for further appends.
pub(crate) struct Timelog<S> {
    activities: Vec<Activity>,
    stream: S,
    /// The last line read had no trailing newline.
    unterminated: bool,
}

impl<S: Read + Write> Timelog<S> {
    /// Reads the whole stream and rebuilds its activities.
    /// The stream is left at end-of-log, ready for appends.
    ///
    /// A log with a single entry yields no activities: that entry only tells
    /// when the first (untracked) interval ended.
    pub(crate) fn load(mut stream: S) -> io::Result<Self> {
        let mut activities = Vec::new();
        let mut state = ChainState::AwaitingFirstBoundary;
        let mut unterminated = false;
        let mut lines = 0usize;
        {
            let mut reader = BufReader::new(&mut stream);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf)? == 0 {
                    break;
                }
                lines += 1;
                unterminated = buf.last() != Some(&b'\n');
                let line = String::from_utf8_lossy(&buf);
                state = state.advance(&line, &mut activities);
            }
        }
        debug!(lines, activities = activities.len(), "loaded timelog");
        Ok(Timelog {
            activities,
            stream,
            unterminated,
        })
    }

    pub(crate) fn activities(&self) -> &[Activity] {
        &self.activities
    }

    /// Appends an activity ending at `end_time` (now, if `None`), preceded by a
    /// blank line when it starts a new logical day or follows a gap of more than
    /// 24 hours. Its start is the end of the last known activity.
    pub(crate) fn record_activity(
        &mut self,
        description: &str,
        end_time: Option<NaiveDateTime>,
    ) -> io::Result<&Activity> {
        let end_time =
            truncate_to_minute(end_time.unwrap_or_else(|| chrono::Local::now().naive_local()));
        let mut out = String::new();
        if self.unterminated {
            out.push('\n');
        }
        let start_time = match self.activities.last() {
            Some(previous) => {
                let previous_end_time = previous.end_time;
                if needs_separator(end_time, previous_end_time) {
                    debug!(%previous_end_time, %end_time, "inserting separator");
                    out.push('\n');
                }
                Some(previous_end_time)
            }
            None => None,
        };
        out.push_str(&format_line(end_time, description));
        out.push('\n');
        self.stream.write_all(out.as_bytes())?;
        self.stream.flush()?;
        self.unterminated = false;
        self.activities.push(Activity {
            start_time,
            end_time,
            description: description.to_string(),
        });
        Ok(&self.activities[self.activities.len() - 1])
    }
}
