// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Command-line parsing for `tl`.

use tracing::debug;

/// What the command line asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Invocation {
    /// `-h` / `--help`: show usage, write nothing.
    Help,
    /// Record an activity with this description.
    Proceed(String),
}

/// Parses arguments (program name excluded). The first positional argument is the
/// description; `--` ends option parsing so a description may start with `-`.
pub(crate) fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut positionals: Vec<&str> = Vec::new();
    let mut options_done = false;
    for arg in args {
        if options_done || arg == "-" || !arg.starts_with('-') {
            positionals.push(arg);
            continue;
        }
        match arg.as_str() {
            "--" => options_done = true,
            "-h" | "--help" => return Ok(Invocation::Help),
            other => return Err(format!("tl: invalid option: {}", other)),
        }
    }
    match positionals.split_first() {
        Some((description, rest)) => {
            if !rest.is_empty() {
                debug!(ignored = ?rest, "extra arguments ignored");
            }
            Ok(Invocation::Proceed(description.to_string()))
        }
        None => Err("tl: missing activity description".to_string()),
    }
}

/// Usage text shown for `--help` and after usage errors.
pub(crate) fn usage() -> &'static str {
    r#"Usage: tl [options] <description>

Records that the activity <description> has just ended. The activity started
when the previous one ended.

Options:
    -h, --help    Display this screen

Log file:
    $TIMELOG_FILE if set, otherwise $HOME/Documents/timelog.log.
    One entry per line: "YYYY-MM-DD HH:MM: description". A blank line is
    written before an entry that follows a gap of more than 24 hours or is the
    first one at or after 04:00 (when a new day starts).

Environment:
    TIMELOG_FILE     Path of the log file.
    TIMELOG_DEBUG    If set (any value), log debug messages to stderr.
    RUST_LOG         Log filter when TIMELOG_DEBUG is unset (default: warn).
"#
}
