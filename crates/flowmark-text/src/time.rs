//! Start timestamps and spent-time tokens.
//!
//! Timestamps are rendered and parsed with a chrono strftime format, so any
//! timestamp flowmark writes can be read back with the same format string.
//! Spent time uses a small placeholder format:
//!
//! | Placeholder | Meaning |
//! |---|---|
//! | `DD` | whole days |
//! | `HH` | hours (total hours when `DD` is absent) |
//! | `mm` | minutes |
//! | `ss` | seconds |

use std::fmt::Write;
use std::ops::Range;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::tokens::{SPENT_MARKER, START_MARKER};

const TOTAL_LABEL: &str = "Total:";

/// A `🛫 <timestamp>` token found in a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTimestamp {
  pub at: NaiveDateTime,
  /// Byte range of the token, including one leading space when present.
  pub span: Range<usize>,
}

/// Render a timestamp. Returns `None` when `format` is not a valid strftime format.
pub fn format_timestamp(at: NaiveDateTime, format: &str) -> Option<String> {
  let mut rendered = String::new();
  write!(rendered, "{}", at.format(format)).ok()?;
  Some(rendered)
}

/// Render a complete start token, e.g. `🛫 2024-05-01 09:00:00`.
pub fn start_token(at: NaiveDateTime, format: &str) -> Option<String> {
  format_timestamp(at, format).map(|ts| format!("{} {}", START_MARKER, ts))
}

/// Find the first start token whose timestamp parses with `format`.
pub fn find_start_timestamp(line: &str, format: &str) -> Option<StartTimestamp> {
  line.match_indices(START_MARKER).find_map(|(index, marker)| {
    let rest = &line[index + marker.len()..];
    let value = rest.trim_start();
    let (at, remainder) = parse_leading_timestamp(value, format)?;

    let start = if line[..index].ends_with(' ') {
      index - 1
    } else {
      index
    };
    Some(StartTimestamp {
      at,
      span: start..line.len() - remainder.len(),
    })
  })
}

/// Whether a start token rendered with `format` parses back to the same text.
///
/// Date-only formats pass; formats without a date (`%H:%M`) or with
/// unsupported specifiers do not.
pub fn timestamp_round_trips(format: &str) -> bool {
  let Some(sample) = NaiveDate::from_ymd_opt(2024, 5, 17).and_then(|d| d.and_hms_opt(13, 45, 30)) else {
    return false;
  };
  let Some(token) = start_token(sample, format) else {
    return false;
  };

  find_start_timestamp(&token, format).is_some_and(|found| {
    found.span == (0..token.len()) && format_timestamp(found.at, format) == format_timestamp(sample, format)
  })
}

fn parse_leading_timestamp<'a>(value: &'a str, format: &str) -> Option<(NaiveDateTime, &'a str)> {
  if let Ok(parsed) = NaiveDateTime::parse_and_remainder(value, format) {
    return Some(parsed);
  }
  // Date-only formats start the stage at midnight.
  let (date, remainder) = NaiveDate::parse_and_remainder(value, format).ok()?;
  Some((date.and_hms_opt(0, 0, 0)?, remainder))
}

/// Render an elapsed duration. Negative durations render as zero.
pub fn format_spent(elapsed: TimeDelta, format: &str) -> String {
  let seconds = elapsed.num_seconds().max(0);
  let (days, hours) = if format.contains("DD") {
    (seconds / 86_400, (seconds % 86_400) / 3_600)
  } else {
    (0, seconds / 3_600)
  };

  format
    .replace("DD", &format!("{:02}", days))
    .replace("HH", &format!("{:02}", hours))
    .replace("mm", &format!("{:02}", (seconds % 3_600) / 60))
    .replace("ss", &format!("{:02}", seconds % 60))
}

/// `(⏱️ <spent>)`
pub fn spent_token(elapsed: TimeDelta, format: &str) -> String {
  format!("({} {})", SPENT_MARKER, format_spent(elapsed, format))
}

/// `(⏱️ Total: <spent>)`
pub fn total_spent_token(elapsed: TimeDelta, format: &str) -> String {
  format!(
    "({} {} {})",
    SPENT_MARKER,
    TOTAL_LABEL,
    format_spent(elapsed, format)
  )
}

/// Whether the line already carries a stage spent-time token.
pub fn has_spent_time(line: &str) -> bool {
  spent_openings(line).any(|rest| !rest.starts_with(TOTAL_LABEL))
}

/// Whether the line already carries a total spent-time token.
pub fn has_total_spent_time(line: &str) -> bool {
  spent_openings(line).any(|rest| rest.starts_with(TOTAL_LABEL))
}

/// Text following each `(⏱️ ` opening.
fn spent_openings(line: &str) -> impl Iterator<Item = &str> {
  let opening = format!("({} ", SPENT_MARKER);
  let starts: Vec<usize> = line
    .match_indices(opening.as_str())
    .map(|(index, m)| index + m.len())
    .collect();
  starts.into_iter().map(move |start| &line[start..])
}
