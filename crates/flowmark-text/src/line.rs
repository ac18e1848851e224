//! Outline line shape: indentation, list bullet and checkbox.

use std::sync::LazyLock;

use regex::Regex;

/// Columns a tab counts for when comparing indentation.
pub const TAB_WIDTH: usize = 4;

static TASK_LINE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^([ \t]*)([-*+]|\d+[.)])[ \t]+\[(.)\]").unwrap());

/// A list item with a checkbox, e.g. `  - [x] Write tests`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLine<'a> {
  pub indent: &'a str,
  pub bullet: &'a str,
  pub status: char,
  /// Byte offset of the status character within the line.
  pub status_offset: usize,
  /// Everything after the closing `]`.
  pub content: &'a str,
}

pub fn parse_task_line(line: &str) -> Option<TaskLine<'_>> {
  let captures = TASK_LINE.captures(line)?;
  let status = captures.get(3)?;
  let whole = captures.get(0)?;

  Some(TaskLine {
    indent: captures.get(1)?.as_str(),
    bullet: captures.get(2)?.as_str(),
    status: status.as_str().chars().next()?,
    status_offset: status.start(),
    content: &line[whole.end()..],
  })
}

/// Width of the leading whitespace, in columns.
pub fn indent_width(line: &str) -> usize {
  line
    .chars()
    .take_while(|c| *c == ' ' || *c == '\t')
    .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
    .sum()
}
