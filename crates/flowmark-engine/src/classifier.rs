//! Change classification.
//!
//! Turns the changed ranges of one edit into per-line events. Only ranges
//! that matter to the workflow engine produce events; everything else is
//! noise and is dropped here.

use std::collections::HashSet;

use flowmark_config::WorkflowSettings;
use flowmark_text::{find_stage_marker, find_workflow_tag, parse_task_line};
use serde::Serialize;
use tracing::debug;

use crate::change::{ChangedRange, EditEvent, EditMarker, EditOrigin};
use crate::document::Document;
use crate::emitter::is_workflow_originated;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
  /// A task was just marked completed.
  TaskStatusChange,
  /// A workflow tag or stage marker appeared on the line.
  WorkflowTagChange,
  /// A sibling subsystem changed the line's priority.
  PriorityChange,
  Unrelated,
}

/// A qualifying change on one line of the new document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
  pub line_number: usize,
  pub kind: ChangeKind,
}

/// Classify every changed range of an edit.
///
/// Returns at most one event per line, in document order. `Unrelated`
/// ranges are not returned.
pub fn classify(event: &EditEvent, settings: &WorkflowSettings) -> Vec<ChangeEvent> {
  if !settings.enable_workflow {
    return Vec::new();
  }
  if is_workflow_originated(&event.markers) {
    debug!("edit was synthesized by the workflow engine, skipping");
    return Vec::new();
  }
  if event.changes.is_empty() {
    return Vec::new();
  }
  if event.origin == EditOrigin::Paste {
    debug!("pasted content never triggers transitions");
    return Vec::new();
  }

  let priority = event.markers.contains(&EditMarker::PriorityChange);
  let trusted_status = event.markers.contains(&EditMarker::TaskStatusChange);

  let mut ranges: Vec<&ChangedRange> = event.changes.iter().collect();
  ranges.sort_by_key(|range| range.new_start);

  let every_line = priority || trusted_status;

  let mut seen = HashSet::new();
  let mut events = Vec::new();
  for range in ranges {
    if !range.is_well_formed(&event.old, &event.new) {
      debug!(?range, "changed range does not fit the document, dropping");
      continue;
    }
    if range.is_no_op(&event.old) {
      continue;
    }

    for (old_line, new_line) in touched_lines(range, &event.old, &event.new, every_line) {
      if seen.contains(&new_line) {
        continue;
      }

      let kind = if priority {
        ChangeKind::PriorityChange
      } else {
        classify_line(range, &event.old, &event.new, (old_line, new_line), settings, trusted_status)
      };
      if kind != ChangeKind::Unrelated {
        seen.insert(new_line);
        events.push(ChangeEvent {
          line_number: new_line,
          kind,
        });
      }
    }
  }

  events
}

/// `(old line, new line)` pairs a range touches.
///
/// Only marked edits look past the first line. Each new line maps to the old
/// line at the same distance from the range start, capped at the old range's
/// last line.
fn touched_lines(
  range: &ChangedRange,
  old: &Document,
  new: &Document,
  every_line: bool,
) -> Vec<(usize, usize)> {
  let (Some(old_first), Some(new_first)) = (old.line_at(range.old_start), new.line_at(range.new_start))
  else {
    return Vec::new();
  };
  if !every_line {
    return vec![(old_first, new_first)];
  }

  let old_last = old.line_at(range.old_end).unwrap_or(old_first);
  let new_last = new.line_at(range.new_end).unwrap_or(new_first);
  (new_first..=new_last)
    .map(|line| ((old_first + (line - new_first)).min(old_last), line))
    .collect()
}

/// Classify one touched line.
///
/// With `trusted_status`, a sibling subsystem has already decided the edit is
/// a status change, so the single-character check is skipped.
fn classify_line(
  range: &ChangedRange,
  old: &Document,
  new: &Document,
  (old_line_number, new_line_number): (usize, usize),
  settings: &WorkflowSettings,
  trusted_status: bool,
) -> ChangeKind {
  let (Some(new_line), Some(old_line)) = (new.line(new_line_number), old.line(old_line_number)) else {
    return ChangeKind::Unrelated;
  };

  let marks = &settings.status_marks;
  if let Some(task) = parse_task_line(new_line) {
    let was_completed = parse_task_line(old_line).is_some_and(|old| marks.is_completed(old.status));

    if marks.is_completed(task.status) && !was_completed {
      if trusted_status {
        return ChangeKind::TaskStatusChange;
      }

      let line_start = new.line_start(new_line_number).unwrap_or(0);
      let mut chars = range.inserted_text.chars();
      let single = matches!((chars.next(), chars.next()), (Some(c), None) if c == task.status);
      if single && range.new_start == line_start + task.status_offset {
        return ChangeKind::TaskStatusChange;
      }
    }
  }

  if introduces_workflow_token(old_line, new_line) {
    return ChangeKind::WorkflowTagChange;
  }

  ChangeKind::Unrelated
}

fn introduces_workflow_token(old_line: &str, new_line: &str) -> bool {
  let new_tag = find_workflow_tag(new_line);
  if new_tag.is_some() && new_tag != find_workflow_tag(old_line) {
    return true;
  }

  let stage = |line| find_stage_marker(line).map(|m| (m.stage_id, m.sub_stage_id));
  let new_stage = stage(new_line);
  new_stage.is_some() && new_stage != stage(old_line)
}
