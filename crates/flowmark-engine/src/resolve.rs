//! Ancestor resolution for `fromParent` lines.

use flowmark_text::{TaskLineInfo, find_workflow_tag, indent_width};
use serde::Serialize;

use crate::document::Document;

/// The workflow root a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowRoot<'a> {
  pub line_number: usize,
  pub workflow_id: &'a str,
}

/// Find the workflow root governing `line_number`.
///
/// A line carrying a workflow tag is its own root. Otherwise walk up the
/// outline: the parent is the nearest preceding non-blank line with strictly
/// lower indent. A tagged parent ends the walk; any other parent continues it.
/// Reaching the outermost level without a tag means the line is orphaned.
pub fn resolve_workflow_root(doc: &Document, line_number: usize) -> Option<WorkflowRoot<'_>> {
  let line = doc.line(line_number)?;
  if let Some(workflow_id) = find_workflow_tag(line) {
    return Some(WorkflowRoot {
      line_number,
      workflow_id,
    });
  }

  let mut threshold = indent_width(line);
  for candidate in (0..line_number).rev() {
    if threshold == 0 {
      return None;
    }
    let Some(text) = doc.line(candidate) else {
      continue;
    };
    if text.trim().is_empty() {
      continue;
    }

    let indent = indent_width(text);
    if indent >= threshold {
      continue;
    }
    if let Some(workflow_id) = find_workflow_tag(text) {
      return Some(WorkflowRoot {
        line_number: candidate,
        workflow_id,
      });
    }
    threshold = indent;
  }

  None
}

/// A workflow line together with the root it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectedLine {
  #[serde(flatten)]
  pub info: TaskLineInfo,
  /// `None` for orphaned lines.
  pub workflow_id: Option<String>,
}

/// Describe every workflow line of a document.
pub fn inspect_document(doc: &Document) -> Vec<InspectedLine> {
  (0..doc.line_count())
    .filter_map(|number| {
      let info = TaskLineInfo::parse(number, doc.line(number)?)?;
      let workflow_id = resolve_workflow_root(doc, number).map(|root| root.workflow_id.to_string());
      Some(InspectedLine { info, workflow_id })
    })
    .collect()
}
