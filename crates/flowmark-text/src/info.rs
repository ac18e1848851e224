//! Workflow identity of a single line.

use serde::Serialize;

use crate::line::{indent_width, parse_task_line};
use crate::tokens::{find_stage_marker, find_workflow_tag};

/// What a line says about its place in a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineWorkflow {
  /// The line carries `#workflow/<id>` and is the root of an instance.
  Root { workflow_id: String },
  /// The line carries a stage marker; its workflow comes from an ancestor.
  Stage {
    stage_id: String,
    sub_stage_id: Option<String>,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentStage<'a> {
  Root,
  Stage(&'a str),
}

/// Extract the workflow identity from raw line text.
///
/// A workflow tag wins over a co-located stage marker.
pub fn extract(line: &str) -> Option<LineWorkflow> {
  if let Some(workflow_id) = find_workflow_tag(line) {
    return Some(LineWorkflow::Root {
      workflow_id: workflow_id.to_string(),
    });
  }

  find_stage_marker(line).map(|marker| LineWorkflow::Stage {
    stage_id: marker.stage_id.to_string(),
    sub_stage_id: marker.sub_stage_id.map(str::to_string),
  })
}

/// Per-line workflow state, derived from the text on every edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskLineInfo {
  pub line_number: usize,
  pub indent_level: usize,
  /// Checkbox character, when the line is a task.
  pub status_mark: Option<char>,
  pub workflow: LineWorkflow,
}

impl TaskLineInfo {
  /// Returns `None` for lines that are not part of any workflow.
  pub fn parse(line_number: usize, line: &str) -> Option<Self> {
    let workflow = extract(line)?;
    Some(Self {
      line_number,
      indent_level: indent_width(line),
      status_mark: parse_task_line(line).map(|task| task.status),
      workflow,
    })
  }

  pub fn current_stage(&self) -> CurrentStage<'_> {
    match &self.workflow {
      LineWorkflow::Root { .. } => CurrentStage::Root,
      LineWorkflow::Stage { stage_id, .. } => CurrentStage::Stage(stage_id),
    }
  }

  pub fn sub_stage(&self) -> Option<&str> {
    match &self.workflow {
      LineWorkflow::Root { .. } => None,
      LineWorkflow::Stage { sub_stage_id, .. } => sub_stage_id.as_deref(),
    }
  }

  pub fn is_root(&self) -> bool {
    matches!(self.workflow, LineWorkflow::Root { .. })
  }
}
