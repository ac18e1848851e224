use std::collections::HashMap;

use flowmark_config::{StageDef, WorkflowDef, WorkflowSettings};
use flowmark_text::timestamp_round_trips;

use crate::error::WorkflowError;
use crate::workflow::Workflow;

/// Read-only collection of loaded workflows, keyed by workflow id.
#[derive(Debug, Clone, Default)]
pub struct WorkflowRegistry {
  workflows: HashMap<String, Workflow>,
  /// Ids in configuration order, for stable reporting.
  order: Vec<String>,
}

impl WorkflowRegistry {
  /// Load workflow definitions.
  pub fn load(definitions: &[WorkflowDef]) -> Result<Self, WorkflowError> {
    let mut workflows = HashMap::with_capacity(definitions.len());
    let mut order = Vec::with_capacity(definitions.len());

    for def in definitions {
      let workflow = Workflow::from_def(def)?;
      if workflows.insert(def.id.clone(), workflow).is_some() {
        return Err(WorkflowError::DuplicateWorkflow(def.id.clone()));
      }
      order.push(def.id.clone());
    }

    Ok(Self { workflows, order })
  }

  /// Validate the status-mark alphabet and timestamp format, then load the
  /// configured definitions.
  pub fn from_settings(settings: &WorkflowSettings) -> Result<Self, WorkflowError> {
    let conflicts = settings.status_marks.conflicts();
    if !conflicts.is_empty() {
      return Err(WorkflowError::ConflictingStatusMarks(conflicts));
    }
    if !timestamp_round_trips(&settings.timestamp_format) {
      return Err(WorkflowError::InvalidTimestampFormat(
        settings.timestamp_format.clone(),
      ));
    }
    Self::load(&settings.definitions)
  }

  /// Look up a workflow by id.
  pub fn resolve_definition(&self, workflow_id: &str) -> Option<&Workflow> {
    self.workflows.get(workflow_id)
  }

  /// Look up a stage within a workflow.
  pub fn resolve_stage<'a>(&self, workflow: &'a Workflow, stage_id: &str) -> Option<&'a StageDef> {
    workflow.stage(stage_id)
  }

  /// The stage used when a line carries a workflow tag but no explicit stage.
  pub fn root_stage<'a>(&self, workflow: &'a Workflow) -> &'a StageDef {
    workflow.root_stage()
  }

  /// Workflows in configuration order.
  pub fn iter(&self) -> impl Iterator<Item = &Workflow> {
    self.order.iter().filter_map(|id| self.workflows.get(id))
  }

  pub fn len(&self) -> usize {
    self.workflows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.workflows.is_empty()
  }
}
