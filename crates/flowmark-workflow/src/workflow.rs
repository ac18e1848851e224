use std::collections::HashMap;

use flowmark_config::{StageDef, StageType, SubStageDef, WorkflowDef};
use serde::Serialize;

use crate::error::WorkflowError;
use crate::graph::StageGraph;

/// A loaded workflow ready for stage lookups.
#[derive(Debug, Clone, Serialize)]
pub struct Workflow {
  pub id: String,
  pub name: String,
  stages: Vec<StageDef>,
  #[serde(skip)]
  index: HashMap<String, usize>,
  #[serde(skip)]
  graph: StageGraph,
}

impl Workflow {
  /// Validate a definition and build its stage graph.
  pub fn from_def(def: &WorkflowDef) -> Result<Self, WorkflowError> {
    if !is_workflow_id(&def.id) {
      return Err(WorkflowError::InvalidWorkflowId(def.id.clone()));
    }
    if def.stages.is_empty() {
      return Err(WorkflowError::NoStages(def.id.clone()));
    }

    let mut index = HashMap::with_capacity(def.stages.len());
    for (position, stage) in def.stages.iter().enumerate() {
      let sub_ids = stage.sub_stages.iter().map(|s| s.id.as_str());
      let invalid = std::iter::once(stage.id.as_str())
        .filter(|id| !is_token_safe(id, &['.']))
        .chain(sub_ids.filter(|id| !is_token_safe(id, &[])))
        .next();
      if let Some(id) = invalid {
        return Err(WorkflowError::InvalidStageId {
          workflow: def.id.clone(),
          stage: id.to_string(),
        });
      }

      if index.insert(stage.id.clone(), position).is_some() {
        return Err(WorkflowError::DuplicateStage {
          workflow: def.id.clone(),
          stage: stage.id.clone(),
        });
      }
    }

    let graph = StageGraph::new(&def.stages);
    for (from, to) in graph.dangling() {
      tracing::warn!(
        workflow_id = %def.id,
        stage_id = %from,
        target = %to,
        "can_proceed_to references an unknown stage"
      );
    }

    Ok(Self {
      id: def.id.clone(),
      name: def.name.clone(),
      stages: def.stages.clone(),
      index,
      graph,
    })
  }

  /// Get a stage by ID.
  pub fn stage(&self, stage_id: &str) -> Option<&StageDef> {
    self.index.get(stage_id).map(|&i| &self.stages[i])
  }

  /// The first stage in definition order.
  pub fn root_stage(&self) -> &StageDef {
    // Loaded workflows always have at least one stage.
    &self.stages[0]
  }

  /// Stages in definition order.
  pub fn stages(&self) -> &[StageDef] {
    &self.stages
  }

  /// Get the stage graph.
  pub fn graph(&self) -> &StageGraph {
    &self.graph
  }

  /// The stage following `stage_id` in definition order.
  pub fn stage_after(&self, stage_id: &str) -> Option<&StageDef> {
    let position = *self.index.get(stage_id)?;
    self.stages.get(position + 1)
  }

  /// Resolve the stage a completed `from` stage moves to.
  ///
  /// Terminal stages, and normal stages whose `can_proceed_to` has no
  /// resolvable entry, have no next stage. Cycle stages loop back onto
  /// themselves unless `advance_cycles` is set, in which case they move to
  /// the next stage in definition order.
  pub fn next_stage(&self, from: &StageDef, advance_cycles: bool) -> Option<&StageDef> {
    match from.stage_type {
      StageType::Terminal => None,
      StageType::Cycle if advance_cycles => self.stage_after(&from.id),
      StageType::Cycle => self.stage(&from.id),
      StageType::Normal => self
        .graph
        .downstream(&from.id)
        .first()
        .and_then(|id| self.stage(id)),
    }
  }

  /// Resolve the sub-stage after `sub_stage_id` within `stage`.
  ///
  /// An explicit `next` wins over sequence order. Returns `None` when the
  /// sub-stage is the last one (or unknown).
  pub fn next_sub_stage<'a>(
    &self,
    stage: &'a StageDef,
    sub_stage_id: &str,
  ) -> Option<&'a SubStageDef> {
    let position = stage.sub_stages.iter().position(|s| s.id == sub_stage_id)?;
    match &stage.sub_stages[position].next {
      Some(next) => stage.sub_stages.iter().find(|s| &s.id == next),
      None => stage.sub_stages.get(position + 1),
    }
  }
}

/// Workflow ids use the same charset the `#workflow/<id>` tag matches.
fn is_workflow_id(id: &str) -> bool {
  !id.is_empty()
    && id
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/'))
}

/// Stage ids end up inside text tokens, so they cannot contain token delimiters.
fn is_token_safe(id: &str, forbidden: &[char]) -> bool {
  !id.is_empty()
    && !id
      .chars()
      .any(|c| c.is_whitespace() || c == '[' || c == ']' || forbidden.contains(&c))
}
