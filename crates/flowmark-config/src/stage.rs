use serde::{Deserialize, Serialize};

/// A named, ordered set of stages describing a task's lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  /// Workflow id, referenced by `#workflow/<id>` tags.
  pub id: String,
  pub name: String,
  /// Stages in definition order. The first stage is the root stage.
  #[serde(default)]
  pub stages: Vec<StageDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDef {
  pub id: String,
  pub name: String,
  #[serde(rename = "type", default)]
  pub stage_type: StageType,
  /// Candidate next stages, tried in order. Ignored for terminal stages.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub can_proceed_to: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub sub_stages: Vec<SubStageDef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageType {
  /// One-shot stage.
  #[default]
  Normal,
  /// Repeatable stage that loops back onto itself.
  Cycle,
  /// End of the workflow, no outgoing transitions.
  Terminal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubStageDef {
  pub id: String,
  pub name: String,
  /// Explicit successor. When absent, the next sub-stage in sequence is used.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub next: Option<String>,
}

impl StageDef {
  /// Create a stage with no outgoing transitions or sub-stages.
  pub fn new(id: impl Into<String>, name: impl Into<String>, stage_type: StageType) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      stage_type,
      can_proceed_to: Vec::new(),
      sub_stages: Vec::new(),
    }
  }

  pub fn proceeds_to<I, S>(mut self, ids: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.can_proceed_to = ids.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_sub_stages<I, S>(mut self, ids: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.sub_stages = ids
      .into_iter()
      .map(|id| {
        let id = id.into();
        SubStageDef {
          name: id.clone(),
          id,
          next: None,
        }
      })
      .collect();
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_stage_type_defaults_to_normal() {
    let stage: StageDef = serde_json::from_str(r#"{ "id": "planning", "name": "Planning" }"#)
      .unwrap();

    assert_eq!(stage.stage_type, StageType::Normal);
    assert!(stage.can_proceed_to.is_empty());
    assert!(stage.sub_stages.is_empty());
  }

  #[test]
  fn test_stage_type_field_is_named_type() {
    let stage: StageDef = serde_json::from_str(
      r#"{
        "id": "review",
        "name": "Review",
        "type": "cycle",
        "can_proceed_to": ["review", "done"]
      }"#,
    )
    .unwrap();

    assert_eq!(stage.stage_type, StageType::Cycle);
    assert_eq!(stage.can_proceed_to, vec!["review", "done"]);
  }

  #[test]
  fn test_sub_stage_next_is_optional() {
    let stage: StageDef = serde_json::from_str(
      r#"{
        "id": "planning",
        "name": "Planning",
        "sub_stages": [
          { "id": "research", "name": "Research", "next": "draft" },
          { "id": "draft", "name": "Draft" }
        ]
      }"#,
    )
    .unwrap();

    assert_eq!(stage.sub_stages[0].next.as_deref(), Some("draft"));
    assert_eq!(stage.sub_stages[1].next, None);
  }

  #[test]
  fn test_builder_helpers() {
    let stage = StageDef::new("planning", "Planning", StageType::Normal)
      .proceeds_to(["development"])
      .with_sub_stages(["research", "draft"]);

    assert_eq!(stage.can_proceed_to, vec!["development"]);
    assert_eq!(stage.sub_stages.len(), 2);
    assert_eq!(stage.sub_stages[1].id, "draft");
  }
}
