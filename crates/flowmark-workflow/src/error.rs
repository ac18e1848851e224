use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WorkflowError {
  #[error("workflow defined more than once: {0}")]
  DuplicateWorkflow(String),

  #[error("workflow '{0}' has no stages")]
  NoStages(String),

  #[error("stage defined more than once in workflow '{workflow}': {stage}")]
  DuplicateStage { workflow: String, stage: String },

  #[error("workflow id cannot be written as a #workflow tag: {0:?}")]
  InvalidWorkflowId(String),

  #[error("stage id in workflow '{workflow}' cannot be written as a stage marker: {stage:?}")]
  InvalidStageId { workflow: String, stage: String },

  #[error("status marks used by more than one status: {0:?}")]
  ConflictingStatusMarks(Vec<char>),

  #[error("timestamp format does not parse back what it renders: {0:?}")]
  InvalidTimestampFormat(String),
}
