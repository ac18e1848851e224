//! Reasons the engine declines to act on a line.

use thiserror::Error;

/// Why a qualifying line produced no transition.
///
/// None of these are surfaced to the user. The engine logs them and leaves
/// the line as the user wrote it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeclineReason {
  #[error("line {line} is outside the document")]
  LineOutOfBounds { line: usize },

  #[error("line {line} carries no workflow tag or stage marker")]
  NotAWorkflowLine { line: usize },

  #[error("line {line} is not a task")]
  NotATask { line: usize },

  #[error("line {line} has no ancestor workflow tag")]
  Orphaned { line: usize },

  #[error("line {line} references unknown workflow '{workflow_id}'")]
  UnknownWorkflow { line: usize, workflow_id: String },

  #[error("edits for line {line} overlap an earlier transition")]
  Overlapping { line: usize },
}
