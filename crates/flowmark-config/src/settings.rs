//! Transition policy settings.
//!
//! The settings object is consumed read-only by the engine and threaded
//! explicitly through every call; nothing in flowmark reads it from global
//! state.
//!
//! # Example
//!
//! ```json
//! {
//!   "calculate_spent_time": true,
//!   "auto_remove_last_stage_marker": true,
//!   "definitions": [
//!     {
//!       "id": "dev",
//!       "name": "Development",
//!       "stages": [
//!         { "id": "planning", "name": "Planning", "can_proceed_to": ["development"] },
//!         { "id": "development", "name": "Development", "can_proceed_to": ["done"] },
//!         { "id": "done", "name": "Done", "type": "terminal" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::stage::WorkflowDef;
use crate::status::StatusMarks;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
  /// Global switch. When off, every edit passes through untouched.
  pub enable_workflow: bool,
  pub definitions: Vec<WorkflowDef>,
  pub status_marks: StatusMarks,
  /// chrono strftime format for start timestamps.
  pub timestamp_format: String,
  /// Duration format using `DD`, `HH`, `mm` and `ss` placeholders.
  pub spent_time_format: String,
  pub remove_timestamp_on_transition: bool,
  pub calculate_spent_time: bool,
  pub calculate_full_spent_time: bool,
  pub auto_remove_last_stage_marker: bool,
  /// Stamp newly created stage lines (and newly tagged lines) with a start timestamp.
  pub auto_add_timestamp: bool,
  /// Create the next-stage line when a stage completes.
  pub auto_add_next_task: bool,
  /// Cycle stages advance to the next stage in definition order instead of self-looping.
  pub advance_cycle_stages: bool,
  /// One level of indentation, used when a workflow root spawns its first stage line.
  pub indent_unit: String,
}

impl Default for WorkflowSettings {
  fn default() -> Self {
    Self {
      enable_workflow: true,
      definitions: Vec::new(),
      status_marks: StatusMarks::default(),
      timestamp_format: "%Y-%m-%d %H:%M:%S".to_string(),
      spent_time_format: "HH:mm:ss".to_string(),
      remove_timestamp_on_transition: false,
      calculate_spent_time: true,
      calculate_full_spent_time: false,
      auto_remove_last_stage_marker: false,
      auto_add_timestamp: false,
      auto_add_next_task: true,
      advance_cycle_stages: false,
      indent_unit: "\t".to_string(),
    }
  }
}

impl WorkflowSettings {
  /// Parse settings from a JSON document.
  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(json)
  }

  pub fn with_definitions(definitions: Vec<WorkflowDef>) -> Self {
    Self {
      definitions,
      ..Self::default()
    }
  }
}
