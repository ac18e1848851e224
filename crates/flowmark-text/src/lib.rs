//! Flowmark Text
//!
//! Every text token flowmark reads or writes is defined here:
//!
//! ```text
//! - [x] Ship release #workflow/dev 🛫 2024-05-01 09:00:00
//!   - [ ] Write notes [stage::docs.draft] (⏱️ 00:45:00)
//! ```
//!
//! - `#workflow/<id>` marks the root line of a workflow instance
//! - `[stage::<stage>]` / `[stage::<stage>.<sub>]` records a line's stage
//! - `🛫 <timestamp>` records when the current stage started
//! - `(⏱️ <spent>)` / `(⏱️ Total: <spent>)` record elapsed time
//!
//! All functions are pure text matching. They are called once per candidate
//! line on every edit, so they never look beyond the line they are given.

mod info;
mod line;
mod time;
mod tokens;

pub use info::{CurrentStage, LineWorkflow, TaskLineInfo, extract};
pub use line::{TAB_WIDTH, TaskLine, indent_width, parse_task_line};
pub use time::{
  StartTimestamp, find_start_timestamp, format_spent, format_timestamp, has_spent_time,
  has_total_spent_time, spent_token, start_token, timestamp_round_trips, total_spent_token,
};
pub use tokens::{
  SPENT_MARKER, START_MARKER, StageMarker, encode_stage_marker,
  find_stage_marker, find_workflow_tag,
};
