//! Flowmark Config
//!
//! This crate contains the serializable settings types for flowmark.
//! These types represent workflow definitions and transition policies before
//! they are loaded into a registry by `flowmark-workflow`.
//!
//! Settings can be loaded from:
//! - JSON files (via CLI with `--settings=settings.json`)
//! - Any host that persists the settings object as JSON
//!
//! Every field has a default, so a partial settings document is valid.

mod settings;
mod stage;
mod status;

pub use settings::WorkflowSettings;
pub use stage::{StageDef, StageType, SubStageDef, WorkflowDef};
pub use status::StatusMarks;
