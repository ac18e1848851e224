//! Flowmark Workflow
//!
//! This crate provides the loaded workflow representation for flowmark.
//! A loaded workflow is a validated form of a [`flowmark_config::WorkflowDef`]
//! that is ready for stage lookups during an edit-handling pass.
//!
//! Key differences from `flowmark-config`:
//! - Workflow and stage ids are unique and encodable as text tokens
//! - Every workflow has a root stage
//! - `can_proceed_to` references are resolved into a stage graph; dangling
//!   references are dropped from the graph instead of failing the load
//!
//! The registry is read-only once loaded. A configuration reload builds a new
//! registry and replaces the old one wholesale.

mod error;
mod graph;
mod registry;
mod workflow;

pub use error::WorkflowError;
pub use graph::StageGraph;
pub use registry::WorkflowRegistry;
pub use workflow::Workflow;
