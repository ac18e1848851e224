//! Flowmark Transition Engine
//!
//! This crate watches edits to a plain-text outline and writes the follow-up
//! edits a workflow transition needs: spent-time annotations, timestamp
//! cleanup and the line for the next stage.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TransitionEngine                        │
//! │  - handle(edit, now) → Option<OutgoingEdit>                 │
//! │  - reports TransitionEvents to a TransitionNotifier         │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       classifier                            │
//! │  - loop guard, paste and marker handling                    │
//! │  - changed ranges → per-line ChangeEvents                   │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Planner                              │
//! │  - ancestor walk to the workflow root                       │
//! │  - next stage / sub-stage, bookkeeping tokens, new line     │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        emitter                              │
//! │  - drops overlapping plans, orders edits                    │
//! │  - tags the result with a workflow-origin transaction       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use flowmark_engine::{EditEvent, TransitionEngine};
//!
//! let engine = TransitionEngine::new(settings)?;
//! let event = EditEvent::from_snapshots(&before, &after);
//! if let Some(edit) = engine.handle_now(&event) {
//!     host.apply(edit);
//! }
//! ```

mod change;
mod classifier;
mod document;
mod emitter;
mod engine;
mod error;
mod events;
mod planner;
mod resolve;

pub use change::{ChangedRange, EditEvent, EditMarker, EditOrigin, Markers, TextEdit};
pub use classifier::{ChangeEvent, ChangeKind, classify};
pub use document::Document;
pub use emitter::{OutgoingEdit, coalesce, emit, is_workflow_originated};
pub use engine::TransitionEngine;
pub use error::DeclineReason;
pub use events::{ChannelNotifier, NoopNotifier, TransitionEvent, TransitionNotifier};
pub use planner::{PendingTransition, Planner, TransitionPlan};
pub use resolve::{InspectedLine, WorkflowRoot, inspect_document, resolve_workflow_root};
