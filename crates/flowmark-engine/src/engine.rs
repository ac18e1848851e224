//! Workflow transition engine.
//!
//! The `TransitionEngine` runs one pass per edit: classify the changed ranges,
//! plan a transition for every qualifying line, and coalesce the plans into a
//! single outgoing edit.

use chrono::{Local, NaiveDateTime};
use flowmark_config::WorkflowSettings;
use flowmark_workflow::{WorkflowError, WorkflowRegistry};
use tracing::{debug, info, instrument};

use crate::change::EditEvent;
use crate::classifier::{ChangeKind, classify};
use crate::emitter::{OutgoingEdit, coalesce, emit};
use crate::error::DeclineReason;
use crate::events::{NoopNotifier, TransitionEvent, TransitionNotifier};
use crate::planner::{Planner, TransitionPlan};

/// The workflow transition engine.
///
/// Generic over `N: TransitionNotifier` to allow different notification strategies.
/// Use `TransitionEngine::new()` for an engine with no-op notifications,
/// or `TransitionEngine::with_notifier()` to provide a custom notifier.
pub struct TransitionEngine<N: TransitionNotifier = NoopNotifier> {
  settings: WorkflowSettings,
  registry: WorkflowRegistry,
  notifier: N,
}

impl TransitionEngine<NoopNotifier> {
  /// Create an engine with no-op notifications.
  pub fn new(settings: WorkflowSettings) -> Result<Self, WorkflowError> {
    Self::with_notifier(settings, NoopNotifier)
  }
}

impl<N: TransitionNotifier> TransitionEngine<N> {
  /// Load the configured workflows and create an engine with a custom notifier.
  pub fn with_notifier(settings: WorkflowSettings, notifier: N) -> Result<Self, WorkflowError> {
    let registry = WorkflowRegistry::from_settings(&settings)?;
    Ok(Self {
      settings,
      registry,
      notifier,
    })
  }

  pub fn settings(&self) -> &WorkflowSettings {
    &self.settings
  }

  pub fn registry(&self) -> &WorkflowRegistry {
    &self.registry
  }

  /// Handle an edit at the current local time.
  pub fn handle_now(&self, event: &EditEvent) -> Option<OutgoingEdit> {
    self.handle(event, Local::now().naive_local())
  }

  /// Handle one edit. `now` stamps every transition of the pass.
  #[instrument(skip_all, fields(origin = ?event.origin, ranges = event.changes.len()))]
  pub fn handle(&self, event: &EditEvent, now: NaiveDateTime) -> Option<OutgoingEdit> {
    let changes = classify(event, &self.settings);
    if changes.is_empty() {
      return None;
    }

    let planner = Planner::new(&self.settings, &self.registry);
    let mut plans = Vec::with_capacity(changes.len());
    for change in changes {
      let planned = match change.kind {
        ChangeKind::TaskStatusChange => planner
          .plan_status_change(&event.new, change.line_number, now)
          .map(Some),
        ChangeKind::WorkflowTagChange => planner.plan_tag_change(&event.new, change.line_number, now),
        ChangeKind::PriorityChange | ChangeKind::Unrelated => Ok(None),
      };

      match planned {
        Ok(Some(plan)) => plans.push(plan),
        Ok(None) => {}
        Err(reason) => {
          debug!(%reason, "declined");
          self.notifier.notify(TransitionEvent::LineDeclined {
            line_number: change.line_number,
            reason,
          });
        }
      }
    }

    let (accepted, rejected) = coalesce(plans);
    for reason in rejected {
      if let DeclineReason::Overlapping { line } = reason {
        self.notifier.notify(TransitionEvent::LineDeclined {
          line_number: line,
          reason,
        });
      }
    }
    for plan in &accepted {
      self.report(plan);
    }

    let edit = emit(accepted)?;
    let transaction = edit.transaction()?;
    info!(%transaction, edits = edit.edits.len(), "emitting workflow edit");
    self.notifier.notify(TransitionEvent::EditEmitted {
      transaction,
      edit_count: edit.edits.len(),
    });
    Some(edit)
  }

  fn report(&self, plan: &TransitionPlan) {
    let Some(transition) = &plan.transition else {
      return;
    };
    info!(
      line = transition.source_line,
      workflow_id = %transition.workflow_id,
      from = %transition.from_stage,
      to = ?transition.to_stage,
      "planned transition"
    );
    self.notifier.notify(TransitionEvent::TransitionPlanned {
      line_number: transition.source_line,
      workflow_id: transition.workflow_id.clone(),
      from_stage: transition.from_stage.clone(),
      to_stage: transition.to_stage.clone(),
      create_child_line: transition.create_child_line,
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;
  use flowmark_config::{StageDef, StageType, WorkflowDef};
  use tokio::sync::mpsc;

  use crate::events::ChannelNotifier;

  fn settings() -> WorkflowSettings {
    WorkflowSettings::with_definitions(vec![WorkflowDef {
      id: "dev".to_string(),
      name: "Development".to_string(),
      stages: vec![
        StageDef::new("todo", "Todo", StageType::Normal).proceeds_to(["done"]),
        StageDef::new("done", "Done", StageType::Terminal),
      ],
    }])
  }

  fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
      .unwrap()
      .and_hms_opt(12, 0, 0)
      .unwrap()
  }

  #[test]
  fn test_handle_emits_events() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = TransitionEngine::with_notifier(settings(), ChannelNotifier::new(tx)).unwrap();
    let event = EditEvent::from_snapshots("- [ ] Task #workflow/dev", "- [x] Task #workflow/dev");

    let edit = engine.handle(&event, now()).unwrap();

    assert!(matches!(
      rx.try_recv().unwrap(),
      TransitionEvent::TransitionPlanned { ref to_stage, .. } if to_stage.as_deref() == Some("done")
    ));
    assert_eq!(
      rx.try_recv().unwrap(),
      TransitionEvent::EditEmitted {
        transaction: edit.transaction().unwrap(),
        edit_count: 1
      }
    );
  }

  #[test]
  fn test_declined_line_is_reported() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = TransitionEngine::with_notifier(settings(), ChannelNotifier::new(tx)).unwrap();
    let event = EditEvent::from_snapshots("- [ ] Lost [stage::todo]", "- [x] Lost [stage::todo]");

    assert!(engine.handle(&event, now()).is_none());
    assert_eq!(
      rx.try_recv().unwrap(),
      TransitionEvent::LineDeclined {
        line_number: 0,
        reason: DeclineReason::Orphaned { line: 0 }
      }
    );
  }

  #[test]
  fn test_invalid_settings_fail_to_load() {
    let mut settings = settings();
    settings.status_marks.in_progress = "x".to_string();

    assert!(matches!(
      TransitionEngine::new(settings),
      Err(WorkflowError::ConflictingStatusMarks(_))
    ));
  }

  #[test]
  fn test_unreadable_timestamp_format_fails_to_load() {
    let mut settings = settings();
    settings.timestamp_format = "%H:%M".to_string();

    assert!(matches!(
      TransitionEngine::new(settings),
      Err(WorkflowError::InvalidTimestampFormat(format)) if format == "%H:%M"
    ));
  }
}
