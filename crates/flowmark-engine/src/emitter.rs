//! Outgoing edit assembly and the loop guard.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::change::{ChangedRange, EditEvent, EditMarker, EditOrigin, Markers, TextEdit};
use crate::document::Document;
use crate::error::DeclineReason;
use crate::planner::TransitionPlan;

/// The single edit the engine hands back to the host for one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEdit {
  /// Non-overlapping edits in ascending position, in new-document offsets.
  pub edits: Vec<TextEdit>,
  pub markers: Markers,
}

impl OutgoingEdit {
  pub fn transaction(&self) -> Option<Uuid> {
    self.markers.workflow_transaction()
  }

  /// Render the document with every edit applied.
  pub fn apply(&self, doc: &Document) -> String {
    let text = doc.text();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for edit in &self.edits {
      if edit.from < cursor || text.get(edit.from..edit.to).is_none() {
        continue;
      }
      out.push_str(&text[cursor..edit.from]);
      out.push_str(&edit.insert);
      cursor = edit.to;
    }
    out.push_str(&text[cursor..]);
    out
  }

  /// Express the edits as the changed ranges a host would report after applying them.
  pub fn changed_ranges(&self, doc: &Document) -> Vec<ChangedRange> {
    let mut shift: isize = 0;
    self
      .edits
      .iter()
      .filter(|edit| edit.to <= doc.len())
      .map(|edit| {
        let new_start = edit.from.saturating_add_signed(shift);
        shift += edit.insert.len() as isize - (edit.to - edit.from) as isize;
        ChangedRange::replace(edit.from, edit.to, new_start, edit.insert.as_str())
      })
      .collect()
  }

  /// The edit event a host emits after applying this edit to `doc`.
  pub fn to_event(&self, doc: &Document) -> EditEvent {
    let mut event = EditEvent::new(
      doc.clone(),
      Document::new(self.apply(doc)),
      self.changed_ranges(doc),
    )
    .with_origin(EditOrigin::Programmatic);
    event.markers = self.markers.clone();
    event
  }
}

/// Whether an edit was synthesized by the workflow engine.
pub fn is_workflow_originated(markers: &Markers) -> bool {
  markers.workflow_transaction().is_some()
}

/// Split plans into those that can be applied together and those that overlap
/// an earlier plan's edits.
pub fn coalesce(plans: Vec<TransitionPlan>) -> (Vec<TransitionPlan>, Vec<DeclineReason>) {
  let mut accepted: Vec<TransitionPlan> = Vec::with_capacity(plans.len());
  let mut rejected = Vec::new();

  for plan in plans {
    let overlaps = plan.edits.iter().any(|edit| {
      accepted
        .iter()
        .flat_map(|earlier| earlier.edits.iter())
        .any(|other| edit.overlaps(other))
    });
    if overlaps {
      warn!(line = plan.line_number, "transition edits overlap an earlier transition, dropping");
      rejected.push(DeclineReason::Overlapping {
        line: plan.line_number,
      });
    } else {
      accepted.push(plan);
    }
  }

  (accepted, rejected)
}

/// Merge every plan into one outgoing edit tagged with a fresh transaction.
///
/// Returns `None` when no plan writes anything.
pub fn emit(plans: Vec<TransitionPlan>) -> Option<OutgoingEdit> {
  let (accepted, _) = coalesce(plans);
  let mut edits: Vec<TextEdit> = accepted.into_iter().flat_map(|plan| plan.edits).collect();
  if edits.is_empty() {
    return None;
  }
  edits.sort_by_key(|edit| (edit.from, edit.to));

  Some(OutgoingEdit {
    edits,
    markers: Markers::new().with(EditMarker::WorkflowOrigin {
      transaction: Uuid::new_v4(),
    }),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn plan(line_number: usize, edits: Vec<TextEdit>) -> TransitionPlan {
    TransitionPlan {
      line_number,
      transition: None,
      edits,
    }
  }

  #[test]
  fn test_emit_sorts_and_tags() {
    let edit = emit(vec![
      plan(1, vec![TextEdit::insert(10, "b")]),
      plan(0, vec![TextEdit::insert(2, "a")]),
    ])
    .unwrap();

    assert_eq!(edit.edits[0].from, 2);
    assert_eq!(edit.edits[1].from, 10);
    assert!(edit.transaction().is_some());
    assert!(is_workflow_originated(&edit.markers));
  }

  #[test]
  fn test_emit_nothing() {
    assert!(emit(Vec::new()).is_none());
    assert!(emit(vec![plan(0, Vec::new())]).is_none());
  }

  #[test]
  fn test_fresh_transaction_per_emit() {
    let first = emit(vec![plan(0, vec![TextEdit::insert(0, "a")])]).unwrap();
    let second = emit(vec![plan(0, vec![TextEdit::insert(0, "a")])]).unwrap();

    assert_ne!(first.transaction(), second.transaction());
  }

  #[test]
  fn test_overlapping_plan_dropped() {
    let (accepted, rejected) = coalesce(vec![
      plan(0, vec![TextEdit::delete(2, 6)]),
      plan(1, vec![TextEdit::insert(4, "x")]),
      plan(2, vec![TextEdit::insert(9, "y")]),
    ]);

    assert_eq!(accepted.len(), 2);
    assert_eq!(rejected, vec![DeclineReason::Overlapping { line: 1 }]);
  }

  #[test]
  fn test_apply_and_changed_ranges() {
    let doc = Document::new("abcdef");
    let edit = OutgoingEdit {
      edits: vec![TextEdit::delete(1, 3), TextEdit::insert(4, "XYZ")],
      markers: Markers::new(),
    };

    assert_eq!(edit.apply(&doc), "adXYZef");
    assert_eq!(
      edit.changed_ranges(&doc),
      vec![
        ChangedRange::replace(1, 3, 1, ""),
        ChangedRange::replace(4, 4, 2, "XYZ"),
      ]
    );
  }

  #[test]
  fn test_to_event_is_guarded() {
    let doc = Document::new("- [x] Task");
    let edit = emit(vec![plan(0, vec![TextEdit::insert(10, " done")])]).unwrap();
    let event = edit.to_event(&doc);

    assert_eq!(event.new.text(), "- [x] Task done");
    assert_eq!(event.origin, EditOrigin::Programmatic);
    assert!(is_workflow_originated(&event.markers));
    assert!(
      event
        .changes
        .iter()
        .all(|range| range.is_well_formed(&event.old, &event.new))
    );
  }
}
