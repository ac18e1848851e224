//! Edit boundary types exchanged with the host editor.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Document;

/// One replaced span: `old[old_start..old_end]` became `new[new_start..new_end]`.
///
/// All offsets are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedRange {
  pub old_start: usize,
  pub old_end: usize,
  pub new_start: usize,
  pub new_end: usize,
  pub inserted_text: String,
}

impl ChangedRange {
  /// A replacement of `old_start..old_end` with `inserted`, landing at `new_start`.
  pub fn replace(
    old_start: usize,
    old_end: usize,
    new_start: usize,
    inserted: impl Into<String>,
  ) -> Self {
    let inserted_text = inserted.into();
    Self {
      old_start,
      old_end,
      new_start,
      new_end: new_start + inserted_text.len(),
      inserted_text,
    }
  }

  /// Compute the single range that turns `old` into `new`.
  ///
  /// Strips the common prefix and suffix. Returns `None` when the texts are equal.
  pub fn diff(old: &str, new: &str) -> Option<Self> {
    if old == new {
      return None;
    }

    let mut prefix = old
      .bytes()
      .zip(new.bytes())
      .take_while(|(a, b)| a == b)
      .count();
    while !old.is_char_boundary(prefix) || !new.is_char_boundary(prefix) {
      prefix -= 1;
    }

    let max_suffix = old.len().min(new.len()) - prefix;
    let mut suffix = old
      .bytes()
      .rev()
      .zip(new.bytes().rev())
      .take(max_suffix)
      .take_while(|(a, b)| a == b)
      .count();
    while !old.is_char_boundary(old.len() - suffix) || !new.is_char_boundary(new.len() - suffix) {
      suffix -= 1;
    }

    let new_end = new.len() - suffix;
    Some(Self::replace(
      prefix,
      old.len() - suffix,
      prefix,
      &new[prefix..new_end],
    ))
  }

  /// Whether the range fits both snapshots on character boundaries.
  pub fn is_well_formed(&self, old: &Document, new: &Document) -> bool {
    self.old_start <= self.old_end
      && self.new_start <= self.new_end
      && old.text().get(self.old_start..self.old_end).is_some()
      && new
        .text()
        .get(self.new_start..self.new_end)
        .is_some_and(|text| text == self.inserted_text)
  }

  /// Whether the range writes back exactly the text it replaced.
  ///
  /// Expects a well-formed range.
  pub fn is_no_op(&self, old: &Document) -> bool {
    old
      .text()
      .get(self.old_start..self.old_end)
      .is_some_and(|replaced| replaced == self.inserted_text)
  }
}

/// A literal replacement in the document an edit is applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
  pub from: usize,
  pub to: usize,
  pub insert: String,
}

impl TextEdit {
  pub fn insert(at: usize, text: impl Into<String>) -> Self {
    Self {
      from: at,
      to: at,
      insert: text.into(),
    }
  }

  pub fn delete(from: usize, to: usize) -> Self {
    Self {
      from,
      to,
      insert: String::new(),
    }
  }

  /// Whether two edits touch the same text. Two insertions at the same point conflict.
  pub fn overlaps(&self, other: &TextEdit) -> bool {
    (self.from < other.to && other.from < self.to) || self.from == other.from
  }
}

/// How the host produced an edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOrigin {
  /// Keystrokes and other interactive typing.
  #[default]
  Input,
  /// Bulk paste. Never triggers transitions.
  Paste,
  /// Edits made by other code (commands, plugins, multi-cursor replace).
  Programmatic,
}

/// Opaque metadata attached to an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditMarker {
  /// The edit was synthesized by this engine.
  WorkflowOrigin { transaction: Uuid },
  /// A sibling subsystem already resolved this edit as a task status change.
  TaskStatusChange,
  /// A sibling subsystem changed task priorities.
  PriorityChange,
  /// Markers owned by other subsystems, carried through untouched.
  Other { name: String },
}

/// The set of markers carried by one edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Markers(Vec<EditMarker>);

impl Markers {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, marker: EditMarker) -> Self {
    self.push(marker);
    self
  }

  pub fn push(&mut self, marker: EditMarker) {
    if !self.0.contains(&marker) {
      self.0.push(marker);
    }
  }

  pub fn contains(&self, marker: &EditMarker) -> bool {
    self.0.contains(marker)
  }

  /// Transaction id of the workflow-origin marker, if present.
  pub fn workflow_transaction(&self) -> Option<Uuid> {
    self.0.iter().find_map(|marker| match marker {
      EditMarker::WorkflowOrigin { transaction } => Some(*transaction),
      _ => None,
    })
  }

  pub fn iter(&self) -> impl Iterator<Item = &EditMarker> {
    self.0.iter()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// An edit notification from the host.
#[derive(Debug, Clone)]
pub struct EditEvent {
  pub old: Document,
  pub new: Document,
  pub changes: Vec<ChangedRange>,
  pub origin: EditOrigin,
  pub markers: Markers,
}

impl EditEvent {
  pub fn new(old: Document, new: Document, changes: Vec<ChangedRange>) -> Self {
    Self {
      old,
      new,
      changes,
      origin: EditOrigin::default(),
      markers: Markers::new(),
    }
  }

  /// Build an event from two snapshots, diffed into a single range.
  pub fn from_snapshots(old: &str, new: &str) -> Self {
    let changes = ChangedRange::diff(old, new).into_iter().collect();
    Self::new(Document::new(old), Document::new(new), changes)
  }

  pub fn with_origin(mut self, origin: EditOrigin) -> Self {
    self.origin = origin;
    self
  }

  pub fn with_marker(mut self, marker: EditMarker) -> Self {
    self.markers.push(marker);
    self
  }
}
