//! Transition events and notifiers for observability.
//!
//! Events are emitted during an edit-handling pass so hosts can report what
//! the engine did (status bars, logs, a CLI summary) without parsing the
//! outgoing edit.

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::DeclineReason;

/// Events emitted while handling one edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TransitionEvent {
  /// A completed task line produced a transition.
  TransitionPlanned {
    line_number: usize,
    workflow_id: String,
    from_stage: String,
    to_stage: Option<String>,
    create_child_line: bool,
  },

  /// A qualifying line was left alone.
  LineDeclined {
    line_number: usize,
    #[serde(serialize_with = "display")]
    reason: DeclineReason,
  },

  /// The pass produced an outgoing edit.
  EditEmitted { transaction: Uuid, edit_count: usize },
}

fn display<S: serde::Serializer>(reason: &DeclineReason, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.collect_str(reason)
}

/// Trait for receiving transition events.
///
/// The engine calls `notify` for each event; implementations decide what to
/// do with them.
pub trait TransitionNotifier: Send + Sync {
  fn notify(&self, event: TransitionEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl TransitionNotifier for NoopNotifier {
  fn notify(&self, _event: TransitionEvent) {}
}

/// A notifier that sends events to an unbounded channel.
///
/// The engine never waits on the consumer.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<TransitionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<TransitionEvent>) -> Self {
    Self { sender }
  }
}

impl TransitionNotifier for ChannelNotifier {
  fn notify(&self, event: TransitionEvent) {
    // Ignore send errors - receiver may have been dropped
    let _ = self.sender.send(event);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_channel_notifier_delivers() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let notifier = ChannelNotifier::new(tx);

    notifier.notify(TransitionEvent::EditEmitted {
      transaction: Uuid::nil(),
      edit_count: 2,
    });

    assert_eq!(
      rx.try_recv().unwrap(),
      TransitionEvent::EditEmitted {
        transaction: Uuid::nil(),
        edit_count: 2
      }
    );
  }

  #[test]
  fn test_channel_notifier_ignores_closed_receiver() {
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);

    ChannelNotifier::new(tx).notify(TransitionEvent::LineDeclined {
      line_number: 0,
      reason: DeclineReason::Orphaned { line: 0 },
    });
  }

  #[test]
  fn test_declined_serializes_reason_text() {
    let event = TransitionEvent::LineDeclined {
      line_number: 3,
      reason: DeclineReason::Orphaned { line: 3 },
    };
    let json = serde_json::to_value(&event).unwrap();

    assert_eq!(json["event"], "line_declined");
    assert_eq!(json["reason"], "line 3 has no ancestor workflow tag");
  }
}
