use serde::{Deserialize, Serialize};

/// Status-mark alphabet: which checkbox characters mean what.
///
/// Each field lists every character accepted for that status. The first
/// character of `not_started` is the one written on newly created lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusMarks {
  pub completed: String,
  pub in_progress: String,
  pub abandoned: String,
  pub planned: String,
  pub not_started: String,
}

impl Default for StatusMarks {
  fn default() -> Self {
    Self {
      completed: "xX".to_string(),
      in_progress: ">/".to_string(),
      abandoned: "-".to_string(),
      planned: "?".to_string(),
      not_started: " ".to_string(),
    }
  }
}

impl StatusMarks {
  pub fn is_completed(&self, mark: char) -> bool {
    self.completed.contains(mark)
  }

  /// Mark written on a freshly created task line.
  pub fn todo_mark(&self) -> char {
    self.not_started.chars().next().unwrap_or(' ')
  }

  /// Characters that appear in more than one status class.
  pub fn conflicts(&self) -> Vec<char> {
    let classes = [
      &self.completed,
      &self.in_progress,
      &self.abandoned,
      &self.planned,
      &self.not_started,
    ];

    let mut conflicts = Vec::new();
    for (i, class) in classes.iter().enumerate() {
      for mark in class.chars() {
        let repeated = classes[i + 1..].iter().any(|other| other.contains(mark));
        if repeated && !conflicts.contains(&mark) {
          conflicts.push(mark);
        }
      }
    }
    conflicts
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_marks() {
    let marks = StatusMarks::default();

    assert!(marks.is_completed('x'));
    assert!(marks.is_completed('X'));
    assert!(!marks.is_completed(' '));
    assert!(!marks.is_completed('/'));
    assert_eq!(marks.todo_mark(), ' ');
    assert!(marks.conflicts().is_empty());
  }

  #[test]
  fn test_empty_not_started_falls_back_to_space() {
    let marks = StatusMarks {
      not_started: String::new(),
      ..StatusMarks::default()
    };

    assert_eq!(marks.todo_mark(), ' ');
  }

  #[test]
  fn test_conflicting_marks() {
    let marks = StatusMarks {
      in_progress: "x/".to_string(),
      ..StatusMarks::default()
    };

    assert_eq!(marks.conflicts(), vec!['x']);
  }
}
