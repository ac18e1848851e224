//! Document snapshots with a line index.

/// An immutable document snapshot.
///
/// The line index is built once per snapshot. Lines are separated by `\n`; a
/// trailing `\r` is not part of the line text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
  text: String,
  /// Byte offset of the first character of every line.
  line_starts: Vec<usize>,
}

impl Document {
  pub fn new(text: impl Into<String>) -> Self {
    let text = text.into();
    let mut line_starts = vec![0];
    line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
    Self { text, line_starts }
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn len(&self) -> usize {
    self.text.len()
  }

  pub fn is_empty(&self) -> bool {
    self.text.is_empty()
  }

  pub fn line_count(&self) -> usize {
    self.line_starts.len()
  }

  /// Byte offset where line `number` starts.
  pub fn line_start(&self, number: usize) -> Option<usize> {
    self.line_starts.get(number).copied()
  }

  /// Byte offset just past the last character of line `number`.
  pub fn line_end(&self, number: usize) -> Option<usize> {
    let start = self.line_start(number)?;
    let end = match self.line_starts.get(number + 1) {
      Some(next) => next - 1,
      None => self.text.len(),
    };
    if end > start && self.text.as_bytes()[end - 1] == b'\r' {
      Some(end - 1)
    } else {
      Some(end)
    }
  }

  /// Text of line `number`, without its line break.
  pub fn line(&self, number: usize) -> Option<&str> {
    let start = self.line_start(number)?;
    let end = self.line_end(number)?;
    self.text.get(start..end)
  }

  /// Line containing byte `offset`. `offset == len()` is the last line.
  pub fn line_at(&self, offset: usize) -> Option<usize> {
    if offset > self.text.len() {
      return None;
    }
    match self.line_starts.binary_search(&offset) {
      Ok(line) => Some(line),
      Err(next) => Some(next - 1),
    }
  }
}

impl From<&str> for Document {
  fn from(text: &str) -> Self {
    Self::new(text)
  }
}

impl From<String> for Document {
  fn from(text: String) -> Self {
    Self::new(text)
  }
}
