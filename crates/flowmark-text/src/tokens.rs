//! Workflow tag and stage marker grammar.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Prefix of the start timestamp token.
pub const START_MARKER: &str = "🛫";

/// Prefix of spent-time tokens.
pub const SPENT_MARKER: &str = "⏱️";

const SUB_STAGE_SEPARATOR: char = '.';

static WORKFLOW_TAG: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"#workflow/([A-Za-z0-9_/-]+)").unwrap());

static STAGE_MARKER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\[stage::([^\s\].]+)(?:\.([^\s\]]+))?\]").unwrap());

/// A `[stage::...]` token found in a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageMarker<'a> {
  pub stage_id: &'a str,
  pub sub_stage_id: Option<&'a str>,
  /// Byte range of the whole token within the line.
  pub span: Range<usize>,
}

/// Find the first workflow tag and return its workflow id.
pub fn find_workflow_tag(line: &str) -> Option<&str> {
  WORKFLOW_TAG
    .captures(line)
    .and_then(|c| c.get(1))
    .map(|m| m.as_str())
}

/// Find the first stage marker.
pub fn find_stage_marker(line: &str) -> Option<StageMarker<'_>> {
  let captures = STAGE_MARKER.captures(line)?;
  let whole = captures.get(0)?;
  Some(StageMarker {
    stage_id: captures.get(1)?.as_str(),
    sub_stage_id: captures.get(2).map(|m| m.as_str()),
    span: whole.range(),
  })
}

pub fn encode_stage_marker(stage_id: &str, sub_stage_id: Option<&str>) -> String {
  match sub_stage_id {
    Some(sub) => format!("[stage::{}{}{}]", stage_id, SUB_STAGE_SEPARATOR, sub),
    None => format!("[stage::{}]", stage_id),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  #[test]
  fn test_find_workflow_tag() {
    assert_eq!(find_workflow_tag("- [ ] Task #workflow/dev"), Some("dev"));
    assert_eq!(
      find_workflow_tag("- [ ] #workflow/release-2 and more"),
      Some("release-2")
    );
    assert_eq!(find_workflow_tag("- [ ] #workflow/"), None);
    assert_eq!(find_workflow_tag("- [ ] #work/dev"), None);
  }

  #[test]
  fn test_workflow_tag_stops_at_punctuation() {
    assert_eq!(find_workflow_tag("Ship it #workflow/dev."), Some("dev"));
    assert_eq!(find_workflow_tag("(see #workflow/ops)"), Some("ops"));
    assert_eq!(find_workflow_tag("#workflow/team/dev, next"), Some("team/dev"));
  }

  #[test]
  fn test_first_workflow_tag_wins() {
    assert_eq!(
      find_workflow_tag("#workflow/a #workflow/b"),
      Some("a")
    );
  }

  #[test]
  fn test_find_stage_marker() {
    let marker = find_stage_marker("- [ ] Sub [stage::testing]").unwrap();

    assert_eq!(marker.stage_id, "testing");
    assert_eq!(marker.sub_stage_id, None);
    assert_eq!(marker.span, 10..26);
  }

  #[test]
  fn test_find_stage_marker_with_sub_stage() {
    let marker = find_stage_marker("[stage::planning.research] notes").unwrap();

    assert_eq!(marker.stage_id, "planning");
    assert_eq!(marker.sub_stage_id, Some("research"));
    assert_eq!(marker.span, 0..26);
  }

  #[test]
  fn test_malformed_stage_markers() {
    assert!(find_stage_marker("[stage::]").is_none());
    assert!(find_stage_marker("[stage::a b]").is_none());
    assert!(find_stage_marker("[stage::open").is_none());
    assert!(find_stage_marker("(stage::x)").is_none());
  }

  #[test]
  fn test_encode() {
    assert_eq!(encode_stage_marker("testing", None), "[stage::testing]");
    assert_eq!(
      encode_stage_marker("planning", Some("draft")),
      "[stage::planning.draft]"
    );
  }

  proptest! {
    #[test]
    fn prop_stage_marker_round_trip(
      stage in "[A-Za-z0-9_-]{1,16}",
      sub in proptest::option::of("[A-Za-z0-9_.-]{1,16}"),
      prefix in "[a-z ]{0,10}",
    ) {
      let line = format!("- [ ] {}{}", prefix, encode_stage_marker(&stage, sub.as_deref()));
      let marker = find_stage_marker(&line).unwrap();

      prop_assert_eq!(marker.stage_id, stage.as_str());
      prop_assert_eq!(marker.sub_stage_id, sub.as_deref());
    }

    #[test]
    fn prop_workflow_tag_round_trip(id in "[A-Za-z0-9_/-]{1,16}") {
      let line = format!("- [ ] Task #workflow/{}", id);

      prop_assert_eq!(find_workflow_tag(&line), Some(id.as_str()));
    }
  }
}
