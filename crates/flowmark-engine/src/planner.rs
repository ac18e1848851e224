//! Transition planning.
//!
//! The planner looks at one qualifying line of the new document and decides
//! what the workflow engine should write: bookkeeping tokens on the line
//! itself, and possibly a fresh line for the next stage.

use chrono::{NaiveDateTime, TimeDelta};
use flowmark_config::{StageDef, StageType, SubStageDef, WorkflowSettings};
use flowmark_text::{
  CurrentStage, TaskLine, TaskLineInfo, encode_stage_marker, find_start_timestamp,
  has_spent_time, has_total_spent_time, parse_task_line, spent_token, start_token,
  total_spent_token,
};
use flowmark_workflow::{Workflow, WorkflowRegistry};
use serde::Serialize;
use tracing::debug;

use crate::change::TextEdit;
use crate::document::Document;
use crate::error::DeclineReason;
use crate::resolve::{WorkflowRoot, resolve_workflow_root};

/// A transition decided for one line, consumed in the same pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingTransition {
  pub source_line: usize,
  pub workflow_id: String,
  pub from_stage: String,
  /// `None` when the line was already in a terminal stage.
  pub to_stage: Option<String>,
  pub to_sub_stage: Option<String>,
  pub occurred_at: NaiveDateTime,
  /// Time spent in the stage, when the line carried a start timestamp.
  #[serde(skip)]
  pub elapsed: Option<TimeDelta>,
  /// Whether a next-stage line is inserted after the source line.
  pub create_child_line: bool,
}

/// Everything the engine wants to write for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
  pub line_number: usize,
  pub transition: Option<PendingTransition>,
  /// Edits in new-document positions.
  pub edits: Vec<TextEdit>,
}

/// A line resolved to its workflow definition.
struct ResolvedLine<'d, 'r> {
  line: &'d str,
  info: TaskLineInfo,
  root: WorkflowRoot<'d>,
  workflow: &'r Workflow,
}

pub struct Planner<'a> {
  settings: &'a WorkflowSettings,
  registry: &'a WorkflowRegistry,
}

impl<'a> Planner<'a> {
  pub fn new(settings: &'a WorkflowSettings, registry: &'a WorkflowRegistry) -> Self {
    Self { settings, registry }
  }

  /// Plan the transition for a task that was just marked completed.
  pub fn plan_status_change(
    &self,
    doc: &Document,
    line_number: usize,
    now: NaiveDateTime,
  ) -> Result<TransitionPlan, DeclineReason> {
    let resolved = self.resolve(doc, line_number)?;
    let task = parse_task_line(resolved.line).ok_or(DeclineReason::NotATask { line: line_number })?;
    let workflow = resolved.workflow;

    let registry = self.registry;
    let from_stage = match resolved.info.current_stage() {
      CurrentStage::Stage(id) => registry
        .resolve_stage(workflow, id)
        .unwrap_or_else(|| registry.root_stage(workflow)),
      CurrentStage::Root => registry.root_stage(workflow),
    };
    let target = self.target(workflow, from_stage, resolved.info.sub_stage());

    let mut tail = self.bookkeeping(doc, &resolved, now);
    let mut edits = Vec::new();
    let elapsed = find_start_timestamp(resolved.line, &self.settings.timestamp_format)
      .map(|start| now - start.at);

    if self.settings.remove_timestamp_on_transition
      && let Some(start) = find_start_timestamp(resolved.line, &self.settings.timestamp_format)
    {
      let line_start = doc.line_start(line_number).unwrap_or(0);
      edits.push(TextEdit::delete(
        line_start + start.span.start,
        line_start + start.span.end,
      ));
    }

    let create_child_line = target.is_some() && self.settings.auto_add_next_task;
    if let (Some((stage, sub)), true) = (target, create_child_line) {
      let newline = line_break(doc, line_number);
      tail.push_str(newline);
      tail.push_str(&self.next_line(&task, resolved.info.is_root(), stage, sub, now));
    }

    if !tail.is_empty() {
      let line_end = doc.line_end(line_number).unwrap_or(doc.len());
      edits.push(TextEdit::insert(line_end, tail));
    }

    Ok(TransitionPlan {
      line_number,
      transition: Some(PendingTransition {
        source_line: line_number,
        workflow_id: workflow.id.clone(),
        from_stage: from_stage.id.clone(),
        to_stage: target.map(|(stage, _)| stage.id.clone()),
        to_sub_stage: target.and_then(|(_, sub)| sub).map(|sub| sub.id.clone()),
        occurred_at: now,
        elapsed,
        create_child_line,
      }),
      edits,
    })
  }

  /// Stamp a line that just joined a workflow with its start time.
  ///
  /// Returns `Ok(None)` when nothing needs writing: timestamps are off, the
  /// line already has one, or the timestamp format cannot render.
  pub fn plan_tag_change(
    &self,
    doc: &Document,
    line_number: usize,
    now: NaiveDateTime,
  ) -> Result<Option<TransitionPlan>, DeclineReason> {
    if !self.settings.auto_add_timestamp {
      return Ok(None);
    }

    let resolved = self.resolve(doc, line_number)?;
    if parse_task_line(resolved.line).is_none() {
      return Err(DeclineReason::NotATask { line: line_number });
    }
    if find_start_timestamp(resolved.line, &self.settings.timestamp_format).is_some() {
      return Ok(None);
    }
    let Some(token) = start_token(now, &self.settings.timestamp_format) else {
      debug!(format = %self.settings.timestamp_format, "timestamp format does not render");
      return Ok(None);
    };

    let line_end = doc.line_end(line_number).unwrap_or(doc.len());
    Ok(Some(TransitionPlan {
      line_number,
      transition: None,
      edits: vec![TextEdit::insert(line_end, format!(" {}", token))],
    }))
  }

  fn resolve<'d>(
    &self,
    doc: &'d Document,
    line_number: usize,
  ) -> Result<ResolvedLine<'d, 'a>, DeclineReason> {
    let line = doc
      .line(line_number)
      .ok_or(DeclineReason::LineOutOfBounds { line: line_number })?;
    let info = TaskLineInfo::parse(line_number, line)
      .ok_or(DeclineReason::NotAWorkflowLine { line: line_number })?;
    let root = resolve_workflow_root(doc, line_number)
      .ok_or(DeclineReason::Orphaned { line: line_number })?;
    let workflow = self
      .registry
      .resolve_definition(root.workflow_id)
      .ok_or_else(|| DeclineReason::UnknownWorkflow {
        line: line_number,
        workflow_id: root.workflow_id.to_string(),
      })?;

    Ok(ResolvedLine {
      line,
      info,
      root,
      workflow,
    })
  }

  /// Where a completed `from` stage moves to.
  fn target<'w>(
    &self,
    workflow: &'w Workflow,
    from: &'w StageDef,
    sub_stage: Option<&str>,
  ) -> Option<(&'w StageDef, Option<&'w SubStageDef>)> {
    if from.stage_type == StageType::Terminal {
      return None;
    }
    if let Some(sub_id) = sub_stage
      && let Some(next) = workflow.next_sub_stage(from, sub_id)
    {
      return Some((from, Some(next)));
    }

    let next = workflow.next_stage(from, self.settings.advance_cycle_stages)?;
    Some((next, next.sub_stages.first()))
  }

  /// Spent-time tokens appended to the source line.
  fn bookkeeping(&self, doc: &Document, resolved: &ResolvedLine<'_, '_>, now: NaiveDateTime) -> String {
    let settings = self.settings;
    let mut tail = String::new();

    if settings.calculate_spent_time && !has_spent_time(resolved.line) {
      match find_start_timestamp(resolved.line, &settings.timestamp_format) {
        Some(start) => {
          tail.push(' ');
          tail.push_str(&spent_token(now - start.at, &settings.spent_time_format));
        }
        None => debug!(line = resolved.info.line_number, "no start timestamp, skipping spent time"),
      }
    }

    if settings.calculate_full_spent_time && !has_total_spent_time(resolved.line) {
      let started = doc
        .line(resolved.root.line_number)
        .and_then(|root| find_start_timestamp(root, &settings.timestamp_format));
      match started {
        Some(start) => {
          tail.push(' ');
          tail.push_str(&total_spent_token(
            now - start.at,
            &settings.spent_time_format,
          ));
        }
        None => debug!(
          root_line = resolved.root.line_number,
          "workflow root has no start timestamp, skipping total spent time"
        ),
      }
    }

    tail
  }

  /// Text of the next-stage line, without its leading line break.
  fn next_line(
    &self,
    source: &TaskLine<'_>,
    source_is_root: bool,
    stage: &StageDef,
    sub_stage: Option<&SubStageDef>,
    now: NaiveDateTime,
  ) -> String {
    let settings = self.settings;
    let mut indent = source.indent.to_string();
    if source_is_root {
      indent.push_str(&settings.indent_unit);
    }
    let bullet = if source.bullet.starts_with(|c: char| c.is_ascii_digit()) {
      "-"
    } else {
      source.bullet
    };

    let label = if stage.stage_type == StageType::Terminal && settings.auto_remove_last_stage_marker {
      stage.name.clone()
    } else {
      encode_stage_marker(&stage.id, sub_stage.map(|sub| sub.id.as_str()))
    };

    let mut line = format!(
      "{}{} [{}] {}",
      indent,
      bullet,
      settings.status_marks.todo_mark(),
      label
    );
    if settings.auto_add_timestamp
      && let Some(token) = start_token(now, &settings.timestamp_format)
    {
      line.push(' ');
      line.push_str(&token);
    }
    line
  }
}

fn line_break(doc: &Document, line_number: usize) -> &'static str {
  let end = doc.line_end(line_number).unwrap_or(doc.len());
  if doc.text()[end..].starts_with("\r\n") {
    "\r\n"
  } else {
    "\n"
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDate;
  use flowmark_config::WorkflowDef;

  fn now() -> NaiveDateTime {
    at(10, 30, 0)
  }

  fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
      .unwrap()
      .and_hms_opt(h, m, s)
      .unwrap()
  }

  fn dev() -> WorkflowDef {
    WorkflowDef {
      id: "dev".to_string(),
      name: "Development".to_string(),
      stages: vec![
        StageDef::new("planning", "Planning", StageType::Normal)
          .proceeds_to(["development"])
          .with_sub_stages(["research", "draft"]),
        StageDef::new("development", "Development", StageType::Normal).proceeds_to(["review"]),
        StageDef::new("review", "Review", StageType::Cycle).proceeds_to(["done"]),
        StageDef::new("done", "Done", StageType::Terminal),
      ],
    }
  }

  fn settings() -> WorkflowSettings {
    WorkflowSettings::with_definitions(vec![dev()])
  }

  fn plan(settings: &WorkflowSettings, text: &str, line: usize) -> Result<TransitionPlan, DeclineReason> {
    let registry = WorkflowRegistry::from_settings(settings).unwrap();
    Planner::new(settings, &registry).plan_status_change(&Document::new(text), line, now())
  }

  fn inserted(plan: &TransitionPlan) -> String {
    plan
      .edits
      .iter()
      .map(|edit| edit.insert.as_str())
      .collect()
  }

  #[test]
  fn test_root_moves_to_next_stage_as_child() {
    let plan = plan(&settings(), "- [x] Task #workflow/dev", 0).unwrap();
    let transition = plan.transition.as_ref().unwrap();

    assert_eq!(transition.from_stage, "planning");
    assert_eq!(transition.to_stage.as_deref(), Some("development"));
    assert!(transition.create_child_line);
    assert_eq!(plan.edits, vec![TextEdit::insert(24, "\n\t- [ ] [stage::development]")]);
  }

  #[test]
  fn test_stage_line_gets_sibling() {
    let text = "- [ ] Task #workflow/dev\n  * [x] Build [stage::development]";
    let plan = plan(&settings(), text, 1).unwrap();

    assert_eq!(inserted(&plan), "\n  * [ ] [stage::review]");
  }

  #[test]
  fn test_numbered_bullet_becomes_dash() {
    let text = "1. [ ] Task #workflow/dev\n\t2. [x] Build [stage::development]";
    let plan = plan(&settings(), text, 1).unwrap();

    assert_eq!(inserted(&plan), "\n\t- [ ] [stage::review]");
  }

  #[test]
  fn test_sub_stage_advances_within_stage() {
    let text = "- [ ] Task #workflow/dev\n\t- [x] Read [stage::planning.research]";
    let plan = plan(&settings(), text, 1).unwrap();
    let transition = plan.transition.unwrap();

    assert_eq!(transition.to_stage.as_deref(), Some("planning"));
    assert_eq!(transition.to_sub_stage.as_deref(), Some("draft"));
  }

  #[test]
  fn test_last_sub_stage_moves_to_next_stage() {
    let text = "- [ ] Task #workflow/dev\n\t- [x] Write [stage::planning.draft]";
    let plan = plan(&settings(), text, 1).unwrap();

    assert_eq!(inserted(&plan), "\n\t- [ ] [stage::development]");
  }

  #[test]
  fn test_entering_stage_with_sub_stages() {
    let mut def = dev();
    def.stages[1].can_proceed_to = vec!["planning".to_string()];
    let settings = WorkflowSettings::with_definitions(vec![def]);
    let text = "- [ ] Task #workflow/dev\n\t- [x] Build [stage::development]";
    let plan = plan(&settings, text, 1).unwrap();

    assert_eq!(inserted(&plan), "\n\t- [ ] [stage::planning.research]");
  }

  #[test]
  fn test_cycle_loops_or_advances() {
    let text = "- [ ] Task #workflow/dev\n\t- [x] Look [stage::review]";
    let looped = plan(&settings(), text, 1).unwrap();
    assert_eq!(inserted(&looped), "\n\t- [ ] [stage::review]");

    let mut advancing = settings();
    advancing.advance_cycle_stages = true;
    let advanced = plan(&advancing, text, 1).unwrap();
    assert_eq!(inserted(&advanced), "\n\t- [ ] [stage::done]");
  }

  #[test]
  fn test_terminal_target_without_marker() {
    let mut settings = settings();
    settings.advance_cycle_stages = true;
    settings.auto_remove_last_stage_marker = true;
    let text = "- [ ] Task #workflow/dev\n\t- [x] Look [stage::review]";
    let plan = plan(&settings, text, 1).unwrap();

    assert_eq!(inserted(&plan), "\n\t- [ ] Done");
  }

  #[test]
  fn test_terminal_source_only_bookkeeping() {
    let text = "- [ ] Task #workflow/dev\n\t- [x] Ship [stage::done] 🛫 2024-05-01 10:00:00";
    let plan = plan(&settings(), text, 1).unwrap();
    let transition = plan.transition.as_ref().unwrap();

    assert!(transition.to_stage.is_none());
    assert!(!transition.create_child_line);
    assert_eq!(transition.elapsed, Some(TimeDelta::minutes(30)));
    assert_eq!(inserted(&plan), " (⏱️ 00:30:00)");
  }

  #[test]
  fn test_unknown_stage_falls_back_to_root_stage() {
    let text = "- [ ] Task #workflow/dev\n\t- [x] ? [stage::mystery]";
    let plan = plan(&settings(), text, 1).unwrap();

    assert_eq!(plan.transition.unwrap().from_stage, "planning");
  }

  #[test]
  fn test_spent_time_not_duplicated() {
    let text = "- [x] Task #workflow/dev 🛫 2024-05-01 10:00:00 (⏱️ 00:10:00)";
    let plan = plan(&settings(), text, 0).unwrap();

    assert_eq!(inserted(&plan), "\n\t- [ ] [stage::development]");
  }

  #[test]
  fn test_full_spent_time_uses_root_timestamp() {
    let mut settings = settings();
    settings.calculate_spent_time = false;
    settings.calculate_full_spent_time = true;
    let text = "- [ ] Task #workflow/dev 🛫 2024-05-01 08:00:00\n\t- [x] Build [stage::development]";
    let plan = plan(&settings, text, 1).unwrap();

    assert_eq!(
      inserted(&plan),
      " (⏱️ Total: 02:30:00)\n\t- [ ] [stage::review]"
    );
  }

  #[test]
  fn test_remove_timestamp() {
    let mut settings = settings();
    settings.remove_timestamp_on_transition = true;
    settings.auto_add_next_task = false;
    let text = "- [x] Task 🛫 2024-05-01 10:00:00 #workflow/dev";
    let plan = plan(&settings, text, 0).unwrap();

    assert_eq!(plan.edits[0], TextEdit::delete(10, 35));
    assert_eq!(plan.edits[1].insert, " (⏱️ 00:30:00)");
  }

  #[test]
  fn test_auto_add_timestamp_on_new_line() {
    let mut settings = settings();
    settings.auto_add_timestamp = true;
    let plan = plan(&settings, "- [x] Task #workflow/dev", 0).unwrap();

    assert_eq!(
      inserted(&plan),
      "\n\t- [ ] [stage::development] 🛫 2024-05-01 10:30:00"
    );
  }

  #[test]
  fn test_crlf_line_break_is_kept() {
    let plan = plan(&settings(), "- [x] Task #workflow/dev\r\nnext", 0).unwrap();

    assert_eq!(plan.edits, vec![TextEdit::insert(24, "\r\n\t- [ ] [stage::development]")]);
  }

  #[test]
  fn test_declines() {
    let settings = settings();

    assert_eq!(
      plan(&settings, "- [x] Task", 0).unwrap_err(),
      DeclineReason::NotAWorkflowLine { line: 0 }
    );
    assert_eq!(
      plan(&settings, "- [x] Sub [stage::review]", 0).unwrap_err(),
      DeclineReason::Orphaned { line: 0 }
    );
    assert_eq!(
      plan(&settings, "- [x] Task #workflow/ops", 0).unwrap_err(),
      DeclineReason::UnknownWorkflow {
        line: 0,
        workflow_id: "ops".to_string()
      }
    );
    assert_eq!(
      plan(&settings, "Notes #workflow/dev", 0).unwrap_err(),
      DeclineReason::NotATask { line: 0 }
    );
    assert_eq!(
      plan(&settings, "- [x] Task", 4).unwrap_err(),
      DeclineReason::LineOutOfBounds { line: 4 }
    );
  }

  #[test]
  fn test_tag_change_stamps_start_time() {
    let mut settings = settings();
    settings.auto_add_timestamp = true;
    let registry = WorkflowRegistry::from_settings(&settings).unwrap();
    let planner = Planner::new(&settings, &registry);
    let doc = Document::new("- [ ] Task #workflow/dev");

    let plan = planner.plan_tag_change(&doc, 0, now()).unwrap().unwrap();
    assert!(plan.transition.is_none());
    assert_eq!(
      plan.edits,
      vec![TextEdit::insert(24, " 🛫 2024-05-01 10:30:00")]
    );

    let stamped = Document::new("- [ ] Task #workflow/dev 🛫 2024-05-01 10:30:00");
    assert!(planner.plan_tag_change(&stamped, 0, now()).unwrap().is_none());
  }

  #[test]
  fn test_tag_change_without_auto_timestamp() {
    let settings = settings();
    let registry = WorkflowRegistry::from_settings(&settings).unwrap();
    let planner = Planner::new(&settings, &registry);
    let doc = Document::new("- [ ] Task #workflow/dev");

    assert!(planner.plan_tag_change(&doc, 0, now()).unwrap().is_none());
  }
}
