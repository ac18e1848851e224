use std::collections::{HashMap, HashSet, VecDeque};

use flowmark_config::{StageDef, StageType};

/// Stage transition graph for a single workflow.
#[derive(Debug, Clone)]
pub struct StageGraph {
  /// Adjacency list: stage_id -> resolvable `can_proceed_to` targets, in order.
  adjacency: HashMap<String, Vec<String>>,
  /// The root stage (first in definition order).
  root: String,
  /// `(from, to)` references that do not resolve within the workflow.
  dangling: Vec<(String, String)>,
}

impl StageGraph {
  /// Build a graph from stages in definition order. `stages` must not be empty.
  pub fn new(stages: &[StageDef]) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut dangling = Vec::new();

    let known: HashSet<&str> = stages.iter().map(|s| s.id.as_str()).collect();

    // Initialize all stages
    for stage in stages {
      adjacency.entry(stage.id.clone()).or_default();
    }

    // Terminal stages never get outgoing edges
    for stage in stages.iter().filter(|s| s.stage_type != StageType::Terminal) {
      for to in &stage.can_proceed_to {
        if !known.contains(to.as_str()) {
          dangling.push((stage.id.clone(), to.clone()));
          continue;
        }
        adjacency.entry(stage.id.clone()).or_default().push(to.clone());
      }
    }

    let root = stages.first().map(|s| s.id.clone()).unwrap_or_default();

    Self {
      adjacency,
      root,
      dangling,
    }
  }

  /// Get the root stage id.
  pub fn root(&self) -> &str {
    &self.root
  }

  /// Get the resolvable next stages for a given stage, in configured order.
  pub fn downstream(&self, stage_id: &str) -> &[String] {
    self
      .adjacency
      .get(stage_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get `(from, to)` pairs whose target does not exist.
  pub fn dangling(&self) -> &[(String, String)] {
    &self.dangling
  }

  /// Stages with no path from the root stage, sorted by id.
  pub fn unreachable(&self) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    seen.insert(&self.root);
    queue.push_back(&self.root);

    while let Some(id) = queue.pop_front() {
      for next in self.downstream(id) {
        if seen.insert(next.as_str()) {
          queue.push_back(next.as_str());
        }
      }
    }

    let mut unreachable: Vec<String> = self
      .adjacency
      .keys()
      .filter(|id| !seen.contains(id.as_str()))
      .cloned()
      .collect();
    unreachable.sort();
    unreachable
  }
}
