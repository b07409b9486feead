//! Planning context.
//!
//! [`PlanningContext`] bundles what one planning invocation needs: the
//! runtime-safety configuration, the plan producer, the notification sink,
//! and fresh-name generation. Contexts are independent; nothing here is
//! process-global, so concurrent planning invocations never share state.

use std::collections::HashSet;

use crate::notification::NotificationLog;
use crate::plan::producer::PlanProducer;

/// Runtime-safety toggles read during plan construction. Threaded explicitly
/// so the decisions they drive are visible at the call sites that make them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlannerConfig {
    /// Make the shortest-path algorithm reject rows where start and end are
    /// the same node, instead of returning a zero-length path.
    pub disallow_same_node: bool,
    /// Plan the exhaustive fallback branch as an error operator: planning
    /// still succeeds, but executing the fallback raises
    /// [`crate::plan::RuntimeError::ExhaustiveShortestPathForbidden`].
    pub forbid_exhaustive_fallback: bool,
}

/// Per-invocation generator for names that cannot collide with user
/// identifiers: generated names start with a space, which the query language
/// does not allow in symbolic names.
#[derive(Debug, Default)]
pub struct NameGenerator {
    next: u32,
}

impl NameGenerator {
    fn next_index(&mut self) -> u32 {
        let n = self.next;
        self.next += 1;
        n
    }

    /// Name for a path the user left anonymous.
    pub fn unnamed_path(&mut self) -> String {
        format!(" UNNAMED{}", self.next_index())
    }

    /// Name for a synthetic column, guaranteed absent from `visible`.
    pub fn fresh_column(&mut self, visible: &HashSet<String>) -> String {
        loop {
            let candidate = format!(" FRESHID{}", self.next_index());
            if !visible.contains(&candidate) {
                return candidate;
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct PlanningContext {
    pub config: PlannerConfig,
    pub producer: PlanProducer,
    pub notifications: NotificationLog,
    pub names: NameGenerator,
}

impl PlanningContext {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}
