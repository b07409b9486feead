//! Advisory planner notifications.
//!
//! Notifications are observational: they never change control flow and
//! logging one never fails. The surrounding system decides how (and whether)
//! to surface them to the client.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;

use crate::ir::InputPosition;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum PlannerNotification {
    /// Emitted when a shortest-path request carries predicates that cannot be
    /// checked incrementally, so the plan includes an exhaustive
    /// enumerate-and-filter branch.
    ExhaustiveShortestPath { position: InputPosition },
}

impl fmt::Display for PlannerNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerNotification::ExhaustiveShortestPath { position } => write!(
                f,
                "Using an exhaustive shortest path fallback might cause query slow-down ({position})"
            ),
        }
    }
}

/// Fire-and-forget notification sink, scoped to one planning invocation.
///
/// Interior mutability lets plan-construction code log through a shared
/// reference; the planning context is otherwise read-only to the steps.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: RefCell<Vec<PlannerNotification>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self, notification: PlannerNotification) {
        log::debug!("planner notification: {notification}");
        self.entries.borrow_mut().push(notification);
    }

    pub fn entries(&self) -> Vec<PlannerNotification> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
