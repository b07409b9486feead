//! Logical plan operator tree.
//!
//! Plans are immutable once constructed: children sit behind `Arc` and a
//! parent never mutates a wrapped child. Each node carries a [`PlanId`]
//! assigned by the [`producer::PlanProducer`], which keys the solved-query
//! registry used by explain/verification.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::ir::{Direction, Expression};
use crate::query_graph::{PatternLength, ShortestPathPattern};

#[path = "../utils/serde_arc.rs"]
mod serde_arc;

pub mod producer;

/// Identity of a plan node within one planning invocation.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct PlanId(pub u32);

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LogicalPlan {
    pub id: PlanId,
    pub op: PlanOp,
}

/// Errors a plan is built to raise when executed. Planning such a plan
/// succeeds; only running it fails.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum RuntimeError {
    #[error("Shortest path fallback has been explicitly disabled. That means that no full path enumeration is performed in case shortest path algorithms cannot be used.")]
    ExhaustiveShortestPathForbidden,
}

/// Whether a `Limit` keeps rows tied with the last one on the sort key.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Ties {
    IncludeTies,
    DoNotIncludeTies,
}

/// Whether an expansion discovers the far endpoint or connects two bound
/// endpoints.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum ExpansionMode {
    /// Far endpoint unbound: each expansion binds it.
    ExpandAll,
    /// Both endpoints bound: expansion only yields paths connecting them.
    ExpandInto,
}

/// One projected column: expression and output name.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ProjectionItem {
    pub expression: Expression,
    pub alias: String,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SortItem {
    pub column: String,
    pub order: SortOrder,
}

/// The closed set of logical operators this planner emits.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum PlanOp {
    /// Leaf re-exposing variables already bound by an outer row.
    Argument { symbols: HashSet<String> },

    /// Invocation of a specialized shortest-path algorithm between the
    /// pattern's endpoints, with `predicates` pushed down for pruning.
    /// `with_fallback` marks the best-effort variant planned alongside an
    /// exhaustive branch; `disallow_same_node` makes the algorithm reject
    /// start = end at runtime.
    FindShortestPaths {
        #[serde(with = "serde_arc")]
        source: Arc<LogicalPlan>,
        pattern: ShortestPathPattern,
        predicates: Vec<Expression>,
        with_fallback: bool,
        disallow_same_node: bool,
    },

    /// Row-preserving wrapper: rows where `source` produced nothing survive
    /// with null bindings for the variables `source` would have bound.
    Optional {
        #[serde(with = "serde_arc")]
        source: Arc<LogicalPlan>,
    },

    /// Nested-loop combinator: runs `rhs` once per `lhs` row, with the row's
    /// bindings as arguments.
    Apply {
        #[serde(with = "serde_arc")]
        lhs: Arc<LogicalPlan>,
        #[serde(with = "serde_arc")]
        rhs: Arc<LogicalPlan>,
    },

    /// Per-row branch selection keyed on `key`: when an `lhs` row has a
    /// non-null `key`, the row passes through untouched and `rhs` is not
    /// run; otherwise the row is replaced by `rhs`'s output for that row's
    /// context.
    AntiConditionalApply {
        #[serde(with = "serde_arc")]
        lhs: Arc<LogicalPlan>,
        #[serde(with = "serde_arc")]
        rhs: Arc<LogicalPlan>,
        key: String,
    },

    /// Variable-length relationship expansion.
    VarExpand {
        #[serde(with = "serde_arc")]
        source: Arc<LogicalPlan>,
        from: String,
        to: String,
        direction: Direction,
        types: Vec<String>,
        length: PatternLength,
        rel_name: String,
        mode: ExpansionMode,
    },

    /// Adds projected columns to each row; existing columns pass through.
    Projection {
        #[serde(with = "serde_arc")]
        source: Arc<LogicalPlan>,
        items: Vec<ProjectionItem>,
    },

    /// Keeps rows satisfying every predicate.
    Selection {
        #[serde(with = "serde_arc")]
        source: Arc<LogicalPlan>,
        predicates: Vec<Expression>,
    },

    Sort {
        #[serde(with = "serde_arc")]
        source: Arc<LogicalPlan>,
        items: Vec<SortItem>,
    },

    Limit {
        #[serde(with = "serde_arc")]
        source: Arc<LogicalPlan>,
        count: u64,
        ties: Ties,
    },

    /// Valid to construct, raises `error` if executed.
    ErrorPlan {
        #[serde(with = "serde_arc")]
        source: Arc<LogicalPlan>,
        error: RuntimeError,
    },
}

impl LogicalPlan {
    /// Variable names this plan makes available to its ancestors.
    pub fn available_symbols(&self) -> HashSet<String> {
        match &self.op {
            PlanOp::Argument { symbols } => symbols.clone(),
            PlanOp::FindShortestPaths {
                source, pattern, ..
            } => {
                let mut symbols = source.available_symbols();
                symbols.extend(pattern.path_variables());
                symbols
            }
            PlanOp::Optional { source } => source.available_symbols(),
            PlanOp::Apply { lhs, rhs } | PlanOp::AntiConditionalApply { lhs, rhs, .. } => {
                let mut symbols = lhs.available_symbols();
                symbols.extend(rhs.available_symbols());
                symbols
            }
            PlanOp::VarExpand {
                source,
                to,
                rel_name,
                ..
            } => {
                let mut symbols = source.available_symbols();
                symbols.insert(to.clone());
                symbols.insert(rel_name.clone());
                symbols
            }
            PlanOp::Projection { source, items } => {
                let mut symbols = source.available_symbols();
                symbols.extend(items.iter().map(|item| item.alias.clone()));
                symbols
            }
            PlanOp::Selection { source, .. }
            | PlanOp::Sort { source, .. }
            | PlanOp::Limit { source, .. }
            | PlanOp::ErrorPlan { source, .. } => source.available_symbols(),
        }
    }

    /// Operator name, for display and test assertions.
    pub fn op_name(&self) -> &'static str {
        match &self.op {
            PlanOp::Argument { .. } => "Argument",
            PlanOp::FindShortestPaths { .. } => "FindShortestPaths",
            PlanOp::Optional { .. } => "Optional",
            PlanOp::Apply { .. } => "Apply",
            PlanOp::AntiConditionalApply { .. } => "AntiConditionalApply",
            PlanOp::VarExpand { .. } => "VarExpand",
            PlanOp::Projection { .. } => "Projection",
            PlanOp::Selection { .. } => "Selection",
            PlanOp::Sort { .. } => "Sort",
            PlanOp::Limit { .. } => "Limit",
            PlanOp::ErrorPlan { .. } => "ErrorPlan",
        }
    }

    /// Direct children, left to right.
    pub fn children(&self) -> Vec<&Arc<LogicalPlan>> {
        match &self.op {
            PlanOp::Argument { .. } => vec![],
            PlanOp::FindShortestPaths { source, .. }
            | PlanOp::Optional { source }
            | PlanOp::VarExpand { source, .. }
            | PlanOp::Projection { source, .. }
            | PlanOp::Selection { source, .. }
            | PlanOp::Sort { source, .. }
            | PlanOp::Limit { source, .. }
            | PlanOp::ErrorPlan { source, .. } => vec![source],
            PlanOp::Apply { lhs, rhs } | PlanOp::AntiConditionalApply { lhs, rhs, .. } => {
                vec![lhs, rhs]
            }
        }
    }

    /// Every node of the given operator kind in this subtree, preorder.
    pub fn find_all(&self, op_name: &str) -> Vec<&LogicalPlan> {
        let mut found = Vec::new();
        self.collect_ops(op_name, &mut found);
        found
    }

    fn collect_ops<'a>(&'a self, op_name: &str, found: &mut Vec<&'a LogicalPlan>) {
        if self.op_name() == op_name {
            found.push(self);
        }
        for child in self.children() {
            child.collect_ops(op_name, found);
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            f.write_str("  ")?;
        }
        match &self.op {
            PlanOp::Argument { symbols } => {
                let mut names: Vec<&str> = symbols.iter().map(String::as_str).collect();
                names.sort_unstable();
                writeln!(f, "Argument({})", names.join(", "))?;
            }
            PlanOp::FindShortestPaths {
                pattern,
                predicates,
                with_fallback,
                ..
            } => {
                writeln!(
                    f,
                    "FindShortestPaths({}, {} predicates{})",
                    pattern.name.as_deref().unwrap_or("<anon>"),
                    predicates.len(),
                    if *with_fallback { ", with fallback" } else { "" },
                )?;
            }
            PlanOp::Optional { .. } => writeln!(f, "Optional")?,
            PlanOp::Apply { .. } => writeln!(f, "Apply")?,
            PlanOp::AntiConditionalApply { key, .. } => {
                writeln!(f, "AntiConditionalApply(key: {key})")?
            }
            PlanOp::VarExpand {
                from, to, mode, ..
            } => {
                let mode = match mode {
                    ExpansionMode::ExpandAll => "all",
                    ExpansionMode::ExpandInto => "into",
                };
                writeln!(f, "VarExpand({from} -> {to}, {mode})")?;
            }
            PlanOp::Projection { items, .. } => {
                let aliases: Vec<&str> = items.iter().map(|i| i.alias.as_str()).collect();
                writeln!(f, "Projection({})", aliases.join(", "))?;
            }
            PlanOp::Selection { predicates, .. } => {
                writeln!(f, "Selection({} predicates)", predicates.len())?
            }
            PlanOp::Sort { items, .. } => {
                let keys: Vec<&str> = items.iter().map(|i| i.column.as_str()).collect();
                writeln!(f, "Sort({})", keys.join(", "))?;
            }
            PlanOp::Limit { count, ties, .. } => {
                let ties = match ties {
                    Ties::IncludeTies => " with ties",
                    Ties::DoNotIncludeTies => "",
                };
                writeln!(f, "Limit({count}{ties})")?;
            }
            PlanOp::ErrorPlan { error, .. } => writeln!(f, "ErrorPlan({error})")?,
        }
        for child in self.children() {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
