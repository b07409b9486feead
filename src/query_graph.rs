//! Query-graph model: patterns, predicates and selections.
//!
//! A [`QueryGraph`] is the read-only description of what a (sub)query asks
//! for: the pattern variables it binds, the arguments it receives from an
//! outer scope, its predicate set, and any shortest-path patterns. The same
//! type doubles as solved-query metadata: the plan producer records, per plan
//! node, the query graph that subtree answers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ir::{Direction, Expression, InputPosition};

/// Length constraint of a relationship pattern.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum PatternLength {
    /// A single relationship, `-[r]->`.
    Simple,
    /// A variable-length relationship, `-[r*1..3]->`. `max = None` means
    /// unbounded.
    VarLength { min: u32, max: Option<u32> },
}

impl PatternLength {
    /// Fixed hop count: `*2` becomes min=2, max=2.
    pub fn fixed(hops: u32) -> Self {
        PatternLength::VarLength {
            min: hops,
            max: Some(hops),
        }
    }

    /// Range: `*1..3` becomes min=1, max=3.
    pub fn range(min: u32, max: u32) -> Self {
        PatternLength::VarLength {
            min,
            max: Some(max),
        }
    }

    /// Unlimited: `*` becomes min=1, max=None.
    pub fn unbounded() -> Self {
        PatternLength::VarLength { min: 1, max: None }
    }

    pub fn is_var_length(&self) -> bool {
        matches!(self, PatternLength::VarLength { .. })
    }
}

/// A relationship pattern between two named endpoint nodes.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PatternRelationship {
    pub name: String,
    /// Left and right endpoint node names, in pattern order.
    pub nodes: (String, String),
    pub direction: Direction,
    /// Allowed relationship types; empty means any type.
    pub types: Vec<String>,
    pub length: PatternLength,
}

impl PatternRelationship {
    pub fn left(&self) -> &str {
        &self.nodes.0
    }

    pub fn right(&self) -> &str {
        &self.nodes.1
    }

    /// The endpoint opposite to `node`, or `None` if `node` is not an
    /// endpoint of this relationship.
    pub fn other_side(&self, node: &str) -> Option<&str> {
        if node == self.nodes.0 {
            Some(&self.nodes.1)
        } else if node == self.nodes.1 {
            Some(&self.nodes.0)
        } else {
            None
        }
    }
}

/// A pattern requesting shortest-path computation between two endpoints.
///
/// `single` distinguishes `shortestPath(...)` (one result) from
/// `allShortestPaths(...)` (every path tied for minimum length). The path
/// name is optional in source text; the planner assigns a generated name
/// before building any plan that must bind the path value.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ShortestPathPattern {
    pub name: Option<String>,
    pub rel: PatternRelationship,
    pub single: bool,
    /// Position of the shortest-path expression in the query text.
    pub position: InputPosition,
}

impl ShortestPathPattern {
    /// Variables this pattern binds: the path name (when present) and the
    /// relationship name.
    pub fn path_variables(&self) -> HashSet<String> {
        let mut vars = HashSet::new();
        if let Some(name) = &self.name {
            vars.insert(name.clone());
        }
        vars.insert(self.rel.name.clone());
        vars
    }

    /// Copy of this pattern with the path name filled in.
    pub fn with_name(&self, name: String) -> Self {
        Self {
            name: Some(name),
            ..self.clone()
        }
    }
}

/// A predicate expression with its precomputed free-variable set.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Predicate {
    pub dependencies: HashSet<String>,
    pub expr: Expression,
}

impl Predicate {
    pub fn new(expr: Expression) -> Self {
        Self {
            dependencies: expr.dependencies(),
            expr,
        }
    }

    /// True when every dependency is bound by `symbols`.
    pub fn dependencies_met(&self, symbols: &HashSet<String>) -> bool {
        self.dependencies.is_subset(symbols)
    }
}

/// The predicate set of a query graph, in selection order.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Selections {
    pub predicates: Vec<Predicate>,
}

impl Selections {
    pub fn from_expressions(exprs: impl IntoIterator<Item = Expression>) -> Self {
        Self {
            predicates: exprs.into_iter().map(Predicate::new).collect(),
        }
    }

    pub fn add(&mut self, expr: Expression) {
        self.predicates.push(Predicate::new(expr));
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// The pattern + predicate description of a (sub)query.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct QueryGraph {
    /// Node variables bound by the pattern.
    pub pattern_nodes: HashSet<String>,
    /// Variables provided by an enclosing scope.
    pub argument_ids: HashSet<String>,
    pub selections: Selections,
    /// Shortest-path patterns this query graph contains (or, as solved
    /// metadata, claims to have answered).
    pub shortest_paths: Vec<ShortestPathPattern>,
}

impl QueryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query graph representing rows handed in from an outer scope.
    pub fn with_arguments(argument_ids: HashSet<String>) -> Self {
        Self {
            argument_ids,
            ..Self::default()
        }
    }

    /// Extension of this graph with a shortest-path pattern. Used when
    /// recording what a plan solves; the receiver is not modified.
    pub fn add_shortest_path(&self, pattern: &ShortestPathPattern) -> Self {
        let mut extended = self.clone();
        extended.shortest_paths.push(pattern.clone());
        extended
    }

    /// Extension of this graph with extra predicates, preserving order.
    pub fn add_predicates(&self, exprs: impl IntoIterator<Item = Expression>) -> Self {
        let mut extended = self.clone();
        for expr in exprs {
            extended.selections.add(expr);
        }
        extended
    }

    /// Union of two query graphs (used for plans combining two branches).
    pub fn merge(&self, other: &QueryGraph) -> Self {
        let mut merged = self.clone();
        merged
            .pattern_nodes
            .extend(other.pattern_nodes.iter().cloned());
        merged
            .argument_ids
            .extend(other.argument_ids.iter().cloned());
        for predicate in &other.selections.predicates {
            if !merged.selections.predicates.contains(predicate) {
                merged.selections.predicates.push(predicate.clone());
            }
        }
        for sp in &other.shortest_paths {
            if !merged.shortest_paths.contains(sp) {
                merged.shortest_paths.push(sp.clone());
            }
        }
        merged
    }
}
