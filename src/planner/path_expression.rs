//! Builds the expression materializing a path value.
//!
//! When the exhaustive fallback enumerates paths row by row, the path
//! variable must be bound to an actual path value (alternating nodes and
//! relationships). This module turns a shortest-path pattern into that
//! expression; evaluation happens downstream.

use crate::ir::{Expression, PathStep};
use crate::query_graph::{PatternLength, ShortestPathPattern};

/// Expression yielding the path value for `pattern`, starting from the
/// pattern's left endpoint. Pure; no planning state involved.
pub fn path_expression_for(pattern: &ShortestPathPattern) -> Expression {
    let rel = &pattern.rel;
    let tail = match rel.length {
        PatternLength::Simple => PathStep::SingleRelationship {
            rel: rel.name.clone(),
            direction: rel.direction,
            to_node: rel.right().to_string(),
            next: Box::new(PathStep::Nil),
        },
        PatternLength::VarLength { .. } => PathStep::MultiRelationship {
            rel: rel.name.clone(),
            direction: rel.direction,
            to_node: rel.right().to_string(),
            next: Box::new(PathStep::Nil),
        },
    };
    Expression::PathExpression(PathStep::Node {
        node: rel.left().to_string(),
        next: Box::new(tail),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Direction, InputPosition};
    use crate::query_graph::PatternRelationship;
    use std::collections::HashSet;

    fn pattern(length: PatternLength) -> ShortestPathPattern {
        ShortestPathPattern {
            name: Some("p".to_string()),
            rel: PatternRelationship {
                name: "r".to_string(),
                nodes: ("a".to_string(), "b".to_string()),
                direction: Direction::Outgoing,
                types: vec![],
                length,
            },
            single: true,
            position: InputPosition::NONE,
        }
    }

    #[test]
    fn test_var_length_uses_multi_relationship_step() {
        let expr = path_expression_for(&pattern(PatternLength::unbounded()));
        match expr {
            Expression::PathExpression(PathStep::Node { node, next }) => {
                assert_eq!(node, "a");
                match *next {
                    PathStep::MultiRelationship {
                        rel, to_node, next, ..
                    } => {
                        assert_eq!(rel, "r");
                        assert_eq!(to_node, "b");
                        assert_eq!(*next, PathStep::Nil);
                    }
                    other => panic!("Expected MultiRelationship, got {other:?}"),
                }
            }
            other => panic!("Expected PathExpression, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_length_uses_single_relationship_step() {
        let expr = path_expression_for(&pattern(PatternLength::Simple));
        match expr {
            Expression::PathExpression(PathStep::Node { next, .. }) => {
                assert!(matches!(*next, PathStep::SingleRelationship { .. }));
            }
            other => panic!("Expected PathExpression, got {other:?}"),
        }
    }

    #[test]
    fn test_path_expression_depends_on_pattern_variables() {
        let expr = path_expression_for(&pattern(PatternLength::unbounded()));
        assert_eq!(
            expr.dependencies(),
            HashSet::from(["a".to_string(), "r".to_string(), "b".to_string()])
        );
    }
}
