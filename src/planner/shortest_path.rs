//! Shortest-path planning.
//!
//! Decides how a shortest-path pattern is executed. The specialized
//! traversal algorithm is far cheaper than enumerating every path, but it is
//! only correct when each attached predicate can be checked incrementally
//! while the traversal runs. Predicates are classified by shape:
//! `all(...)`/`none(...)` quantifications whose inner condition never touches
//! the path variables can be evaluated per element and are safe; anything
//! else needs the complete path value first. With only safe predicates the
//! planner emits a single traversal operator. Otherwise it builds a two
//! branch plan: a best-effort traversal attempt, and an exhaustive
//! enumerate-filter-sort-limit branch that takes over, per row, whenever the
//! attempt comes up empty. Rows the attempt does produce are trusted as-is
//! and never re-checked against the exhaustive branch.

use std::collections::HashSet;
use std::sync::Arc;

use crate::ir::combinators::fn_call;
use crate::ir::{Expression, FilterScope, IterablePredicate};
use crate::notification::PlannerNotification;
use crate::plan::{LogicalPlan, ProjectionItem, RuntimeError, SortItem, SortOrder, Ties};
use crate::plan_ctx::PlanningContext;
use crate::query_graph::{QueryGraph, ShortestPathPattern};

use super::errors::PlannerError;
use super::{expand, path_expression};

/// Plan a shortest-path pattern on top of `inner`, which must already bind
/// both endpoints of the pattern's relationship.
pub fn plan_shortest_paths(
    inner: Arc<LogicalPlan>,
    query_graph: &QueryGraph,
    pattern: &ShortestPathPattern,
    ctx: &mut PlanningContext,
) -> Result<Arc<LogicalPlan>, PlannerError> {
    // The fallback branch binds the path variable by name to merge results
    // across branches, so an anonymous path gets a generated name up front.
    let pattern = match &pattern.name {
        Some(_) => pattern.clone(),
        None => pattern.with_name(ctx.names.unnamed_path()),
    };

    let classified = classify_predicates(query_graph, &pattern, &inner);
    log::debug!(
        "shortest path `{}`: {} safe predicates, {} need fallback",
        pattern.rel.name,
        classified.safe.len(),
        classified.need_fallback.len()
    );

    if classified.need_fallback.is_empty() {
        let disallow_same_node = ctx.config.disallow_same_node;
        Ok(ctx.producer.plan_shortest_path(
            inner,
            pattern,
            classified.safe,
            false,
            disallow_same_node,
        ))
    } else {
        build_fallback_plans(inner, &pattern, classified.into_all(), ctx)
    }
}

struct ClassifiedPredicates {
    safe: Vec<Expression>,
    need_fallback: Vec<Expression>,
}

impl ClassifiedPredicates {
    /// All relevant predicates in original selection order.
    fn into_all(self) -> Vec<Expression> {
        let mut all = self.safe;
        all.extend(self.need_fallback);
        all
    }
}

/// Select the predicates relevant to this path and partition them by whether
/// the traversal algorithm can check them incrementally.
///
/// A predicate is relevant when all of its dependencies are bound by the
/// path's own variables plus what `inner` provides, and at least one
/// dependency is a path variable. Partitioning preserves selection order
/// within each group.
fn classify_predicates(
    query_graph: &QueryGraph,
    pattern: &ShortestPathPattern,
    inner: &LogicalPlan,
) -> ClassifiedPredicates {
    let path_variables = pattern.path_variables();
    let mut bound = inner.available_symbols();
    bound.extend(path_variables.iter().cloned());

    let mut safe = Vec::new();
    let mut need_fallback = Vec::new();
    for predicate in &query_graph.selections.predicates {
        let relevant = predicate.dependencies_met(&bound)
            && !predicate.dependencies.is_disjoint(&path_variables);
        if !relevant {
            continue;
        }
        if is_incrementally_safe(&predicate.expr, &path_variables) {
            safe.push(predicate.expr.clone());
        } else {
            log::debug!("predicate `{}` requires the full path", predicate.expr);
            need_fallback.push(predicate.expr.clone());
        }
    }
    ClassifiedPredicates {
        safe,
        need_fallback,
    }
}

/// Structural safety check. Only universal-or-none quantifications whose
/// inner condition never references a path variable are safe; every other
/// shape fails closed. Do not widen the safe set without an equivalent
/// correctness argument for incremental evaluation.
fn is_incrementally_safe(expr: &Expression, path_variables: &HashSet<String>) -> bool {
    match expr {
        Expression::AllIterable(IterablePredicate {
            scope:
                FilterScope {
                    inner: Some(inner), ..
                },
            ..
        })
        | Expression::NoneIterable(IterablePredicate {
            scope:
                FilterScope {
                    inner: Some(inner), ..
                },
            ..
        }) => inner.dependencies().is_disjoint(path_variables),
        _ => false,
    }
}

/// Dual-branch plan for a path with predicates that need full-path
/// materialization.
///
/// The fast branch still runs the traversal with every predicate attached as
/// best-effort pruning, wrapped in Optional so rows where it finds nothing
/// survive with a null path. The exhaustive branch enumerates paths between
/// the (already bound) endpoints, binds the path value, filters with the full
/// predicate list, ranks by length and keeps the minimum. AntiConditionalApply
/// keyed on the path name picks, per row, the fast result when present and
/// the exhaustive result otherwise.
fn build_fallback_plans(
    inner: Arc<LogicalPlan>,
    pattern: &ShortestPathPattern,
    predicates: Vec<Expression>,
    ctx: &mut PlanningContext,
) -> Result<Arc<LogicalPlan>, PlannerError> {
    ctx.notifications.log(PlannerNotification::ExhaustiveShortestPath {
        position: pattern.position,
    });

    let disallow_same_node = ctx.config.disallow_same_node;

    // Fast branch: per outer row, try the algorithm and keep the row either way.
    let lhs_argument = ctx.producer.plan_argument_from(&inner);
    let attempt = ctx.producer.plan_shortest_path(
        lhs_argument,
        pattern.clone(),
        predicates.clone(),
        true,
        disallow_same_node,
    );
    let optional_attempt = ctx.producer.plan_optional(attempt);
    let lhs = ctx.producer.plan_apply(inner.clone(), optional_attempt);

    let rhs_argument = ctx.producer.plan_argument_from(&lhs);
    let rhs = if ctx.config.forbid_exhaustive_fallback {
        // Planning may proceed; actually reaching this branch at runtime is
        // a policy violation.
        ctx.producer
            .plan_error(rhs_argument, RuntimeError::ExhaustiveShortestPathForbidden)
    } else {
        build_exhaustive_branch(rhs_argument, pattern, &predicates, ctx)?
    };

    // The combined plan answers the inner query extended with this pattern
    // and every relevant predicate, whichever branch runs.
    let solved = ctx
        .producer
        .solved_for(inner.id)
        .cloned()
        .unwrap_or_else(|| QueryGraph::with_arguments(inner.available_symbols()))
        .add_shortest_path(pattern)
        .add_predicates(predicates);

    let key = pattern
        .name
        .clone()
        .unwrap_or_else(|| pattern.rel.name.clone());
    Ok(ctx
        .producer
        .plan_anti_conditional_apply(lhs, rhs, key, Some(solved)))
}

/// Enumerate-filter-rank-limit branch. Endpoints are bound by the argument
/// rows, so the expansion runs in into-mode; anything else means an upstream
/// planning invariant was broken.
fn build_exhaustive_branch(
    source: Arc<LogicalPlan>,
    pattern: &ShortestPathPattern,
    predicates: &[Expression],
    ctx: &mut PlanningContext,
) -> Result<Arc<LogicalPlan>, PlannerError> {
    let expanded = expand::plan_var_expand(source, &pattern.rel, &mut ctx.producer).ok_or(
        PlannerError::UnresolvedEndpoints {
            rel: pattern.rel.name.clone(),
            position: pattern.position,
        },
    )?;

    let path_name = pattern
        .name
        .clone()
        .unwrap_or_else(|| pattern.rel.name.clone());

    let with_path = ctx.producer.plan_regular_projection(
        expanded,
        vec![ProjectionItem {
            expression: path_expression::path_expression_for(pattern),
            alias: path_name.clone(),
        }],
    );

    // With the full path bound, the original predicate list is evaluable.
    let filtered = ctx.producer.plan_selection(with_path, predicates.to_vec());

    let length_column = ctx.names.fresh_column(&filtered.available_symbols());
    let with_length = ctx.producer.plan_regular_projection(
        filtered,
        vec![ProjectionItem {
            expression: fn_call("length", vec![Expression::Variable(path_name)]),
            alias: length_column.clone(),
        }],
    );

    let sorted = ctx.producer.plan_sort(
        with_length,
        vec![SortItem {
            column: length_column,
            order: SortOrder::Asc,
        }],
    );

    let ties = if pattern.single {
        Ties::DoNotIncludeTies
    } else {
        Ties::IncludeTies
    };
    Ok(ctx.producer.plan_limit(sorted, 1, ties))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::combinators::{all_in, gt, int, lt, none_in, prop, var};
    use crate::ir::{Direction, InputPosition};
    use crate::plan_ctx::PlannerConfig;
    use crate::query_graph::{PatternLength, PatternRelationship};

    fn pattern(name: Option<&str>, single: bool) -> ShortestPathPattern {
        ShortestPathPattern {
            name: name.map(|n| n.to_string()),
            rel: PatternRelationship {
                name: "r".to_string(),
                nodes: ("a".to_string(), "b".to_string()),
                direction: Direction::Either,
                types: vec![],
                length: PatternLength::unbounded(),
            },
            single,
            position: InputPosition::NONE,
        }
    }

    fn inner_plan(ctx: &mut PlanningContext) -> Arc<LogicalPlan> {
        ctx.producer
            .plan_argument(HashSet::from(["a".to_string(), "b".to_string()]))
    }

    fn safe_predicate() -> Expression {
        all_in("x", fn_call("nodes", vec![var("p")]), gt(prop("x", "prop"), int(0)))
    }

    fn unsafe_predicate() -> Expression {
        gt(fn_call("length", vec![var("p")]), int(3))
    }

    #[test]
    fn test_classification_is_total_and_ordered() {
        let mut ctx = PlanningContext::default();
        let inner = inner_plan(&mut ctx);
        let pat = pattern(Some("p"), true);
        let qg = QueryGraph::new().add_predicates([
            unsafe_predicate(),
            safe_predicate(),
            lt(fn_call("length", vec![var("p")]), int(10)),
        ]);

        let classified = classify_predicates(&qg, &pat, &inner);
        assert_eq!(classified.safe, vec![safe_predicate()]);
        assert_eq!(
            classified.need_fallback,
            vec![
                unsafe_predicate(),
                lt(fn_call("length", vec![var("p")]), int(10))
            ]
        );
    }

    #[test]
    fn test_none_quantifier_is_safe() {
        let pat = pattern(Some("p"), true);
        let expr = none_in(
            "x",
            fn_call("nodes", vec![var("p")]),
            gt(prop("x", "prop"), int(0)),
        );
        assert!(is_incrementally_safe(&expr, &pat.path_variables()));
    }

    #[test]
    fn test_quantifier_referencing_path_is_unsafe() {
        // all(x IN nodes(p) WHERE x.prop > length(p)) touches p inside
        let pat = pattern(Some("p"), true);
        let expr = all_in(
            "x",
            fn_call("nodes", vec![var("p")]),
            gt(prop("x", "prop"), fn_call("length", vec![var("p")])),
        );
        assert!(!is_incrementally_safe(&expr, &pat.path_variables()));
    }

    #[test]
    fn test_quantifier_without_inner_predicate_is_unsafe() {
        let pat = pattern(Some("p"), true);
        let expr = Expression::AllIterable(IterablePredicate {
            scope: FilterScope {
                variable: "x".to_string(),
                inner: None,
            },
            list: Box::new(fn_call("nodes", vec![var("p")])),
        });
        assert!(!is_incrementally_safe(&expr, &pat.path_variables()));
    }

    #[test]
    fn test_endpoint_only_predicate_is_not_relevant() {
        let mut ctx = PlanningContext::default();
        let inner = inner_plan(&mut ctx);
        let pat = pattern(Some("p"), true);
        // depends on an endpoint but not on the path or relationship
        let qg = QueryGraph::new().add_predicates([gt(prop("a", "age"), int(18))]);

        let classified = classify_predicates(&qg, &pat, &inner);
        assert!(classified.safe.is_empty());
        assert!(classified.need_fallback.is_empty());
    }

    #[test]
    fn test_unsatisfied_dependencies_excluded() {
        let mut ctx = PlanningContext::default();
        let inner = inner_plan(&mut ctx);
        let pat = pattern(Some("p"), true);
        // `c` is bound by nothing
        let qg = QueryGraph::new()
            .add_predicates([gt(fn_call("length", vec![var("p")]), prop("c", "bound"))]);

        let classified = classify_predicates(&qg, &pat, &inner);
        assert!(classified.safe.is_empty());
        assert!(classified.need_fallback.is_empty());
    }

    #[test]
    fn test_no_predicates_plans_single_traversal() {
        let mut ctx = PlanningContext::default();
        let inner = inner_plan(&mut ctx);
        let plan =
            plan_shortest_paths(inner, &QueryGraph::new(), &pattern(Some("p"), true), &mut ctx)
                .unwrap();

        assert_eq!(plan.op_name(), "FindShortestPaths");
        assert!(plan.find_all("Optional").is_empty());
        assert!(plan.find_all("Apply").is_empty());
        assert!(ctx.notifications.is_empty());
    }

    #[test]
    fn test_anonymous_path_gets_generated_name() {
        let mut ctx = PlanningContext::default();
        let inner = inner_plan(&mut ctx);
        let plan =
            plan_shortest_paths(inner, &QueryGraph::new(), &pattern(None, true), &mut ctx)
                .unwrap();

        match &plan.op {
            crate::plan::PlanOp::FindShortestPaths { pattern, .. } => {
                let name = pattern.name.as_deref().unwrap();
                assert!(name.starts_with(' '));
            }
            other => panic!("Expected FindShortestPaths, got {other:?}"),
        }
    }

    #[test]
    fn test_fallback_emits_one_notification() {
        let mut ctx = PlanningContext::default();
        let inner = inner_plan(&mut ctx);
        let qg = QueryGraph::new().add_predicates([unsafe_predicate()]);
        plan_shortest_paths(inner, &qg, &pattern(Some("p"), true), &mut ctx).unwrap();

        assert_eq!(ctx.notifications.len(), 1);
    }

    #[test]
    fn test_fallback_available_symbols_include_path_and_rel() {
        let mut ctx = PlanningContext::default();
        let inner = inner_plan(&mut ctx);
        let qg = QueryGraph::new().add_predicates([unsafe_predicate()]);
        let plan = plan_shortest_paths(inner, &qg, &pattern(Some("p"), true), &mut ctx).unwrap();

        let symbols = plan.available_symbols();
        assert!(symbols.contains("p"));
        assert!(symbols.contains("r"));
    }

    #[test]
    fn test_forbidden_fallback_plans_error_branch() {
        let mut ctx = PlanningContext::new(PlannerConfig {
            forbid_exhaustive_fallback: true,
            ..PlannerConfig::default()
        });
        let inner = inner_plan(&mut ctx);
        let qg = QueryGraph::new().add_predicates([unsafe_predicate()]);
        let plan = plan_shortest_paths(inner, &qg, &pattern(Some("p"), true), &mut ctx).unwrap();

        assert_eq!(plan.find_all("ErrorPlan").len(), 1);
        assert!(plan.find_all("VarExpand").is_empty());
        // planning itself succeeded and still warned
        assert_eq!(ctx.notifications.len(), 1);
    }

    #[test]
    fn test_unresolved_endpoints_fail_planning() {
        let mut ctx = PlanningContext::default();
        // inner binds neither endpoint
        let inner = ctx.producer.plan_argument(HashSet::new());
        let qg = QueryGraph::new().add_predicates([unsafe_predicate()]);
        let result = plan_shortest_paths(inner, &qg, &pattern(Some("p"), true), &mut ctx);

        assert_eq!(
            result,
            Err(PlannerError::UnresolvedEndpoints {
                rel: "r".to_string(),
                position: InputPosition::NONE,
            })
        );
    }

    #[test]
    fn test_disallow_same_node_reaches_traversal_operator() {
        let mut ctx = PlanningContext::new(PlannerConfig {
            disallow_same_node: true,
            ..PlannerConfig::default()
        });
        let inner = inner_plan(&mut ctx);
        let plan =
            plan_shortest_paths(inner, &QueryGraph::new(), &pattern(Some("p"), true), &mut ctx)
                .unwrap();

        match &plan.op {
            crate::plan::PlanOp::FindShortestPaths {
                disallow_same_node, ..
            } => assert!(disallow_same_node),
            other => panic!("Expected FindShortestPaths, got {other:?}"),
        }
    }
}
