//! Plan node factory and solved-query bookkeeping.
//!
//! Every operator the planner emits goes through [`PlanProducer`], which
//! assigns the node its [`PlanId`] and records which [`QueryGraph`] the
//! subtree solves. Downstream explain/verification reads that registry to
//! check a plan claims to answer exactly what was asked.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::ir::Expression;
use crate::query_graph::{PatternRelationship, QueryGraph, ShortestPathPattern};

use super::{
    ExpansionMode, LogicalPlan, PlanId, PlanOp, ProjectionItem, RuntimeError, SortItem, Ties,
};

/// Solved-query metadata, keyed by plan identity.
#[derive(Debug, Default)]
pub struct SolvedQueries {
    map: HashMap<PlanId, QueryGraph>,
}

impl SolvedQueries {
    pub fn get(&self, id: PlanId) -> Option<&QueryGraph> {
        self.map.get(&id)
    }

    fn set(&mut self, id: PlanId, solved: QueryGraph) {
        self.map.insert(id, solved);
    }
}

#[derive(Debug, Default)]
pub struct PlanProducer {
    next_id: u32,
    solveds: SolvedQueries,
}

impl PlanProducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solved-query metadata recorded for a plan, if the plan was built by
    /// this producer.
    pub fn solved_for(&self, id: PlanId) -> Option<&QueryGraph> {
        self.solveds.get(id)
    }

    /// Solved query of a child plan. A plan handed in from outside this
    /// producer solves the binding of its own symbols and nothing more.
    fn solved_of(&self, plan: &LogicalPlan) -> QueryGraph {
        self.solveds
            .get(plan.id)
            .cloned()
            .unwrap_or_else(|| QueryGraph::with_arguments(plan.available_symbols()))
    }

    fn attach(&mut self, op: PlanOp, solved: QueryGraph) -> Arc<LogicalPlan> {
        let id = PlanId(self.next_id);
        self.next_id += 1;
        self.solveds.set(id, solved);
        Arc::new(LogicalPlan { id, op })
    }

    /// Leaf plan exposing the given symbols as arguments from an outer row.
    pub fn plan_argument(&mut self, symbols: HashSet<String>) -> Arc<LogicalPlan> {
        let solved = QueryGraph::with_arguments(symbols.clone());
        self.attach(PlanOp::Argument { symbols }, solved)
    }

    /// Argument leaf re-exposing everything `plan` makes available.
    pub fn plan_argument_from(&mut self, plan: &LogicalPlan) -> Arc<LogicalPlan> {
        self.plan_argument(plan.available_symbols())
    }

    pub fn plan_shortest_path(
        &mut self,
        source: Arc<LogicalPlan>,
        pattern: ShortestPathPattern,
        predicates: Vec<Expression>,
        with_fallback: bool,
        disallow_same_node: bool,
    ) -> Arc<LogicalPlan> {
        let solved = self
            .solved_of(&source)
            .add_shortest_path(&pattern)
            .add_predicates(predicates.iter().cloned());
        self.attach(
            PlanOp::FindShortestPaths {
                source,
                pattern,
                predicates,
                with_fallback,
                disallow_same_node,
            },
            solved,
        )
    }

    pub fn plan_optional(&mut self, source: Arc<LogicalPlan>) -> Arc<LogicalPlan> {
        let solved = self.solved_of(&source);
        self.attach(PlanOp::Optional { source }, solved)
    }

    pub fn plan_apply(
        &mut self,
        lhs: Arc<LogicalPlan>,
        rhs: Arc<LogicalPlan>,
    ) -> Arc<LogicalPlan> {
        let solved = self.solved_of(&lhs).merge(&self.solved_of(&rhs));
        self.attach(PlanOp::Apply { lhs, rhs }, solved)
    }

    /// Combinator keyed on `key`. `solved` overrides the default (union of
    /// the branches) when the caller knows what the combined plan answers —
    /// the shortest-path fallback does, since both branches answer the same
    /// sub-query.
    pub fn plan_anti_conditional_apply(
        &mut self,
        lhs: Arc<LogicalPlan>,
        rhs: Arc<LogicalPlan>,
        key: String,
        solved: Option<QueryGraph>,
    ) -> Arc<LogicalPlan> {
        let solved = solved.unwrap_or_else(|| self.solved_of(&lhs).merge(&self.solved_of(&rhs)));
        self.attach(PlanOp::AntiConditionalApply { lhs, rhs, key }, solved)
    }

    pub fn plan_var_expand(
        &mut self,
        source: Arc<LogicalPlan>,
        from: String,
        to: String,
        rel: &PatternRelationship,
        mode: ExpansionMode,
    ) -> Arc<LogicalPlan> {
        // Direction is expressed relative to `from`; expanding from the
        // pattern's right endpoint reverses it.
        let direction = if from == rel.left() {
            rel.direction
        } else {
            rel.direction.reverse()
        };
        let solved = self.solved_of(&source);
        self.attach(
            PlanOp::VarExpand {
                source,
                from,
                to,
                direction,
                types: rel.types.clone(),
                length: rel.length.clone(),
                rel_name: rel.name.clone(),
                mode,
            },
            solved,
        )
    }

    pub fn plan_regular_projection(
        &mut self,
        source: Arc<LogicalPlan>,
        items: Vec<ProjectionItem>,
    ) -> Arc<LogicalPlan> {
        let solved = self.solved_of(&source);
        self.attach(PlanOp::Projection { source, items }, solved)
    }

    pub fn plan_selection(
        &mut self,
        source: Arc<LogicalPlan>,
        predicates: Vec<Expression>,
    ) -> Arc<LogicalPlan> {
        let solved = self.solved_of(&source).add_predicates(predicates.iter().cloned());
        self.attach(PlanOp::Selection { source, predicates }, solved)
    }

    pub fn plan_sort(
        &mut self,
        source: Arc<LogicalPlan>,
        items: Vec<SortItem>,
    ) -> Arc<LogicalPlan> {
        let solved = self.solved_of(&source);
        self.attach(PlanOp::Sort { source, items }, solved)
    }

    pub fn plan_limit(
        &mut self,
        source: Arc<LogicalPlan>,
        count: u64,
        ties: Ties,
    ) -> Arc<LogicalPlan> {
        let solved = self.solved_of(&source);
        self.attach(PlanOp::Limit { source, count, ties }, solved)
    }

    /// A plan that is valid to construct but raises `error` when executed.
    pub fn plan_error(
        &mut self,
        source: Arc<LogicalPlan>,
        error: RuntimeError,
    ) -> Arc<LogicalPlan> {
        let solved = self.solved_of(&source);
        self.attach(PlanOp::ErrorPlan { source, error }, solved)
    }
}
