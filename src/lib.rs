//! graphplan - logical planning for openCypher shortest-path queries
//!
//! Given a shortest-path pattern whose endpoints are already planned, this
//! crate decides between a single specialized traversal operator and a
//! dual-branch plan with an exhaustive fallback, based on a structural
//! classification of the predicates attached to the path:
//! - Predicate classification: safe-for-traversal vs. needs-full-path
//! - Logical plan operators and solved-query bookkeeping
//! - Performance notifications when exhaustive evaluation is planned
//!
//! Parsing, optimization and execution live in the surrounding system; the
//! interface here is purely structural.

pub mod ir;
pub mod notification;
pub mod plan;
pub mod plan_ctx;
pub mod planner;
pub mod query_graph;
pub mod utils;

pub use plan::producer::PlanProducer;
pub use plan::{LogicalPlan, PlanId, PlanOp};
pub use plan_ctx::{PlannerConfig, PlanningContext};
pub use planner::{plan_shortest_paths, PlannerError};
pub use query_graph::{QueryGraph, ShortestPathPattern};
