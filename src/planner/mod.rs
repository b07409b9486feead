//! Pattern-to-plan steps.
//!
//! Each step takes the plan built so far plus the planning context and
//! returns a new plan rooted above it. Only the shortest-path step lives in
//! this crate; the generic expansion step is the piece of ordinary pattern
//! planning it shares.

pub mod errors;
pub mod expand;
pub mod path_expression;
pub mod shortest_path;

pub use errors::PlannerError;
pub use shortest_path::plan_shortest_paths;
