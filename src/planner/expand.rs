//! Generic variable-length expansion step.
//!
//! Shared with ordinary pattern planning: given a relationship pattern and
//! the plan built so far, emit a `VarExpand` in whichever mode the bound
//! endpoints allow. Returns `None` when neither endpoint is bound, which the
//! caller treats as an upstream planning invariant violation.

use std::sync::Arc;

use crate::plan::producer::PlanProducer;
use crate::plan::{ExpansionMode, LogicalPlan};
use crate::query_graph::PatternRelationship;

/// Plan the expansion of `rel` over `source`. Mode selection:
/// both endpoints bound -> into, one bound -> all (from the bound side),
/// none bound -> `None`.
pub fn plan_var_expand(
    source: Arc<LogicalPlan>,
    rel: &PatternRelationship,
    producer: &mut PlanProducer,
) -> Option<Arc<LogicalPlan>> {
    let available = source.available_symbols();
    let left_bound = available.contains(rel.left());
    let right_bound = available.contains(rel.right());

    let (from, to, mode) = match (left_bound, right_bound) {
        (true, true) => (rel.left(), rel.right(), ExpansionMode::ExpandInto),
        (true, false) => (rel.left(), rel.right(), ExpansionMode::ExpandAll),
        (false, true) => (rel.right(), rel.left(), ExpansionMode::ExpandAll),
        (false, false) => return None,
    };
    log::debug!(
        "expanding `{}` {} -> {} ({:?})",
        rel.name,
        from,
        to,
        mode
    );

    Some(producer.plan_var_expand(source, from.to_string(), to.to_string(), rel, mode))
}
