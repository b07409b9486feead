//! Error types for shortest-path planning.
//!
//! These errors abort planning; they indicate an upstream invariant
//! violation rather than a user mistake.

use thiserror::Error;

use crate::ir::InputPosition;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlannerError {
    #[error("Endpoints of relationship `{rel}` ({position}) are not bound by the incoming plan; cannot build the exhaustive shortest path fallback")]
    UnresolvedEndpoints { rel: String, position: InputPosition },
}
