//! Planning errors.
//!
//! The core never recovers from these internally; every failure is
//! surfaced to the planner driver, which maps them to user-visible
//! SQL errors.

use thiserror::Error;

/// Errors that can occur in the logical plan core.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A precondition of a plan API was broken by the caller.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// An expression has a structural shape an analysis does not support.
    #[error("malformed expression: {0}")]
    MalformedExpression(String),

    /// A join predicate side could not be assigned to an input schema.
    #[error("malformed join predicate: {0}")]
    MalformedJoinPredicate(String),

    /// A rewrite encountered a node kind it does not know how to transform.
    #[error("unsupported plan: {0}")]
    UnsupportedPlan(String),
}

/// Result type for plan operations.
pub type PlanResult<T> = Result<T, PlanError>;
