//! Plan validation.
//!
//! Structural checks a finished plan must pass before it is handed to the
//! executor: schema chaining along every edge, pid uniqueness, and
//! qualified-name uniqueness inside each schema.

use std::collections::HashSet;

use crate::error::{PlanError, PlanResult};
use crate::node::{Arity, LogicalNode};

/// Validates a plan tree.
///
/// Checks, for every node:
/// - pids are unique across the tree;
/// - a unary node's input schema equals its child's output schema;
/// - a binary node's input schema is the concatenation of its children's
///   output schemas, left then right;
/// - no schema declares the same qualified name twice.
///
/// # Errors
///
/// [`PlanError::InvariantViolation`] naming the offending node.
pub fn validate_plan(root: &LogicalNode) -> PlanResult<()> {
    let mut seen_pids = HashSet::new();
    validate_node(root, &mut seen_pids)
}

fn validate_node(node: &LogicalNode, seen_pids: &mut HashSet<i32>) -> PlanResult<()> {
    for child in node.children() {
        validate_node(child, seen_pids)?;
    }

    if !seen_pids.insert(node.pid) {
        return Err(PlanError::InvariantViolation(format!(
            "duplicate pid {} at {}",
            node.pid,
            node.plan_string()
        )));
    }

    check_unique_names(node)?;

    match node.arity() {
        Arity::Leaf => {}
        Arity::Unary => {
            // Safe: unary nodes always have an input
            let child = node.input().expect("unary node has an input");
            if child.out_schema != node.in_schema {
                return Err(PlanError::InvariantViolation(format!(
                    "schema chaining broken at {}: input {} vs child output {}",
                    node.plan_string(),
                    node.in_schema,
                    child.out_schema
                )));
            }
        }
        Arity::Binary => {
            // Safe: binary nodes always have both children
            let left = node.left().expect("binary node has a left child");
            let right = node.right().expect("binary node has a right child");
            let expected = left.out_schema.merge(&right.out_schema);
            if expected != node.in_schema {
                return Err(PlanError::InvariantViolation(format!(
                    "schema chaining broken at {}: input {} vs concatenated children {}",
                    node.plan_string(),
                    node.in_schema,
                    expected
                )));
            }
        }
    }

    Ok(())
}

fn check_unique_names(node: &LogicalNode) -> PlanResult<()> {
    for schema in [&node.in_schema, &node.out_schema] {
        let mut names = HashSet::new();
        for column in schema {
            if !names.insert(column.qualified_name()) {
                return Err(PlanError::InvariantViolation(format!(
                    "duplicate column {} in a schema of {}",
                    column.qualified_name(),
                    node.plan_string()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::EvalNode;
    use crate::node::PidFactory;
    use crate::relational::{FilterNode, JoinNode, ScanNode};
    use crate::types::{Column, DataType, Schema};

    fn schema() -> Schema {
        Schema::new(vec![Column::new("x", DataType::Integer)])
    }

    fn scan(pids: &mut PidFactory, name: &str) -> LogicalNode {
        LogicalNode::scan(pids, ScanNode::new(name), &schema())
    }

    #[test]
    fn well_formed_plan_passes() {
        let mut pids = PidFactory::new();
        let right = scan(&mut pids, "b");
        let plan = scan(&mut pids, "a")
            .join(&mut pids, JoinNode::cross(), right)
            .filter(&mut pids, FilterNode::new(EvalNode::boolean(true)))
            .limit(&mut pids, 3);
        let root = LogicalNode::root(&mut pids, plan);

        validate_plan(&root).unwrap();
    }

    #[test]
    fn broken_chaining_is_rejected() {
        let mut pids = PidFactory::new();
        let mut plan = scan(&mut pids, "a").limit(&mut pids, 3);

        // repoint the limit at a scan with a different schema
        let other = LogicalNode::scan(
            &mut pids,
            ScanNode::new("b"),
            &Schema::new(vec![Column::new("y", DataType::Text)]),
        );
        plan.set_input(other).unwrap();

        assert!(validate_plan(&plan).is_err());
    }

    #[test]
    fn duplicate_pid_is_rejected() {
        let mut pids = PidFactory::new();
        let child = scan(&mut pids, "a");
        let child_pid = child.pid;
        let mut plan = child.limit(&mut pids, 3);

        plan.pid = child_pid;
        assert!(validate_plan(&plan).is_err());
    }

    #[test]
    fn duplicate_qualified_names_are_rejected() {
        let mut pids = PidFactory::new();
        // self-join without aliasing: both sides expose a.x
        let right = scan(&mut pids, "a");
        let plan = scan(&mut pids, "a").join(&mut pids, JoinNode::cross(), right);
        assert!(validate_plan(&plan).is_err());
    }
}
