//! Structural plan rewrites.
//!
//! These splice, replace, and substitute nodes while leaving every
//! untouched node's pid alone. Schema chaining across a rewritten edge is
//! the caller's responsibility when the spliced-out node changed row
//! shape.

use crate::error::{PlanError, PlanResult};
use crate::node::{Arity, LogicalNode, NodeType};
use crate::traverse::find_top_parent_node;

/// Splices a unary node out of the plan.
///
/// `target` must deep-equal a child of `parent` and must be unary; its
/// child takes its place under `parent`. For a binary parent the left
/// side is checked first. The detached node is returned, holding a copy
/// of its former input.
///
/// # Errors
///
/// [`PlanError::InvariantViolation`] when `target` is not unary, or when
/// `parent` and `target` are not actually related.
pub fn delete_node(parent: &mut LogicalNode, target: &LogicalNode) -> PlanResult<LogicalNode> {
    if target.arity() != Arity::Unary {
        return Err(PlanError::InvariantViolation(format!(
            "node to remove must be unary, got {}",
            target.node_type()
        )));
    }
    if parent.arity() == Arity::Leaf {
        return Err(PlanError::InvariantViolation(format!(
            "{} node cannot be a parent",
            parent.node_type()
        )));
    }

    let slot_index = parent
        .children()
        .iter()
        .position(|child| *child == target)
        .ok_or_else(|| {
            PlanError::InvariantViolation(
                "the two nodes must be parent and child".to_string(),
            )
        })?;

    let mut slots = parent.child_slots_mut();
    let slot = slots.swap_remove(slot_index);

    // Detach the child, leave a copy of the grandchild in its place, and
    // splice the real grandchild into the parent's slot.
    let mut removed = std::mem::replace(&mut **slot, LogicalNode::detached());
    // Safe: deep-equal to a unary node, so the removed node is unary too
    let grand_copy = removed.input().expect("unary node has an input").clone();
    let grand = std::mem::replace(
        removed.input_slot_mut().expect("unary node has an input slot"),
        Box::new(grand_copy),
    );
    **slot = *grand;

    Ok(removed)
}

/// Replaces every subtree deep-equal to `old` below `start` with a copy
/// of `new`.
///
/// Child slots are visited in post-order, and a freshly substituted
/// subtree is not descended into, so a `new` containing `old` cannot
/// recurse forever. `start` itself is never replaced — only edges below
/// it are re-pointed. Returns the number of replacements.
pub fn replace_node(start: &mut LogicalNode, old: &LogicalNode, new: &LogicalNode) -> usize {
    let mut count = 0;
    replace_below(start, old, new, &mut count);
    count
}

fn replace_below(node: &mut LogicalNode, old: &LogicalNode, new: &LogicalNode, count: &mut usize) {
    for slot in node.child_slots_mut() {
        replace_below(slot, old, new, count);
        if **slot == *old {
            **slot = new.clone();
            *count += 1;
        }
    }
}

/// Substitutes `new_node` for the child of the first parent (post-order)
/// of the given type.
///
/// The matched parent must be unary and `new_node` must not be binary.
/// The old child is excised; when it was itself unary, its child moves
/// under `new_node`, which then takes the old child's position with the
/// grandchild beneath.
///
/// # Errors
///
/// [`PlanError::InvariantViolation`] when no parent of `ty` exists, the
/// parent is not unary, `new_node` is binary, or the grandchild graft
/// needs a unary `new_node` and it is not.
pub fn replace_child_of_kind(
    root: &mut LogicalNode,
    new_node: LogicalNode,
    ty: NodeType,
) -> PlanResult<()> {
    if new_node.arity() == Arity::Binary {
        return Err(PlanError::InvariantViolation(
            "replacement node must not be binary".to_string(),
        ));
    }
    let Some(parent) = find_top_parent_node(root, ty) else {
        return Err(PlanError::InvariantViolation(format!("no parent of a {ty} node found")));
    };
    if parent.arity() != Arity::Unary {
        return Err(PlanError::InvariantViolation(format!(
            "parent of the {ty} node must be unary, got {}",
            parent.node_type()
        )));
    }
    let old_child_unary = parent.input().map(|c| c.arity() == Arity::Unary).unwrap_or(false);
    if old_child_unary && new_node.arity() != Arity::Unary {
        return Err(PlanError::InvariantViolation(
            "replacement for a unary child must itself be unary".to_string(),
        ));
    }
    let parent_pid = parent.pid;

    substitute(root, parent_pid, new_node, old_child_unary);
    Ok(())
}

fn substitute(node: &mut LogicalNode, parent_pid: i32, new_node: LogicalNode, graft: bool) {
    if node.pid == parent_pid {
        // Safe: the caller verified the parent is unary
        let slot = node.input_slot_mut().expect("matched parent is unary");
        let mut old_child = std::mem::replace(slot, Box::new(new_node));
        if graft {
            let grand = std::mem::replace(
                old_child.input_slot_mut().expect("old child is unary"),
                Box::new(LogicalNode::detached()),
            );
            let new_slot = slot.input_slot_mut().expect("replacement is unary");
            *new_slot = grand;
        }
        return;
    }
    // pid uniqueness: at most one subtree holds the parent
    let index = node.children().iter().position(|c| contains_pid(c, parent_pid));
    if let Some(index) = index {
        let mut slots = node.child_slots_mut();
        substitute(slots.swap_remove(index), parent_pid, new_node, graft);
    }
}

fn contains_pid(node: &LogicalNode, pid: i32) -> bool {
    let mut found = false;
    node.post_order(&mut |n| {
        if n.pid == pid {
            found = true;
        }
    });
    found
}
