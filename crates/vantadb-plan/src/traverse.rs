//! Plan traversal and search.
//!
//! Traversal orders are contractual: post-order visits children left to
//! right and then the node, pre-order visits the node first. Analyses and
//! rewrites rely on these orders, and tests may too.
//!
//! Visitors are plain closures. Where a rewrite needs the path to the
//! current node, [`LogicalNode::post_order_with_ancestors`] supplies the
//! ancestor stack explicitly instead of parent pointers on nodes.

use std::collections::BTreeSet;

use crate::node::{LogicalNode, NodeType};

impl LogicalNode {
    /// Visits children left to right, then this node.
    pub fn post_order<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a LogicalNode),
    {
        for child in self.children() {
            child.post_order(f);
        }
        f(self);
    }

    /// Visits this node, then children left to right.
    pub fn pre_order<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a LogicalNode),
    {
        f(self);
        for child in self.children() {
            child.pre_order(f);
        }
    }

    /// Post-order visit where the closure also receives the ancestor
    /// stack, root first. The node itself is not on the stack.
    pub fn post_order_with_ancestors<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a LogicalNode, &[&'a LogicalNode]),
    {
        fn walk<'a, F>(node: &'a LogicalNode, stack: &mut Vec<&'a LogicalNode>, f: &mut F)
        where
            F: FnMut(&'a LogicalNode, &[&'a LogicalNode]),
        {
            stack.push(node);
            for child in node.children() {
                walk(child, stack, f);
            }
            stack.pop();
            f(node, stack);
        }
        walk(self, &mut Vec::new(), f);
    }

    /// Post-order visit scoped to one query block.
    ///
    /// Descent stops at a table subquery: its child block is not entered,
    /// but the subquery node itself is still visited.
    pub fn post_order_within_block<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a LogicalNode),
    {
        if self.node_type() != NodeType::TableSubquery {
            for child in self.children() {
                child.post_order_within_block(f);
            }
        }
        f(self);
    }
}

/// Finds the first node of the given type in post-order.
///
/// Post-order means the match is the deepest-leftmost one, not the
/// shallowest; the name is historical. Callers wanting the match closest
/// to the root walk pre-order instead.
#[must_use]
pub fn find_top_node<'a>(root: &'a LogicalNode, ty: NodeType) -> Option<&'a LogicalNode> {
    let mut found = None;
    root.post_order(&mut |node| {
        if found.is_none() && node.node_type() == ty {
            found = Some(node);
        }
    });
    found
}

/// Finds every node of the given type, in post-order.
#[must_use]
pub fn find_all_nodes<'a>(root: &'a LogicalNode, ty: NodeType) -> Vec<&'a LogicalNode> {
    let mut found = Vec::new();
    root.post_order(&mut |node| {
        if node.node_type() == ty {
            found.push(node);
        }
    });
    found
}

/// Finds the first node (post-order) with a child of the given type.
///
/// A binary node matches when either child has the type.
#[must_use]
pub fn find_top_parent_node<'a>(root: &'a LogicalNode, ty: NodeType) -> Option<&'a LogicalNode> {
    let mut found = None;
    root.post_order(&mut |node| {
        if found.is_none() && node.children().iter().any(|c| c.node_type() == ty) {
            found = Some(node);
        }
    });
    found
}

/// Canonical names of all scanned relations reachable from `root`, in
/// post-order. Nested query blocks are entered.
#[must_use]
pub fn relation_lineage(root: &LogicalNode) -> Vec<String> {
    let mut names = Vec::new();
    root.post_order(&mut |node| {
        if matches!(node.node_type(), NodeType::Scan | NodeType::PartitionedScan) {
            if let Some(name) = node.canonical_name() {
                names.push(name);
            }
        }
    });
    names
}

/// Canonical names of the relations visible in `root`'s query block.
///
/// Table subqueries count as relations of the enclosing block; their
/// inner blocks are not entered.
#[must_use]
pub fn relation_lineage_within_block(root: &LogicalNode) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    root.post_order_within_block(&mut |node| {
        if let Some(name) = node.canonical_name() {
            names.insert(name);
        }
    });
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PidFactory;
    use crate::relational::{JoinNode, ScanNode, TableSubqueryNode};
    use crate::types::{Column, DataType, Schema};

    fn schema() -> Schema {
        Schema::new(vec![Column::new("x", DataType::Integer)])
    }

    fn scan(pids: &mut PidFactory, name: &str) -> LogicalNode {
        LogicalNode::scan(pids, ScanNode::new(name), &schema())
    }

    /// Join(Scan(a), TableSubquery(s, Scan(b)))
    fn join_with_subquery(pids: &mut PidFactory) -> LogicalNode {
        let inner = scan(pids, "b");
        let sub = LogicalNode::table_subquery(pids, TableSubqueryNode::new("s"), inner);
        scan(pids, "a").join(pids, JoinNode::cross(), sub)
    }

    #[test]
    fn post_order_is_children_first() {
        let mut pids = PidFactory::new();
        let plan = join_with_subquery(&mut pids);

        let mut order = Vec::new();
        plan.post_order(&mut |n| order.push(n.node_type()));
        assert_eq!(
            order,
            vec![NodeType::Scan, NodeType::Scan, NodeType::TableSubquery, NodeType::Join]
        );

        let mut pre = Vec::new();
        plan.pre_order(&mut |n| pre.push(n.node_type()));
        assert_eq!(
            pre,
            vec![NodeType::Join, NodeType::Scan, NodeType::TableSubquery, NodeType::Scan]
        );
    }

    #[test]
    fn post_order_is_deterministic() {
        let mut pids = PidFactory::new();
        let plan = join_with_subquery(&mut pids);

        let mut first = Vec::new();
        plan.post_order(&mut |n| first.push(n.pid));
        let mut second = Vec::new();
        plan.post_order(&mut |n| second.push(n.pid));
        assert_eq!(first, second);
    }

    #[test]
    fn ancestor_stack_tracks_parents() {
        let mut pids = PidFactory::new();
        let plan = scan(&mut pids, "t").limit(&mut pids, 1);
        let root_pid = plan.pid;

        plan.post_order_with_ancestors(&mut |node, stack| match node.node_type() {
            NodeType::Scan => {
                assert_eq!(stack.len(), 1);
                assert_eq!(stack[0].pid, root_pid);
            }
            NodeType::Limit => assert!(stack.is_empty()),
            _ => unreachable!(),
        });
    }

    #[test]
    fn find_top_node_returns_deepest_leftmost() {
        let mut pids = PidFactory::new();
        let plan = join_with_subquery(&mut pids);

        // first scan in post-order is the left one ("a")
        let found = find_top_node(&plan, NodeType::Scan).unwrap();
        assert_eq!(found.canonical_name().as_deref(), Some("a"));
        assert!(find_top_node(&plan, NodeType::Sort).is_none());
    }

    #[test]
    fn find_all_nodes_in_post_order() {
        let mut pids = PidFactory::new();
        let plan = join_with_subquery(&mut pids);

        let scans = find_all_nodes(&plan, NodeType::Scan);
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0].canonical_name().as_deref(), Some("a"));
        assert_eq!(scans[1].canonical_name().as_deref(), Some("b"));
    }

    #[test]
    fn find_top_parent_matches_either_side() {
        let mut pids = PidFactory::new();
        let plan = join_with_subquery(&mut pids);

        // the subquery's parent is the join (right side match)
        let parent = find_top_parent_node(&plan, NodeType::TableSubquery).unwrap();
        assert_eq!(parent.node_type(), NodeType::Join);

        let scan_parent = find_top_parent_node(&plan, NodeType::Scan).unwrap();
        assert_eq!(scan_parent.node_type(), NodeType::TableSubquery);
    }

    #[test]
    fn lineage_crosses_blocks_but_scoped_lineage_stops() {
        let mut pids = PidFactory::new();
        let plan = join_with_subquery(&mut pids);

        assert_eq!(relation_lineage(&plan), vec!["a".to_string(), "b".to_string()]);

        let scoped = relation_lineage_within_block(&plan);
        let expected: BTreeSet<String> = ["a".to_string(), "s".to_string()].into_iter().collect();
        assert_eq!(scoped, expected);
    }
}
