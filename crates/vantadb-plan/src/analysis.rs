//! Planner analyses.
//!
//! Predicate placement (`can_be_evaluated`), join-key extraction from an
//! equi-join predicate, sort keys and comparators derived from those
//! keys, and small plan classifications.

use std::collections::BTreeSet;

use crate::datum::TupleComparator;
use crate::error::{PlanError, PlanResult};
use crate::expr::EvalNode;
use crate::node::{LogicalNode, NodeKind, NodeType};
use crate::relational::JoinType;
use crate::traverse::relation_lineage;
use crate::types::{Column, Schema, SortSpec};

/// Decides whether `expr` may be evaluated at `node`'s position.
///
/// - At a join, the expression must reference exactly two distinct
///   qualifiers, one covered by each side's relation lineage (either
///   assignment of the two is accepted).
/// - At a scan, every reference must carry the scan's canonical name as
///   its qualifier and resolve in the scan's input schema by local name.
/// - At a table subquery, the same check runs against the subquery's
///   output schema.
/// - Anywhere else, every qualified name must be present in the node's
///   input schema.
#[must_use]
pub fn can_be_evaluated(expr: &EvalNode, node: &LogicalNode) -> bool {
    let columns = expr.distinct_columns();

    match &node.kind {
        NodeKind::Join { left, right, .. } => {
            let mut qualifiers: Vec<String> = Vec::new();
            for col in &columns {
                let q = col.qualifier.clone().unwrap_or_default();
                if !qualifiers.contains(&q) {
                    qualifiers.push(q);
                }
            }
            if qualifiers.len() != 2 {
                return false;
            }

            let outer: BTreeSet<String> = relation_lineage(left).into_iter().collect();
            let inner: BTreeSet<String> = relation_lineage(right).into_iter().collect();

            (outer.contains(&qualifiers[0]) && inner.contains(&qualifiers[1]))
                || (inner.contains(&qualifiers[0]) && outer.contains(&qualifiers[1]))
        }

        NodeKind::Scan(_) | NodeKind::PartitionedScan(_) => {
            // Safe: both kinds are relations
            let canonical = node.canonical_name().expect("scan is a relation");
            columns.iter().all(|col| {
                col.qualifier.as_deref() == Some(canonical.as_str())
                    && node.in_schema.column_by_name(&col.name).is_some()
            })
        }

        NodeKind::TableSubquery { node: sub, .. } => {
            let canonical = sub.canonical_name();
            columns.iter().all(|col| {
                col.qualifier.as_deref() == Some(canonical.as_str())
                    && node.out_schema.column_by_name(&col.name).is_some()
            })
        }

        _ => columns.iter().all(|col| node.in_schema.contains_qualified(&col.qualified_name())),
    }
}

/// Extracts the join key pairs from an equi-join predicate.
///
/// The predicate is walked in pre-order; every subexpression recognized
/// as a join qual contributes one pair. Each side's single column is
/// assigned to whichever schema contains its qualified name, so the pair
/// order is always `(left-schema column, right-schema column)` no matter
/// how the predicate was written.
///
/// # Errors
///
/// [`PlanError::MalformedJoinPredicate`] when a key column belongs to
/// neither schema.
pub fn join_key_pairs(
    qual: &EvalNode,
    left_schema: &Schema,
    right_schema: &Schema,
) -> PlanResult<Vec<(Column, Column)>> {
    let mut pairs = Vec::new();
    collect_pairs(qual, left_schema, right_schema, &mut pairs)?;
    Ok(pairs)
}

fn collect_pairs(
    expr: &EvalNode,
    left_schema: &Schema,
    right_schema: &Schema,
    pairs: &mut Vec<(Column, Column)>,
) -> PlanResult<()> {
    if expr.is_join_qual() {
        let mut left_key: Option<Column> = None;
        let mut right_key: Option<Column> = None;

        for side in expr.children() {
            // Safe: a join qual has exactly one column ref per side
            let column = side.column_refs().into_iter().next().expect("join qual side column");
            if left_schema.contains_qualified(&column.qualified_name()) {
                left_key = Some(column);
            } else if right_schema.contains_qualified(&column.qualified_name()) {
                right_key = Some(column);
            }
        }

        match (left_key, right_key) {
            (Some(l), Some(r)) => pairs.push((l, r)),
            _ => {
                return Err(PlanError::MalformedJoinPredicate(format!(
                    "join key of {expr} matches neither input schema"
                )))
            }
        }
    }
    for child in expr.children() {
        collect_pairs(child, left_schema, right_schema, pairs)?;
    }
    Ok(())
}

/// Derives ascending, nulls-last sort specs for both join sides from an
/// equi-join predicate, in join-key order.
///
/// # Errors
///
/// Propagates [`PlanError::MalformedJoinPredicate`] from key extraction.
pub fn sort_keys_from_join_qual(
    qual: &EvalNode,
    left_schema: &Schema,
    right_schema: &Schema,
) -> PlanResult<(Vec<SortSpec>, Vec<SortSpec>)> {
    let pairs = join_key_pairs(qual, left_schema, right_schema)?;
    let left = pairs.iter().map(|(l, _)| SortSpec::new(l.clone())).collect();
    let right = pairs.iter().map(|(_, r)| SortSpec::new(r.clone())).collect();
    Ok((left, right))
}

/// Builds one tuple comparator per join side from an equi-join predicate.
///
/// # Errors
///
/// Propagates key-extraction failures, and
/// [`PlanError::InvariantViolation`] when a derived key is missing from
/// its schema.
pub fn comparators_from_join_qual(
    qual: &EvalNode,
    left_schema: &Schema,
    right_schema: &Schema,
) -> PlanResult<(TupleComparator, TupleComparator)> {
    let (left_specs, right_specs) = sort_keys_from_join_qual(qual, left_schema, right_schema)?;
    Ok((
        TupleComparator::new(left_schema, &left_specs)?,
        TupleComparator::new(right_schema, &right_specs)?,
    ))
}

/// Returns true when the join type allows swapping its inputs.
#[must_use]
pub fn is_commutative_join(join_type: JoinType) -> bool {
    join_type == JoinType::Inner
}

/// Returns true when the plan is a data-definition statement, looking
/// through a root node.
#[must_use]
pub fn is_ddl_plan(node: &LogicalNode) -> bool {
    let base = match &node.kind {
        NodeKind::Root { input } => input,
        _ => node,
    };
    matches!(
        base.node_type(),
        NodeType::CreateTable
            | NodeType::DropTable
            | NodeType::CreateDatabase
            | NodeType::DropDatabase
            | NodeType::CreateIndex
            | NodeType::DropIndex
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddl::CreateTableNode;
    use crate::node::PidFactory;
    use crate::relational::{JoinNode, ScanNode, TableSubqueryNode};
    use crate::types::DataType;

    fn col(qualifier: &str, name: &str) -> Column {
        Column::new(name, DataType::Integer).with_qualifier(qualifier)
    }

    fn field(qualifier: &str, name: &str) -> EvalNode {
        EvalNode::field(col(qualifier, name))
    }

    fn table_schema(names: &[&str]) -> Schema {
        names.iter().map(|n| Column::new(*n, DataType::Integer)).collect()
    }

    fn scan(pids: &mut PidFactory, name: &str, columns: &[&str]) -> LogicalNode {
        LogicalNode::scan(pids, ScanNode::new(name), &table_schema(columns))
    }

    #[test]
    fn join_predicate_over_both_sides_is_pushable() {
        let mut pids = PidFactory::new();
        let right = scan(&mut pids, "b", &["y"]);
        let join = scan(&mut pids, "a", &["x", "z"]).join(&mut pids, JoinNode::cross(), right);

        let pushable = field("a", "x").eq(field("b", "y"));
        assert!(can_be_evaluated(&pushable, &join));

        // only one qualifier referenced
        let single_sided = field("a", "x").eq(field("a", "z"));
        assert!(!can_be_evaluated(&single_sided, &join));

        // unknown relation
        let foreign = field("a", "x").eq(field("c", "y"));
        assert!(!can_be_evaluated(&foreign, &join));
    }

    #[test]
    fn join_predicate_accepts_reversed_assignment() {
        let mut pids = PidFactory::new();
        let right = scan(&mut pids, "b", &["y"]);
        let join = scan(&mut pids, "a", &["x"]).join(&mut pids, JoinNode::cross(), right);

        let reversed = field("b", "y").eq(field("a", "x"));
        assert!(can_be_evaluated(&reversed, &join));
    }

    #[test]
    fn scan_requires_matching_qualifier_and_column() {
        let mut pids = PidFactory::new();
        let scan_node = scan(&mut pids, "a", &["x"]);

        assert!(can_be_evaluated(&field("a", "x").gt(EvalNode::integer(1)), &scan_node));
        assert!(!can_be_evaluated(&field("b", "x").gt(EvalNode::integer(1)), &scan_node));
        assert!(!can_be_evaluated(&field("a", "missing").gt(EvalNode::integer(1)), &scan_node));
    }

    #[test]
    fn subquery_checks_its_output_schema() {
        let mut pids = PidFactory::new();
        let inner = scan(&mut pids, "b", &["y"]);
        let sub = LogicalNode::table_subquery(&mut pids, TableSubqueryNode::new("s"), inner);

        assert!(can_be_evaluated(&field("s", "y").gt(EvalNode::integer(1)), &sub));
        assert!(!can_be_evaluated(&field("b", "y").gt(EvalNode::integer(1)), &sub));
    }

    #[test]
    fn default_case_uses_qualified_names() {
        let mut pids = PidFactory::new();
        let plan = scan(&mut pids, "a", &["x"]).limit(&mut pids, 1);

        assert!(can_be_evaluated(&field("a", "x").gt(EvalNode::integer(1)), &plan));
        assert!(!can_be_evaluated(&field("b", "x").gt(EvalNode::integer(1)), &plan));
    }

    #[test]
    fn key_pairs_ignore_range_predicates_and_source_order() {
        let left_schema = Schema::new(vec![col("a", "x"), col("a", "k")]);
        let right_schema = Schema::new(vec![col("b", "y")]);

        // (b.y = a.x) AND (a.k > 5): reversed equi pair plus a range filter
        let qual =
            field("b", "y").eq(field("a", "x")).and(field("a", "k").gt(EvalNode::integer(5)));

        let pairs = join_key_pairs(&qual, &left_schema, &right_schema).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0.qualified_name(), "a.x");
        assert_eq!(pairs[0].1.qualified_name(), "b.y");
    }

    #[test]
    fn key_pairs_symmetric_under_operand_swap() {
        let left_schema = Schema::new(vec![col("a", "x")]);
        let right_schema = Schema::new(vec![col("b", "y")]);

        let forward = field("a", "x").eq(field("b", "y"));
        let backward = field("b", "y").eq(field("a", "x"));

        let p1 = join_key_pairs(&forward, &left_schema, &right_schema).unwrap();
        let p2 = join_key_pairs(&backward, &left_schema, &right_schema).unwrap();
        assert_eq!(p1, p2);
    }

    #[test]
    fn key_pairs_reject_unassignable_side() {
        let left_schema = Schema::new(vec![col("a", "x")]);
        let right_schema = Schema::new(vec![col("b", "y")]);

        let qual = field("a", "x").eq(field("c", "w"));
        let err = join_key_pairs(&qual, &left_schema, &right_schema);
        assert!(matches!(err, Err(PlanError::MalformedJoinPredicate(_))));
    }

    #[test]
    fn sort_keys_default_ascending_nulls_last() {
        let left_schema = Schema::new(vec![col("a", "x")]);
        let right_schema = Schema::new(vec![col("b", "y")]);
        let qual = field("a", "x").eq(field("b", "y"));

        let (left, right) = sort_keys_from_join_qual(&qual, &left_schema, &right_schema).unwrap();
        assert_eq!(left.len(), 1);
        assert!(left[0].ascending && !left[0].nulls_first);
        assert_eq!(right[0].column.qualified_name(), "b.y");
    }

    #[test]
    fn comparators_compare_by_derived_keys() {
        use crate::datum::{Datum, Tuple};
        use std::cmp::Ordering;

        let left_schema = Schema::new(vec![col("a", "x")]);
        let right_schema = Schema::new(vec![col("b", "y")]);
        let qual = field("a", "x").eq(field("b", "y"));

        let (left_cmp, _) =
            comparators_from_join_qual(&qual, &left_schema, &right_schema).unwrap();
        let small = Tuple::new(vec![Datum::Integer(1)]);
        let large = Tuple::new(vec![Datum::Integer(2)]);
        assert_eq!(left_cmp.compare(&small, &large), Ordering::Less);
    }

    #[test]
    fn commutativity() {
        assert!(is_commutative_join(JoinType::Inner));
        assert!(!is_commutative_join(JoinType::Left));
        assert!(!is_commutative_join(JoinType::Full));
        assert!(!is_commutative_join(JoinType::Cross));
    }

    #[test]
    fn ddl_detection_looks_through_root() {
        let mut pids = PidFactory::new();
        let ddl = LogicalNode::create_table(
            &mut pids,
            CreateTableNode::new("t", table_schema(&["x"])),
        );
        let rooted = LogicalNode::root(&mut pids, ddl);
        assert!(is_ddl_plan(&rooted));

        let not_ddl = scan(&mut pids, "a", &["x"]);
        assert!(!is_ddl_plan(&not_ddl));
    }
}
