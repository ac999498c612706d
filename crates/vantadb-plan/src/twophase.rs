//! Two-phase transforms for distributed execution.
//!
//! Aggregation and sort split into a partial child (per partition, on the
//! workers) and a final parent (merging the partials). The child of a
//! split group-by emits intermediate `column_<k>` values; the parent's
//! aggregates are re-argumented to consume them.

use crate::error::{PlanError, PlanResult};
use crate::expr::{AggPhase, AggregateCall, EvalNode};
use crate::node::{LogicalNode, NodeKind, NodeType, PidFactory};
use crate::relational::GroupbyNode;
use crate::target::{targets_to_schema, Target};
use crate::types::Column;

/// Splits a group-by into final and partial phases.
///
/// Returns `(parent, child)` as separate nodes for the caller to wire:
/// the child aggregates the original input, and the parent consumes the
/// child's output through a terminal placeholder that
/// [`LogicalNode::set_input`] replaces. The parent keeps the original
/// node's pid; the child gets a fresh one.
///
/// The child's target list carries the intermediate columns first, then
/// the grouping columns. Per aggregate found in the original targets
/// (counter `k` monotonic across the transform):
/// - a non-distinct aggregate is cloned into the child as a first-phase
///   call named `column_<k>`, and the parent's structurally matching
///   call is re-argumented to `column_<k>` with phase FINAL;
/// - a DISTINCT aggregate ships its raw input column under `column_<k>`
///   instead, so the parent still sees every distinct value.
///
/// Targets without aggregates are grouping passthroughs; they reappear
/// through the grouping-column append, which adds every grouping column
/// the child does not yet produce as a plain field target, once, after
/// all targets are processed. The parent reads them by field.
///
/// # Errors
///
/// [`PlanError::UnsupportedPlan`] when the node is not a group-by, and
/// [`PlanError::MalformedExpression`] for a DISTINCT aggregate without a
/// column reference to ship.
pub fn split_groupby(
    pids: &mut PidFactory,
    groupby: LogicalNode,
) -> PlanResult<(LogicalNode, LogicalNode)> {
    if groupby.node_type() != NodeType::GroupBy {
        return Err(PlanError::UnsupportedPlan(format!(
            "two-phase aggregation expects a GroupBy node, got {}",
            groupby.node_type()
        )));
    }
    let LogicalNode { pid, in_schema, out_schema, kind } = groupby;
    // Safe: the node type was checked above
    let NodeKind::GroupBy { node: mut final_payload, input } = kind else { unreachable!() };
    let mut partial_payload = final_payload.clone();

    let mut first_targets: Vec<Target> = Vec::new();
    let mut column_id = 0usize;

    for target in &partial_payload.targets {
        // targets without aggregates are grouping passthroughs; the
        // grouping-column append below re-emits them
        for call in target.expr.aggregate_calls() {
            let name = format!("column_{column_id}");
            column_id += 1;

            if call.distinct {
                // ship the raw input column; the parent aggregates the
                // distinct values itself
                let raw = call.column_refs().into_iter().next().ok_or_else(|| {
                    PlanError::MalformedExpression(format!(
                        "distinct aggregate {call} has no column to ship"
                    ))
                })?;
                let shipped = Target::aliased(EvalNode::field(raw.clone()), name.clone());
                let fed = Column::new(name, raw.data_type.clone());
                rewrite_final_call(&mut final_payload, &call, fed, false);
                first_targets.push(shipped);
            } else {
                let mut first_call = call.clone();
                first_call.phase = AggPhase::First;
                let intermediate_type = first_call.func.return_type.clone();
                let shipped = Target::aliased(EvalNode::Aggregate(first_call), name.clone());
                let fed = Column::new(name, intermediate_type);
                rewrite_final_call(&mut final_payload, &call, fed, true);
                first_targets.push(shipped);
            }
        }
    }

    // Append grouping columns the child does not yet produce. The source
    // ran this finalization inside the target loop, appending the echoes
    // once per target; once at the end is the intended behavior.
    let produced = targets_to_schema(&first_targets);
    for column in &partial_payload.grouping_columns {
        if !produced.contains_qualified(&column.qualified_name()) {
            first_targets.push(Target::new(EvalNode::field(column.clone())));
        }
    }

    partial_payload.targets = first_targets;
    let child_out = targets_to_schema(&partial_payload.targets);

    let child = LogicalNode {
        pid: pids.new_pid(),
        in_schema,
        out_schema: child_out.clone(),
        kind: NodeKind::GroupBy { node: partial_payload, input },
    };

    let placeholder = LogicalNode::terminal(pids, child_out.clone());
    let parent = LogicalNode {
        pid,
        in_schema: child_out,
        out_schema,
        kind: NodeKind::GroupBy { node: final_payload, input: Box::new(placeholder) },
    };

    Ok((parent, child))
}

/// Re-arguments every call in the final phase that structurally matches
/// `key` to read the intermediate column instead.
fn rewrite_final_call(payload: &mut GroupbyNode, key: &AggregateCall, fed: Column, final_phase: bool) {
    for target in &mut payload.targets {
        target.expr.for_each_aggregate_mut(&mut |call| {
            if call.same_call(key) {
                call.args = vec![EvalNode::field(fed.clone())];
                if final_phase {
                    call.phase = AggPhase::Final;
                }
            }
        });
    }
}

/// Splits a group-by and wires the phases together.
///
/// The returned tree is `final group-by → partial group-by → input`.
///
/// # Errors
///
/// Same conditions as [`split_groupby`].
pub fn transform_groupby_two_phase(
    pids: &mut PidFactory,
    groupby: LogicalNode,
) -> PlanResult<LogicalNode> {
    let (mut parent, child) = split_groupby(pids, groupby)?;
    parent.set_input(child)?;
    Ok(parent)
}

/// Splits a sort into a merge parent and a partial-sort child.
///
/// The child is a fresh-pid copy of the sort running on each input
/// stream; the parent (keeping the original pid) merges the sorted runs
/// and consumes the child's output schema. As with
/// [`split_groupby`], the parent holds a terminal placeholder until the
/// caller wires the child in.
///
/// # Errors
///
/// [`PlanError::UnsupportedPlan`] when the node is not a sort.
pub fn split_sort(
    pids: &mut PidFactory,
    sort: LogicalNode,
) -> PlanResult<(LogicalNode, LogicalNode)> {
    if sort.node_type() != NodeType::Sort {
        return Err(PlanError::UnsupportedPlan(format!(
            "two-phase sort expects a Sort node, got {}",
            sort.node_type()
        )));
    }
    let LogicalNode { pid, in_schema, out_schema, kind } = sort;
    // Safe: the node type was checked above
    let NodeKind::Sort { node, input } = kind else { unreachable!() };

    let child = LogicalNode {
        pid: pids.new_pid(),
        in_schema,
        out_schema: out_schema.clone(),
        kind: NodeKind::Sort { node: node.clone(), input },
    };

    let placeholder = LogicalNode::terminal(pids, child.out_schema.clone());
    let parent = LogicalNode {
        pid,
        in_schema: child.out_schema.clone(),
        out_schema,
        kind: NodeKind::Sort { node, input: Box::new(placeholder) },
    };

    Ok((parent, child))
}

/// Splits a sort and wires the phases together.
///
/// # Errors
///
/// Same conditions as [`split_sort`].
pub fn transform_sort_two_phase(
    pids: &mut PidFactory,
    sort: LogicalNode,
) -> PlanResult<LogicalNode> {
    let (mut parent, child) = split_sort(pids, sort)?;
    parent.set_input(child)?;
    Ok(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;
    use crate::relational::ScanNode;
    use crate::types::{DataType, Schema, SortSpec};

    fn g_col() -> Column {
        Column::new("g", DataType::Text).with_qualifier("t")
    }

    fn v_col() -> Column {
        Column::new("v", DataType::Integer).with_qualifier("t")
    }

    fn scan(pids: &mut PidFactory) -> LogicalNode {
        let schema = Schema::new(vec![
            Column::new("g", DataType::Text),
            Column::new("v", DataType::Integer),
        ]);
        LogicalNode::scan(pids, ScanNode::new("t"), &schema)
    }

    /// GROUP BY g: targets [g, sum(v)]
    fn groupby_plan(pids: &mut PidFactory) -> LogicalNode {
        let targets = vec![
            Target::new(EvalNode::field(g_col())),
            Target::new(EvalNode::sum(EvalNode::field(v_col()), false)),
        ];
        let payload = GroupbyNode::new(vec![g_col()], targets);
        scan(pids).group_by(pids, payload)
    }

    fn groupby_payload(node: &LogicalNode) -> &GroupbyNode {
        let NodeKind::GroupBy { node, .. } = &node.kind else { panic!("expected group-by") };
        node
    }

    #[test]
    fn groupby_split_shapes_child_and_parent() {
        let mut pids = PidFactory::new();
        let original = groupby_plan(&mut pids);
        let original_pid = original.pid;
        let original_out = original.out_schema.clone();

        let plan = transform_groupby_two_phase(&mut pids, original).unwrap();

        // parent keeps the pid and output schema
        assert_eq!(plan.pid, original_pid);
        assert_eq!(plan.out_schema, original_out);

        let child = plan.input().unwrap();
        assert_eq!(child.node_type(), NodeType::GroupBy);
        assert_eq!(plan.in_schema, child.out_schema);

        // child targets: sum(v) FIRST AS column_0, then the g echo
        let child_payload = groupby_payload(child);
        assert_eq!(child_payload.targets.len(), 2);
        assert_eq!(child_payload.targets[0].output_name(), "column_0");
        assert_eq!(child_payload.targets[1].output_name(), "t.g");
        let EvalNode::Aggregate(partial) = &child_payload.targets[0].expr else {
            panic!("expected aggregate")
        };
        assert_eq!(partial.phase, AggPhase::First);
        assert_eq!(partial.func.name, "sum");

        // child schema: {column_0: sum type, t.g: g type}
        assert!(child.out_schema.contains_qualified("column_0"));
        assert!(child.out_schema.contains_qualified("t.g"));
        assert_eq!(child.out_schema.len(), 2);
        assert_eq!(
            child.out_schema.column_by_name("column_0").unwrap().data_type,
            DataType::Integer
        );
        assert_eq!(child.out_schema.column_by_name("g").unwrap().data_type, DataType::Text);

        // parent sum now reads column_0 with phase FINAL
        let parent_payload = groupby_payload(&plan);
        let EvalNode::Aggregate(merged) = &parent_payload.targets[1].expr else {
            panic!("expected aggregate")
        };
        assert_eq!(merged.phase, AggPhase::Final);
        assert_eq!(merged.args.len(), 1);
        let EvalNode::Field(fed) = &merged.args[0] else { panic!("expected field") };
        assert_eq!(fed.qualified_name(), "column_0");

        // the child still aggregates the scan
        assert_eq!(child.input().unwrap().node_type(), NodeType::Scan);
    }

    #[test]
    fn aggregates_first_then_grouping_echo() {
        let mut pids = PidFactory::new();
        // targets [sum(v)] with grouping [g]: the echo is appended after
        let targets = vec![Target::new(EvalNode::sum(EvalNode::field(v_col()), false))];
        let payload = GroupbyNode::new(vec![g_col()], targets);
        let original = scan(&mut pids).group_by(&mut pids, payload);

        let plan = transform_groupby_two_phase(&mut pids, original).unwrap();
        let child_payload = groupby_payload(plan.input().unwrap());

        assert_eq!(child_payload.targets.len(), 2);
        assert_eq!(child_payload.targets[0].output_name(), "column_0");
        assert_eq!(child_payload.targets[1].output_name(), "t.g");
    }

    #[test]
    fn grouping_echo_appended_once() {
        let mut pids = PidFactory::new();
        // two aggregate targets; the faulty in-loop finalization would
        // duplicate the grouping echo
        let targets = vec![
            Target::new(EvalNode::sum(EvalNode::field(v_col()), false)),
            Target::new(EvalNode::count(EvalNode::field(v_col()), false)),
        ];
        let payload = GroupbyNode::new(vec![g_col()], targets);
        let original = scan(&mut pids).group_by(&mut pids, payload);

        let plan = transform_groupby_two_phase(&mut pids, original).unwrap();
        let child_payload = groupby_payload(plan.input().unwrap());

        let echoes = child_payload
            .targets
            .iter()
            .filter(|t| t.output_name() == "t.g")
            .count();
        assert_eq!(echoes, 1);
        assert_eq!(child_payload.targets.len(), 3);
    }

    #[test]
    fn distinct_aggregate_ships_raw_column() {
        let mut pids = PidFactory::new();
        let targets = vec![
            Target::new(EvalNode::field(g_col())),
            Target::new(EvalNode::count(EvalNode::field(v_col()), true)),
        ];
        let payload = GroupbyNode::new(vec![g_col()], targets);
        let original = scan(&mut pids).group_by(&mut pids, payload);

        let plan = transform_groupby_two_phase(&mut pids, original).unwrap();
        let child_payload = groupby_payload(plan.input().unwrap());

        // the child carries the raw column, unaggregated
        let EvalNode::Field(raw) = &child_payload.targets[0].expr else {
            panic!("expected raw field, not an aggregate")
        };
        assert_eq!(raw.qualified_name(), "t.v");
        assert_eq!(child_payload.targets[0].output_name(), "column_0");
        assert_eq!(child_payload.targets[1].output_name(), "t.g");

        // the parent still counts distinct values of the shipped column
        let parent_payload = groupby_payload(&plan);
        let EvalNode::Aggregate(counting) = &parent_payload.targets[1].expr else {
            panic!("expected aggregate")
        };
        assert!(counting.distinct);
        let EvalNode::Field(fed) = &counting.args[0] else { panic!("expected field") };
        assert_eq!(fed.qualified_name(), "column_0");
        // the shipped column keeps the raw value type
        assert_eq!(fed.data_type, DataType::Integer);
    }

    #[test]
    fn split_groupby_returns_unwired_pair() {
        let mut pids = PidFactory::new();
        let original = groupby_plan(&mut pids);

        let (mut parent, child) = split_groupby(&mut pids, original).unwrap();
        assert_eq!(parent.input().unwrap().node_type(), NodeType::Terminal);
        assert_eq!(parent.in_schema, child.out_schema);

        let old = parent.set_input(child).unwrap();
        assert_eq!(old.node_type(), NodeType::Terminal);
        assert_eq!(parent.input().unwrap().node_type(), NodeType::GroupBy);
    }

    #[test]
    fn split_rejects_non_groupby() {
        let mut pids = PidFactory::new();
        let not_groupby = scan(&mut pids);
        assert!(matches!(
            split_groupby(&mut pids, not_groupby),
            Err(PlanError::UnsupportedPlan(_))
        ));
    }

    #[test]
    fn sort_split_keeps_specs_and_chains_schemas() {
        let mut pids = PidFactory::new();
        let spec = SortSpec::new(Column::new("v", DataType::Integer).with_qualifier("t"));
        let original = scan(&mut pids).sort(&mut pids, vec![spec.clone()]);
        let original_pid = original.pid;

        let plan = transform_sort_two_phase(&mut pids, original).unwrap();
        assert_eq!(plan.pid, original_pid);
        assert_eq!(plan.node_type(), NodeType::Sort);

        let child = plan.input().unwrap();
        assert_eq!(child.node_type(), NodeType::Sort);
        assert_ne!(child.pid, plan.pid);
        assert_eq!(plan.in_schema, child.out_schema);

        let NodeKind::Sort { node: parent_sort, .. } = &plan.kind else { panic!() };
        let NodeKind::Sort { node: child_sort, .. } = &child.kind else { panic!() };
        assert_eq!(parent_sort.sort_specs, child_sort.sort_specs);
        assert_eq!(parent_sort.sort_specs[0], spec);

        assert_eq!(child.input().unwrap().node_type(), NodeType::Scan);
    }

    #[test]
    fn sort_phases_mutate_independently() {
        let mut pids = PidFactory::new();
        let spec = SortSpec::new(Column::new("v", DataType::Integer).with_qualifier("t"));
        let original = scan(&mut pids).sort(&mut pids, vec![spec]);

        let mut plan = transform_sort_two_phase(&mut pids, original).unwrap();
        if let NodeKind::Sort { node, .. } = &mut plan.kind {
            node.sort_specs[0].ascending = false;
        }
        let child = plan.input().unwrap();
        let NodeKind::Sort { node: child_sort, .. } = &child.kind else { panic!() };
        assert!(child_sort.sort_specs[0].ascending);
    }
}
