//! Logical query plan core for VantaDB.
//!
//! This crate defines the logical operator tree a query is planned into,
//! together with the machinery the planner uses on it: traversal and
//! search, structural rewrites, predicate-placement analysis, and the
//! two-phase transforms that split aggregation and sorting for
//! distributed execution.
//!
//! # Overview
//!
//! A plan is a tree of [`LogicalNode`]s. Each node carries a plan-local
//! id, its input and output schemas, and a [`NodeKind`] holding the
//! operator payload and the owned children. Scalar expressions are
//! [`EvalNode`] trees over qualified [`Column`]s.
//!
//! The core is synchronous and CPU-only. A plan is built, rewritten to
//! completion, then handed to the executor as an immutable tree; plans of
//! different queries share nothing, each owning its [`PidFactory`].
//!
//! # Example
//!
//! ```
//! use vantadb_plan::{
//!     Column, DataType, EvalNode, FilterNode, LogicalNode, PidFactory, ScanNode, Schema,
//! };
//!
//! // SELECT * FROM orders WHERE orders.amount > 100 LIMIT 10
//! let mut pids = PidFactory::new();
//! let schema = Schema::new(vec![Column::new("amount", DataType::BigInt)]);
//! let amount = Column::new("amount", DataType::BigInt).with_qualifier("orders");
//!
//! let plan = LogicalNode::scan(&mut pids, ScanNode::new("orders"), &schema)
//!     .filter(&mut pids, FilterNode::new(EvalNode::field(amount).gt(EvalNode::integer(100))))
//!     .limit(&mut pids, 10);
//!
//! assert!(vantadb_plan::validate_plan(&plan).is_ok());
//! ```

mod analysis;
mod catalog;
mod datum;
mod ddl;
mod error;
mod expr;
mod node;
mod relational;
mod rewrite;
mod target;
mod traverse;
mod twophase;
mod types;
mod validate;

pub use analysis::{
    can_be_evaluated, comparators_from_join_qual, is_commutative_join, is_ddl_plan,
    join_key_pairs, sort_keys_from_join_qual,
};
pub use catalog::{
    Catalog, EmptyCatalog, FunctionDesc, FunctionKind, MemoryCatalog, PartitionMethod, TableDesc,
};
pub use datum::{Datum, Tuple, TupleComparator};
pub use ddl::{
    CreateDatabaseNode, CreateIndexNode, CreateTableNode, DropDatabaseNode, DropIndexNode,
    DropTableNode,
};
pub use error::{PlanError, PlanResult};
pub use expr::{AggPhase, AggregateCall, BinaryOp, EvalNode, UnaryOp};
pub use node::{Arity, DisplayTree, LogicalNode, NodeKind, NodeType, PidFactory};
pub use relational::{
    normalize_table_name, FilterNode, GroupbyNode, HavingNode, InsertNode, JoinNode, JoinType,
    LimitNode, PartitionedScanNode, ProjectionNode, ScanNode, SetOpNode, SetOpType, SortNode,
    StoreNode, TableSubqueryNode,
};
pub use rewrite::{delete_node, replace_child_of_kind, replace_node};
pub use target::{schema_to_targets, strip_targets, targets_to_schema, Target};
pub use traverse::{
    find_all_nodes, find_top_node, find_top_parent_node, relation_lineage,
    relation_lineage_within_block,
};
pub use twophase::{
    split_groupby, split_sort, transform_groupby_two_phase, transform_sort_two_phase,
};
pub use types::{Column, DataType, Schema, SortSpec};
pub use validate::validate_plan;
