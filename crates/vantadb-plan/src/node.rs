//! Logical plan nodes.
//!
//! [`LogicalNode`] is the tree the planner builds, rewrites, and hands to
//! the executor. Every node carries a plan-local id, the schema of the
//! rows it consumes, the schema of the rows it produces, and a
//! [`NodeKind`] holding the operator payload together with the owned
//! children. Arity is encoded structurally: leaf variants own no child,
//! unary variants one, binary variants two.
//!
//! Nodes carry no parent pointers; traversal helpers supply ancestor
//! stacks where rewrites need them.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::catalog::PartitionMethod;
use crate::ddl::{
    CreateDatabaseNode, CreateIndexNode, CreateTableNode, DropDatabaseNode, DropIndexNode,
    DropTableNode,
};
use crate::error::{PlanError, PlanResult};
use crate::relational::{
    FilterNode, GroupbyNode, HavingNode, InsertNode, JoinNode, LimitNode, PartitionedScanNode,
    ProjectionNode, ScanNode, SetOpNode, SetOpType, SortNode, StoreNode, TableSubqueryNode,
};
use crate::target::{targets_to_schema, Target};
use crate::types::{Column, Schema, SortSpec};

/// Allocates plan-node identifiers for one plan.
///
/// Ids are strictly increasing. Each plan owns its own factory; there is
/// no process-wide id state.
#[derive(Debug, Clone, Default)]
pub struct PidFactory {
    next: i32,
}

impl PidFactory {
    /// Creates a factory starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next plan-node id.
    pub fn new_pid(&mut self) -> i32 {
        let pid = self.next;
        self.next += 1;
        pid
    }
}

/// The closed set of operator tags, used by searches and rewrites.
///
/// Set operations split into their three concrete tags so a search can
/// target UNION without also matching INTERSECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Plan root.
    Root,
    /// Terminal sink / detached placeholder.
    Terminal,
    /// Table scan.
    Scan,
    /// Partitioned table scan.
    PartitionedScan,
    /// Derived table (nested query block).
    TableSubquery,
    /// Row filter (WHERE).
    Filter,
    /// Group filter (HAVING).
    Having,
    /// Projection.
    Projection,
    /// Aggregation.
    GroupBy,
    /// Sort.
    Sort,
    /// Row limit.
    Limit,
    /// Join.
    Join,
    /// UNION set operation.
    Union,
    /// INTERSECT set operation.
    Intersect,
    /// EXCEPT set operation.
    Except,
    /// Store sink.
    Store,
    /// Insert sink.
    Insert,
    /// CREATE TABLE.
    CreateTable,
    /// DROP TABLE.
    DropTable,
    /// CREATE DATABASE.
    CreateDatabase,
    /// DROP DATABASE.
    DropDatabase,
    /// CREATE INDEX.
    CreateIndex,
    /// DROP INDEX.
    DropIndex,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Structural arity of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// No children.
    Leaf,
    /// Exactly one child.
    Unary,
    /// Exactly two ordered children.
    Binary,
}

/// Operator payload plus owned children.
#[derive(Debug, Clone, PartialEq, Hash)]
pub enum NodeKind {
    // ========== Leaf nodes ==========
    /// Terminal sink.
    Terminal,
    /// Table scan.
    Scan(ScanNode),
    /// Partitioned table scan.
    PartitionedScan(PartitionedScanNode),
    /// CREATE TABLE.
    CreateTable(CreateTableNode),
    /// DROP TABLE.
    DropTable(DropTableNode),
    /// CREATE DATABASE.
    CreateDatabase(CreateDatabaseNode),
    /// DROP DATABASE.
    DropDatabase(DropDatabaseNode),
    /// CREATE INDEX.
    CreateIndex(CreateIndexNode),
    /// DROP INDEX.
    DropIndex(DropIndexNode),

    // ========== Unary nodes ==========
    /// Plan root.
    Root {
        /// The input plan.
        input: Box<LogicalNode>,
    },
    /// Derived table exposing a nested query block as a relation.
    TableSubquery {
        /// The subquery relation payload.
        node: TableSubqueryNode,
        /// The block's plan.
        input: Box<LogicalNode>,
    },
    /// Row filter.
    Filter {
        /// The filter payload.
        node: FilterNode,
        /// The input plan.
        input: Box<LogicalNode>,
    },
    /// Group filter.
    Having {
        /// The having payload.
        node: HavingNode,
        /// The input plan.
        input: Box<LogicalNode>,
    },
    /// Projection.
    Projection {
        /// The projection payload.
        node: ProjectionNode,
        /// The input plan.
        input: Box<LogicalNode>,
    },
    /// Aggregation.
    GroupBy {
        /// The group-by payload.
        node: GroupbyNode,
        /// The input plan.
        input: Box<LogicalNode>,
    },
    /// Sort.
    Sort {
        /// The sort payload.
        node: SortNode,
        /// The input plan.
        input: Box<LogicalNode>,
    },
    /// Row limit.
    Limit {
        /// The limit payload.
        node: LimitNode,
        /// The input plan.
        input: Box<LogicalNode>,
    },
    /// Store sink.
    Store {
        /// The store payload.
        node: StoreNode,
        /// The input plan.
        input: Box<LogicalNode>,
    },
    /// Insert sink.
    Insert {
        /// The insert payload.
        node: InsertNode,
        /// The input plan.
        input: Box<LogicalNode>,
    },

    // ========== Binary nodes ==========
    /// Join. Left is the outer side, right the inner.
    Join {
        /// The join payload.
        node: JoinNode,
        /// The outer input.
        left: Box<LogicalNode>,
        /// The inner input.
        right: Box<LogicalNode>,
    },
    /// Set operation.
    SetOp {
        /// The set-operation payload.
        node: SetOpNode,
        /// The left input.
        left: Box<LogicalNode>,
        /// The right input.
        right: Box<LogicalNode>,
    },
}

/// A node of a logical plan tree.
///
/// Equality and hashing compare kind, payload, schemas, and children in
/// positional order; the pid never participates. Use
/// [`LogicalNode::clone_with`] (or [`LogicalNode::clone_tree_with`]) when
/// a duplicate is going back into the same plan — a plain `clone` keeps
/// the old pids and would break pid uniqueness.
#[derive(Debug, Clone)]
pub struct LogicalNode {
    /// Plan-local node id.
    pub pid: i32,
    /// Schema of the rows this node consumes.
    pub in_schema: Schema,
    /// Schema of the rows this node produces.
    pub out_schema: Schema,
    /// Operator payload and children.
    pub kind: NodeKind,
}

impl PartialEq for LogicalNode {
    fn eq(&self, other: &Self) -> bool {
        self.in_schema == other.in_schema
            && self.out_schema == other.out_schema
            && self.kind == other.kind
    }
}

impl Hash for LogicalNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.in_schema.hash(state);
        self.out_schema.hash(state);
        self.kind.hash(state);
    }
}

impl LogicalNode {
    /// Creates a node from its parts, stamping a fresh pid.
    #[must_use]
    pub fn new(pids: &mut PidFactory, kind: NodeKind, in_schema: Schema, out_schema: Schema) -> Self {
        Self { pid: pids.new_pid(), in_schema, out_schema, kind }
    }

    /// A placeholder used transiently while splicing owned children.
    pub(crate) fn detached() -> Self {
        Self {
            pid: -1,
            in_schema: Schema::empty(),
            out_schema: Schema::empty(),
            kind: NodeKind::Terminal,
        }
    }

    // ========== Leaf constructors ==========

    /// Creates a terminal node with the given schema on both sides.
    #[must_use]
    pub fn terminal(pids: &mut PidFactory, schema: Schema) -> Self {
        Self::new(pids, NodeKind::Terminal, schema.clone(), schema)
    }

    /// Creates a table scan.
    ///
    /// The scan produces the table schema qualified by the canonical
    /// relation name.
    #[must_use]
    pub fn scan(pids: &mut PidFactory, node: ScanNode, table_schema: &Schema) -> Self {
        let out = table_schema.with_qualifier(node.canonical_name());
        Self::new(pids, NodeKind::Scan(node), out.clone(), out)
    }

    /// Creates a partitioned table scan.
    #[must_use]
    pub fn partitioned_scan(
        pids: &mut PidFactory,
        node: PartitionedScanNode,
        table_schema: &Schema,
    ) -> Self {
        let out = table_schema.with_qualifier(node.canonical_name());
        Self::new(pids, NodeKind::PartitionedScan(node), out.clone(), out)
    }

    /// Creates a CREATE TABLE node.
    #[must_use]
    pub fn create_table(pids: &mut PidFactory, node: CreateTableNode) -> Self {
        Self::new(pids, NodeKind::CreateTable(node), Schema::empty(), Schema::empty())
    }

    /// Creates a DROP TABLE node.
    #[must_use]
    pub fn drop_table(pids: &mut PidFactory, node: DropTableNode) -> Self {
        Self::new(pids, NodeKind::DropTable(node), Schema::empty(), Schema::empty())
    }

    /// Creates a CREATE DATABASE node.
    #[must_use]
    pub fn create_database(pids: &mut PidFactory, node: CreateDatabaseNode) -> Self {
        Self::new(pids, NodeKind::CreateDatabase(node), Schema::empty(), Schema::empty())
    }

    /// Creates a DROP DATABASE node.
    #[must_use]
    pub fn drop_database(pids: &mut PidFactory, node: DropDatabaseNode) -> Self {
        Self::new(pids, NodeKind::DropDatabase(node), Schema::empty(), Schema::empty())
    }

    /// Creates a CREATE INDEX node.
    #[must_use]
    pub fn create_index(pids: &mut PidFactory, node: CreateIndexNode) -> Self {
        Self::new(pids, NodeKind::CreateIndex(node), Schema::empty(), Schema::empty())
    }

    /// Creates a DROP INDEX node.
    #[must_use]
    pub fn drop_index(pids: &mut PidFactory, node: DropIndexNode) -> Self {
        Self::new(pids, NodeKind::DropIndex(node), Schema::empty(), Schema::empty())
    }

    // ========== Unary constructors ==========

    /// Wraps a plan under a root node.
    #[must_use]
    pub fn root(pids: &mut PidFactory, child: LogicalNode) -> Self {
        let schema = child.out_schema.clone();
        Self::new(pids, NodeKind::Root { input: Box::new(child) }, schema.clone(), schema)
    }

    /// Exposes a query block as a relation.
    ///
    /// The block's columns are requalified by the subquery's canonical
    /// name.
    #[must_use]
    pub fn table_subquery(pids: &mut PidFactory, node: TableSubqueryNode, child: LogicalNode) -> Self {
        let in_schema = child.out_schema.clone();
        let out = in_schema.with_qualifier(node.canonical_name());
        Self::new(pids, NodeKind::TableSubquery { node, input: Box::new(child) }, in_schema, out)
    }

    /// Adds a filter above this plan.
    #[must_use]
    pub fn filter(self, pids: &mut PidFactory, node: FilterNode) -> Self {
        let schema = self.out_schema.clone();
        Self::new(
            pids,
            NodeKind::Filter { node, input: Box::new(self) },
            schema.clone(),
            schema,
        )
    }

    /// Adds a having filter above this plan.
    #[must_use]
    pub fn having(self, pids: &mut PidFactory, node: HavingNode) -> Self {
        let schema = self.out_schema.clone();
        Self::new(
            pids,
            NodeKind::Having { node, input: Box::new(self) },
            schema.clone(),
            schema,
        )
    }

    /// Adds a projection above this plan.
    #[must_use]
    pub fn project(self, pids: &mut PidFactory, targets: Vec<Target>) -> Self {
        let in_schema = self.out_schema.clone();
        let out = targets_to_schema(&targets);
        Self::new(
            pids,
            NodeKind::Projection { node: ProjectionNode::new(targets), input: Box::new(self) },
            in_schema,
            out,
        )
    }

    /// Adds an aggregation above this plan.
    #[must_use]
    pub fn group_by(self, pids: &mut PidFactory, node: GroupbyNode) -> Self {
        let in_schema = self.out_schema.clone();
        let out = targets_to_schema(&node.targets);
        Self::new(pids, NodeKind::GroupBy { node, input: Box::new(self) }, in_schema, out)
    }

    /// Adds a sort above this plan.
    #[must_use]
    pub fn sort(self, pids: &mut PidFactory, sort_specs: Vec<SortSpec>) -> Self {
        let schema = self.out_schema.clone();
        Self::new(
            pids,
            NodeKind::Sort { node: SortNode::new(sort_specs), input: Box::new(self) },
            schema.clone(),
            schema,
        )
    }

    /// Adds a row limit above this plan.
    #[must_use]
    pub fn limit(self, pids: &mut PidFactory, fetch: u64) -> Self {
        let schema = self.out_schema.clone();
        Self::new(
            pids,
            NodeKind::Limit { node: LimitNode::new(fetch), input: Box::new(self) },
            schema.clone(),
            schema,
        )
    }

    /// Stores this plan's rows into a relation.
    #[must_use]
    pub fn store(self, pids: &mut PidFactory, node: StoreNode) -> Self {
        let schema = self.out_schema.clone();
        Self::new(pids, NodeKind::Store { node, input: Box::new(self) }, schema.clone(), schema)
    }

    /// Inserts this plan's rows into a table.
    #[must_use]
    pub fn insert(self, pids: &mut PidFactory, node: InsertNode) -> Self {
        let in_schema = self.out_schema.clone();
        Self::new(
            pids,
            NodeKind::Insert { node, input: Box::new(self) },
            in_schema,
            Schema::empty(),
        )
    }

    // ========== Binary constructors ==========

    /// Joins this plan (outer) with another (inner).
    ///
    /// The join consumes and produces the concatenation of both input
    /// schemas; a projection above trims it.
    #[must_use]
    pub fn join(self, pids: &mut PidFactory, node: JoinNode, right: LogicalNode) -> Self {
        let in_schema = self.out_schema.merge(&right.out_schema);
        let out = in_schema.clone();
        Self::new(
            pids,
            NodeKind::Join { node, left: Box::new(self), right: Box::new(right) },
            in_schema,
            out,
        )
    }

    /// Combines this plan with another under a set operation.
    ///
    /// The operation produces the left input's schema.
    #[must_use]
    pub fn set_op(self, pids: &mut PidFactory, node: SetOpNode, right: LogicalNode) -> Self {
        let in_schema = self.out_schema.merge(&right.out_schema);
        let out = self.out_schema.clone();
        Self::new(
            pids,
            NodeKind::SetOp { node, left: Box::new(self), right: Box::new(right) },
            in_schema,
            out,
        )
    }

    // ========== Accessors ==========

    /// The operator tag of this node.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Terminal => NodeType::Terminal,
            NodeKind::Scan(_) => NodeType::Scan,
            NodeKind::PartitionedScan(_) => NodeType::PartitionedScan,
            NodeKind::CreateTable(_) => NodeType::CreateTable,
            NodeKind::DropTable(_) => NodeType::DropTable,
            NodeKind::CreateDatabase(_) => NodeType::CreateDatabase,
            NodeKind::DropDatabase(_) => NodeType::DropDatabase,
            NodeKind::CreateIndex(_) => NodeType::CreateIndex,
            NodeKind::DropIndex(_) => NodeType::DropIndex,
            NodeKind::Root { .. } => NodeType::Root,
            NodeKind::TableSubquery { .. } => NodeType::TableSubquery,
            NodeKind::Filter { .. } => NodeType::Filter,
            NodeKind::Having { .. } => NodeType::Having,
            NodeKind::Projection { .. } => NodeType::Projection,
            NodeKind::GroupBy { .. } => NodeType::GroupBy,
            NodeKind::Sort { .. } => NodeType::Sort,
            NodeKind::Limit { .. } => NodeType::Limit,
            NodeKind::Store { .. } => NodeType::Store,
            NodeKind::Insert { .. } => NodeType::Insert,
            NodeKind::Join { .. } => NodeType::Join,
            NodeKind::SetOp { node, .. } => match node.op_type {
                SetOpType::Union => NodeType::Union,
                SetOpType::Intersect => NodeType::Intersect,
                SetOpType::Except => NodeType::Except,
            },
        }
    }

    /// The structural arity of this node.
    #[must_use]
    pub fn arity(&self) -> Arity {
        match &self.kind {
            NodeKind::Terminal
            | NodeKind::Scan(_)
            | NodeKind::PartitionedScan(_)
            | NodeKind::CreateTable(_)
            | NodeKind::DropTable(_)
            | NodeKind::CreateDatabase(_)
            | NodeKind::DropDatabase(_)
            | NodeKind::CreateIndex(_)
            | NodeKind::DropIndex(_) => Arity::Leaf,
            NodeKind::Root { .. }
            | NodeKind::TableSubquery { .. }
            | NodeKind::Filter { .. }
            | NodeKind::Having { .. }
            | NodeKind::Projection { .. }
            | NodeKind::GroupBy { .. }
            | NodeKind::Sort { .. }
            | NodeKind::Limit { .. }
            | NodeKind::Store { .. }
            | NodeKind::Insert { .. } => Arity::Unary,
            NodeKind::Join { .. } | NodeKind::SetOp { .. } => Arity::Binary,
        }
    }

    /// The children of this node, left to right.
    #[must_use]
    pub fn children(&self) -> Vec<&LogicalNode> {
        match &self.kind {
            NodeKind::Root { input }
            | NodeKind::TableSubquery { input, .. }
            | NodeKind::Filter { input, .. }
            | NodeKind::Having { input, .. }
            | NodeKind::Projection { input, .. }
            | NodeKind::GroupBy { input, .. }
            | NodeKind::Sort { input, .. }
            | NodeKind::Limit { input, .. }
            | NodeKind::Store { input, .. }
            | NodeKind::Insert { input, .. } => vec![input],
            NodeKind::Join { left, right, .. } | NodeKind::SetOp { left, right, .. } => {
                vec![left, right]
            }
            _ => vec![],
        }
    }

    /// The mutable children of this node, left to right.
    #[must_use]
    pub fn children_mut(&mut self) -> Vec<&mut LogicalNode> {
        self.child_slots_mut().into_iter().map(|b| &mut **b).collect()
    }

    /// The owned child slots, left to right.
    pub(crate) fn child_slots_mut(&mut self) -> Vec<&mut Box<LogicalNode>> {
        match &mut self.kind {
            NodeKind::Root { input }
            | NodeKind::TableSubquery { input, .. }
            | NodeKind::Filter { input, .. }
            | NodeKind::Having { input, .. }
            | NodeKind::Projection { input, .. }
            | NodeKind::GroupBy { input, .. }
            | NodeKind::Sort { input, .. }
            | NodeKind::Limit { input, .. }
            | NodeKind::Store { input, .. }
            | NodeKind::Insert { input, .. } => vec![input],
            NodeKind::Join { left, right, .. } | NodeKind::SetOp { left, right, .. } => {
                vec![left, right]
            }
            _ => vec![],
        }
    }

    /// The only child of a unary node.
    #[must_use]
    pub fn input(&self) -> Option<&LogicalNode> {
        match self.arity() {
            Arity::Unary => self.children().pop(),
            _ => None,
        }
    }

    /// The only child slot of a unary node.
    pub(crate) fn input_slot_mut(&mut self) -> Option<&mut Box<LogicalNode>> {
        match self.arity() {
            Arity::Unary => self.child_slots_mut().pop(),
            _ => None,
        }
    }

    /// The left (outer) child of a binary node.
    #[must_use]
    pub fn left(&self) -> Option<&LogicalNode> {
        match &self.kind {
            NodeKind::Join { left, .. } | NodeKind::SetOp { left, .. } => Some(left),
            _ => None,
        }
    }

    /// The right (inner) child of a binary node.
    #[must_use]
    pub fn right(&self) -> Option<&LogicalNode> {
        match &self.kind {
            NodeKind::Join { right, .. } | NodeKind::SetOp { right, .. } => Some(right),
            _ => None,
        }
    }

    /// Returns true if this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.arity() == Arity::Leaf
    }

    /// The canonical relation name, for relation nodes.
    #[must_use]
    pub fn canonical_name(&self) -> Option<String> {
        match &self.kind {
            NodeKind::Scan(node) => Some(node.canonical_name()),
            NodeKind::PartitionedScan(node) => Some(node.canonical_name()),
            NodeKind::TableSubquery { node, .. } => Some(node.canonical_name()),
            _ => None,
        }
    }

    /// Replaces a unary node's child, returning the old one.
    ///
    /// Schema chaining across the new edge is the caller's responsibility.
    pub fn set_input(&mut self, new_input: LogicalNode) -> PlanResult<LogicalNode> {
        if self.arity() != Arity::Unary {
            return Err(PlanError::InvariantViolation(format!(
                "set_input requires a unary node, got {}",
                self.node_type()
            )));
        }
        // Safe: unary nodes always have an input slot
        let slot = self.input_slot_mut().expect("unary node has an input slot");
        Ok(*std::mem::replace(slot, Box::new(new_input)))
    }

    // ========== Cloning ==========

    /// Clones this node with a fresh pid.
    ///
    /// The payload is independently mutable; children are duplicated
    /// as-is and keep their pids. A caller rebuilding a subtree stamps
    /// every node itself, or uses [`LogicalNode::clone_tree_with`].
    #[must_use]
    pub fn clone_with(&self, pids: &mut PidFactory) -> Self {
        let mut copy = self.clone();
        copy.pid = pids.new_pid();
        copy
    }

    /// Recursively clones this subtree, stamping a fresh pid on every
    /// node.
    #[must_use]
    pub fn clone_tree_with(&self, pids: &mut PidFactory) -> Self {
        let mut copy = self.clone();
        copy.restamp(pids);
        copy
    }

    fn restamp(&mut self, pids: &mut PidFactory) {
        self.pid = pids.new_pid();
        for slot in self.child_slots_mut() {
            slot.restamp(pids);
        }
    }

    // ========== Display ==========

    /// A stable, one-line summary of this node, used by explain.
    #[must_use]
    pub fn plan_string(&self) -> String {
        match &self.kind {
            NodeKind::Terminal => "Terminal".to_string(),
            NodeKind::Scan(node) => match &node.alias {
                Some(alias) => format!("Scan: {} AS {}", node.table_name, alias),
                None => format!("Scan: {}", node.table_name),
            },
            NodeKind::PartitionedScan(node) => {
                let method = match &node.partition {
                    PartitionMethod::Hash(_) => "hash",
                    PartitionMethod::Range(_) => "range",
                    PartitionMethod::Column(_) => "column",
                };
                match &node.alias {
                    Some(alias) => {
                        format!("PartitionedScan: {} AS {} [{}]", node.table_name, alias, method)
                    }
                    None => format!("PartitionedScan: {} [{}]", node.table_name, method),
                }
            }
            NodeKind::CreateTable(node) => {
                let mut s = format!("CreateTable: {}", node.table_name);
                if node.if_not_exists {
                    s.push_str(" IF NOT EXISTS");
                }
                s.push_str(&format!(" ({} columns)", node.schema.len()));
                s
            }
            NodeKind::DropTable(node) => {
                let mut s = format!("DropTable: {}", node.table_name);
                if node.if_exists {
                    s.push_str(" IF EXISTS");
                }
                s
            }
            NodeKind::CreateDatabase(node) => {
                let mut s = format!("CreateDatabase: {}", node.database_name);
                if node.if_not_exists {
                    s.push_str(" IF NOT EXISTS");
                }
                s
            }
            NodeKind::DropDatabase(node) => {
                let mut s = format!("DropDatabase: {}", node.database_name);
                if node.if_exists {
                    s.push_str(" IF EXISTS");
                }
                s
            }
            NodeKind::CreateIndex(node) => {
                let mut s = format!("CreateIndex: {} ON {}", node.index_name, node.table_name);
                if node.unique {
                    s.push_str(" UNIQUE");
                }
                s
            }
            NodeKind::DropIndex(node) => {
                let mut s = format!("DropIndex: {}", node.index_name);
                if node.if_exists {
                    s.push_str(" IF EXISTS");
                }
                s
            }
            NodeKind::Root { .. } => "Root".to_string(),
            NodeKind::TableSubquery { node, .. } => format!("TableSubquery: {}", node.name),
            NodeKind::Filter { node, .. } => format!("Filter: {}", node.predicate),
            NodeKind::Having { node, .. } => format!("Having: {}", node.predicate),
            NodeKind::Projection { node, .. } => {
                let targets: Vec<String> = node.targets.iter().map(ToString::to_string).collect();
                format!("Projection: {}", targets.join(", "))
            }
            NodeKind::GroupBy { node, .. } => {
                let targets: Vec<String> = node.targets.iter().map(ToString::to_string).collect();
                let mut s = format!("GroupBy: {}", targets.join(", "));
                if !node.grouping_columns.is_empty() {
                    let keys: Vec<String> =
                        node.grouping_columns.iter().map(Column::qualified_name).collect();
                    s.push_str(&format!(" BY {}", keys.join(", ")));
                }
                if node.distinct {
                    s.push_str(" DISTINCT");
                }
                s
            }
            NodeKind::Sort { node, .. } => {
                let specs: Vec<String> = node.sort_specs.iter().map(ToString::to_string).collect();
                format!("Sort: {}", specs.join(", "))
            }
            NodeKind::Limit { node, .. } => format!("Limit: {}", node.fetch),
            NodeKind::Store { node, .. } => format!("Store: {}", node.table_name),
            NodeKind::Insert { node, .. } => {
                if node.overwrite {
                    format!("Insert: {} (overwrite)", node.table_name)
                } else {
                    format!("Insert: {}", node.table_name)
                }
            }
            NodeKind::Join { node, .. } => {
                let mut s = format!("Join: {}", node.join_type);
                if let Some(cond) = &node.condition {
                    s.push_str(&format!(" ON {cond}"));
                }
                s
            }
            NodeKind::SetOp { node, .. } => {
                if node.all {
                    format!("SetOp: {} ALL", node.op_type)
                } else {
                    format!("SetOp: {}", node.op_type)
                }
            }
        }
    }

    /// Pretty-prints the plan as a tree.
    #[must_use]
    pub fn display_tree(&self) -> DisplayTree<'_> {
        DisplayTree { plan: self }
    }
}

/// Helper for tree-style plan display.
pub struct DisplayTree<'a> {
    plan: &'a LogicalNode,
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_node(f, self.plan, "", true)
    }
}

fn fmt_node(
    f: &mut fmt::Formatter<'_>,
    plan: &LogicalNode,
    prefix: &str,
    is_last: bool,
) -> fmt::Result {
    let connector = if is_last { "└── " } else { "├── " };
    writeln!(f, "{prefix}{connector}{}", plan.plan_string())?;

    let children = plan.children();
    let new_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
    for (i, child) in children.iter().enumerate() {
        fmt_node(f, child, &new_prefix, i == children.len() - 1)?;
    }
    Ok(())
}

impl fmt::Display for LogicalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_tree())
    }
}
