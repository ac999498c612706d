//! Catalog interface consumed during planning.
//!
//! The catalog service itself lives outside this crate; planning only
//! needs lookups, injected through the [`Catalog`] trait and treated as
//! pure functions for the duration of a plan.

use std::collections::HashMap;

use crate::types::{DataType, Schema};

/// How a table is partitioned across workers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartitionMethod {
    /// Hash partitioning over the named columns.
    Hash(Vec<String>),
    /// Range partitioning over the named columns.
    Range(Vec<String>),
    /// Per-column value partitioning.
    Column(Vec<String>),
}

/// A table description returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDesc {
    /// Canonical table name.
    pub name: String,
    /// The table's schema.
    pub schema: Schema,
    /// Partitioning, when the table is partitioned.
    pub partition: Option<PartitionMethod>,
}

impl TableDesc {
    /// Creates an unpartitioned table description.
    #[must_use]
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self { name: name.into(), schema, partition: None }
    }

    /// Sets the partition method.
    #[must_use]
    pub fn with_partition(mut self, partition: PartitionMethod) -> Self {
        self.partition = Some(partition);
        self
    }
}

/// Whether a function is scalar or aggregating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    /// One output row per input row.
    Scalar,
    /// One output row per group.
    Aggregate,
}

/// A function signature returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionDesc {
    /// Function name (lowercase).
    pub name: String,
    /// Scalar or aggregate.
    pub kind: FunctionKind,
    /// The function's return type.
    pub return_type: DataType,
}

impl FunctionDesc {
    /// Creates a scalar function descriptor.
    #[must_use]
    pub fn scalar(name: impl Into<String>, return_type: DataType) -> Self {
        Self { name: name.into(), kind: FunctionKind::Scalar, return_type }
    }

    /// Creates an aggregate function descriptor.
    #[must_use]
    pub fn aggregate(name: impl Into<String>, return_type: DataType) -> Self {
        Self { name: name.into(), kind: FunctionKind::Aggregate, return_type }
    }
}

/// Catalog lookups the planner depends on.
pub trait Catalog {
    /// Looks up a table by canonical name.
    fn table(&self, name: &str) -> Option<TableDesc>;

    /// Looks up a function by name.
    fn function(&self, name: &str) -> Option<FunctionDesc>;

    /// Returns true if the table exists.
    fn table_exists(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Returns true if the function exists.
    fn function_exists(&self, name: &str) -> bool {
        self.function(name).is_some()
    }
}

/// A catalog that knows nothing.
pub struct EmptyCatalog;

impl Catalog for EmptyCatalog {
    fn table(&self, _name: &str) -> Option<TableDesc> {
        None
    }

    fn function(&self, _name: &str) -> Option<FunctionDesc> {
        None
    }
}

/// An in-memory catalog, mainly for tests and embedded planning.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    tables: HashMap<String, TableDesc>,
    functions: HashMap<String, FunctionDesc>,
}

impl MemoryCatalog {
    /// Creates an empty in-memory catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table.
    pub fn add_table(&mut self, table: TableDesc) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Registers a function.
    pub fn add_function(&mut self, function: FunctionDesc) {
        self.functions.insert(function.name.clone(), function);
    }
}

impl Catalog for MemoryCatalog {
    fn table(&self, name: &str) -> Option<TableDesc> {
        self.tables.get(name).cloned()
    }

    fn function(&self, name: &str) -> Option<FunctionDesc> {
        self.functions.get(name).cloned()
    }
}
