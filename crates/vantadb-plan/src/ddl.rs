//! DDL plan nodes.
//!
//! Payloads for data-definition statements. These are leaf nodes: the
//! planner hands them to the master verbatim, and nothing in the tree
//! depends on their schemas.

use crate::catalog::PartitionMethod;
use crate::types::{Column, Schema};

/// CREATE TABLE.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreateTableNode {
    /// The table name.
    pub table_name: String,
    /// The table schema.
    pub schema: Schema,
    /// Whether IF NOT EXISTS was specified.
    pub if_not_exists: bool,
    /// Optional partitioning.
    pub partition: Option<PartitionMethod>,
}

impl CreateTableNode {
    /// Creates a new CREATE TABLE node.
    #[must_use]
    pub fn new(table_name: impl Into<String>, schema: Schema) -> Self {
        Self { table_name: table_name.into(), schema, if_not_exists: false, partition: None }
    }

    /// Sets IF NOT EXISTS.
    #[must_use]
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Sets the partition method.
    #[must_use]
    pub fn with_partition(mut self, partition: PartitionMethod) -> Self {
        self.partition = Some(partition);
        self
    }
}

/// DROP TABLE.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DropTableNode {
    /// The table name.
    pub table_name: String,
    /// Whether IF EXISTS was specified.
    pub if_exists: bool,
}

impl DropTableNode {
    /// Creates a new DROP TABLE node.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        Self { table_name: table_name.into(), if_exists: false }
    }

    /// Sets IF EXISTS.
    #[must_use]
    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }
}

/// CREATE DATABASE.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreateDatabaseNode {
    /// The database name.
    pub database_name: String,
    /// Whether IF NOT EXISTS was specified.
    pub if_not_exists: bool,
}

impl CreateDatabaseNode {
    /// Creates a new CREATE DATABASE node.
    #[must_use]
    pub fn new(database_name: impl Into<String>) -> Self {
        Self { database_name: database_name.into(), if_not_exists: false }
    }

    /// Sets IF NOT EXISTS.
    #[must_use]
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }
}

/// DROP DATABASE.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DropDatabaseNode {
    /// The database name.
    pub database_name: String,
    /// Whether IF EXISTS was specified.
    pub if_exists: bool,
}

impl DropDatabaseNode {
    /// Creates a new DROP DATABASE node.
    #[must_use]
    pub fn new(database_name: impl Into<String>) -> Self {
        Self { database_name: database_name.into(), if_exists: false }
    }

    /// Sets IF EXISTS.
    #[must_use]
    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }
}

/// CREATE INDEX.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreateIndexNode {
    /// The index name.
    pub index_name: String,
    /// The indexed table.
    pub table_name: String,
    /// The indexed columns.
    pub columns: Vec<Column>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl CreateIndexNode {
    /// Creates a new CREATE INDEX node.
    #[must_use]
    pub fn new(
        index_name: impl Into<String>,
        table_name: impl Into<String>,
        columns: Vec<Column>,
    ) -> Self {
        Self {
            index_name: index_name.into(),
            table_name: table_name.into(),
            columns,
            unique: false,
        }
    }

    /// Makes the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// DROP INDEX.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DropIndexNode {
    /// The index name.
    pub index_name: String,
    /// Whether IF EXISTS was specified.
    pub if_exists: bool,
}

impl DropIndexNode {
    /// Creates a new DROP INDEX node.
    #[must_use]
    pub fn new(index_name: impl Into<String>) -> Self {
        Self { index_name: index_name.into(), if_exists: false }
    }

    /// Sets IF EXISTS.
    #[must_use]
    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }
}
