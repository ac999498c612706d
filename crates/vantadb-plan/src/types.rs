//! Type system for logical plan nodes.
//!
//! This module provides the schema infrastructure shared by every plan
//! node: data type tags, qualified columns, ordered schemas, and sort
//! specifications.
//!
//! # Overview
//!
//! - [`DataType`]: the value types the planner propagates
//! - [`Column`]: a qualified column name with its type
//! - [`Schema`]: an ordered sequence of columns with name lookup
//! - [`SortSpec`]: a per-column ordering directive
//!
//! Within one schema, qualified names are unique; [`crate::validate_plan`]
//! enforces this for finished plans.

use std::fmt;

/// Data types used in the planner's type system.
///
/// These are propagation tags only. The planner compares and promotes
/// them; it never computes with values of these types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Boolean type.
    Boolean,
    /// 16-bit signed integer.
    SmallInt,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    BigInt,
    /// 32-bit floating point.
    Real,
    /// 64-bit floating point.
    DoublePrecision,
    /// Variable-length string with optional max length.
    Varchar(Option<u32>),
    /// Unlimited-length text.
    Text,
    /// Date.
    Date,
    /// Timestamp without timezone.
    Timestamp,
    /// Null type (for NULL literals).
    Null,
    /// Any type (unknown, to be inferred later).
    Any,
}

impl DataType {
    /// Returns true if this type is numeric.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::SmallInt | Self::Integer | Self::BigInt | Self::Real | Self::DoublePrecision
        )
    }

    /// Returns true if this type is a string type.
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::Varchar(_) | Self::Text)
    }

    /// Determines the common type for a binary operation between two types.
    ///
    /// Returns the "wider" type that both can be coerced to, or None if
    /// the types are incompatible.
    #[must_use]
    pub fn common_type(&self, other: &Self) -> Option<Self> {
        if self == other {
            return Some(self.clone());
        }
        // Any and Null adapt to the other side
        if matches!(self, Self::Any | Self::Null) {
            return Some(other.clone());
        }
        if matches!(other, Self::Any | Self::Null) {
            return Some(self.clone());
        }
        if self.is_numeric() && other.is_numeric() {
            return Some(promote_numeric(self, other));
        }
        if self.is_string() && other.is_string() {
            return Some(Self::Text);
        }
        if matches!(self, Self::Date) && matches!(other, Self::Timestamp) {
            return Some(Self::Timestamp);
        }
        if matches!(other, Self::Date) && matches!(self, Self::Timestamp) {
            return Some(Self::Timestamp);
        }
        None
    }
}

/// Promotes two numeric types to their common supertype.
fn promote_numeric(a: &DataType, b: &DataType) -> DataType {
    fn rank(t: &DataType) -> u8 {
        match t {
            DataType::SmallInt => 1,
            DataType::Integer => 2,
            DataType::BigInt => 3,
            DataType::Real => 4,
            DataType::DoublePrecision => 5,
            _ => 0,
        }
    }

    if rank(a) >= rank(b) {
        a.clone()
    } else {
        b.clone()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "BOOLEAN"),
            Self::SmallInt => write!(f, "SMALLINT"),
            Self::Integer => write!(f, "INTEGER"),
            Self::BigInt => write!(f, "BIGINT"),
            Self::Real => write!(f, "REAL"),
            Self::DoublePrecision => write!(f, "DOUBLE PRECISION"),
            Self::Varchar(len) => {
                write!(f, "VARCHAR")?;
                if let Some(l) = len {
                    write!(f, "({l})")?;
                }
                Ok(())
            }
            Self::Text => write!(f, "TEXT"),
            Self::Date => write!(f, "DATE"),
            Self::Timestamp => write!(f, "TIMESTAMP"),
            Self::Null => write!(f, "NULL"),
            Self::Any => write!(f, "ANY"),
        }
    }
}

/// A column with an optional relation qualifier and a type.
///
/// Two columns are equal when their qualified names and types match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    /// Relation qualifier (table canonical name or alias).
    pub qualifier: Option<String>,
    /// Column name.
    pub name: String,
    /// Column data type.
    pub data_type: DataType,
}

impl Column {
    /// Creates a new unqualified column.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self { qualifier: None, name: name.into(), data_type }
    }

    /// Sets the qualifier for this column.
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Removes the qualifier, keeping the local name.
    #[must_use]
    pub fn without_qualifier(mut self) -> Self {
        self.qualifier = None;
        self
    }

    /// Returns true if this column carries a qualifier.
    #[must_use]
    pub fn has_qualifier(&self) -> bool {
        self.qualifier.is_some()
    }

    /// Returns the qualified name of this column (e.g., "orders.amount").
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.qualifier {
            Some(q) => format!("{}.{}", q, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.qualified_name(), self.data_type)
    }
}

/// A schema: the ordered columns of a relation or an operator's row shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a new schema with the given columns.
    #[must_use]
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Creates an empty schema.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Looks up a column by local name.
    ///
    /// When several columns share a local name under different qualifiers,
    /// the first match in declaration order wins; disambiguation is the
    /// caller's concern.
    #[must_use]
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column by qualifier and local name.
    #[must_use]
    pub fn column_by_qualified(&self, qualifier: &str, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.qualifier.as_deref() == Some(qualifier) && c.name == name)
    }

    /// Looks up a column by its rendered qualified name.
    #[must_use]
    pub fn column_by_qualified_name(&self, qualified: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.qualified_name() == qualified)
    }

    /// Returns the position of a column by its rendered qualified name.
    #[must_use]
    pub fn index_of_qualified_name(&self, qualified: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.qualified_name() == qualified)
    }

    /// Returns true if a column with the given qualified name exists.
    #[must_use]
    pub fn contains_qualified(&self, qualified: &str) -> bool {
        self.column_by_qualified_name(qualified).is_some()
    }

    /// Appends a column.
    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Merges two schemas, concatenating the columns of both.
    ///
    /// Used for joins and set operations where both inputs contribute.
    #[must_use]
    pub fn merge(&self, other: &Schema) -> Schema {
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());
        Schema { columns }
    }

    /// Creates a new schema with every column requalified.
    #[must_use]
    pub fn with_qualifier(&self, qualifier: impl Into<String>) -> Schema {
        let q = qualifier.into();
        Schema {
            columns: self.columns.iter().map(|c| c.clone().with_qualifier(q.clone())).collect(),
        }
    }

    /// Returns an iterator over the columns.
    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{col}")?;
        }
        write!(f, ")")
    }
}

impl IntoIterator for Schema {
    type Item = Column;
    type IntoIter = std::vec::IntoIter<Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

impl FromIterator<Column> for Schema {
    fn from_iter<T: IntoIterator<Item = Column>>(iter: T) -> Self {
        Schema { columns: iter.into_iter().collect() }
    }
}

/// A sort specification: a key column with direction and null placement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortSpec {
    /// The sort key column.
    pub column: Column,
    /// Whether to sort ascending.
    pub ascending: bool,
    /// Whether nulls sort before non-nulls.
    pub nulls_first: bool,
}

impl SortSpec {
    /// Creates an ascending, nulls-last sort spec.
    #[must_use]
    pub fn new(column: Column) -> Self {
        Self { column, ascending: true, nulls_first: false }
    }

    /// Creates a descending sort spec.
    #[must_use]
    pub fn desc(column: Column) -> Self {
        Self { column, ascending: false, nulls_first: false }
    }

    /// Sets nulls-first ordering.
    #[must_use]
    pub fn with_nulls_first(mut self) -> Self {
        self.nulls_first = true;
        self
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column.qualified_name())?;
        write!(f, "{}", if self.ascending { " ASC" } else { " DESC" })?;
        if self.nulls_first {
            write!(f, " NULLS FIRST")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_type_promotion() {
        assert_eq!(DataType::Integer.common_type(&DataType::Integer), Some(DataType::Integer));
        assert_eq!(DataType::Integer.common_type(&DataType::BigInt), Some(DataType::BigInt));
        assert_eq!(
            DataType::Integer.common_type(&DataType::DoublePrecision),
            Some(DataType::DoublePrecision)
        );
        assert_eq!(DataType::Text.common_type(&DataType::Varchar(Some(16))), Some(DataType::Text));
        assert_eq!(DataType::Any.common_type(&DataType::Integer), Some(DataType::Integer));
        assert_eq!(DataType::Integer.common_type(&DataType::Boolean), None);
    }

    #[test]
    fn column_qualified_name() {
        let col = Column::new("amount", DataType::BigInt).with_qualifier("orders");
        assert!(col.has_qualifier());
        assert_eq!(col.qualified_name(), "orders.amount");

        let stripped = col.without_qualifier();
        assert!(!stripped.has_qualifier());
        assert_eq!(stripped.qualified_name(), "amount");
    }

    #[test]
    fn column_equality_includes_type() {
        let a = Column::new("x", DataType::Integer).with_qualifier("t");
        let b = Column::new("x", DataType::BigInt).with_qualifier("t");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn schema_lookup() {
        let schema = Schema::new(vec![
            Column::new("id", DataType::BigInt).with_qualifier("users"),
            Column::new("id", DataType::BigInt).with_qualifier("orders"),
            Column::new("name", DataType::Text).with_qualifier("users"),
        ]);

        // local-name lookup returns the first match in declaration order
        let first = schema.column_by_name("id").unwrap();
        assert_eq!(first.qualifier.as_deref(), Some("users"));

        assert!(schema.contains_qualified("orders.id"));
        assert!(!schema.contains_qualified("products.id"));
        assert_eq!(schema.index_of_qualified_name("users.name"), Some(2));
        assert!(schema.column_by_qualified("orders", "id").is_some());
    }

    #[test]
    fn schema_merge_and_requalify() {
        let left = Schema::new(vec![Column::new("a", DataType::Integer).with_qualifier("t")]);
        let right = Schema::new(vec![Column::new("b", DataType::Integer).with_qualifier("u")]);

        let merged = left.merge(&right);
        assert_eq!(merged.len(), 2);
        assert!(merged.contains_qualified("t.a"));
        assert!(merged.contains_qualified("u.b"));

        let requalified = merged.with_qualifier("sub");
        assert!(requalified.contains_qualified("sub.a"));
        assert!(requalified.contains_qualified("sub.b"));
    }

    #[test]
    fn sort_spec_defaults() {
        let spec = SortSpec::new(Column::new("x", DataType::Integer));
        assert!(spec.ascending);
        assert!(!spec.nulls_first);
        assert_eq!(spec.to_string(), "x ASC");

        let spec = SortSpec::desc(Column::new("x", DataType::Integer)).with_nulls_first();
        assert_eq!(spec.to_string(), "x DESC NULLS FIRST");
    }
}
