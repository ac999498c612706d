//! Constant values and tuple comparison.
//!
//! [`Datum`] is the typed constant carried by literal expressions.
//! [`Tuple`] and [`TupleComparator`] exist for the merge-join support
//! surface: comparators derived from a join qualifier compare rows of one
//! input schema by the extracted key columns.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{PlanError, PlanResult};
use crate::types::{DataType, Schema, SortSpec};

/// A typed constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    /// Null value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// UTF-8 string.
    Text(String),
}

impl Datum {
    /// Returns the data type tag of this value.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Boolean(_) => DataType::Boolean,
            Self::Integer(_) => DataType::BigInt,
            Self::Float(_) => DataType::DoublePrecision,
            Self::Text(_) => DataType::Text,
        }
    }

    /// Returns true if this is the null value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Total ordering over values, with numeric cross-type comparison.
    ///
    /// Null placement is the comparator's concern, not this function's;
    /// here NULL orders before every non-null value. Values of unrelated
    /// types order by type tag so the ordering stays total.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        fn rank(d: &Datum) -> u8 {
            match d {
                Datum::Null => 0,
                Datum::Boolean(_) => 1,
                Datum::Integer(_) | Datum::Float(_) => 2,
                Datum::Text(_) => 3,
            }
        }

        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Integer(a), Self::Float(b)) => (*a as f64).total_cmp(b),
            (Self::Float(a), Self::Integer(b)) => a.total_cmp(&(*b as f64)),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }
}

// Floats hash by bit pattern so hashing stays consistent with equality.
impl Hash for Datum {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Boolean(b) => b.hash(state),
            Self::Integer(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "'{s}'"),
        }
    }
}

/// A row of values, positionally aligned with some schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tuple {
    values: Vec<Datum>,
}

impl Tuple {
    /// Creates a tuple from its values.
    #[must_use]
    pub fn new(values: Vec<Datum>) -> Self {
        Self { values }
    }

    /// Returns the value at the given position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Datum> {
        self.values.get(index)
    }

    /// Returns the values of this tuple.
    #[must_use]
    pub fn values(&self) -> &[Datum] {
        &self.values
    }
}

#[derive(Debug, Clone)]
struct SortKey {
    index: usize,
    ascending: bool,
    nulls_first: bool,
}

/// Compares tuples of one schema by a list of sort specs.
///
/// Key columns are resolved to positions once, at construction.
#[derive(Debug, Clone)]
pub struct TupleComparator {
    keys: Vec<SortKey>,
}

impl TupleComparator {
    /// Builds a comparator for the given schema and sort specs.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvariantViolation`] if a sort key column is
    /// not present in the schema.
    pub fn new(schema: &Schema, specs: &[SortSpec]) -> PlanResult<Self> {
        let mut keys = Vec::with_capacity(specs.len());
        for spec in specs {
            let qualified = spec.column.qualified_name();
            let index = schema.index_of_qualified_name(&qualified).ok_or_else(|| {
                PlanError::InvariantViolation(format!(
                    "sort key {qualified} is not part of the schema {schema}"
                ))
            })?;
            keys.push(SortKey { index, ascending: spec.ascending, nulls_first: spec.nulls_first });
        }
        Ok(Self { keys })
    }

    /// Compares two tuples by the configured keys.
    ///
    /// A missing position orders as NULL.
    #[must_use]
    pub fn compare(&self, left: &Tuple, right: &Tuple) -> Ordering {
        for key in &self.keys {
            let l = left.get(key.index).unwrap_or(&Datum::Null);
            let r = right.get(key.index).unwrap_or(&Datum::Null);

            let ord = match (l.is_null(), r.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => {
                    if key.nulls_first {
                        Ordering::Less
                    } else {
                        Ordering::Greater
                    }
                }
                (false, true) => {
                    if key.nulls_first {
                        Ordering::Greater
                    } else {
                        Ordering::Less
                    }
                }
                (false, false) => {
                    let ord = l.compare(r);
                    if key.ascending {
                        ord
                    } else {
                        ord.reverse()
                    }
                }
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    fn schema() -> Schema {
        Schema::new(vec![
            Column::new("a", DataType::BigInt).with_qualifier("t"),
            Column::new("b", DataType::Text).with_qualifier("t"),
        ])
    }

    #[test]
    fn datum_compare_cross_numeric() {
        assert_eq!(Datum::Integer(2).compare(&Datum::Float(2.5)), Ordering::Less);
        assert_eq!(Datum::Float(3.0).compare(&Datum::Integer(3)), Ordering::Equal);
        assert_eq!(Datum::Text("b".into()).compare(&Datum::Text("a".into())), Ordering::Greater);
    }

    #[test]
    fn comparator_orders_by_keys() {
        let specs = vec![SortSpec::new(Column::new("a", DataType::BigInt).with_qualifier("t"))];
        let cmp = TupleComparator::new(&schema(), &specs).unwrap();

        let low = Tuple::new(vec![Datum::Integer(1), Datum::Text("x".into())]);
        let high = Tuple::new(vec![Datum::Integer(9), Datum::Text("x".into())]);
        assert_eq!(cmp.compare(&low, &high), Ordering::Less);
        assert_eq!(cmp.compare(&high, &low), Ordering::Greater);
        assert_eq!(cmp.compare(&low, &low), Ordering::Equal);
    }

    #[test]
    fn comparator_nulls_last_by_default() {
        let specs = vec![SortSpec::new(Column::new("a", DataType::BigInt).with_qualifier("t"))];
        let cmp = TupleComparator::new(&schema(), &specs).unwrap();

        let null = Tuple::new(vec![Datum::Null, Datum::Text("x".into())]);
        let value = Tuple::new(vec![Datum::Integer(1), Datum::Text("x".into())]);
        assert_eq!(cmp.compare(&null, &value), Ordering::Greater);
        assert_eq!(cmp.compare(&value, &null), Ordering::Less);
    }

    #[test]
    fn comparator_descending() {
        let specs = vec![SortSpec::desc(Column::new("a", DataType::BigInt).with_qualifier("t"))];
        let cmp = TupleComparator::new(&schema(), &specs).unwrap();

        let low = Tuple::new(vec![Datum::Integer(1)]);
        let high = Tuple::new(vec![Datum::Integer(9)]);
        assert_eq!(cmp.compare(&low, &high), Ordering::Greater);
    }

    #[test]
    fn comparator_rejects_unknown_key() {
        let specs = vec![SortSpec::new(Column::new("missing", DataType::BigInt))];
        assert!(TupleComparator::new(&schema(), &specs).is_err());
    }
}
