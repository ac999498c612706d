//! Projection targets and target/schema conversions.
//!
//! A [`Target`] is a named output expression of a projection or
//! aggregation. The conversions here are what keep operator schemas and
//! target lists consistent while rewrites shuffle them around.

use std::fmt;

use crate::expr::EvalNode;
use crate::types::{Column, Schema};

/// An output expression with an optional alias.
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct Target {
    /// The expression producing the output value.
    pub expr: EvalNode,
    /// Output column alias; the expression's auto name applies when unset.
    pub alias: Option<String>,
}

impl Target {
    /// Creates an unaliased target.
    #[must_use]
    pub fn new(expr: EvalNode) -> Self {
        Self { expr, alias: None }
    }

    /// Creates an aliased target.
    #[must_use]
    pub fn aliased(expr: EvalNode, alias: impl Into<String>) -> Self {
        Self { expr, alias: Some(alias.into()) }
    }

    /// Returns true if this target carries an alias.
    #[must_use]
    pub fn has_alias(&self) -> bool {
        self.alias.is_some()
    }

    /// The name of the output column this target produces.
    #[must_use]
    pub fn output_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.expr.auto_name(),
        }
    }

    /// The output column this target produces.
    ///
    /// An unaliased bare field target passes its column through unchanged;
    /// an alias always produces an unqualified column named by it.
    #[must_use]
    pub fn output_column(&self) -> Column {
        match (&self.alias, &self.expr) {
            (Some(alias), expr) => Column::new(alias.clone(), expr.value_type()),
            (None, EvalNode::Field(col)) => col.clone(),
            (None, expr) => Column::new(expr.auto_name(), expr.value_type()),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {alias}")?;
        }
        Ok(())
    }
}

/// Builds the output schema a target list produces.
#[must_use]
pub fn targets_to_schema(targets: &[Target]) -> Schema {
    targets.iter().map(Target::output_column).collect()
}

/// Wraps each schema column in a bare field-reference target.
///
/// The reversible shape of [`targets_to_schema`].
#[must_use]
pub fn schema_to_targets(schema: &Schema) -> Vec<Target> {
    schema.iter().map(|col| Target::new(EvalNode::field(col.clone()))).collect()
}

/// Deep-copies the targets, removing the column qualifier from every
/// field-reference target.
///
/// Used when pushing targets across a relation boundary, where the inner
/// qualifier no longer names anything.
#[must_use]
pub fn strip_targets(targets: &[Target]) -> Vec<Target> {
    targets
        .iter()
        .map(|t| {
            let mut copy = t.clone();
            if let EvalNode::Field(col) = &copy.expr {
                if col.has_qualifier() {
                    copy.expr = EvalNode::field(col.clone().without_qualifier());
                }
            }
            copy
        })
        .collect()
}
