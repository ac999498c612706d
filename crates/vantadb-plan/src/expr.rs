//! Scalar expression trees.
//!
//! [`EvalNode`] is the expression algebra evaluated over rows: column
//! references, constants, binary/unary operators, scalar function calls,
//! and aggregate calls. Expressions carry enough type information for the
//! planner to propagate output types and derive default column names.
//!
//! Search helpers (`column_refs`, `aggregate_calls`, `is_join_qual`) walk
//! the tree in pre-order; their traversal order is part of the contract.

// Allow builder names that match std traits - these return new
// expressions, not Self, so the traits don't fit
#![allow(clippy::should_implement_trait)]

use std::fmt;

use crate::catalog::FunctionDesc;
use crate::datum::Datum;
use crate::types::{Column, DataType};

/// Binary operators: arithmetic, comparison, and logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Arithmetic
    /// Addition (+).
    Add,
    /// Subtraction (-).
    Sub,
    /// Multiplication (*).
    Mul,
    /// Division (/).
    Div,
    /// Modulo (%).
    Mod,

    // Comparison
    /// Equal (=).
    Eq,
    /// Not equal (<>).
    NotEq,
    /// Less than (<).
    Lt,
    /// Less than or equal (<=).
    LtEq,
    /// Greater than (>).
    Gt,
    /// Greater than or equal (>=).
    GtEq,

    // Logical
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
}

impl BinaryOp {
    /// Returns true for {=, <>, <, <=, >, >=}.
    #[must_use]
    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq)
    }

    /// Returns true for AND/OR.
    #[must_use]
    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Returns true for the arithmetic operators.
    #[must_use]
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
        };
        write!(f, "{op}")
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Logical NOT.
    Not,
    /// Numeric negation (-).
    Neg,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Not => write!(f, "NOT"),
            Self::Neg => write!(f, "-"),
        }
    }
}

/// Which half of a two-phase aggregation a call computes.
///
/// `First` runs per partition on the workers; `Final` merges the partial
/// states. A freshly built aggregate is `Final` (single-phase execution
/// uses the final form directly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AggPhase {
    /// Partial, per-partition aggregation.
    First,
    /// Final, merging aggregation.
    #[default]
    Final,
}

/// An aggregate function call.
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct AggregateCall {
    /// The aggregate function.
    pub func: FunctionDesc,
    /// Argument expressions.
    pub args: Vec<EvalNode>,
    /// Whether DISTINCT is specified.
    pub distinct: bool,
    /// Which phase of a split aggregation this call computes.
    pub phase: AggPhase,
}

impl AggregateCall {
    /// Creates a new (final-phase) aggregate call.
    #[must_use]
    pub fn new(func: FunctionDesc, args: Vec<EvalNode>, distinct: bool) -> Self {
        Self { func, args, distinct, phase: AggPhase::Final }
    }

    /// Structural match on (descriptor, args, distinct), ignoring the
    /// phase flag.
    ///
    /// The two-phase transform marks a clone as first-phase and must still
    /// find the untouched final-phase original, so phase cannot take part
    /// in this match.
    #[must_use]
    pub fn same_call(&self, other: &Self) -> bool {
        self.func == other.func && self.args == other.args && self.distinct == other.distinct
    }

    /// All column references inside the call's arguments, in source order.
    #[must_use]
    pub fn column_refs(&self) -> Vec<Column> {
        let mut refs = Vec::new();
        for arg in &self.args {
            refs.extend(arg.column_refs());
        }
        refs
    }
}

impl fmt::Display for AggregateCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.func.name)?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ")")
    }
}

/// A scalar expression tree.
#[derive(Debug, Clone, PartialEq, Hash)]
pub enum EvalNode {
    /// A column reference.
    Field(Column),

    /// A typed constant.
    Const(Datum),

    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<EvalNode>,
        /// Right operand.
        right: Box<EvalNode>,
    },

    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<EvalNode>,
    },

    /// A scalar function call.
    Function {
        /// The function descriptor.
        func: FunctionDesc,
        /// Argument expressions.
        args: Vec<EvalNode>,
    },

    /// An aggregate function call.
    Aggregate(AggregateCall),
}

impl EvalNode {
    // ========== Constructors ==========

    /// Creates a column reference.
    #[must_use]
    pub fn field(column: Column) -> Self {
        Self::Field(column)
    }

    /// Creates a literal null expression.
    #[must_use]
    pub const fn null() -> Self {
        Self::Const(Datum::Null)
    }

    /// Creates a literal boolean expression.
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Const(Datum::Boolean(value))
    }

    /// Creates a literal integer expression.
    #[must_use]
    pub const fn integer(value: i64) -> Self {
        Self::Const(Datum::Integer(value))
    }

    /// Creates a literal float expression.
    #[must_use]
    pub const fn float(value: f64) -> Self {
        Self::Const(Datum::Float(value))
    }

    /// Creates a literal string expression.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Const(Datum::Text(value.into()))
    }

    /// Creates a scalar function call.
    #[must_use]
    pub fn function(func: FunctionDesc, args: Vec<Self>) -> Self {
        Self::Function { func, args }
    }

    /// Creates an aggregate call expression.
    #[must_use]
    pub fn aggregate(call: AggregateCall) -> Self {
        Self::Aggregate(call)
    }

    /// Creates a SUM aggregate over the expression.
    #[must_use]
    pub fn sum(expr: Self, distinct: bool) -> Self {
        let return_type = expr.value_type();
        Self::Aggregate(AggregateCall::new(
            FunctionDesc::aggregate("sum", return_type),
            vec![expr],
            distinct,
        ))
    }

    /// Creates a COUNT aggregate over the expression.
    #[must_use]
    pub fn count(expr: Self, distinct: bool) -> Self {
        Self::Aggregate(AggregateCall::new(
            FunctionDesc::aggregate("count", DataType::BigInt),
            vec![expr],
            distinct,
        ))
    }

    /// Creates an AVG aggregate over the expression.
    #[must_use]
    pub fn avg(expr: Self, distinct: bool) -> Self {
        Self::Aggregate(AggregateCall::new(
            FunctionDesc::aggregate("avg", DataType::DoublePrecision),
            vec![expr],
            distinct,
        ))
    }

    /// Creates a MIN aggregate over the expression.
    #[must_use]
    pub fn min(expr: Self) -> Self {
        let return_type = expr.value_type();
        Self::Aggregate(AggregateCall::new(
            FunctionDesc::aggregate("min", return_type),
            vec![expr],
            false,
        ))
    }

    /// Creates a MAX aggregate over the expression.
    #[must_use]
    pub fn max(expr: Self) -> Self {
        let return_type = expr.value_type();
        Self::Aggregate(AggregateCall::new(
            FunctionDesc::aggregate("max", return_type),
            vec![expr],
            false,
        ))
    }

    // ========== Binary operations ==========

    fn binary(self, op: BinaryOp, other: Self) -> Self {
        Self::Binary { op, left: Box::new(self), right: Box::new(other) }
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.binary(BinaryOp::And, other)
    }

    /// Creates an OR expression.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        self.binary(BinaryOp::Or, other)
    }

    /// Creates an equality expression.
    #[must_use]
    pub fn eq(self, other: Self) -> Self {
        self.binary(BinaryOp::Eq, other)
    }

    /// Creates a not-equal expression.
    #[must_use]
    pub fn not_eq(self, other: Self) -> Self {
        self.binary(BinaryOp::NotEq, other)
    }

    /// Creates a less-than expression.
    #[must_use]
    pub fn lt(self, other: Self) -> Self {
        self.binary(BinaryOp::Lt, other)
    }

    /// Creates a less-than-or-equal expression.
    #[must_use]
    pub fn lt_eq(self, other: Self) -> Self {
        self.binary(BinaryOp::LtEq, other)
    }

    /// Creates a greater-than expression.
    #[must_use]
    pub fn gt(self, other: Self) -> Self {
        self.binary(BinaryOp::Gt, other)
    }

    /// Creates a greater-than-or-equal expression.
    #[must_use]
    pub fn gt_eq(self, other: Self) -> Self {
        self.binary(BinaryOp::GtEq, other)
    }

    /// Creates an addition expression.
    #[must_use]
    pub fn add(self, other: Self) -> Self {
        self.binary(BinaryOp::Add, other)
    }

    /// Creates a subtraction expression.
    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        self.binary(BinaryOp::Sub, other)
    }

    /// Creates a multiplication expression.
    #[must_use]
    pub fn mul(self, other: Self) -> Self {
        self.binary(BinaryOp::Mul, other)
    }

    /// Creates a division expression.
    #[must_use]
    pub fn div(self, other: Self) -> Self {
        self.binary(BinaryOp::Div, other)
    }

    /// Creates a NOT expression.
    #[must_use]
    pub fn not(self) -> Self {
        Self::Unary { op: UnaryOp::Not, operand: Box::new(self) }
    }

    /// Creates a negation expression.
    #[must_use]
    pub fn neg(self) -> Self {
        Self::Unary { op: UnaryOp::Neg, operand: Box::new(self) }
    }

    // ========== Type and naming ==========

    /// Computes the value type this expression produces.
    #[must_use]
    pub fn value_type(&self) -> DataType {
        match self {
            Self::Field(col) => col.data_type.clone(),
            Self::Const(d) => d.data_type(),
            Self::Binary { op, left, right } => {
                if op.is_comparison() || op.is_logical() {
                    DataType::Boolean
                } else {
                    left.value_type().common_type(&right.value_type()).unwrap_or(DataType::Any)
                }
            }
            Self::Unary { op, operand } => match op {
                UnaryOp::Not => DataType::Boolean,
                UnaryOp::Neg => operand.value_type(),
            },
            Self::Function { func, .. } => func.return_type.clone(),
            Self::Aggregate(call) => call.func.return_type.clone(),
        }
    }

    /// Default output column name for an unaliased target over this
    /// expression.
    #[must_use]
    pub fn auto_name(&self) -> String {
        match self {
            Self::Field(col) => col.qualified_name(),
            Self::Const(d) => match d {
                Datum::Null => "null".to_string(),
                Datum::Boolean(_) => "bool".to_string(),
                Datum::Integer(_) => "int".to_string(),
                Datum::Float(_) => "float".to_string(),
                Datum::Text(_) => "string".to_string(),
            },
            Self::Binary { .. } => "expr".to_string(),
            Self::Unary { operand, .. } => operand.auto_name(),
            Self::Function { func, .. } => func.name.clone(),
            Self::Aggregate(call) => call.func.name.clone(),
        }
    }

    // ========== Traversal ==========

    /// Returns the direct children of this expression, left to right.
    #[must_use]
    pub fn children(&self) -> Vec<&EvalNode> {
        match self {
            Self::Field(_) | Self::Const(_) => vec![],
            Self::Binary { left, right, .. } => vec![left, right],
            Self::Unary { operand, .. } => vec![operand],
            Self::Function { args, .. } => args.iter().collect(),
            Self::Aggregate(call) => call.args.iter().collect(),
        }
    }

    /// Visits this expression, then its children left to right.
    pub fn pre_order<'a, F: FnMut(&'a EvalNode)>(&'a self, f: &mut F) {
        f(self);
        for child in self.children() {
            child.pre_order(f);
        }
    }

    /// Visits the children left to right, then this expression.
    pub fn post_order<'a, F: FnMut(&'a EvalNode)>(&'a self, f: &mut F) {
        for child in self.children() {
            child.post_order(f);
        }
        f(self);
    }

    /// Applies `f` to every aggregate call in the tree, outermost first.
    pub fn for_each_aggregate_mut<F: FnMut(&mut AggregateCall)>(&mut self, f: &mut F) {
        match self {
            Self::Field(_) | Self::Const(_) => {}
            Self::Binary { left, right, .. } => {
                left.for_each_aggregate_mut(f);
                right.for_each_aggregate_mut(f);
            }
            Self::Unary { operand, .. } => operand.for_each_aggregate_mut(f),
            Self::Function { args, .. } => {
                for arg in args {
                    arg.for_each_aggregate_mut(f);
                }
            }
            Self::Aggregate(call) => {
                f(call);
                for arg in &mut call.args {
                    arg.for_each_aggregate_mut(f);
                }
            }
        }
    }

    // ========== Search helpers ==========

    /// Every column reference in pre-order, duplicates preserved.
    #[must_use]
    pub fn column_refs(&self) -> Vec<Column> {
        let mut refs = Vec::new();
        self.pre_order(&mut |e| {
            if let Self::Field(col) = e {
                refs.push(col.clone());
            }
        });
        refs
    }

    /// Column references deduplicated by qualified name, in encounter
    /// order.
    #[must_use]
    pub fn distinct_columns(&self) -> Vec<Column> {
        let mut out: Vec<Column> = Vec::new();
        self.pre_order(&mut |e| {
            if let Self::Field(col) = e {
                if !out.iter().any(|c| c.qualified_name() == col.qualified_name()) {
                    out.push(col.clone());
                }
            }
        });
        out
    }

    /// Aggregate calls in the tree, distinct by
    /// [`AggregateCall::same_call`], in encounter order.
    #[must_use]
    pub fn aggregate_calls(&self) -> Vec<AggregateCall> {
        let mut out: Vec<AggregateCall> = Vec::new();
        self.pre_order(&mut |e| {
            if let Self::Aggregate(call) = e {
                if !out.iter().any(|c| c.same_call(call)) {
                    out.push(call.clone());
                }
            }
        });
        out
    }

    /// Returns true if any subexpression is an aggregate call.
    #[must_use]
    pub fn contains_aggregate(&self) -> bool {
        let mut found = false;
        self.pre_order(&mut |e| {
            if matches!(e, Self::Aggregate(_)) {
                found = true;
            }
        });
        found
    }

    /// Returns true if this is a comparison between two operands.
    #[must_use]
    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::Binary { op, .. } if op.is_comparison())
    }

    /// Returns true if this predicate connects two relations: a comparison
    /// whose sides carry exactly one column reference each, under
    /// different qualifiers.
    #[must_use]
    pub fn is_join_qual(&self) -> bool {
        let Self::Binary { op, left, right } = self else {
            return false;
        };
        if !op.is_comparison() {
            return false;
        }
        let l = left.column_refs();
        let r = right.column_refs();
        l.len() == 1 && r.len() == 1 && l[0].qualifier != r[0].qualifier
    }
}

impl fmt::Display for EvalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(col) => write!(f, "{}", col.qualified_name()),
            Self::Const(d) => write!(f, "{d}"),
            Self::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            Self::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "NOT {operand}"),
                UnaryOp::Neg => write!(f, "-{operand}"),
            },
            Self::Function { func, args } => {
                write!(f, "{}(", func.name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::Aggregate(call) => write!(f, "{call}"),
        }
    }
}
