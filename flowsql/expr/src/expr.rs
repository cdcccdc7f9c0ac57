// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The expression tree.
//!
//! Expressions are immutable after construction and equal by structural
//! comparison. The `Display` implementation produces the canonical text form,
//! which the planner uses to derive synthetic names; it is stable across
//! releases.

use flowsql_common::name::FunctionName;

use crate::operator::Operator;
use crate::schema::ColumnRef;
use crate::types::SqlType;
use crate::value::Value;

/// A call to a scalar or aggregate function. Which of the two it is, is
/// decided by the function registry, not the syntax.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: FunctionName,
    pub args: Vec<Expr>,
}

impl FunctionCall {
    pub fn new(name: impl Into<FunctionName>, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// An expression over the value columns of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant. NULL carries no type and propagates as any.
    Literal(Value),
    /// A bare or source-qualified column reference.
    Column(ColumnRef),
    /// Arithmetic, comparison or logical combination of two expressions;
    /// the operator class decides the typing rule.
    BinaryExpr {
        left: Box<Expr>,
        op: Operator,
        right: Box<Expr>,
    },
    /// Arithmetic unary minus.
    Negative(Box<Expr>),
    Not(Box<Expr>),
    IsNull(Box<Expr>),
    IsNotNull(Box<Expr>),
    Between {
        expr: Box<Expr>,
        negated: bool,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    Cast {
        expr: Box<Expr>,
        data_type: SqlType,
    },
    /// Array element (INT index, negative counts from the end) or map value
    /// (STRING index) access.
    Subscript {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// Struct field access, `base->field`.
    GetField {
        base: Box<Expr>,
        field: String,
    },
    Function(FunctionCall),
    /// `CASE` expression: simple when `operand` is present, searched
    /// otherwise.
    Case {
        operand: Option<Box<Expr>>,
        when_then: Vec<(Expr, Expr)>,
        else_expr: Option<Box<Expr>>,
    },
}

impl Expr {
    /// The column reference, if this expression is exactly one.
    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Expr::Column(column) => Some(column),
            _ => None,
        }
    }
}

/// A bare column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column(ColumnRef::bare(name))
}

/// A source-qualified column reference.
pub fn qcol(source: &str, name: &str) -> Expr {
    Expr::Column(ColumnRef::qualified(source, name))
}

/// A literal.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

/// A NULL literal.
pub fn null_lit() -> Expr {
    Expr::Literal(Value::Null)
}

pub fn binary_expr(left: Expr, op: Operator, right: Expr) -> Expr {
    Expr::BinaryExpr {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Literal(Value::String(s)) => write!(f, "'{s}'"),
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::Column(column) => write!(f, "{column}"),
            Expr::BinaryExpr { left, op, right } => write!(f, "({left} {op} {right})"),
            Expr::Negative(expr) => write!(f, "-{expr}"),
            Expr::Not(expr) => write!(f, "(NOT {expr})"),
            Expr::IsNull(expr) => write!(f, "({expr} IS NULL)"),
            Expr::IsNotNull(expr) => write!(f, "({expr} IS NOT NULL)"),
            Expr::Between {
                expr,
                negated,
                low,
                high,
            } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "({expr} {not}BETWEEN {low} AND {high})")
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "({expr} {not}LIKE {pattern})")
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "({expr} {not}IN (")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "))")
            }
            Expr::Cast { expr, data_type } => write!(f, "CAST({expr} AS {data_type})"),
            Expr::Subscript { base, index } => write!(f, "{base}[{index}]"),
            Expr::GetField { base, field } => write!(f, "{base}->{field}"),
            Expr::Function(call) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Case {
                operand,
                when_then,
                else_expr,
            } => {
                write!(f, "CASE")?;
                if let Some(operand) = operand {
                    write!(f, " {operand}")?;
                }
                for (when, then) in when_then {
                    write!(f, " WHEN {when} THEN {then}")?;
                }
                if let Some(else_expr) = else_expr {
                    write!(f, " ELSE {else_expr}")?;
                }
                write!(f, " END")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality() {
        let a = binary_expr(col("a"), Operator::Plus, lit(1));
        let b = binary_expr(col("a"), Operator::Plus, lit(1));
        let c = binary_expr(col("a"), Operator::Plus, lit(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn canonical_text() {
        assert_eq!(col("b").to_string(), "b");
        assert_eq!(qcol("S", "b").to_string(), "S.b");
        assert_eq!(
            binary_expr(col("a"), Operator::Gt, lit("x")).to_string(),
            "(a > 'x')"
        );
        assert_eq!(
            Expr::Cast {
                expr: Box::new(col("a")),
                data_type: SqlType::Bigint,
            }
            .to_string(),
            "CAST(a AS BIGINT)"
        );
        assert_eq!(
            Expr::Function(FunctionCall::new("count", vec![])).to_string(),
            "COUNT()"
        );
        assert_eq!(
            Expr::Case {
                operand: None,
                when_then: vec![(lit(true), lit(1))],
                else_expr: Some(Box::new(lit(2))),
            }
            .to_string(),
            "CASE WHEN true THEN 1 ELSE 2 END"
        );
    }
}
