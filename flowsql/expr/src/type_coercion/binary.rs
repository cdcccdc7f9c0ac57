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

//! Coercion rules for matching argument types for binary operators.

use flowsql_common::error::{Error, Result};

use crate::operator::Operator;
use crate::type_coercion::decimal_of_integral;
use crate::types::{SqlType, DECIMAL_MAX_PRECISION};

/// The type signature of an instantiation of a binary expression.
pub struct Signature {
    /// The type to widen the left argument to.
    pub lhs: SqlType,
    /// The type to widen the right argument to.
    pub rhs: SqlType,
    /// The return type of the expression.
    pub ret: SqlType,
}

impl Signature {
    /// A signature where the inputs are widened to the same type as the output.
    fn coerced(t: SqlType) -> Self {
        Self {
            lhs: t.clone(),
            rhs: t.clone(),
            ret: t,
        }
    }

    /// A signature where the inputs are widened to the same type with a
    /// boolean output.
    fn comparison(t: SqlType) -> Self {
        Self {
            lhs: t.clone(),
            rhs: t,
            ret: SqlType::Boolean,
        }
    }
}

/// Returns a [`Signature`] for applying `op` to arguments of type `lhs` and `rhs`.
pub fn signature(lhs: &SqlType, op: &Operator, rhs: &SqlType) -> Result<Signature> {
    match op {
        Operator::Eq | Operator::NotEq => eq_coercion(lhs, rhs)
            .map(Signature::comparison)
            .ok_or_else(|| {
                Error::ComparisonIncompatibleTypes(format!("{lhs} {op} {rhs}"))
            }),
        Operator::Lt | Operator::LtEq | Operator::Gt | Operator::GtEq => {
            order_coercion(lhs, rhs)
                .map(Signature::comparison)
                .ok_or_else(|| {
                    Error::ComparisonIncompatibleTypes(format!("{lhs} {op} {rhs}"))
                })
        }
        Operator::And | Operator::Or => match (lhs, rhs) {
            (SqlType::Boolean, SqlType::Boolean) => {
                Ok(Signature::coerced(SqlType::Boolean))
            }
            _ => Err(Error::TypeMismatch(format!(
                "logical operator {op} requires BOOLEAN operands, got {lhs} and {rhs}"
            ))),
        },
        Operator::Plus
        | Operator::Minus
        | Operator::Multiply
        | Operator::Divide
        | Operator::Modulo => arithmetic_signature(lhs, op, rhs).ok_or_else(|| {
            Error::ArithmeticTypeMismatch(format!("{lhs} {op} {rhs}"))
        }),
    }
}

/// Returns the resulting type of a binary expression evaluating `op` with the
/// left and right hand types.
pub fn get_result_type(lhs: &SqlType, op: &Operator, rhs: &SqlType) -> Result<SqlType> {
    signature(lhs, op, rhs).map(|sig| sig.ret)
}

/// Returns the widened input types for a binary expression evaluating `op`
/// with the left and right hand types.
pub fn get_input_types(
    lhs: &SqlType,
    op: &Operator,
    rhs: &SqlType,
) -> Result<(SqlType, SqlType)> {
    signature(lhs, op, rhs).map(|sig| (sig.lhs, sig.rhs))
}

/// Widen `lhs` and `rhs` to a common type for an equality comparison.
///
/// Equality admits numeric cross-type comparison; STRING compares only with
/// STRING; BOOLEAN only with BOOLEAN; container types only with an identical
/// type.
pub fn eq_coercion(lhs: &SqlType, rhs: &SqlType) -> Option<SqlType> {
    if lhs == rhs {
        return Some(lhs.clone());
    }
    binary_numeric_coercion(lhs, rhs)
}

/// Widen `lhs` and `rhs` to a common type for an ordering comparison.
///
/// Orderings exist for the numeric types (cross-type, decimal widens the
/// smaller side) and for STRING with STRING. BOOLEAN and the container types
/// have no ordering.
pub fn order_coercion(lhs: &SqlType, rhs: &SqlType) -> Option<SqlType> {
    match (lhs, rhs) {
        (SqlType::String, SqlType::String) => Some(SqlType::String),
        _ if lhs == rhs && lhs.is_numeric() => Some(lhs.clone()),
        _ => binary_numeric_coercion(lhs, rhs),
    }
}

/// Widen two numeric types to the type both can be compared in, maintaining
/// maximum precision. These are ordered from most informative to least
/// informative so that the coercion does not lose information.
fn binary_numeric_coercion(lhs: &SqlType, rhs: &SqlType) -> Option<SqlType> {
    if !lhs.is_numeric() || !rhs.is_numeric() {
        return None;
    }
    match (lhs, rhs) {
        (SqlType::Double, _) | (_, SqlType::Double) => Some(SqlType::Double),
        (SqlType::Decimal { .. }, _) | (_, SqlType::Decimal { .. }) => {
            let lhs = as_decimal(lhs)?;
            let rhs = as_decimal(rhs)?;
            Some(wider_decimal(&lhs, &rhs))
        }
        (SqlType::Bigint, _) | (_, SqlType::Bigint) => Some(SqlType::Bigint),
        (SqlType::Integer, SqlType::Integer) => Some(SqlType::Integer),
        _ => None,
    }
}

/// The smallest decimal type that can hold every value of both inputs.
fn wider_decimal(lhs: &SqlType, rhs: &SqlType) -> SqlType {
    let (p1, s1) = decimal_parts(lhs);
    let (p2, s2) = decimal_parts(rhs);
    let scale = s1.max(s2);
    let integral = (p1 - s1).max(p2 - s2);
    clamped_decimal(integral as u16 + scale as u16, scale as u16)
}

fn as_decimal(t: &SqlType) -> Option<SqlType> {
    match t {
        SqlType::Decimal { .. } => Some(t.clone()),
        _ => decimal_of_integral(t),
    }
}

fn decimal_parts(t: &SqlType) -> (u8, u8) {
    match t {
        SqlType::Decimal { precision, scale } => (*precision, *scale),
        _ => unreachable!("decimal_parts called on non-decimal type"),
    }
}

/// Clamp a computed precision/scale pair into the representable range.
fn clamped_decimal(precision: u16, scale: u16) -> SqlType {
    let precision = precision.clamp(1, DECIMAL_MAX_PRECISION as u16) as u8;
    let scale = scale.min(precision as u16) as u8;
    SqlType::Decimal { precision, scale }
}

fn arithmetic_signature(lhs: &SqlType, op: &Operator, rhs: &SqlType) -> Option<Signature> {
    if !lhs.is_numeric() || !rhs.is_numeric() {
        return None;
    }
    match (lhs, rhs) {
        // double absorbs everything, decimals included
        (SqlType::Double, _) | (_, SqlType::Double) => {
            Some(Signature::coerced(SqlType::Double))
        }
        (SqlType::Decimal { .. }, _) | (_, SqlType::Decimal { .. }) => {
            let lhs = as_decimal(lhs)?;
            let rhs = as_decimal(rhs)?;
            let ret = decimal_arithmetic_type(op, &lhs, &rhs);
            Some(Signature { lhs, rhs, ret })
        }
        // integer arithmetic stays integral, 64 bits win
        (SqlType::Bigint, _) | (_, SqlType::Bigint) => {
            Some(Signature::coerced(SqlType::Bigint))
        }
        (SqlType::Integer, SqlType::Integer) => Some(Signature::coerced(SqlType::Integer)),
        _ => None,
    }
}

/// The result type of decimal arithmetic, before any value is computed. The
/// evaluator rescales its exact result to this type.
pub fn decimal_arithmetic_type(op: &Operator, lhs: &SqlType, rhs: &SqlType) -> SqlType {
    let (p1, s1) = decimal_parts(lhs);
    let (p2, s2) = decimal_parts(rhs);
    let (p1, s1, p2, s2) = (p1 as u16, s1 as u16, p2 as u16, s2 as u16);
    match op {
        Operator::Plus | Operator::Minus => {
            let scale = s1.max(s2);
            clamped_decimal((p1 - s1).max(p2 - s2) + scale + 1, scale)
        }
        Operator::Multiply => clamped_decimal(p1 + p2 + 1, s1 + s2),
        Operator::Divide => {
            let scale = s1.max(s2);
            let precision = (p1 - s1).max(p2 - s2) + scale;
            clamped_decimal(precision + 5, scale + 6)
        }
        Operator::Modulo => {
            let scale = s1.max(s2);
            clamped_decimal((p1 - s1).min(p2 - s2) + scale, scale)
        }
        _ => unreachable!("decimal_arithmetic_type called with non-arithmetic operator"),
    }
}
