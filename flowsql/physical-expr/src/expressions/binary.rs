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

//! Binary expression evaluation.
//!
//! Numeric semantics follow the inferred types exactly: integral arithmetic
//! is checked, decimal arithmetic is exact with the result rescaled to the
//! inferred scale, and a comparison between DECIMAL and a non-decimal widens
//! the non-decimal side. `AND`/`OR` short-circuit; a comparison with a NULL
//! operand is `false`.

use std::cmp::Ordering;
use std::sync::Arc;

use bigdecimal::rounding::RoundingMode;
use bigdecimal::BigDecimal;
use flowsql_common::error::{Error, Result};
use flowsql_common::internal_err;
use flowsql_expr::operator::Operator;
use flowsql_expr::types::SqlType;
use flowsql_expr::value::{compare_values, Value};

use crate::decimal::{rescale_exact, to_decimal};
use crate::expressions::cast::cast_value;
use crate::physical_expr::PhysicalExpr;

/// Binary expression.
#[derive(Debug)]
pub struct BinaryExpr {
    left: Arc<dyn PhysicalExpr>,
    op: Operator,
    right: Arc<dyn PhysicalExpr>,
    /// Widened operand types, when both operand types are known.
    input_types: Option<(SqlType, SqlType)>,
    data_type: Option<SqlType>,
}

impl BinaryExpr {
    pub fn new(
        left: Arc<dyn PhysicalExpr>,
        op: Operator,
        right: Arc<dyn PhysicalExpr>,
        input_types: Option<(SqlType, SqlType)>,
        data_type: Option<SqlType>,
    ) -> Self {
        Self {
            left,
            op,
            right,
            input_types,
            data_type,
        }
    }

    fn evaluate_logical(&self, row: &[Value]) -> Result<Value> {
        // NULL operands behave as false, so both operators can short-circuit
        let left = truthy(self.left.evaluate(row)?);
        let result = match self.op {
            Operator::And => left && truthy(self.right.evaluate(row)?),
            Operator::Or => left || truthy(self.right.evaluate(row)?),
            _ => return internal_err!("{} is not a logical operator", self.op),
        };
        Ok(Value::Boolean(result))
    }

    fn evaluate_comparison(&self, row: &[Value]) -> Result<Value> {
        let left = self.left.evaluate(row)?;
        let right = self.right.evaluate(row)?;
        if left.is_null() || right.is_null() {
            return Ok(Value::Boolean(false));
        }
        let (left, right) = match &self.input_types {
            Some((left_type, right_type)) => {
                (cast_value(&left, left_type)?, cast_value(&right, right_type)?)
            }
            None => (left, right),
        };
        let ordering = compare_values(&left, &right);
        // container values have no ordering, but equality still holds
        let result = match (self.op, ordering) {
            (Operator::Eq, Some(ordering)) => ordering == Ordering::Equal,
            (Operator::Eq, None) => left == right,
            (Operator::NotEq, Some(ordering)) => ordering != Ordering::Equal,
            (Operator::NotEq, None) => left != right,
            (Operator::Lt, Some(ordering)) => ordering == Ordering::Less,
            (Operator::LtEq, Some(ordering)) => ordering != Ordering::Greater,
            (Operator::Gt, Some(ordering)) => ordering == Ordering::Greater,
            (Operator::GtEq, Some(ordering)) => ordering != Ordering::Less,
            (op, None) if op.is_comparison() => {
                return Err(Error::Evaluation(format!(
                    "cannot compare {left} with {right}"
                )))
            }
            _ => return internal_err!("{} is not a comparison operator", self.op),
        };
        Ok(Value::Boolean(result))
    }

    fn evaluate_arithmetic(&self, row: &[Value]) -> Result<Value> {
        let left = self.left.evaluate(row)?;
        let right = self.right.evaluate(row)?;
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }
        match &self.data_type {
            Some(SqlType::Double) => {
                let l = as_f64(&left)?;
                let r = as_f64(&right)?;
                Ok(Value::Double(match self.op {
                    Operator::Plus => l + r,
                    Operator::Minus => l - r,
                    Operator::Multiply => l * r,
                    Operator::Divide => l / r,
                    Operator::Modulo => l % r,
                    _ => return internal_err!("{} is not arithmetic", self.op),
                }))
            }
            Some(SqlType::Bigint) => {
                let l = as_i64(&left)?;
                let r = as_i64(&right)?;
                checked_integral(self.op, l, r, i64::checked_add, i64::checked_sub,
                    i64::checked_mul, i64::checked_div, i64::checked_rem)
                    .map(Value::Bigint)
            }
            Some(SqlType::Integer) => {
                let l = as_i32(&left)?;
                let r = as_i32(&right)?;
                checked_integral(self.op, l, r, i32::checked_add, i32::checked_sub,
                    i32::checked_mul, i32::checked_div, i32::checked_rem)
                    .map(Value::Integer)
            }
            Some(SqlType::Decimal { precision, scale }) => {
                self.evaluate_decimal(&left, &right, *precision, *scale)
            }
            other => internal_err!("arithmetic cannot produce {other:?}"),
        }
    }

    fn evaluate_decimal(
        &self,
        left: &Value,
        right: &Value,
        precision: u8,
        scale: u8,
    ) -> Result<Value> {
        let l = to_decimal(left).ok_or_else(|| {
            Error::Evaluation(format!("{left} is not a decimal operand"))
        })?;
        let r = to_decimal(right).ok_or_else(|| {
            Error::Evaluation(format!("{right} is not a decimal operand"))
        })?;
        let context = format!("{l} {} {r}", self.op);
        let exact = match self.op {
            Operator::Plus => &l + &r,
            Operator::Minus => &l - &r,
            Operator::Multiply => &l * &r,
            Operator::Divide => {
                if is_zero(&r) {
                    return Err(Error::Evaluation(format!("division by zero: {context}")));
                }
                &l / &r
            }
            Operator::Modulo => {
                if is_zero(&r) {
                    return Err(Error::Evaluation(format!("division by zero: {context}")));
                }
                let quotient = (&l / &r).with_scale_round(0, RoundingMode::Down);
                &l - &(&quotient * &r)
            }
            _ => return internal_err!("{} is not arithmetic", self.op),
        };
        rescale_exact(&exact, precision, scale, &context).map(Value::Decimal)
    }
}

impl PhysicalExpr for BinaryExpr {
    fn data_type(&self) -> Option<SqlType> {
        self.data_type.clone()
    }

    fn evaluate(&self, row: &[Value]) -> Result<Value> {
        if self.op.is_logical() {
            self.evaluate_logical(row)
        } else if self.op.is_comparison() {
            self.evaluate_comparison(row)
        } else {
            self.evaluate_arithmetic(row)
        }
    }
}

fn truthy(value: Value) -> bool {
    matches!(value, Value::Boolean(true))
}

fn is_zero(d: &BigDecimal) -> bool {
    use bigdecimal::Zero;
    d.is_zero()
}

fn as_f64(value: &Value) -> Result<f64> {
    match value {
        Value::Integer(i) => Ok(*i as f64),
        Value::Bigint(i) => Ok(*i as f64),
        Value::Double(d) => Ok(*d),
        Value::Decimal(d) => {
            use bigdecimal::ToPrimitive;
            d.to_f64()
                .ok_or_else(|| Error::Evaluation(format!("{d} does not fit a DOUBLE")))
        }
        other => Err(Error::Evaluation(format!("{other} is not numeric"))),
    }
}

fn as_i64(value: &Value) -> Result<i64> {
    match value {
        Value::Integer(i) => Ok(*i as i64),
        Value::Bigint(i) => Ok(*i),
        other => Err(Error::Evaluation(format!("{other} is not integral"))),
    }
}

fn as_i32(value: &Value) -> Result<i32> {
    match value {
        Value::Integer(i) => Ok(*i),
        other => Err(Error::Evaluation(format!("{other} is not an INT"))),
    }
}

#[allow(clippy::too_many_arguments)]
fn checked_integral<T: Copy + std::fmt::Display>(
    op: Operator,
    l: T,
    r: T,
    add: fn(T, T) -> Option<T>,
    sub: fn(T, T) -> Option<T>,
    mul: fn(T, T) -> Option<T>,
    div: fn(T, T) -> Option<T>,
    rem: fn(T, T) -> Option<T>,
) -> Result<T> {
    let result = match op {
        Operator::Plus => add(l, r),
        Operator::Minus => sub(l, r),
        Operator::Multiply => mul(l, r),
        Operator::Divide => div(l, r),
        Operator::Modulo => rem(l, r),
        _ => return internal_err!("{op} is not arithmetic"),
    };
    result.ok_or_else(|| Error::Evaluation(format!("integer overflow or division by zero: {l} {op} {r}")))
}
