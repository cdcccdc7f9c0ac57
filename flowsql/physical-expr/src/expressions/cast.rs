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

//! CAST evaluation.
//!
//! Legality of a cast is decided at inference time by
//! [`SqlType::can_cast_to`]; this module implements the value conversion.
//! Unlike the implicit widenings, an explicit cast to a DECIMAL may round
//! (half-up), and numeric narrowing truncates toward zero.

use std::sync::Arc;

use bigdecimal::rounding::RoundingMode;
use bigdecimal::{BigDecimal, ToPrimitive};
use flowsql_common::error::{Error, Result};
use flowsql_expr::types::SqlType;
use flowsql_expr::value::Value;

use crate::physical_expr::PhysicalExpr;

#[derive(Debug)]
pub struct CastExpr {
    expr: Arc<dyn PhysicalExpr>,
    data_type: SqlType,
}

impl CastExpr {
    pub fn new(expr: Arc<dyn PhysicalExpr>, data_type: SqlType) -> Self {
        Self { expr, data_type }
    }
}

impl PhysicalExpr for CastExpr {
    fn data_type(&self) -> Option<SqlType> {
        Some(self.data_type.clone())
    }

    fn evaluate(&self, row: &[Value]) -> Result<Value> {
        cast_value(&self.expr.evaluate(row)?, &self.data_type)
    }
}

/// Convert `value` to `target`. The pair is assumed cast-legal.
pub fn cast_value(value: &Value, target: &SqlType) -> Result<Value> {
    use SqlType::*;
    let failure = || {
        Error::Evaluation(format!(
            "cannot cast value {value} to {target}"
        ))
    };
    if value.is_null() {
        return Ok(Value::Null);
    }
    if value.sql_type().as_ref() == Some(target) {
        return Ok(value.clone());
    }
    Ok(match (value, target) {
        // renderings
        (v, String) => Value::String(v.to_string()),

        // string parsing
        (Value::String(s), Boolean) => match s.trim() {
            t if t.eq_ignore_ascii_case("true") => Value::Boolean(true),
            t if t.eq_ignore_ascii_case("false") => Value::Boolean(false),
            _ => return Err(failure()),
        },
        (Value::String(s), Integer) => {
            Value::Integer(s.trim().parse().map_err(|_| failure())?)
        }
        (Value::String(s), Bigint) => {
            Value::Bigint(s.trim().parse().map_err(|_| failure())?)
        }
        (Value::String(s), Double) => {
            Value::Double(s.trim().parse().map_err(|_| failure())?)
        }
        (Value::String(s), Decimal { precision, scale }) => {
            let parsed: BigDecimal = s.trim().parse().map_err(|_| failure())?;
            round_decimal(parsed, *precision, *scale).ok_or_else(failure)?
        }

        // numeric conversions
        (Value::Integer(i), Bigint) => Value::Bigint(*i as i64),
        (Value::Integer(i), Double) => Value::Double(*i as f64),
        (Value::Bigint(i), Integer) => {
            Value::Integer(i32::try_from(*i).map_err(|_| failure())?)
        }
        (Value::Bigint(i), Double) => Value::Double(*i as f64),
        (Value::Double(d), Integer) => {
            let truncated = d.trunc();
            if !truncated.is_finite()
                || truncated > i32::MAX as f64
                || truncated < i32::MIN as f64
            {
                return Err(failure());
            }
            Value::Integer(truncated as i32)
        }
        (Value::Double(d), Bigint) => {
            let truncated = d.trunc();
            if !truncated.is_finite()
                || truncated > i64::MAX as f64
                || truncated < i64::MIN as f64
            {
                return Err(failure());
            }
            Value::Bigint(truncated as i64)
        }
        (Value::Integer(i), Decimal { precision, scale }) => {
            round_decimal(BigDecimal::from(*i), *precision, *scale).ok_or_else(failure)?
        }
        (Value::Bigint(i), Decimal { precision, scale }) => {
            round_decimal(BigDecimal::from(*i), *precision, *scale).ok_or_else(failure)?
        }
        (Value::Double(d), Decimal { precision, scale }) => {
            let parsed = BigDecimal::try_from(*d).map_err(|_| failure())?;
            round_decimal(parsed, *precision, *scale).ok_or_else(failure)?
        }
        (Value::Decimal(d), Integer) => {
            let truncated = d.with_scale_round(0, RoundingMode::Down);
            Value::Integer(truncated.to_i32().ok_or_else(failure)?)
        }
        (Value::Decimal(d), Bigint) => {
            let truncated = d.with_scale_round(0, RoundingMode::Down);
            Value::Bigint(truncated.to_i64().ok_or_else(failure)?)
        }
        (Value::Decimal(d), Double) => Value::Double(d.to_f64().ok_or_else(failure)?),
        (Value::Decimal(d), Decimal { precision, scale }) => {
            round_decimal(d.clone(), *precision, *scale).ok_or_else(failure)?
        }

        // containers cast element-wise
        (Value::Array(items), Array(element)) => Value::Array(
            items
                .iter()
                .map(|item| cast_value(item, element))
                .collect::<Result<_>>()?,
        ),
        (Value::Map(entries), Map(value_type)) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), cast_value(v, value_type)?)))
                .collect::<Result<_>>()?,
        ),
        (Value::Struct(fields), Struct(field_types)) => {
            if fields.len() != field_types.len() {
                return Err(failure());
            }
            Value::Struct(
                fields
                    .iter()
                    .zip(field_types.iter())
                    .map(|((name, v), field)| Ok((name.clone(), cast_value(v, &field.sql_type)?)))
                    .collect::<Result<_>>()?,
            )
        }

        _ => return Err(failure()),
    })
}

/// Round (half-up) to the target scale and verify the precision.
fn round_decimal(d: BigDecimal, precision: u8, scale: u8) -> Option<Value> {
    let rounded = d.with_scale_round(scale as i64, RoundingMode::HalfUp);
    if rounded.digits() > precision as u64 {
        return None;
    }
    Some(Value::Decimal(rounded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowsql_expr::value::decimal;

    #[test]
    fn string_parses() {
        assert_eq!(
            cast_value(&Value::String(" 42 ".into()), &SqlType::Integer).unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            cast_value(&Value::String("TRUE".into()), &SqlType::Boolean).unwrap(),
            Value::Boolean(true)
        );
        assert!(cast_value(&Value::String("maybe".into()), &SqlType::Boolean).is_err());
        assert!(cast_value(&Value::String("abc".into()), &SqlType::Integer).is_err());
    }

    #[test]
    fn renders_to_string() {
        assert_eq!(
            cast_value(&Value::Integer(7), &SqlType::String).unwrap(),
            Value::String("7".into())
        );
        assert_eq!(
            cast_value(&decimal(1250, 2), &SqlType::String).unwrap(),
            Value::String("12.50".into())
        );
    }

    #[test]
    fn explicit_decimal_cast_rounds_half_up() {
        let target = SqlType::decimal(5, 1).unwrap();
        assert_eq!(
            cast_value(&decimal(1250, 2), &target).unwrap(),
            decimal(125, 1)
        );
        assert_eq!(
            cast_value(&decimal(1255, 2), &target).unwrap(),
            decimal(126, 1)
        );
    }

    #[test]
    fn narrowing_truncates_toward_zero() {
        assert_eq!(
            cast_value(&Value::Double(-3.9), &SqlType::Integer).unwrap(),
            Value::Integer(-3)
        );
        assert_eq!(
            cast_value(&decimal(-39, 1), &SqlType::Bigint).unwrap(),
            Value::Bigint(-3)
        );
        assert!(cast_value(&Value::Bigint(i64::MAX), &SqlType::Integer).is_err());
    }

    #[test]
    fn null_casts_to_null() {
        assert_eq!(
            cast_value(&Value::Null, &SqlType::Boolean).unwrap(),
            Value::Null
        );
    }
}
