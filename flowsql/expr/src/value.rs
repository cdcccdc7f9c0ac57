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

//! Runtime scalar values.
//!
//! A [`Value`] is one slot of a row: rows are ordered lists of nullable
//! values, sized to a schema's value-column count. Values are also the
//! representation of literals in the expression tree.

use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;
use flowsql_common::error::{Error, Result};

use crate::types::SqlType;

/// A single nullable scalar (or nested container) value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i32),
    Bigint(i64),
    Double(f64),
    String(String),
    Decimal(BigDecimal),
    Array(Vec<Value>),
    /// Key/value pairs in insertion order; keys are STRING.
    Map(Vec<(String, Value)>),
    /// Field name/value pairs in schema order.
    Struct(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The SQL type of this value, or `None` for NULL, whose type is unknown
    /// and propagates as any.
    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(SqlType::Boolean),
            Value::Integer(_) => Some(SqlType::Integer),
            Value::Bigint(_) => Some(SqlType::Bigint),
            Value::Double(_) => Some(SqlType::Double),
            Value::String(_) => Some(SqlType::String),
            Value::Decimal(d) => {
                let scale = d.fractional_digit_count().max(0) as u8;
                let precision = (d.digits() as u8).max(scale).max(1);
                Some(SqlType::Decimal { precision, scale })
            }
            Value::Array(items) => items
                .iter()
                .find_map(|v| v.sql_type())
                .map(SqlType::array),
            Value::Map(entries) => entries
                .iter()
                .find_map(|(_, v)| v.sql_type())
                .map(SqlType::map),
            Value::Struct(fields) => {
                let fields = fields
                    .iter()
                    .map(|(name, v)| {
                        v.sql_type()
                            .map(|t| crate::types::Field::new(name.clone(), t))
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(SqlType::Struct(fields))
            }
        }
    }

    /// Widen this value to `target`, per the insert-values rules: integers
    /// widen to BIGINT, DOUBLE and DECIMAL (with a fit check); strings and
    /// booleans coerce to nothing but themselves; NULL fits every type.
    pub fn coerce_to(&self, target: &SqlType) -> Result<Value> {
        let mismatch = || {
            Error::InsertTypeMismatch(format!(
                "{} is not coercible to {target}",
                self.sql_type()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "NULL".to_string())
            ))
        };
        match (self, target) {
            (Value::Null, _) => Ok(Value::Null),
            (v, t) if v.sql_type().as_ref() == Some(t) => Ok(v.clone()),
            (Value::Integer(i), SqlType::Bigint) => Ok(Value::Bigint(*i as i64)),
            (Value::Integer(i), SqlType::Double) => Ok(Value::Double(*i as f64)),
            (Value::Bigint(i), SqlType::Double) => Ok(Value::Double(*i as f64)),
            (Value::Integer(i), SqlType::Decimal { precision, scale }) => {
                fit_decimal(BigDecimal::from(*i), *precision, *scale).ok_or_else(mismatch)
            }
            (Value::Bigint(i), SqlType::Decimal { precision, scale }) => {
                fit_decimal(BigDecimal::from(*i), *precision, *scale).ok_or_else(mismatch)
            }
            (Value::Decimal(d), SqlType::Decimal { precision, scale }) => {
                fit_decimal(d.clone(), *precision, *scale).ok_or_else(mismatch)
            }
            _ => Err(mismatch()),
        }
    }
}

/// Rescale `d` to exactly `scale` and check that it fits in `precision`
/// digits. Returns `None` when digits would be lost.
fn fit_decimal(d: BigDecimal, precision: u8, scale: u8) -> Option<Value> {
    if d.fractional_digit_count() > scale as i64 {
        return None;
    }
    let rescaled = d.with_scale(scale as i64);
    if rescaled.digits() > precision as u64 {
        return None;
    }
    Some(Value::Decimal(rescaled))
}

/// Exact decimal from unscaled digits and a scale, e.g. `(1234, 2)` is 12.34.
pub fn decimal(unscaled: i64, scale: i64) -> Value {
    Value::Decimal(BigDecimal::new(BigInt::from(unscaled), scale))
}

/// Compare two values, widening across the numeric types. `None` when either
/// side is NULL or the values have no common ordering.
pub fn compare_values(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    use Value::*;
    match (left, right) {
        (Null, _) | (_, Null) => None,
        (Boolean(a), Boolean(b)) => a.partial_cmp(b),
        (String(a), String(b)) => a.partial_cmp(b),
        (Integer(a), Integer(b)) => a.partial_cmp(b),
        (Bigint(a), Bigint(b)) => a.partial_cmp(b),
        (Integer(a), Bigint(b)) => (*a as i64).partial_cmp(b),
        (Bigint(a), Integer(b)) => a.partial_cmp(&(*b as i64)),
        (Double(a), Double(b)) => a.partial_cmp(b),
        (Double(a), Integer(b)) => a.partial_cmp(&(*b as f64)),
        (Double(a), Bigint(b)) => a.partial_cmp(&(*b as f64)),
        (Integer(a), Double(b)) => (*a as f64).partial_cmp(b),
        (Bigint(a), Double(b)) => (*a as f64).partial_cmp(b),
        (Decimal(a), Decimal(b)) => a.partial_cmp(b),
        (Decimal(a), Integer(b)) => a.partial_cmp(&BigDecimal::from(*b)),
        (Decimal(a), Bigint(b)) => a.partial_cmp(&BigDecimal::from(*b)),
        (Integer(a), Decimal(b)) => BigDecimal::from(*a).partial_cmp(b),
        (Bigint(a), Decimal(b)) => BigDecimal::from(*a).partial_cmp(b),
        _ => None,
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Bigint(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) | Value::Struct(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Bigint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<BigDecimal> for Value {
    fn from(v: BigDecimal) -> Self {
        Value::Decimal(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_types() {
        assert_eq!(Value::Null.sql_type(), None);
        assert_eq!(Value::Integer(1).sql_type(), Some(SqlType::Integer));
        assert_eq!(
            decimal(1234, 2).sql_type(),
            Some(SqlType::Decimal {
                precision: 4,
                scale: 2
            })
        );
    }

    #[test]
    fn integer_widening() {
        assert_eq!(
            Value::Integer(7).coerce_to(&SqlType::Bigint).unwrap(),
            Value::Bigint(7)
        );
        assert_eq!(
            Value::Bigint(7).coerce_to(&SqlType::Double).unwrap(),
            Value::Double(7.0)
        );
        // narrowing is not a coercion
        assert!(Value::Bigint(7).coerce_to(&SqlType::Integer).is_err());
    }

    #[test]
    fn decimal_widening_checks_fit() {
        let target = SqlType::Decimal {
            precision: 5,
            scale: 2,
        };
        assert_eq!(
            Value::Integer(123).coerce_to(&target).unwrap(),
            decimal(12300, 2)
        );
        // 1234 needs 6 digits at scale 2
        assert!(Value::Integer(1234).coerce_to(&target).is_err());
        // rescaling must not round
        assert!(decimal(12345, 3).coerce_to(&target).is_err());
    }

    #[test]
    fn string_coerces_to_nothing_else() {
        assert!(Value::String("1".into()).coerce_to(&SqlType::Integer).is_err());
        assert_eq!(
            Value::String("x".into()).coerce_to(&SqlType::String).unwrap(),
            Value::String("x".into())
        );
    }

    #[test]
    fn null_fits_everything() {
        assert_eq!(Value::Null.coerce_to(&SqlType::Boolean).unwrap(), Value::Null);
        assert_eq!(
            Value::Null
                .coerce_to(&SqlType::Decimal {
                    precision: 2,
                    scale: 1
                })
                .unwrap(),
            Value::Null
        );
    }
}
