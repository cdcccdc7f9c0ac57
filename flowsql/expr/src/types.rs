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

//! The closed SQL type sum and the cast legality rules.

use flowsql_common::error::{Error, Result};

/// Largest precision a DECIMAL may carry.
pub const DECIMAL_MAX_PRECISION: u8 = 38;

/// A field of a STRUCT type. Nested field names are plain strings: they are
/// never qualified or re-qualified by schema aliasing, even when they contain
/// a `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub sql_type: SqlType,
}

impl Field {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

/// The SQL types a column or expression may take.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlType {
    Boolean,
    Integer,
    Bigint,
    Double,
    String,
    Decimal { precision: u8, scale: u8 },
    /// Element type.
    Array(Box<SqlType>),
    /// Value type; map keys are always STRING.
    Map(Box<SqlType>),
    /// Ordered fields.
    Struct(Vec<Field>),
}

impl SqlType {
    /// Build a DECIMAL type, enforcing `1 ≤ precision ≤ 38` and
    /// `scale ≤ precision`.
    pub fn decimal(precision: u8, scale: u8) -> Result<SqlType> {
        if precision == 0 || precision > DECIMAL_MAX_PRECISION {
            return Err(Error::TypeMismatch(format!(
                "DECIMAL precision must be between 1 and {DECIMAL_MAX_PRECISION}, got {precision}"
            )));
        }
        if scale > precision {
            return Err(Error::TypeMismatch(format!(
                "DECIMAL scale {scale} cannot exceed precision {precision}"
            )));
        }
        Ok(SqlType::Decimal { precision, scale })
    }

    pub fn array(element: SqlType) -> SqlType {
        SqlType::Array(Box::new(element))
    }

    pub fn map(value: SqlType) -> SqlType {
        SqlType::Map(Box::new(value))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SqlType::Integer | SqlType::Bigint | SqlType::Double | SqlType::Decimal { .. }
        )
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, SqlType::Integer | SqlType::Bigint)
    }

    pub fn is_decimal(&self) -> bool {
        matches!(self, SqlType::Decimal { .. })
    }

    /// Whether a CAST from `self` to `to` is defined. Total over all pairs.
    ///
    /// Identity casts are always legal; scalar types render to STRING; STRING
    /// parses to the scalar types; the numeric types cast among themselves.
    /// Containers cast field-wise to same-shaped containers. STRUCT never
    /// casts to or from a non-STRUCT.
    pub fn can_cast_to(&self, to: &SqlType) -> bool {
        use SqlType::*;
        match (self, to) {
            (a, b) if a == b => true,
            (_, String) => !matches!(self, Array(_) | Map(_) | Struct(_)),
            (String, Boolean | Integer | Bigint | Double | Decimal { .. }) => true,
            (a, b) if a.is_numeric() && b.is_numeric() => true,
            (Array(a), Array(b)) => a.can_cast_to(b),
            (Map(a), Map(b)) => a.can_cast_to(b),
            (Struct(a), Struct(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(fa, fb)| fa.name == fb.name && fa.sql_type.can_cast_to(&fb.sql_type))
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlType::Boolean => write!(f, "BOOLEAN"),
            SqlType::Integer => write!(f, "INT"),
            SqlType::Bigint => write!(f, "BIGINT"),
            SqlType::Double => write!(f, "DOUBLE"),
            SqlType::String => write!(f, "STRING"),
            SqlType::Decimal { precision, scale } => {
                write!(f, "DECIMAL({precision}, {scale})")
            }
            SqlType::Array(element) => write!(f, "ARRAY<{element}>"),
            SqlType::Map(value) => write!(f, "MAP<STRING, {value}>"),
            SqlType::Struct(fields) => {
                write!(f, "STRUCT<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", field.name, field.sql_type)?;
                }
                write!(f, ">")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_bounds() {
        assert!(SqlType::decimal(10, 2).is_ok());
        assert!(SqlType::decimal(38, 38).is_ok());
        assert!(SqlType::decimal(0, 0).is_err());
        assert!(SqlType::decimal(39, 2).is_err());
        assert!(SqlType::decimal(5, 6).is_err());
    }

    #[test]
    fn rendering() {
        assert_eq!(SqlType::Integer.to_string(), "INT");
        assert_eq!(
            SqlType::decimal(6, 2).unwrap().to_string(),
            "DECIMAL(6, 2)"
        );
        assert_eq!(
            SqlType::array(SqlType::Bigint).to_string(),
            "ARRAY<BIGINT>"
        );
        assert_eq!(
            SqlType::map(SqlType::Double).to_string(),
            "MAP<STRING, DOUBLE>"
        );
        assert_eq!(
            SqlType::Struct(vec![
                Field::new("f1", SqlType::Integer),
                Field::new("f2", SqlType::String),
            ])
            .to_string(),
            "STRUCT<f1 INT, f2 STRING>"
        );
    }

    #[test]
    fn casts_between_numerics() {
        let numerics = [
            SqlType::Integer,
            SqlType::Bigint,
            SqlType::Double,
            SqlType::decimal(10, 2).unwrap(),
        ];
        for a in &numerics {
            for b in &numerics {
                assert!(a.can_cast_to(b), "{a} -> {b}");
            }
        }
    }

    #[test]
    fn casts_with_string() {
        assert!(SqlType::String.can_cast_to(&SqlType::Boolean));
        assert!(SqlType::String.can_cast_to(&SqlType::Integer));
        assert!(SqlType::Boolean.can_cast_to(&SqlType::String));
        assert!(SqlType::Double.can_cast_to(&SqlType::String));
        assert!(!SqlType::Boolean.can_cast_to(&SqlType::Integer));
    }

    #[test]
    fn struct_never_casts_to_primitive() {
        let strukt = SqlType::Struct(vec![Field::new("a", SqlType::Integer)]);
        assert!(!strukt.can_cast_to(&SqlType::String));
        assert!(!strukt.can_cast_to(&SqlType::Integer));
        assert!(!SqlType::String.can_cast_to(&strukt));
        assert!(strukt.can_cast_to(&strukt.clone()));
    }

    #[test]
    fn container_casts_are_element_wise() {
        assert!(SqlType::array(SqlType::Integer).can_cast_to(&SqlType::array(SqlType::Bigint)));
        assert!(!SqlType::array(SqlType::Boolean).can_cast_to(&SqlType::array(SqlType::Integer)));
        assert!(SqlType::map(SqlType::Integer).can_cast_to(&SqlType::map(SqlType::String)));
        assert!(!SqlType::array(SqlType::Integer).can_cast_to(&SqlType::map(SqlType::Integer)));
    }
}
