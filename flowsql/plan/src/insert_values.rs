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

//! Literal row construction for `INSERT INTO … VALUES`.
//!
//! Values must be literals; each is coerced to its target column's type
//! (integer widening, decimal widening with a fit check, strings only to
//! strings). The declared key column and `ROWKEY` must agree when both are
//! supplied; when only the key column is given, `ROWKEY` is derived from its
//! textual form. The timestamp comes from an explicit `ROWTIME` value or
//! from the injected clock.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use flowsql_common::config::PlannerConfig;
use flowsql_common::error::{Error, Result};
use flowsql_common::name::ColumnName;
use flowsql_expr::expr::Expr;
use flowsql_expr::schema::{is_meta_or_key_name, ColumnRef, ROWKEY_NAME, ROWTIME_NAME};
use flowsql_expr::types::SqlType;
use flowsql_expr::value::Value;

use crate::catalog::CatalogSource;

/// The wall clock used when no `ROWTIME` is supplied. Injected so planning
/// stays deterministic under test.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// The row handed to the serializer collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRow {
    pub timestamp: i64,
    /// The key struct: the declared key column when the source has one,
    /// otherwise the synthetic `ROWKEY`.
    pub key: Vec<(ColumnName, Value)>,
    /// One slot per value column of the source schema with the meta and key
    /// columns projected in, in row order: `ROWTIME`, `ROWKEY`, then the
    /// declared columns. The meta/key slots stay NULL — the timestamp and
    /// key travel alongside — and are flattened away per the schema's
    /// projection rules at serialization time.
    pub value: Vec<Value>,
}

/// Plans one `INSERT INTO … VALUES` statement.
pub struct InsertValuesPlanner<'a> {
    config: &'a PlannerConfig,
    clock: &'a dyn Clock,
}

impl<'a> InsertValuesPlanner<'a> {
    pub fn new(config: &'a PlannerConfig, clock: &'a dyn Clock) -> Self {
        Self { config, clock }
    }

    /// Build the `(timestamp, key, value)` triple for one statement.
    ///
    /// `columns` is the explicit column list; when absent it defaults to the
    /// key columns followed by the value columns, in schema order.
    pub fn plan(
        &self,
        source: &CatalogSource,
        columns: Option<Vec<ColumnRef>>,
        values: Vec<Expr>,
    ) -> Result<InsertRow> {
        if !self.config.insert_values_enabled {
            return Err(Error::InsertDisabled);
        }
        if source.window_type.is_some() {
            return Err(Error::InsertIntoWindowedNotAllowed(source.name.to_string()));
        }

        let schema = &source.schema;
        let columns = columns.unwrap_or_else(|| {
            schema
                .key_columns()
                .iter()
                .chain(schema.value_columns().iter())
                .map(|c| c.to_ref())
                .collect()
        });
        if columns.len() != values.len() {
            return Err(Error::InsertArityMismatch {
                expected: columns.len(),
                actual: values.len(),
            });
        }

        // resolve targets and coerce the literals
        let mut supplied: HashMap<String, Value> = HashMap::with_capacity(columns.len());
        for (column, expr) in columns.iter().zip(values) {
            let literal = match expr {
                Expr::Literal(value) => value,
                other => return Err(Error::InsertNonLiteral(other.to_string())),
            };
            let (name, target_type) = self.resolve_target(source, column)?;
            let coerced = literal.coerce_to(&target_type)?;
            supplied.insert(name, coerced);
        }

        let key = self.build_key(source, &mut supplied)?;
        let timestamp = match supplied.get(ROWTIME_NAME) {
            Some(Value::Bigint(millis)) => *millis,
            Some(Value::Null) | None => self.clock.now_millis(),
            Some(other) => {
                return Err(Error::InsertTypeMismatch(format!(
                    "ROWTIME must be a BIGINT, got {other}"
                )))
            }
        };

        let projected = schema.with_meta_and_key_cols_in_value();
        let value = projected
            .value_columns()
            .iter()
            .map(|c| {
                if is_meta_or_key_name(c.name()) {
                    Value::Null
                } else {
                    supplied
                        .get(c.name().as_str())
                        .cloned()
                        .unwrap_or(Value::Null)
                }
            })
            .collect();

        Ok(InsertRow {
            timestamp,
            key,
            value,
        })
    }

    /// The insertable column a reference names: a key or value column, or
    /// one of `ROWTIME`/`ROWKEY`.
    fn resolve_target(
        &self,
        source: &CatalogSource,
        column: &ColumnRef,
    ) -> Result<(String, SqlType)> {
        if let Some(found) = source.schema.find_column(column) {
            return Ok((found.name().to_string(), found.sql_type().clone()));
        }
        match column.name.as_str() {
            ROWTIME_NAME => Ok((ROWTIME_NAME.to_string(), SqlType::Bigint)),
            ROWKEY_NAME => Ok((ROWKEY_NAME.to_string(), SqlType::String)),
            _ => Err(Error::UnknownColumn(column.to_string())),
        }
    }

    /// Reconcile the declared key column with `ROWKEY` and build the key
    /// struct. Either may be derived from the other; both together must
    /// agree.
    fn build_key(
        &self,
        source: &CatalogSource,
        supplied: &mut HashMap<String, Value>,
    ) -> Result<Vec<(ColumnName, Value)>> {
        let key_column = source.key_field.resolve(&source.schema).cloned();
        let rowkey = supplied.get(ROWKEY_NAME).cloned().filter(|v| !v.is_null());

        let Some(key_column) = key_column else {
            // unkeyed source: the synthetic ROWKEY is the whole key
            let rowkey = rowkey.unwrap_or(Value::Null);
            return Ok(vec![(ColumnName::new(ROWKEY_NAME), rowkey)]);
        };

        let key_value = supplied
            .get(key_column.name().as_str())
            .cloned()
            .filter(|v| !v.is_null());
        match (&key_value, &rowkey) {
            (Some(key), Some(Value::String(rowkey))) => {
                if &key.to_string() != rowkey {
                    return Err(Error::InsertKeyMismatch(format!(
                        "expected ROWKEY '{}' to match {} '{}'",
                        rowkey,
                        key_column.name(),
                        key
                    )));
                }
            }
            (Some(key), None) => {
                // derive ROWKEY from the key column's textual form
                supplied.insert(ROWKEY_NAME.to_string(), Value::String(key.to_string()));
            }
            (None, Some(_)) | (None, None) => {}
            (Some(_), Some(other)) => {
                return Err(Error::InsertKeyMismatch(format!(
                    "ROWKEY must be a STRING, got {other}"
                )))
            }
        }

        let key_value = supplied
            .get(key_column.name().as_str())
            .cloned()
            .unwrap_or(Value::Null);
        Ok(vec![(key_column.name().clone(), key_value)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogSource, SourceType, WindowType};
    use crate::key_field::KeyField;
    use flowsql_expr::expr::lit;
    use flowsql_expr::schema::LogicalSchema;

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now_millis(&self) -> i64 {
            self.0
        }
    }

    fn source() -> CatalogSource {
        let schema = LogicalSchema::builder()
            .value_column("a", SqlType::Integer)
            .value_column("b", SqlType::String)
            .value_column("ts", SqlType::Bigint)
            .build()
            .unwrap();
        CatalogSource::new("S", SourceType::Stream, schema, "s-topic", 4)
            .with_key_field(KeyField::of(ColumnRef::bare("a")))
    }

    fn plan(
        source: &CatalogSource,
        columns: Option<Vec<ColumnRef>>,
        values: Vec<Expr>,
    ) -> Result<InsertRow> {
        let config = PlannerConfig::default();
        let clock = FixedClock(1000);
        InsertValuesPlanner::new(&config, &clock).plan(source, columns, values)
    }

    #[test]
    fn inserts_with_explicit_columns() {
        let row = plan(
            &source(),
            Some(vec![ColumnRef::bare("a"), ColumnRef::bare("b")]),
            vec![lit(1), lit("x")],
        )
        .unwrap();
        assert_eq!(row.timestamp, 1000);
        assert_eq!(row.key, vec![(ColumnName::new("a"), Value::Integer(1))]);
        // ROWTIME, ROWKEY, a, b, ts — the meta/key slots stay null
        assert_eq!(
            row.value,
            vec![
                Value::Null,
                Value::Null,
                Value::Integer(1),
                Value::String("x".into()),
                Value::Null,
            ]
        );
    }

    #[test]
    fn default_columns_are_keys_then_values() {
        // ROWKEY, a, b, ts
        let row = plan(
            &source(),
            None,
            vec![lit("1"), lit(1), lit("x"), lit(5i64)],
        )
        .unwrap();
        assert_eq!(row.key, vec![(ColumnName::new("a"), Value::Integer(1))]);
        assert_eq!(
            row.value,
            vec![
                Value::Null,
                Value::Null,
                Value::Integer(1),
                Value::String("x".into()),
                Value::Bigint(5),
            ]
        );
    }

    #[test]
    fn arity_must_match() {
        let err = plan(
            &source(),
            Some(vec![ColumnRef::bare("a"), ColumnRef::bare("b")]),
            vec![lit(1)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::InsertArityMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn rejects_non_literals() {
        let err = plan(
            &source(),
            Some(vec![ColumnRef::bare("a")]),
            vec![flowsql_expr::expr::col("b")],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InsertNonLiteral(_)));
    }

    #[test]
    fn coercion_failures_are_typed() {
        let err = plan(
            &source(),
            Some(vec![ColumnRef::bare("a")]),
            vec![lit("not a number")],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InsertTypeMismatch(_)));
    }

    #[test]
    fn rowkey_and_key_column_must_agree() {
        let err = plan(
            &source(),
            Some(vec![ColumnRef::bare("ROWKEY"), ColumnRef::bare("a")]),
            vec![lit("2"), lit(1)],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InsertKeyMismatch(_)));

        let row = plan(
            &source(),
            Some(vec![ColumnRef::bare("ROWKEY"), ColumnRef::bare("a")]),
            vec![lit("1"), lit(1)],
        )
        .unwrap();
        assert_eq!(row.key, vec![(ColumnName::new("a"), Value::Integer(1))]);
    }

    #[test]
    fn explicit_rowtime_overrides_the_clock() {
        let row = plan(
            &source(),
            Some(vec![ColumnRef::bare("ROWTIME"), ColumnRef::bare("a")]),
            vec![lit(777i64), lit(1)],
        )
        .unwrap();
        assert_eq!(row.timestamp, 777);
    }

    #[test]
    fn windowed_sources_are_rejected() {
        let windowed = source().with_window_type(WindowType::Tumbling);
        let err = plan(&windowed, None, vec![]).unwrap_err();
        assert!(matches!(err, Error::InsertIntoWindowedNotAllowed(_)));
    }

    #[test]
    fn disabled_by_config() {
        let config = PlannerConfig::default().with_insert_values_enabled(false);
        let clock = FixedClock(0);
        let err = InsertValuesPlanner::new(&config, &clock)
            .plan(&source(), None, vec![])
            .unwrap_err();
        assert_eq!(err, Error::InsertDisabled);
    }
}
