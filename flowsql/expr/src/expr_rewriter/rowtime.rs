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

//! Row-time literal normalization.
//!
//! Comparisons (and BETWEEN bounds) against the `ROWTIME` column accept
//! date-time strings; this rewriter replaces such string literals with BIGINT
//! epoch-millisecond literals so that downstream typing and code generation
//! only ever see numeric row-time comparisons. The rewrite is idempotent: a
//! rewritten literal is numeric and no longer matches.
//!
//! The accepted grammar is `yyyy-MM-dd'T'HH:mm:ss.SSS` with an optional
//! trailing offset (`Z`, `±HH:MM` or `±HHMM`) and leftward zero-completion:
//! `2020` is midnight of 2020-01-01, `2020-03-04T05:06` completes the
//! seconds and milliseconds with zeros. A literal without an offset is UTC.

use chrono::{DateTime, NaiveDateTime};
use flowsql_common::error::{Error, Result};

use crate::expr::Expr;
use crate::expr_rewriter::rewrite_expr;
use crate::schema::ROWTIME_NAME;
use crate::value::Value;

/// Completion template for partial date-time literals.
const TEMPLATE: &str = "0000-01-01T00:00:00.000";
const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Replace date-time string literals compared against `ROWTIME` with epoch
/// millisecond literals.
pub fn normalize_rowtime(expr: Expr) -> Result<Expr> {
    let rewritten = rewrite_expr(expr, |node| {
        Ok(match node {
            Expr::BinaryExpr { left, op, right } if op.is_comparison() => {
                match (is_rowtime(left), string_literal(right), is_rowtime(right), string_literal(left)) {
                    (true, Some(text), _, _) => Some(Expr::BinaryExpr {
                        left: left.clone(),
                        op: *op,
                        right: Box::new(millis_literal(text)?),
                    }),
                    (_, _, true, Some(text)) => Some(Expr::BinaryExpr {
                        left: Box::new(millis_literal(text)?),
                        op: *op,
                        right: right.clone(),
                    }),
                    _ => None,
                }
            }
            Expr::Between {
                expr,
                negated,
                low,
                high,
            } if is_rowtime(expr)
                && (string_literal(low).is_some() || string_literal(high).is_some()) =>
            {
                Some(Expr::Between {
                    expr: expr.clone(),
                    negated: *negated,
                    low: Box::new(bound_literal(low)?),
                    high: Box::new(bound_literal(high)?),
                })
            }
            _ => None,
        })
    })?;
    Ok(rewritten.data)
}

fn is_rowtime(expr: &Expr) -> bool {
    matches!(expr.as_column(), Some(column) if column.name.as_str() == ROWTIME_NAME)
}

fn string_literal(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Literal(Value::String(s)) => Some(s),
        _ => None,
    }
}

fn millis_literal(text: &str) -> Result<Expr> {
    Ok(Expr::Literal(Value::Bigint(parse_timestamp(text)?)))
}

fn bound_literal(bound: &Expr) -> Result<Expr> {
    match string_literal(bound) {
        Some(text) => millis_literal(text),
        None => Ok(bound.clone()),
    }
}

/// Parse a (possibly partial) date-time literal into epoch milliseconds.
pub fn parse_timestamp(text: &str) -> Result<i64> {
    let error = || Error::InvalidTimestampLiteral(text.to_string());
    let (body, offset) = split_offset(text);
    let completed = complete(body).ok_or_else(error)?;
    match offset {
        None => NaiveDateTime::parse_from_str(&completed, FORMAT)
            .map(|dt| dt.and_utc().timestamp_millis())
            .map_err(|_| error()),
        Some(offset) => {
            DateTime::parse_from_str(&format!("{completed}{offset}"), &format!("{FORMAT}%z"))
                .map(|dt| dt.timestamp_millis())
                .map_err(|_| error())
        }
    }
}

/// Split a trailing zone offset off the literal. The date part also contains
/// `-`, so only characters after the `T` are considered.
fn split_offset(text: &str) -> (&str, Option<String>) {
    let Some(time_start) = text.find('T') else {
        return (text, None);
    };
    if text.ends_with('Z') || text.ends_with('z') {
        return (&text[..text.len() - 1], Some("+0000".to_string()));
    }
    let time = &text[time_start..];
    if let Some(sign) = time.rfind(['+', '-']) {
        let split = time_start + sign;
        let offset = text[split..].replace(':', "");
        return (&text[..split], Some(offset));
    }
    (text, None)
}

/// Left-complete a partial literal against the template, so that missing
/// month and day default to `01` and missing time components to zero.
fn complete(body: &str) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    if body.len() >= TEMPLATE.len() {
        return Some(body.to_string());
    }
    Some(format!("{body}{}", &TEMPLATE[body.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{binary_expr, col, lit, qcol};
    use crate::operator::Operator;

    #[test]
    fn parses_full_timestamps() {
        // 2020-01-02T03:04:05.000 UTC
        assert_eq!(parse_timestamp("2020-01-02T03:04:05.000").unwrap(), 1577934245000);
        assert_eq!(parse_timestamp("2020-01-02T03:04:05").unwrap(), 1577934245000);
        assert_eq!(parse_timestamp("2020-01-02T03:04:05.123").unwrap(), 1577934245123);
    }

    #[rstest::rstest]
    #[case("2020", "2020-01-01T00:00:00.000")]
    #[case("2020-01", "2020-01-01T00:00:00.000")]
    #[case("2020-01-01", "2020-01-01T00:00:00.000")]
    #[case("2020-01-01T00", "2020-01-01T00:00:00.000")]
    #[case("2020-03-04T05:06", "2020-03-04T05:06:00.000")]
    fn completes_partial_literals_leftward(#[case] partial: &str, #[case] full: &str) {
        assert_eq!(
            parse_timestamp(partial).unwrap(),
            parse_timestamp(full).unwrap()
        );
    }

    #[test]
    fn honors_offsets() {
        let utc = parse_timestamp("2020-01-02T03:04:05.000").unwrap();
        assert_eq!(parse_timestamp("2020-01-02T03:04:05.000Z").unwrap(), utc);
        assert_eq!(
            parse_timestamp("2020-01-02T04:04:05.000+01:00").unwrap(),
            utc
        );
        assert_eq!(
            parse_timestamp("2020-01-02T01:04:05.000-0200").unwrap(),
            utc
        );
    }

    #[test]
    fn rejects_malformed_literals() {
        for bad in ["", "not-a-date", "2020-13-01", "2020-01-02X03:04:05"] {
            assert!(
                matches!(parse_timestamp(bad), Err(Error::InvalidTimestampLiteral(_))),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn rewrites_comparison_literal() {
        let expr = binary_expr(col("ROWTIME"), Operator::Gt, lit("2020-01-02T03:04:05"));
        let rewritten = normalize_rowtime(expr).unwrap();
        assert_eq!(
            rewritten,
            binary_expr(col("ROWTIME"), Operator::Gt, lit(1577934245000i64))
        );
    }

    #[test]
    fn rewrites_qualified_rowtime_and_reversed_sides() {
        let expr = binary_expr(lit("2020"), Operator::LtEq, qcol("S", "ROWTIME"));
        let rewritten = normalize_rowtime(expr).unwrap();
        let millis = parse_timestamp("2020").unwrap();
        assert_eq!(
            rewritten,
            binary_expr(lit(millis), Operator::LtEq, qcol("S", "ROWTIME"))
        );
    }

    #[test]
    fn rewrites_between_bounds() {
        let expr = Expr::Between {
            expr: Box::new(col("ROWTIME")),
            negated: false,
            low: Box::new(lit("2020-01-01")),
            high: Box::new(lit("2020-02-01")),
        };
        let rewritten = normalize_rowtime(expr).unwrap();
        assert_eq!(
            rewritten,
            Expr::Between {
                expr: Box::new(col("ROWTIME")),
                negated: false,
                low: Box::new(lit(parse_timestamp("2020-01-01").unwrap())),
                high: Box::new(lit(parse_timestamp("2020-02-01").unwrap())),
            }
        );
    }

    #[test]
    fn leaves_other_comparisons_alone() {
        let expr = binary_expr(col("name"), Operator::Eq, lit("2020"));
        assert_eq!(normalize_rowtime(expr.clone()).unwrap(), expr);
    }

    #[test]
    fn idempotent() {
        let expr = binary_expr(col("ROWTIME"), Operator::Gt, lit("2020-01-02"));
        let once = normalize_rowtime(expr).unwrap();
        let twice = normalize_rowtime(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn surfaces_parse_failures() {
        let expr = binary_expr(col("ROWTIME"), Operator::Gt, lit("yesterday"));
        assert!(matches!(
            normalize_rowtime(expr),
            Err(Error::InvalidTimestampLiteral(_))
        ));
    }
}
