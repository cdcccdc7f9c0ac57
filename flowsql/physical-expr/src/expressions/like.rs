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

//! LIKE pattern evaluation.
//!
//! Constant patterns are compiled once at planning time. The common shapes
//! avoid the regex engine entirely: a wildcard-free pattern is an equality
//! check, `pat%` a prefix check, `%pat` a suffix check and `%pat%` a
//! containment check. Everything else becomes an anchored regex with `%` and
//! `_` substituted.

use std::sync::Arc;

use flowsql_common::error::{Error, Result};
use flowsql_expr::types::SqlType;
use flowsql_expr::value::Value;
use regex::Regex;

use crate::physical_expr::PhysicalExpr;

/// A LIKE pattern in its cheapest executable form.
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    Equality(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Pattern(Regex),
}

impl CompiledPattern {
    /// Compile a LIKE pattern.
    pub fn compile(pattern: &str) -> Result<CompiledPattern> {
        let has_wildcards = |s: &str| s.contains(['%', '_']);
        if !has_wildcards(pattern) {
            return Ok(CompiledPattern::Equality(pattern.to_string()));
        }
        if let Some(prefix) = pattern.strip_suffix('%') {
            if !has_wildcards(prefix) {
                return Ok(CompiledPattern::StartsWith(prefix.to_string()));
            }
        }
        if let Some(suffix) = pattern.strip_prefix('%') {
            if !has_wildcards(suffix) {
                return Ok(CompiledPattern::EndsWith(suffix.to_string()));
            }
        }
        if let Some(inner) = pattern
            .strip_prefix('%')
            .and_then(|p| p.strip_suffix('%'))
        {
            if !has_wildcards(inner) {
                return Ok(CompiledPattern::Contains(inner.to_string()));
            }
        }
        let mut built = String::with_capacity(pattern.len() + 8);
        built.push('^');
        for c in pattern.chars() {
            match c {
                '%' => built.push_str(".*"),
                '_' => built.push('.'),
                c => built.push_str(&regex::escape(&c.to_string())),
            }
        }
        built.push('$');
        let regex = Regex::new(&built)
            .map_err(|e| Error::Evaluation(format!("invalid LIKE pattern {pattern}: {e}")))?;
        Ok(CompiledPattern::Pattern(regex))
    }

    pub fn matches(&self, input: &str) -> bool {
        match self {
            CompiledPattern::Equality(p) => input == p,
            CompiledPattern::StartsWith(p) => input.starts_with(p),
            CompiledPattern::EndsWith(p) => input.ends_with(p),
            CompiledPattern::Contains(p) => input.contains(p),
            CompiledPattern::Pattern(regex) => regex.is_match(input),
        }
    }
}

/// The pattern side of a LIKE: compiled up front when constant, compiled per
/// row otherwise.
#[derive(Debug)]
pub enum PatternSource {
    Constant(CompiledPattern),
    Dynamic(Arc<dyn PhysicalExpr>),
}

#[derive(Debug)]
pub struct LikeExpr {
    expr: Arc<dyn PhysicalExpr>,
    pattern: PatternSource,
    negated: bool,
}

impl LikeExpr {
    pub fn new(expr: Arc<dyn PhysicalExpr>, pattern: PatternSource, negated: bool) -> Self {
        Self {
            expr,
            pattern,
            negated,
        }
    }
}

impl PhysicalExpr for LikeExpr {
    fn data_type(&self) -> Option<SqlType> {
        Some(SqlType::Boolean)
    }

    fn evaluate(&self, row: &[Value]) -> Result<Value> {
        let input = match self.expr.evaluate(row)? {
            Value::Null => return Ok(Value::Boolean(false)),
            Value::String(s) => s,
            other => {
                return Err(Error::Evaluation(format!(
                    "LIKE requires a STRING input, got {other}"
                )))
            }
        };
        let matched = match &self.pattern {
            PatternSource::Constant(pattern) => pattern.matches(&input),
            PatternSource::Dynamic(expr) => match expr.evaluate(row)? {
                Value::Null => return Ok(Value::Boolean(false)),
                Value::String(pattern) => CompiledPattern::compile(&pattern)?.matches(&input),
                other => {
                    return Err(Error::Evaluation(format!(
                        "LIKE requires a STRING pattern, got {other}"
                    )))
                }
            },
        };
        Ok(Value::Boolean(matched != self.negated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_free_is_equality() {
        let p = CompiledPattern::compile("abc").unwrap();
        assert!(matches!(p, CompiledPattern::Equality(_)));
        assert!(p.matches("abc"));
        assert!(!p.matches("abcd"));
    }

    #[test]
    fn anchored_shapes() {
        let p = CompiledPattern::compile("ab%").unwrap();
        assert!(matches!(p, CompiledPattern::StartsWith(_)));
        assert!(p.matches("abxyz"));
        assert!(!p.matches("xab"));

        let p = CompiledPattern::compile("%ab").unwrap();
        assert!(matches!(p, CompiledPattern::EndsWith(_)));
        assert!(p.matches("xyab"));

        let p = CompiledPattern::compile("%ab%").unwrap();
        assert!(matches!(p, CompiledPattern::Contains(_)));
        assert!(p.matches("xabx"));
        assert!(!p.matches("ax"));
    }

    #[test]
    fn general_patterns_become_regexes() {
        let p = CompiledPattern::compile("a_c%d").unwrap();
        assert!(matches!(p, CompiledPattern::Pattern(_)));
        assert!(p.matches("abcxxd"));
        assert!(p.matches("azcd"));
        assert!(!p.matches("ac"));
    }

    #[test]
    fn regex_metacharacters_are_escaped() {
        let p = CompiledPattern::compile("a.c").unwrap();
        assert!(!p.matches("abc"));
        assert!(p.matches("a.c"));

        let p = CompiledPattern::compile("(x)%").unwrap();
        assert!(p.matches("(x)y"));
    }

    #[test]
    fn underscore_without_percent_is_not_equality() {
        let p = CompiledPattern::compile("a_c").unwrap();
        assert!(matches!(p, CompiledPattern::Pattern(_)));
        assert!(p.matches("abc"));
        assert!(!p.matches("a_x"));
    }
}
