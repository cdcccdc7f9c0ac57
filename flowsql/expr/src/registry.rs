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

//! The function registry contract and a simple in-memory implementation.
//!
//! The registry is an external collaborator of the planner: it resolves a
//! function name and argument types to a descriptor carrying the return type
//! and a runtime instance. Scalar and aggregate functions are disjoint;
//! which one a call site is, is the registry's answer, not the syntax's.

use std::cmp::Ordering;
use std::sync::Arc;

use flowsql_common::error::{Error, Result};
use flowsql_common::name::FunctionName;
use indexmap::IndexMap;

use crate::types::SqlType;
use crate::value::{compare_values, Value};

/// Name of the pseudo-aggregate resolving to a window's lower bound.
pub const WINDOW_START_NAME: &str = "WINDOWSTART";
/// Name of the pseudo-aggregate resolving to a window's upper bound.
pub const WINDOW_END_NAME: &str = "WINDOWEND";

/// Whether `name` is one of the window-bound pseudo-aggregates.
pub fn is_window_bound(name: &FunctionName) -> bool {
    name.as_str() == WINDOW_START_NAME || name.as_str() == WINDOW_END_NAME
}

/// A runtime scalar function instance.
pub type ScalarImpl = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// A resolved scalar function: return type plus the runtime instance.
#[derive(Clone)]
pub struct ScalarFunction {
    pub name: FunctionName,
    pub return_type: SqlType,
    pub fun: ScalarImpl,
}

impl std::fmt::Debug for ScalarFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalarFunction")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// Folds one input value into the accumulator.
pub type AccumulateImpl = Arc<dyn Fn(Value, &Value) -> Value + Send + Sync>;
/// Combines two accumulators (needed by session windows only).
pub type MergeImpl = Arc<dyn Fn(Value, &Value) -> Value + Send + Sync>;

/// A resolved aggregate function: initializer, accumulator and merger.
#[derive(Clone)]
pub struct AggregateFunction {
    pub name: FunctionName,
    pub return_type: SqlType,
    pub initial_value: Value,
    pub accumulate: AccumulateImpl,
    pub merge: MergeImpl,
}

impl std::fmt::Debug for AggregateFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateFunction")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// Resolution of function names against the installed functions.
pub trait FunctionRegistry {
    /// Whether `name` names an aggregate (window-bound pseudo-aggregates
    /// included).
    fn is_aggregate(&self, name: &FunctionName) -> bool;

    /// Resolve a scalar call. `None` argument types stand for NULL literals
    /// and match any parameter.
    fn scalar_function(
        &self,
        name: &FunctionName,
        args: &[Option<SqlType>],
    ) -> Result<ScalarFunction>;

    /// Resolve an aggregate call over an argument of type `arg` (`None` for
    /// the zero-argument form, e.g. `COUNT()`).
    fn aggregate_function(
        &self,
        name: &FunctionName,
        arg: Option<&SqlType>,
    ) -> Result<AggregateFunction>;
}

type ScalarFactory = Arc<dyn Fn(&[Option<SqlType>]) -> Result<ScalarFunction> + Send + Sync>;
type AggregateFactory =
    Arc<dyn Fn(Option<&SqlType>) -> Result<AggregateFunction> + Send + Sync>;

/// An insertion-ordered, in-memory registry.
#[derive(Clone, Default)]
pub struct SimpleFunctionRegistry {
    scalars: IndexMap<FunctionName, ScalarFactory>,
    aggregates: IndexMap<FunctionName, AggregateFactory>,
}

impl std::fmt::Debug for SimpleFunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleFunctionRegistry")
            .field("scalars", &self.scalars.keys().collect::<Vec<_>>())
            .field("aggregates", &self.aggregates.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SimpleFunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::install(&mut registry);
        registry
    }

    pub fn register_scalar(&mut self, name: impl Into<FunctionName>, factory: ScalarFactory) {
        self.scalars.insert(name.into(), factory);
    }

    pub fn register_aggregate(
        &mut self,
        name: impl Into<FunctionName>,
        factory: AggregateFactory,
    ) {
        self.aggregates.insert(name.into(), factory);
    }
}

impl FunctionRegistry for SimpleFunctionRegistry {
    fn is_aggregate(&self, name: &FunctionName) -> bool {
        self.aggregates.contains_key(name)
    }

    fn scalar_function(
        &self,
        name: &FunctionName,
        args: &[Option<SqlType>],
    ) -> Result<ScalarFunction> {
        let factory = self
            .scalars
            .get(name)
            .ok_or_else(|| Error::UnknownFunction(name.to_string()))?;
        factory(args)
    }

    fn aggregate_function(
        &self,
        name: &FunctionName,
        arg: Option<&SqlType>,
    ) -> Result<AggregateFunction> {
        let factory = self
            .aggregates
            .get(name)
            .ok_or_else(|| Error::UnknownFunction(name.to_string()))?;
        factory(arg)
    }
}

/// The built-in functions.
mod builtins {
    use super::*;

    pub(super) fn install(registry: &mut SimpleFunctionRegistry) {
        registry.register_scalar("LEN", Arc::new(len_factory));
        registry.register_scalar("UCASE", Arc::new(ucase_factory));
        registry.register_scalar("LCASE", Arc::new(lcase_factory));
        registry.register_scalar("SUBSTRING", Arc::new(substring_factory));
        registry.register_scalar("ABS", Arc::new(abs_factory));
        registry.register_aggregate("COUNT", Arc::new(count_factory));
        registry.register_aggregate("SUM", Arc::new(sum_factory));
        registry.register_aggregate("MIN", Arc::new(min_factory));
        registry.register_aggregate("MAX", Arc::new(max_factory));
        registry.register_aggregate(WINDOW_START_NAME, Arc::new(window_bound_factory));
        registry.register_aggregate(WINDOW_END_NAME, Arc::new(window_bound_factory));
    }

    fn check_arity(name: &str, expected: usize, args: &[Option<SqlType>]) -> Result<()> {
        if args.len() != expected {
            return Err(Error::FunctionArityMismatch {
                name: name.to_string(),
                expected,
                actual: args.len(),
            });
        }
        Ok(())
    }

    /// NULL argument types match any parameter.
    fn check_arg(name: &str, arg: &Option<SqlType>, expected: &SqlType) -> Result<()> {
        match arg {
            None => Ok(()),
            Some(t) if t == expected => Ok(()),
            Some(t) => Err(Error::FunctionSignatureMismatch(format!(
                "{name} does not accept {t}"
            ))),
        }
    }

    fn string_fn(
        name: &str,
        return_type: SqlType,
        fun: impl Fn(&str) -> Value + Send + Sync + 'static,
    ) -> ScalarFunction {
        ScalarFunction {
            name: FunctionName::new(name),
            return_type,
            fun: Arc::new(move |args| match &args[0] {
                Value::Null => Ok(Value::Null),
                Value::String(s) => Ok(fun(s)),
                other => Err(Error::Evaluation(format!(
                    "expected STRING argument, got {other}"
                ))),
            }),
        }
    }

    fn len_factory(args: &[Option<SqlType>]) -> Result<ScalarFunction> {
        check_arity("LEN", 1, args)?;
        check_arg("LEN", &args[0], &SqlType::String)?;
        Ok(string_fn("LEN", SqlType::Integer, |s| {
            Value::Integer(s.chars().count() as i32)
        }))
    }

    fn ucase_factory(args: &[Option<SqlType>]) -> Result<ScalarFunction> {
        check_arity("UCASE", 1, args)?;
        check_arg("UCASE", &args[0], &SqlType::String)?;
        Ok(string_fn("UCASE", SqlType::String, |s| {
            Value::String(s.to_uppercase())
        }))
    }

    fn lcase_factory(args: &[Option<SqlType>]) -> Result<ScalarFunction> {
        check_arity("LCASE", 1, args)?;
        check_arg("LCASE", &args[0], &SqlType::String)?;
        Ok(string_fn("LCASE", SqlType::String, |s| {
            Value::String(s.to_lowercase())
        }))
    }

    /// SUBSTRING(str, pos[, len]) with 1-based positions.
    fn substring_factory(args: &[Option<SqlType>]) -> Result<ScalarFunction> {
        if args.len() != 2 && args.len() != 3 {
            return Err(Error::FunctionArityMismatch {
                name: "SUBSTRING".to_string(),
                expected: 2,
                actual: args.len(),
            });
        }
        check_arg("SUBSTRING", &args[0], &SqlType::String)?;
        check_arg("SUBSTRING", &args[1], &SqlType::Integer)?;
        if let Some(len) = args.get(2) {
            check_arg("SUBSTRING", len, &SqlType::Integer)?;
        }
        Ok(ScalarFunction {
            name: FunctionName::new("SUBSTRING"),
            return_type: SqlType::String,
            fun: Arc::new(|args| {
                let (s, pos) = match (&args[0], &args[1]) {
                    (Value::Null, _) | (_, Value::Null) => return Ok(Value::Null),
                    (Value::String(s), Value::Integer(pos)) => (s, *pos),
                    (a, b) => {
                        return Err(Error::Evaluation(format!(
                            "SUBSTRING arguments {a}, {b} have unexpected types"
                        )))
                    }
                };
                let chars: Vec<char> = s.chars().collect();
                let start = (pos.max(1) as usize - 1).min(chars.len());
                let taken = match args.get(2) {
                    Some(Value::Integer(len)) => chars[start..]
                        .iter()
                        .take((*len).max(0) as usize)
                        .collect::<String>(),
                    Some(Value::Null) => return Ok(Value::Null),
                    None => chars[start..].iter().collect::<String>(),
                    Some(other) => {
                        return Err(Error::Evaluation(format!(
                            "SUBSTRING length {other} has unexpected type"
                        )))
                    }
                };
                Ok(Value::String(taken))
            }),
        })
    }

    fn abs_factory(args: &[Option<SqlType>]) -> Result<ScalarFunction> {
        check_arity("ABS", 1, args)?;
        let return_type = match &args[0] {
            None => SqlType::Double,
            Some(t) if t.is_numeric() => t.clone(),
            Some(t) => {
                return Err(Error::FunctionSignatureMismatch(format!(
                    "ABS does not accept {t}"
                )))
            }
        };
        Ok(ScalarFunction {
            name: FunctionName::new("ABS"),
            return_type,
            fun: Arc::new(|args| {
                Ok(match &args[0] {
                    Value::Null => Value::Null,
                    Value::Integer(i) => Value::Integer(i.abs()),
                    Value::Bigint(i) => Value::Bigint(i.abs()),
                    Value::Double(d) => Value::Double(d.abs()),
                    Value::Decimal(d) => Value::Decimal(d.abs()),
                    other => {
                        return Err(Error::Evaluation(format!(
                            "ABS argument {other} has unexpected type"
                        )))
                    }
                })
            }),
        })
    }

    fn count_factory(arg: Option<&SqlType>) -> Result<AggregateFunction> {
        // the zero-argument form counts rows, the one-argument form counts
        // non-null inputs
        let count_rows = arg.is_none();
        Ok(AggregateFunction {
            name: FunctionName::new("COUNT"),
            return_type: SqlType::Bigint,
            initial_value: Value::Bigint(0),
            accumulate: Arc::new(move |acc, input| {
                let acc = match acc {
                    Value::Bigint(n) => n,
                    _ => 0,
                };
                if count_rows || !input.is_null() {
                    Value::Bigint(acc + 1)
                } else {
                    Value::Bigint(acc)
                }
            }),
            merge: Arc::new(|acc, other| match (acc, other) {
                (Value::Bigint(a), Value::Bigint(b)) => Value::Bigint(a + b),
                (acc, _) => acc,
            }),
        })
    }

    fn sum_factory(arg: Option<&SqlType>) -> Result<AggregateFunction> {
        let arg = arg.ok_or_else(|| Error::FunctionArityMismatch {
            name: "SUM".to_string(),
            expected: 1,
            actual: 0,
        })?;
        if !arg.is_numeric() {
            return Err(Error::FunctionSignatureMismatch(format!(
                "SUM does not accept {arg}"
            )));
        }
        Ok(AggregateFunction {
            name: FunctionName::new("SUM"),
            return_type: arg.clone(),
            initial_value: Value::Null,
            accumulate: Arc::new(|acc, input| numeric_add(acc, input)),
            merge: Arc::new(|acc, other| numeric_add(acc, other)),
        })
    }

    fn min_factory(arg: Option<&SqlType>) -> Result<AggregateFunction> {
        extremum_factory("MIN", arg, Ordering::Less)
    }

    fn max_factory(arg: Option<&SqlType>) -> Result<AggregateFunction> {
        extremum_factory("MAX", arg, Ordering::Greater)
    }

    fn extremum_factory(
        name: &str,
        arg: Option<&SqlType>,
        keep: Ordering,
    ) -> Result<AggregateFunction> {
        let arg = arg.ok_or_else(|| Error::FunctionArityMismatch {
            name: name.to_string(),
            expected: 1,
            actual: 0,
        })?;
        if !arg.is_numeric() && arg != &SqlType::String {
            return Err(Error::FunctionSignatureMismatch(format!(
                "{name} does not accept {arg}"
            )));
        }
        let pick = move |acc: Value, input: &Value| -> Value {
            if input.is_null() {
                return acc;
            }
            if acc.is_null() {
                return input.clone();
            }
            match compare_values(input, &acc) {
                Some(ordering) if ordering == keep => input.clone(),
                _ => acc,
            }
        };
        Ok(AggregateFunction {
            name: FunctionName::new(name),
            return_type: arg.clone(),
            initial_value: Value::Null,
            accumulate: Arc::new(pick),
            merge: Arc::new(pick),
        })
    }

    /// The window bounds are filled in by the window selector after
    /// aggregation; the accumulator itself carries nothing.
    fn window_bound_factory(_arg: Option<&SqlType>) -> Result<AggregateFunction> {
        Ok(AggregateFunction {
            name: FunctionName::new(WINDOW_START_NAME),
            return_type: SqlType::Bigint,
            initial_value: Value::Null,
            accumulate: Arc::new(|acc, _| acc),
            merge: Arc::new(|acc, _| acc),
        })
    }

    fn numeric_add(acc: Value, input: &Value) -> Value {
        use Value::*;
        match (acc, input) {
            (acc, Null) => acc,
            (Null, input) => input.clone(),
            (Integer(a), Integer(b)) => Integer(a + b),
            (Bigint(a), Bigint(b)) => Bigint(a + b),
            (Bigint(a), Integer(b)) => Bigint(a + *b as i64),
            (Double(a), Double(b)) => Double(a + b),
            (Decimal(a), Decimal(b)) => Decimal(a + b),
            (acc, _) => acc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_at_the_boundary() {
        let registry = SimpleFunctionRegistry::with_builtins();
        assert!(registry.is_aggregate(&FunctionName::new("count")));
        assert!(registry.is_aggregate(&FunctionName::new("COUNT")));
        assert!(!registry.is_aggregate(&FunctionName::new("LEN")));
    }

    #[test]
    fn unknown_function() {
        let registry = SimpleFunctionRegistry::with_builtins();
        let err = registry
            .scalar_function(&FunctionName::new("NO_SUCH_FN"), &[])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownFunction(_)));
    }

    #[test]
    fn arity_and_signature_checks() {
        let registry = SimpleFunctionRegistry::with_builtins();
        let err = registry
            .scalar_function(&FunctionName::new("LEN"), &[])
            .unwrap_err();
        assert!(matches!(err, Error::FunctionArityMismatch { .. }));

        let err = registry
            .scalar_function(&FunctionName::new("LEN"), &[Some(SqlType::Integer)])
            .unwrap_err();
        assert!(matches!(err, Error::FunctionSignatureMismatch(_)));

        let len = registry
            .scalar_function(&FunctionName::new("LEN"), &[Some(SqlType::String)])
            .unwrap();
        assert_eq!(len.return_type, SqlType::Integer);
        assert_eq!(
            (len.fun)(&[Value::String("abc".into())]).unwrap(),
            Value::Integer(3)
        );
    }

    #[test]
    fn count_counts() {
        let registry = SimpleFunctionRegistry::with_builtins();
        let count = registry
            .aggregate_function(&FunctionName::new("COUNT"), None)
            .unwrap();
        let mut acc = count.initial_value.clone();
        for _ in 0..3 {
            acc = (count.accumulate)(acc, &Value::Null);
        }
        assert_eq!(acc, Value::Bigint(3));

        let count_col = registry
            .aggregate_function(&FunctionName::new("COUNT"), Some(&SqlType::Integer))
            .unwrap();
        let mut acc = count_col.initial_value.clone();
        acc = (count_col.accumulate)(acc, &Value::Integer(1));
        acc = (count_col.accumulate)(acc, &Value::Null);
        assert_eq!(acc, Value::Bigint(1));
    }

    #[test]
    fn sum_and_extrema() {
        let registry = SimpleFunctionRegistry::with_builtins();
        let sum = registry
            .aggregate_function(&FunctionName::new("SUM"), Some(&SqlType::Bigint))
            .unwrap();
        let mut acc = sum.initial_value.clone();
        acc = (sum.accumulate)(acc, &Value::Bigint(2));
        acc = (sum.accumulate)(acc, &Value::Bigint(5));
        assert_eq!(acc, Value::Bigint(7));

        let max = registry
            .aggregate_function(&FunctionName::new("MAX"), Some(&SqlType::Integer))
            .unwrap();
        let mut acc = max.initial_value.clone();
        acc = (max.accumulate)(acc, &Value::Integer(3));
        acc = (max.accumulate)(acc, &Value::Integer(1));
        assert_eq!(acc, Value::Integer(3));
    }
}
