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

//! Lowering a type-checked expression to a row-level evaluator.
//!
//! Type inference runs first, so an expression compiles iff it infers, with
//! the same error for the same root cause. Lowering then collects the minimal
//! set of required columns (by full name, with their row positions) and
//! resolves every function call to its own instance with a stable per-site
//! identifier.

use std::sync::Arc;

use flowsql_common::error::{Error, Result};
use flowsql_common::internal_err;
use flowsql_expr::expr::{Expr, FunctionCall};
use flowsql_expr::expr_schema::expr_type;
use flowsql_expr::operator::Operator;
use flowsql_expr::registry::{FunctionRegistry, ScalarFunction};
use flowsql_expr::schema::{Column, LogicalSchema};
use flowsql_expr::type_coercion::binary::{eq_coercion, get_input_types, get_result_type};
use flowsql_expr::types::SqlType;
use flowsql_expr::value::Value;
use indexmap::IndexMap;

use crate::expressions::{
    BinaryExpr, CaseExpr, CastExpr, ColumnExpr, CompiledPattern, GetFieldExpr, InListExpr,
    IsNullExpr, LikeExpr, LiteralExpr, NegativeExpr, NotExpr, PatternSource, SubscriptExpr,
};
use crate::physical_expr::PhysicalExpr;
use crate::scalar_function::ScalarFunctionExpr;

/// A function call site resolved to a concrete instance.
#[derive(Debug, Clone)]
pub struct FunctionSite {
    pub id: String,
    pub function: ScalarFunction,
}

/// A compiled row-level evaluator plus everything the runtime needs to feed
/// it: which row slots it reads and which function instances it owns.
#[derive(Debug)]
pub struct CompiledExpression {
    expr: Arc<dyn PhysicalExpr>,
    required_columns: Vec<Column>,
    function_sites: Vec<FunctionSite>,
    data_type: Option<SqlType>,
}

impl CompiledExpression {
    /// The distinct columns the expression reads, in first-use order, each
    /// carrying its positional index within the row.
    pub fn required_columns(&self) -> &[Column] {
        &self.required_columns
    }

    pub fn function_sites(&self) -> &[FunctionSite] {
        &self.function_sites
    }

    pub fn data_type(&self) -> Option<&SqlType> {
        self.data_type.as_ref()
    }

    pub fn evaluate(&self, row: &[Value]) -> Result<Value> {
        self.expr.evaluate(row)
    }
}

/// Compile `expr` against `schema`'s value columns.
pub fn create_physical_expr(
    expr: &Expr,
    schema: &LogicalSchema,
    registry: &dyn FunctionRegistry,
) -> Result<CompiledExpression> {
    // inference first: an expression compiles iff it type-checks
    let data_type = expr_type(expr, schema, registry)?;
    let mut planner = PhysicalPlanner {
        schema,
        registry,
        columns: IndexMap::new(),
        sites: Vec::new(),
    };
    let physical = planner.plan(expr)?;
    Ok(CompiledExpression {
        expr: physical,
        required_columns: planner.columns.into_values().collect(),
        function_sites: planner.sites,
        data_type,
    })
}

struct PhysicalPlanner<'a> {
    schema: &'a LogicalSchema,
    registry: &'a dyn FunctionRegistry,
    columns: IndexMap<String, Column>,
    sites: Vec<FunctionSite>,
}

impl PhysicalPlanner<'_> {
    fn plan(&mut self, expr: &Expr) -> Result<Arc<dyn PhysicalExpr>> {
        Ok(match expr {
            Expr::Literal(value) => Arc::new(LiteralExpr::new(value.clone())),
            Expr::Column(wanted) => {
                let column = self
                    .schema
                    .find_value_column(wanted)
                    .ok_or_else(|| Error::UnknownColumn(wanted.to_string()))?;
                let full_name = column.full_name();
                self.columns
                    .entry(full_name.clone())
                    .or_insert_with(|| column.clone());
                Arc::new(ColumnExpr::new(
                    full_name,
                    column.index(),
                    column.sql_type().clone(),
                ))
            }
            Expr::BinaryExpr { left, op, right } => {
                let left = self.plan(left)?;
                let right = self.plan(right)?;
                self.binary(left, *op, right)?
            }
            Expr::Negative(operand) => Arc::new(NegativeExpr::new(self.plan(operand)?)),
            Expr::Not(operand) => Arc::new(NotExpr::new(self.plan(operand)?)),
            Expr::IsNull(operand) => Arc::new(IsNullExpr::new(self.plan(operand)?, false)),
            Expr::IsNotNull(operand) => Arc::new(IsNullExpr::new(self.plan(operand)?, true)),
            Expr::Between {
                expr,
                negated,
                low,
                high,
            } => {
                // lowered to `expr >= low AND expr <= high`; the operand is
                // planned once so call sites inside it stay unique
                let operand = self.plan(expr)?;
                let low = self.plan(low)?;
                let high = self.plan(high)?;
                let lower = self.binary(operand.clone(), Operator::GtEq, low)?;
                let upper = self.binary(operand, Operator::LtEq, high)?;
                let both = self.binary(lower, Operator::And, upper)?;
                if *negated {
                    Arc::new(NotExpr::new(both))
                } else {
                    both
                }
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                let input = self.plan(expr)?;
                let pattern = match pattern.as_ref() {
                    Expr::Literal(Value::String(pattern)) => {
                        PatternSource::Constant(CompiledPattern::compile(pattern)?)
                    }
                    other => PatternSource::Dynamic(self.plan(other)?),
                };
                Arc::new(LikeExpr::new(input, pattern, *negated))
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                let needle = self.plan(expr)?;
                let list = list
                    .iter()
                    .map(|item| self.plan(item))
                    .collect::<Result<Vec<_>>>()?;
                Arc::new(InListExpr::new(needle, list, *negated))
            }
            Expr::Cast { expr, data_type } => {
                Arc::new(CastExpr::new(self.plan(expr)?, data_type.clone()))
            }
            Expr::Subscript { base, index } => {
                let base = self.plan(base)?;
                let index = self.plan(index)?;
                let data_type = match base.data_type() {
                    Some(SqlType::Array(element)) => Some(*element),
                    Some(SqlType::Map(value)) => Some(*value),
                    _ => None,
                };
                Arc::new(SubscriptExpr::new(base, index, data_type))
            }
            Expr::GetField { base, field } => {
                let base = self.plan(base)?;
                let data_type = match base.data_type() {
                    Some(SqlType::Struct(fields)) => fields
                        .iter()
                        .find(|f| &f.name == field)
                        .map(|f| f.sql_type.clone()),
                    _ => None,
                };
                Arc::new(GetFieldExpr::new(base, field.clone(), data_type))
            }
            Expr::Function(call) => self.function(call)?,
            Expr::Case {
                operand,
                when_then,
                else_expr,
            } => {
                let operand = operand
                    .as_ref()
                    .map(|o| self.plan(o))
                    .transpose()?;
                let when_then = when_then
                    .iter()
                    .map(|(when, then)| Ok((self.plan(when)?, self.plan(then)?)))
                    .collect::<Result<Vec<_>>>()?;
                let else_expr = else_expr
                    .as_ref()
                    .map(|e| self.plan(e))
                    .transpose()?;
                let mut data_type: Option<SqlType> = None;
                for branch in when_then
                    .iter()
                    .map(|(_, then)| then)
                    .chain(else_expr.iter())
                {
                    data_type = match (data_type, branch.data_type()) {
                        (None, t) | (t, None) => t,
                        (Some(a), Some(b)) => eq_coercion(&a, &b),
                    };
                }
                Arc::new(CaseExpr::new(operand, when_then, else_expr, data_type))
            }
        })
    }

    /// Build a binary node, widening operand types when both are known.
    fn binary(
        &self,
        left: Arc<dyn PhysicalExpr>,
        op: Operator,
        right: Arc<dyn PhysicalExpr>,
    ) -> Result<Arc<dyn PhysicalExpr>> {
        let (input_types, data_type) = match (left.data_type(), right.data_type()) {
            (Some(l), Some(r)) => (
                Some(get_input_types(&l, &op, &r)?),
                Some(get_result_type(&l, &op, &r)?),
            ),
            _ if op.is_comparison() || op.is_logical() => (None, Some(SqlType::Boolean)),
            (l, r) => (None, l.or(r)),
        };
        Ok(Arc::new(BinaryExpr::new(
            left,
            op,
            right,
            input_types,
            data_type,
        )))
    }

    fn function(&mut self, call: &FunctionCall) -> Result<Arc<dyn PhysicalExpr>> {
        if self.registry.is_aggregate(&call.name) {
            return internal_err!(
                "aggregate function {} cannot be evaluated per row",
                call.name
            );
        }
        let args = call
            .args
            .iter()
            .map(|arg| self.plan(arg))
            .collect::<Result<Vec<_>>>()?;
        let arg_types: Vec<_> = args.iter().map(|arg| arg.data_type()).collect();
        let function = self.registry.scalar_function(&call.name, &arg_types)?;
        let site = FunctionSite {
            id: format!("fn_{}", self.sites.len()),
            function: function.clone(),
        };
        self.sites.push(site.clone());
        Ok(Arc::new(ScalarFunctionExpr::new(site.id, function, args)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowsql_expr::expr::{binary_expr, col, lit, qcol};
    use flowsql_expr::registry::SimpleFunctionRegistry;
    use flowsql_expr::schema::LogicalSchema;
    use flowsql_common::name::SourceName;

    fn schema() -> LogicalSchema {
        LogicalSchema::builder()
            .value_column("a", SqlType::Integer)
            .value_column("b", SqlType::String)
            .value_column("c", SqlType::Double)
            .build()
            .unwrap()
            .with_alias(&SourceName::new("S"))
            .unwrap()
    }

    fn compile(expr: &Expr) -> Result<CompiledExpression> {
        let registry = SimpleFunctionRegistry::with_builtins();
        create_physical_expr(expr, &schema(), &registry)
    }

    fn row(a: i32, b: &str, c: f64) -> Vec<Value> {
        vec![Value::Integer(a), Value::String(b.into()), Value::Double(c)]
    }

    #[test]
    fn required_columns_are_minimal_and_positional() {
        let expr = binary_expr(
            binary_expr(col("a"), Operator::Plus, col("a")),
            Operator::Plus,
            Expr::Function(FunctionCall::new("LEN", vec![qcol("S", "b")])),
        );
        let compiled = compile(&expr).unwrap();
        let names: Vec<_> = compiled
            .required_columns()
            .iter()
            .map(|c| (c.full_name(), c.index()))
            .collect();
        assert_eq!(
            names,
            vec![("S.a".to_string(), 0), ("S.b".to_string(), 1)]
        );
    }

    #[test]
    fn evaluation_reads_row_slots() {
        let expr = binary_expr(col("a"), Operator::Plus, lit(1));
        let compiled = compile(&expr).unwrap();
        assert_eq!(
            compiled.evaluate(&row(41, "x", 0.0)).unwrap(),
            Value::Integer(42)
        );
    }

    #[test]
    fn each_call_site_gets_its_own_instance() {
        let expr = binary_expr(
            Expr::Function(FunctionCall::new("LEN", vec![col("b")])),
            Operator::Plus,
            Expr::Function(FunctionCall::new("LEN", vec![col("b")])),
        );
        let compiled = compile(&expr).unwrap();
        let ids: Vec<_> = compiled
            .function_sites()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["fn_0", "fn_1"]);
        assert_eq!(
            compiled.evaluate(&row(0, "abc", 0.0)).unwrap(),
            Value::Integer(6)
        );
    }

    #[test]
    fn compiles_iff_it_infers() {
        let bad = binary_expr(col("b"), Operator::Plus, lit(1));
        let infer_err = expr_type(&bad, &schema(), &SimpleFunctionRegistry::with_builtins())
            .unwrap_err();
        let compile_err = compile(&bad).unwrap_err();
        assert_eq!(
            std::mem::discriminant(&infer_err),
            std::mem::discriminant(&compile_err)
        );

        let unknown = col("zzz");
        assert!(matches!(
            compile(&unknown).unwrap_err(),
            Error::UnknownColumn(_)
        ));
    }

    #[test]
    fn between_lowering_keeps_null_semantics() {
        let expr = Expr::Between {
            expr: Box::new(col("a")),
            negated: false,
            low: Box::new(lit(1)),
            high: Box::new(lit(10)),
        };
        let compiled = compile(&expr).unwrap();
        assert_eq!(
            compiled.evaluate(&row(5, "", 0.0)).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            compiled.evaluate(&row(11, "", 0.0)).unwrap(),
            Value::Boolean(false)
        );
        let mut null_row = row(0, "", 0.0);
        null_row[0] = Value::Null;
        assert_eq!(
            compiled.evaluate(&null_row).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn case_evaluation() {
        let expr = Expr::Case {
            operand: None,
            when_then: vec![(
                binary_expr(col("a"), Operator::Gt, lit(0)),
                lit("positive"),
            )],
            else_expr: Some(Box::new(lit("other"))),
        };
        let compiled = compile(&expr).unwrap();
        assert_eq!(compiled.data_type(), Some(&SqlType::String));
        assert_eq!(
            compiled.evaluate(&row(3, "", 0.0)).unwrap(),
            Value::String("positive".into())
        );
        assert_eq!(
            compiled.evaluate(&row(-3, "", 0.0)).unwrap(),
            Value::String("other".into())
        );
    }
}
