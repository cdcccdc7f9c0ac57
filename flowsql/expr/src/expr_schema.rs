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

//! Expression type inference.
//!
//! Walks an expression against a schema's value columns and the function
//! registry, producing the expression's type or a typed error. A NULL
//! literal's type is unknown (`None`) and propagates as any.

use flowsql_common::error::{Error, Result};

use crate::expr::{Expr, FunctionCall};
use crate::registry::FunctionRegistry;
use crate::schema::LogicalSchema;
use crate::type_coercion::binary::{eq_coercion, get_result_type, order_coercion};
use crate::types::SqlType;

/// The context a tree walk carries: the row schema and the installed
/// functions.
pub struct ExprTypeContext<'a> {
    schema: &'a LogicalSchema,
    registry: &'a dyn FunctionRegistry,
}

/// Infer the type of `expr` against `schema`'s value columns.
pub fn expr_type(
    expr: &Expr,
    schema: &LogicalSchema,
    registry: &dyn FunctionRegistry,
) -> Result<Option<SqlType>> {
    ExprTypeContext::new(schema, registry).expr_type(expr)
}

impl<'a> ExprTypeContext<'a> {
    pub fn new(schema: &'a LogicalSchema, registry: &'a dyn FunctionRegistry) -> Self {
        Self { schema, registry }
    }

    pub fn schema(&self) -> &LogicalSchema {
        self.schema
    }

    /// The type of `expr`, or `None` when the expression is NULL-typed.
    pub fn expr_type(&self, expr: &Expr) -> Result<Option<SqlType>> {
        match expr {
            Expr::Literal(value) => Ok(value.sql_type()),
            Expr::Column(column) => self
                .schema
                .find_value_column(column)
                .map(|c| Some(c.sql_type().clone()))
                .ok_or_else(|| Error::UnknownColumn(column.to_string())),
            Expr::BinaryExpr { left, op, right } => {
                let lhs = self.expr_type(left)?;
                let rhs = self.expr_type(right)?;
                match (lhs, rhs) {
                    (Some(lhs), Some(rhs)) => get_result_type(&lhs, op, &rhs).map(Some),
                    // NULL propagates as any: comparisons and logical
                    // operators stay BOOLEAN, arithmetic takes the known side
                    _ if op.is_comparison() || op.is_logical() => Ok(Some(SqlType::Boolean)),
                    (known, None) | (None, known) => Ok(known),
                }
            }
            Expr::Negative(operand) => match self.expr_type(operand)? {
                None => Ok(None),
                Some(t) if t.is_numeric() => Ok(Some(t)),
                Some(t) => Err(Error::ArithmeticTypeMismatch(format!("-{t}"))),
            },
            Expr::Not(operand) => match self.expr_type(operand)? {
                None | Some(SqlType::Boolean) => Ok(Some(SqlType::Boolean)),
                Some(t) => Err(Error::TypeMismatch(format!(
                    "NOT requires a BOOLEAN operand, got {t}"
                ))),
            },
            Expr::IsNull(operand) | Expr::IsNotNull(operand) => {
                self.expr_type(operand)?;
                Ok(Some(SqlType::Boolean))
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                let operand = self.expr_type(expr)?;
                for bound in [low, high] {
                    let bound = self.expr_type(bound)?;
                    if let (Some(operand), Some(bound)) = (&operand, &bound) {
                        if order_coercion(operand, bound).is_none() {
                            return Err(Error::ComparisonIncompatibleTypes(format!(
                                "{operand} BETWEEN {bound}"
                            )));
                        }
                    }
                }
                Ok(Some(SqlType::Boolean))
            }
            Expr::Like { expr, pattern, .. } => {
                for operand in [expr, pattern] {
                    match self.expr_type(operand)? {
                        None | Some(SqlType::String) => {}
                        Some(t) => {
                            return Err(Error::TypeMismatch(format!(
                                "LIKE requires STRING operands, got {t}"
                            )))
                        }
                    }
                }
                Ok(Some(SqlType::Boolean))
            }
            Expr::InList { expr, list, .. } => {
                let operand = self.expr_type(expr)?;
                for item in list {
                    let item = self.expr_type(item)?;
                    if let (Some(operand), Some(item)) = (&operand, &item) {
                        if eq_coercion(operand, item).is_none() {
                            return Err(Error::ComparisonIncompatibleTypes(format!(
                                "{operand} IN (… {item} …)"
                            )));
                        }
                    }
                }
                Ok(Some(SqlType::Boolean))
            }
            Expr::Cast { expr, data_type } => match self.expr_type(expr)? {
                None => Ok(Some(data_type.clone())),
                Some(src) if src.can_cast_to(data_type) => Ok(Some(data_type.clone())),
                Some(src) => Err(Error::CastNotSupported {
                    from: src.to_string(),
                    to: data_type.to_string(),
                }),
            },
            Expr::Subscript { base, index } => {
                let index_type = self.expr_type(index)?;
                match self.expr_type(base)? {
                    None => Ok(None),
                    Some(SqlType::Array(element)) => match index_type {
                        None | Some(SqlType::Integer) => Ok(Some(*element)),
                        Some(t) => Err(Error::TypeMismatch(format!(
                            "array index must be INT, got {t}"
                        ))),
                    },
                    Some(SqlType::Map(value)) => match index_type {
                        None | Some(SqlType::String) => Ok(Some(*value)),
                        Some(t) => Err(Error::TypeMismatch(format!(
                            "map key must be STRING, got {t}"
                        ))),
                    },
                    Some(t) => Err(Error::SubscriptBaseNotContainer(t.to_string())),
                }
            }
            Expr::GetField { base, field } => match self.expr_type(base)? {
                Some(SqlType::Struct(fields)) => fields
                    .iter()
                    .find(|f| &f.name == field)
                    .map(|f| Some(f.sql_type.clone()))
                    .ok_or_else(|| Error::DereferenceUnresolved(field.clone())),
                Some(t) => Err(Error::DereferenceUnresolved(format!(
                    "{field} (base has type {t})"
                ))),
                None => Ok(None),
            },
            Expr::Function(call) => self.function_type(call),
            Expr::Case {
                operand,
                when_then,
                else_expr,
            } => self.case_type(operand.as_deref(), when_then, else_expr.as_deref()),
        }
    }

    fn function_type(&self, call: &FunctionCall) -> Result<Option<SqlType>> {
        if self.registry.is_aggregate(&call.name) {
            if call.args.len() > 1 {
                return Err(Error::FunctionArityMismatch {
                    name: call.name.to_string(),
                    expected: 1,
                    actual: call.args.len(),
                });
            }
            let arg = match call.args.first() {
                Some(arg) => self.expr_type(arg)?,
                None => None,
            };
            let function = self.registry.aggregate_function(&call.name, arg.as_ref())?;
            Ok(Some(function.return_type))
        } else {
            let args = call
                .args
                .iter()
                .map(|arg| self.expr_type(arg))
                .collect::<Result<Vec<_>>>()?;
            let function = self.registry.scalar_function(&call.name, &args)?;
            Ok(Some(function.return_type))
        }
    }

    fn case_type(
        &self,
        operand: Option<&Expr>,
        when_then: &[(Expr, Expr)],
        else_expr: Option<&Expr>,
    ) -> Result<Option<SqlType>> {
        let operand_type = operand.map(|o| self.expr_type(o)).transpose()?.flatten();
        for (when, _) in when_then {
            let when_type = self.expr_type(when)?;
            match (operand, &when_type) {
                // searched CASE: every WHEN must be BOOLEAN
                (None, Some(t)) if t != &SqlType::Boolean => {
                    return Err(Error::CaseTypeMismatch(format!(
                        "WHEN operand must be BOOLEAN, got {t}"
                    )))
                }
                // simple CASE: every WHEN must be comparable to the operand
                (Some(_), Some(t)) => {
                    if let Some(operand_type) = &operand_type {
                        if eq_coercion(operand_type, t).is_none() {
                            return Err(Error::CaseTypeMismatch(format!(
                                "cannot compare CASE operand {operand_type} with WHEN {t}"
                            )));
                        }
                    }
                }
                _ => {}
            }
        }

        let mut result: Option<SqlType> = None;
        let results = when_then
            .iter()
            .map(|(_, then)| then)
            .chain(else_expr.into_iter());
        for branch in results {
            let branch_type = self.expr_type(branch)?;
            result = match (result, branch_type) {
                (None, t) | (t, None) => t,
                (Some(a), Some(b)) => Some(eq_coercion(&a, &b).ok_or_else(|| {
                    Error::CaseTypeMismatch(format!("{a} is incompatible with {b}"))
                })?),
            };
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{binary_expr, col, lit, null_lit, qcol};
    use crate::operator::Operator;
    use crate::registry::SimpleFunctionRegistry;
    use crate::schema::LogicalSchema;
    use crate::types::Field;
    use crate::value::decimal;
    use flowsql_common::name::SourceName;

    fn schema() -> LogicalSchema {
        LogicalSchema::builder()
            .value_column("i", SqlType::Integer)
            .value_column("l", SqlType::Bigint)
            .value_column("d", SqlType::Double)
            .value_column("s", SqlType::String)
            .value_column("b", SqlType::Boolean)
            .value_column("dec", SqlType::decimal(6, 2).unwrap())
            .value_column("arr", SqlType::array(SqlType::String))
            .value_column("map", SqlType::map(SqlType::Integer))
            .value_column(
                "addr",
                SqlType::Struct(vec![
                    Field::new("street", SqlType::String),
                    Field::new("number", SqlType::Integer),
                ]),
            )
            .build()
            .unwrap()
            .with_alias(&SourceName::new("S"))
            .unwrap()
    }

    fn infer(expr: &Expr) -> Result<Option<SqlType>> {
        let registry = SimpleFunctionRegistry::with_builtins();
        expr_type(expr, &schema(), &registry)
    }

    #[test]
    fn column_resolution() {
        assert_eq!(infer(&col("i")).unwrap(), Some(SqlType::Integer));
        assert_eq!(infer(&qcol("S", "s")).unwrap(), Some(SqlType::String));
        assert!(matches!(
            infer(&col("missing")),
            Err(Error::UnknownColumn(_))
        ));
        assert!(matches!(
            infer(&qcol("T", "i")),
            Err(Error::UnknownColumn(_))
        ));
    }

    #[test]
    fn arithmetic_promotion() {
        let expr = binary_expr(col("i"), Operator::Plus, col("l"));
        assert_eq!(infer(&expr).unwrap(), Some(SqlType::Bigint));

        let expr = binary_expr(col("dec"), Operator::Plus, col("d"));
        assert_eq!(infer(&expr).unwrap(), Some(SqlType::Double));

        let expr = binary_expr(col("dec"), Operator::Plus, col("i"));
        assert_eq!(infer(&expr).unwrap(), Some(SqlType::decimal(13, 2).unwrap()));

        let expr = binary_expr(col("s"), Operator::Plus, col("i"));
        assert!(matches!(infer(&expr), Err(Error::ArithmeticTypeMismatch(_))));
    }

    #[test]
    fn comparisons_are_boolean() {
        let expr = binary_expr(col("i"), Operator::Gt, col("d"));
        assert_eq!(infer(&expr).unwrap(), Some(SqlType::Boolean));

        let expr = binary_expr(col("s"), Operator::Eq, col("i"));
        assert!(matches!(
            infer(&expr),
            Err(Error::ComparisonIncompatibleTypes(_))
        ));

        let expr = binary_expr(col("i"), Operator::Eq, null_lit());
        assert_eq!(infer(&expr).unwrap(), Some(SqlType::Boolean));
    }

    #[test]
    fn cast_legality() {
        let ok = Expr::Cast {
            expr: Box::new(col("s")),
            data_type: SqlType::Boolean,
        };
        assert_eq!(infer(&ok).unwrap(), Some(SqlType::Boolean));

        let bad = Expr::Cast {
            expr: Box::new(col("addr")),
            data_type: SqlType::String,
        };
        assert!(matches!(infer(&bad), Err(Error::CastNotSupported { .. })));
    }

    #[test]
    fn subscript_types() {
        let array = Expr::Subscript {
            base: Box::new(col("arr")),
            index: Box::new(lit(0)),
        };
        assert_eq!(infer(&array).unwrap(), Some(SqlType::String));

        let map = Expr::Subscript {
            base: Box::new(col("map")),
            index: Box::new(lit("k")),
        };
        assert_eq!(infer(&map).unwrap(), Some(SqlType::Integer));

        let bad_index = Expr::Subscript {
            base: Box::new(col("map")),
            index: Box::new(lit(0)),
        };
        assert!(matches!(infer(&bad_index), Err(Error::TypeMismatch(_))));

        let not_container = Expr::Subscript {
            base: Box::new(col("i")),
            index: Box::new(lit(0)),
        };
        assert!(matches!(
            infer(&not_container),
            Err(Error::SubscriptBaseNotContainer(_))
        ));
    }

    #[test]
    fn struct_dereference() {
        let ok = Expr::GetField {
            base: Box::new(col("addr")),
            field: "number".to_string(),
        };
        assert_eq!(infer(&ok).unwrap(), Some(SqlType::Integer));

        let bad = Expr::GetField {
            base: Box::new(col("addr")),
            field: "zip".to_string(),
        };
        assert!(matches!(infer(&bad), Err(Error::DereferenceUnresolved(_))));
    }

    #[test]
    fn case_branches_must_unify() {
        let ok = Expr::Case {
            operand: None,
            when_then: vec![(binary_expr(col("i"), Operator::Gt, lit(0)), col("i"))],
            else_expr: Some(Box::new(col("l"))),
        };
        assert_eq!(infer(&ok).unwrap(), Some(SqlType::Bigint));

        let bad_when = Expr::Case {
            operand: None,
            when_then: vec![(col("i"), lit(1))],
            else_expr: None,
        };
        assert!(matches!(infer(&bad_when), Err(Error::CaseTypeMismatch(_))));

        let bad_result = Expr::Case {
            operand: None,
            when_then: vec![(col("b"), col("i"))],
            else_expr: Some(Box::new(col("s"))),
        };
        assert!(matches!(infer(&bad_result), Err(Error::CaseTypeMismatch(_))));
    }

    #[test]
    fn function_calls() {
        let len = Expr::Function(FunctionCall::new("LEN", vec![col("s")]));
        assert_eq!(infer(&len).unwrap(), Some(SqlType::Integer));

        let count = Expr::Function(FunctionCall::new("COUNT", vec![]));
        assert_eq!(infer(&count).unwrap(), Some(SqlType::Bigint));

        let unknown = Expr::Function(FunctionCall::new("NOPE", vec![]));
        assert!(matches!(infer(&unknown), Err(Error::UnknownFunction(_))));
    }

    #[test]
    fn decimal_comparison_widens() {
        let expr = binary_expr(col("dec"), Operator::Lt, lit(decimal(10, 1)));
        assert_eq!(infer(&expr).unwrap(), Some(SqlType::Boolean));
    }
}
