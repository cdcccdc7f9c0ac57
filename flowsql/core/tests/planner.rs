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

//! End-to-end planning scenarios over a small stream/table catalog.

use std::time::Duration;

use flowsql::expr::expr::FunctionCall;
use flowsql::expr::registry::SimpleFunctionRegistry;
use flowsql::plan::insert_values::{Clock, InsertValuesPlanner};
use flowsql::plan::node::join::JoinType;
use flowsql::plan::window::JoinWindow;
use flowsql::prelude::*;

fn catalog() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();

    let s = LogicalSchema::builder()
        .value_column("a", SqlType::Integer)
        .value_column("b", SqlType::String)
        .value_column("ts", SqlType::Bigint)
        .build()
        .unwrap();
    catalog.register(
        CatalogSource::new("S", SourceType::Stream, s, "s-topic", 4)
            .with_key_field(KeyField::of(ColumnRef::bare("a"))),
    );

    let s2 = LogicalSchema::builder()
        .value_column("a", SqlType::Integer)
        .value_column("c", SqlType::String)
        .build()
        .unwrap();
    catalog.register(
        CatalogSource::new("S2", SourceType::Stream, s2, "s2-topic", 4)
            .with_key_field(KeyField::of(ColumnRef::bare("a"))),
    );

    let t = LogicalSchema::builder()
        .value_column("a", SqlType::Integer)
        .value_column("v", SqlType::Double)
        .build()
        .unwrap();
    catalog.register(
        CatalogSource::new("T", SourceType::Table, t, "t-topic", 4)
            .with_key_field(KeyField::of(ColumnRef::bare("a"))),
    );

    let t_small = LogicalSchema::builder()
        .value_column("a", SqlType::Integer)
        .value_column("w", SqlType::Double)
        .build()
        .unwrap();
    catalog.register(
        CatalogSource::new("T_SMALL", SourceType::Table, t_small, "t-small-topic", 2)
            .with_key_field(KeyField::of(ColumnRef::bare("a"))),
    );

    catalog
}

fn source<'a>(
    catalog: &MemoryCatalog,
    registry: &'a SimpleFunctionRegistry,
    name: &str,
    alias: Option<&str>,
) -> PlanBuilder<'a> {
    let _ = env_logger::builder().is_test(true).try_init();
    PlanBuilder::from_catalog(
        catalog,
        name,
        alias.map(SourceName::new),
        registry,
        PlannerConfig::default(),
    )
    .unwrap()
}

// SELECT a, b FROM S
#[test]
fn select_two_columns_keeps_key_field() {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let plan = source(&catalog, &registry, "S", None)
        .project(vec![(None, col("a")), (None, col("b"))])
        .unwrap()
        .build();

    assert_eq!(
        plan.schema().to_string(),
        "[ROWKEY STRING KEY, a INT, b STRING]"
    );
    assert_eq!(plan.key_field(), &KeyField::of(ColumnRef::bare("a")));
    assert_eq!(plan.node_type(), NodeType::Stream);
    // no repartition anywhere in the tree
    let PlanNode::Project(project) = &plan else {
        panic!("expected a Project");
    };
    assert!(matches!(project.input(), PlanNode::Source(_)));
}

// SELECT COUNT(*) FROM S GROUP BY b
#[test]
fn group_by_non_key_column_repartitions() {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let plan = source(&catalog, &registry, "S", None)
        .group_by(vec![col("b")])
        .unwrap()
        .aggregate(vec![(None, FunctionCall::new("COUNT", vec![]))], None)
        .unwrap()
        .build();

    assert_eq!(plan.node_type(), NodeType::Table);
    assert_eq!(plan.key_field(), &KeyField::of(ColumnRef::bare("b")));
    let rendered: Vec<_> = plan
        .schema()
        .value_columns()
        .iter()
        .map(|c| format!("{} {}", c.name(), c.sql_type()))
        .collect();
    assert_eq!(rendered, vec!["b STRING", "FSQL_COL_0 BIGINT"]);

    let PlanNode::Aggregate(aggregate) = &plan else {
        panic!("expected an Aggregate");
    };
    let PlanNode::GroupBy(group_by) = aggregate.input() else {
        panic!("expected a GroupBy");
    };
    assert!(matches!(group_by.input(), PlanNode::Repartition(_)));
}

// SELECT s.a, t.v FROM S s JOIN T t ON s.a = t.a
#[test]
fn stream_table_join() {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let right = source(&catalog, &registry, "T", Some("t")).build();
    let plan = source(&catalog, &registry, "S", Some("s"))
        .join(
            right,
            JoinType::Inner,
            JoinKey::new(ColumnRef::qualified("s", "a"), ColumnRef::qualified("t", "a")),
            None,
        )
        .unwrap()
        .build();

    assert!(matches!(plan, PlanNode::StreamTableJoin(_)));
    assert_eq!(plan.node_type(), NodeType::Stream);
    assert_eq!(
        plan.key_field(),
        &KeyField::of(ColumnRef::qualified("s", "a"))
    );

    // [ROWKEY STRING KEY] ++ left values ++ right values
    let key = &plan.schema().key_columns()[0];
    assert_eq!(format!("{} {}", key.name(), key.sql_type()), "ROWKEY STRING");
    let names: Vec<_> = plan
        .schema()
        .value_columns()
        .iter()
        .map(|c| c.full_name())
        .collect();
    assert_eq!(
        names,
        vec![
            "s.ROWTIME", "s.ROWKEY", "s.a", "s.b", "s.ts", "t.ROWTIME", "t.ROWKEY", "t.a",
            "t.v",
        ]
    );

    // the projection on top sees both sides
    let projected = source(&catalog, &registry, "S", Some("s"))
        .join(
            source(&catalog, &registry, "T", Some("t")).build(),
            JoinType::Inner,
            JoinKey::new(ColumnRef::qualified("s", "a"), ColumnRef::qualified("t", "a")),
            None,
        )
        .unwrap()
        .project(vec![
            (None, qcol("s", "a")),
            (None, qcol("t", "v")),
        ])
        .unwrap()
        .build();
    assert_eq!(
        projected.schema().to_string(),
        "[ROWKEY STRING KEY, a INT, v DOUBLE]"
    );
}

// SELECT * FROM S s LEFT JOIN S2 s2 WITHIN 10 SECONDS ON s.a = s2.a
#[test]
fn stream_stream_join_takes_the_within_window() {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let right = source(&catalog, &registry, "S2", Some("s2")).build();
    let plan = source(&catalog, &registry, "S", Some("s"))
        .join(
            right,
            JoinType::Left,
            JoinKey::new(
                ColumnRef::qualified("s", "a"),
                ColumnRef::qualified("s2", "a"),
            ),
            Some(WithinExpression::new(Duration::from_secs(10))),
        )
        .unwrap()
        .build();

    let PlanNode::StreamStreamJoin(join) = &plan else {
        panic!("expected a stream-stream join");
    };
    assert_eq!(
        join.window(),
        JoinWindow {
            before: Duration::from_secs(10),
            after: Duration::from_secs(10),
        }
    );
    assert_eq!(plan.node_type(), NodeType::Stream);
    assert_eq!(
        plan.key_field(),
        &KeyField::of(ColumnRef::qualified("s", "a"))
    );
}

#[test]
fn stream_stream_join_requires_within() {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let right = source(&catalog, &registry, "S2", Some("s2")).build();
    let err = source(&catalog, &registry, "S", Some("s"))
        .join(
            right,
            JoinType::Inner,
            JoinKey::new(
                ColumnRef::qualified("s", "a"),
                ColumnRef::qualified("s2", "a"),
            ),
            None,
        )
        .err()
        .unwrap();
    assert_eq!(err, Error::WithinRequired);
}

#[rstest::rstest]
#[case::stream_table("S", "T")]
#[case::table_table("T", "T")]
fn within_is_forbidden_off_stream_stream(#[case] left: &str, #[case] right: &str) {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let within = Some(WithinExpression::new(Duration::from_secs(10)));

    let right = source(&catalog, &registry, right, Some("r")).build();
    let err = source(&catalog, &registry, left, Some("l"))
        .join(
            right,
            JoinType::Inner,
            JoinKey::new(ColumnRef::qualified("l", "a"), ColumnRef::qualified("r", "a")),
            within,
        )
        .err()
        .unwrap();
    assert_eq!(err, Error::WithinForbidden);
}

#[test]
fn table_stream_join_is_illegal() {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let right = source(&catalog, &registry, "S", Some("s")).build();
    let err = source(&catalog, &registry, "T", Some("t"))
        .join(
            right,
            JoinType::Inner,
            JoinKey::new(ColumnRef::qualified("t", "a"), ColumnRef::qualified("s", "a")),
            None,
        )
        .err()
        .unwrap();
    assert!(matches!(err, Error::JoinCombinationIllegal(_)));
}

#[test]
fn outer_join_drops_the_key_field() {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let right = source(&catalog, &registry, "S2", Some("s2")).build();
    let plan = source(&catalog, &registry, "S", Some("s"))
        .join(
            right,
            JoinType::Outer,
            JoinKey::new(
                ColumnRef::qualified("s", "a"),
                ColumnRef::qualified("s2", "a"),
            ),
            Some(WithinExpression::new(Duration::from_secs(1))),
        )
        .unwrap()
        .build();
    assert_eq!(plan.key_field(), &KeyField::none());
}

#[test]
fn join_partition_counts_must_match() {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let right = source(&catalog, &registry, "T_SMALL", Some("t")).build();
    let err = source(&catalog, &registry, "S", Some("s"))
        .join(
            right,
            JoinType::Inner,
            JoinKey::new(ColumnRef::qualified("s", "a"), ColumnRef::qualified("t", "a")),
            None,
        )
        .err()
        .unwrap();
    assert_eq!(err, Error::PartitionCountMismatch { left: 4, right: 2 });
}

#[test]
fn table_must_be_keyed_by_the_join_field() {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let right = source(&catalog, &registry, "T", Some("t")).build();
    let err = source(&catalog, &registry, "S", Some("s"))
        .join(
            right,
            JoinType::Inner,
            JoinKey::new(ColumnRef::qualified("s", "b"), ColumnRef::qualified("t", "v")),
            None,
        )
        .err()
        .unwrap();
    assert!(matches!(err, Error::TableJoinKeyMismatch(_)));
}

// SELECT * FROM S WHERE ROWTIME > '2020-01-02T03:04:05'
#[test]
fn rowtime_literals_are_normalized_in_filters() {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let plan = source(&catalog, &registry, "S", None)
        .filter(binary_expr(
            col("ROWTIME"),
            Operator::Gt,
            lit("2020-01-02T03:04:05"),
        ))
        .unwrap()
        .build();
    let PlanNode::Filter(filter) = &plan else {
        panic!("expected a Filter");
    };
    assert_eq!(
        filter.predicate(),
        &binary_expr(col("ROWTIME"), Operator::Gt, lit(1577934245000i64))
    );
}

#[test]
fn windowed_aggregate_selects_window_bounds() {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let window = WindowExpression::tumbling(Duration::from_secs(60)).unwrap();
    let plan = source(&catalog, &registry, "S", None)
        .group_by(vec![col("b")])
        .unwrap()
        .aggregate(
            vec![
                (None, FunctionCall::new("WINDOWSTART", vec![])),
                (None, FunctionCall::new("COUNT", vec![])),
            ],
            Some(window),
        )
        .unwrap()
        .build();

    let PlanNode::WindowedAggregate(aggregate) = &plan else {
        panic!("expected a windowed aggregate");
    };
    assert!(!aggregate.window_selector().is_empty());

    // slot 0 is the group column, slot 1 the WINDOWSTART bound
    let mut row = vec![
        flowsql::expr::value::Value::String("k".into()),
        flowsql::expr::value::Value::Null,
        flowsql::expr::value::Value::Bigint(2),
    ];
    aggregate.window_selector().apply(
        flowsql::plan::window::WindowBounds {
            start: 60_000,
            end: 120_000,
        },
        &mut row,
    );
    assert_eq!(row[1], flowsql::expr::value::Value::Bigint(60_000));
    assert_eq!(row[2], flowsql::expr::value::Value::Bigint(2));
}

#[test]
fn window_bounds_require_a_window() {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let err = source(&catalog, &registry, "S", None)
        .group_by(vec![col("b")])
        .unwrap()
        .aggregate(
            vec![(None, FunctionCall::new("WINDOWSTART", vec![]))],
            None,
        )
        .err()
        .unwrap();
    assert!(matches!(err, Error::WindowBoundsWithoutWindow(_)));
}

// INSERT INTO S (a, b) VALUES (1, 'x')
#[test]
fn insert_values_builds_the_key_and_value_rows() {
    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now_millis(&self) -> i64 {
            self.0
        }
    }

    let catalog = catalog();
    let source = catalog.get_source(&SourceName::new("S")).unwrap();
    let config = PlannerConfig::default();
    let clock = FixedClock(1_577_934_245_000);
    let row = InsertValuesPlanner::new(&config, &clock)
        .plan(
            source,
            Some(vec![ColumnRef::bare("a"), ColumnRef::bare("b")]),
            vec![lit(1), lit("x")],
        )
        .unwrap();

    // the timestamp defaults to the injected clock
    assert_eq!(row.timestamp, 1_577_934_245_000);
    // the key struct carries the declared key column
    assert_eq!(
        row.key,
        vec![(
            ColumnName::new("a"),
            flowsql::expr::value::Value::Integer(1)
        )]
    );
    // value slots follow the meta-projected schema: ROWTIME, ROWKEY, a, b, ts
    assert_eq!(
        row.value,
        vec![
            flowsql::expr::value::Value::Null,
            flowsql::expr::value::Value::Null,
            flowsql::expr::value::Value::Integer(1),
            flowsql::expr::value::Value::String("x".into()),
            flowsql::expr::value::Value::Null,
        ]
    );
}

#[test]
fn planning_is_deterministic() {
    let catalog = catalog();
    let registry = SimpleFunctionRegistry::with_builtins();
    let plan_once = || {
        source(&catalog, &registry, "S", None)
            .group_by(vec![col("b")])
            .unwrap()
            .aggregate(vec![(None, FunctionCall::new("COUNT", vec![]))], None)
            .unwrap()
            .build()
    };
    let first = plan_once();
    let second = plan_once();
    assert_eq!(first.schema(), second.schema());
    assert_eq!(first.key_field(), second.key_field());
    assert_eq!(first.query_context(), second.query_context());
}
