// Copyright 2025 StrataDB Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end pipeline tests: parsed AST in, result table out

use std::time::Duration;

use stratadb::{
    AstExpr, AstOperand, ColumnDefinition, DataType, Engine, ErrorKind, JoinMode, Pipeline,
    PipelineOptions, PredicateCondition, SelectStatement, TableRef, TableType, Value,
};

fn setup_engine() -> Engine {
    let engine = Engine::new();

    let orders = engine
        .create_table(
            "orders",
            vec![
                ColumnDefinition::new("id", DataType::Int32, false),
                ColumnDefinition::new("customer_id", DataType::Int32, false),
                ColumnDefinition::new("total", DataType::Int64, false),
            ],
        )
        .unwrap();
    for (id, customer_id, total) in [(1, 10, 250i64), (2, 10, 80), (3, 20, 400), (4, 30, 15)] {
        orders
            .append(&[
                Value::Int32(id),
                Value::Int32(customer_id),
                Value::Int64(total),
            ])
            .unwrap();
    }

    let customers = engine
        .create_table(
            "customers",
            vec![
                ColumnDefinition::new("id", DataType::Int32, false),
                ColumnDefinition::new("name", DataType::Text, false),
            ],
        )
        .unwrap();
    for (id, name) in [(10, "ada"), (20, "grace"), (40, "edsger")] {
        customers
            .append(&[Value::Int32(id), Value::text(name)])
            .unwrap();
    }

    engine
}

fn sorted_rows(table: &stratadb::Table) -> Vec<Vec<Value>> {
    let mut rows = table.materialize_rows();
    rows.sort_by(|a, b| format!("{:?}", a).cmp(&format!("{:?}", b)));
    rows
}

#[test]
fn test_filtered_scan() {
    let engine = setup_engine();
    let statement = SelectStatement::from_table(TableRef::new("orders")).filter(
        AstExpr::compare(
            AstOperand::column("total"),
            PredicateCondition::GreaterThan,
            AstOperand::literal(100i64),
        ),
    );
    let (result, metrics) =
        Pipeline::from_ast(&engine, &statement, PipelineOptions::default()).unwrap();

    assert_eq!(result.row_count(), 2);
    assert_eq!(result.table_type(), TableType::References);
    assert_eq!(metrics.result_rows, 2);
}

#[test]
fn test_inner_join_through_pipeline() {
    let engine = setup_engine();
    let statement = SelectStatement::from_table(TableRef::aliased("orders", "o")).join(
        TableRef::aliased("customers", "c"),
        JoinMode::Inner,
        AstExpr::compare(
            AstOperand::qualified("o", "customer_id"),
            PredicateCondition::Equals,
            AstOperand::qualified("c", "id"),
        ),
    );
    let (result, _) =
        Pipeline::from_ast(&engine, &statement, PipelineOptions::default()).unwrap();

    // Orders 1, 2 match ada; order 3 matches grace; order 4 has no customer
    assert_eq!(result.row_count(), 3);
    assert_eq!(result.column_count(), 5);

    let rows = sorted_rows(&result);
    assert!(rows
        .iter()
        .all(|row| row[1] == row[3] && !row[4].is_null()));
}

#[test]
fn test_left_outer_join_null_extension() {
    let engine = setup_engine();
    let statement = SelectStatement::from_table(TableRef::aliased("orders", "o")).join(
        TableRef::aliased("customers", "c"),
        JoinMode::Left,
        AstExpr::compare(
            AstOperand::qualified("o", "customer_id"),
            PredicateCondition::Equals,
            AstOperand::qualified("c", "id"),
        ),
    );
    let (result, _) =
        Pipeline::from_ast(&engine, &statement, PipelineOptions::default()).unwrap();

    assert_eq!(result.row_count(), 4);
    let rows = sorted_rows(&result);
    let unmatched: Vec<_> = rows.iter().filter(|row| row[3].is_null()).collect();
    assert_eq!(unmatched.len(), 1);
    assert_eq!(unmatched[0][0], Value::Int32(4));
    assert!(unmatched[0][4].is_null());
}

#[test]
fn test_three_way_join_with_statistics() {
    let engine = setup_engine();
    let items = engine
        .create_table(
            "items",
            vec![
                ColumnDefinition::new("order_id", DataType::Int32, false),
                ColumnDefinition::new("sku", DataType::Text, false),
            ],
        )
        .unwrap();
    for (order_id, sku) in [(1, "a"), (1, "b"), (2, "c"), (3, "a")] {
        items
            .append(&[Value::Int32(order_id), Value::text(sku)])
            .unwrap();
    }
    for table in ["orders", "customers", "items"] {
        engine.analyze_table(table, None).unwrap();
    }

    let statement = SelectStatement::from_table(TableRef::aliased("orders", "o"))
        .join(
            TableRef::aliased("customers", "c"),
            JoinMode::Inner,
            AstExpr::compare(
                AstOperand::qualified("o", "customer_id"),
                PredicateCondition::Equals,
                AstOperand::qualified("c", "id"),
            ),
        )
        .join(
            TableRef::aliased("items", "i"),
            JoinMode::Inner,
            AstExpr::compare(
                AstOperand::qualified("i", "order_id"),
                PredicateCondition::Equals,
                AstOperand::qualified("o", "id"),
            ),
        );
    let (result, _) =
        Pipeline::from_ast(&engine, &statement, PipelineOptions::default()).unwrap();

    // Items of orders 1 (x2), 2, 3 survive; customer 30's order has no items.
    // The optimizer may reorder the joins, but never changes the row set.
    assert_eq!(result.row_count(), 4);
    assert_eq!(result.column_count(), 7);
}

#[test]
fn test_like_filter() {
    let engine = setup_engine();
    let statement = SelectStatement::from_table(TableRef::new("customers")).filter(
        AstExpr::compare(
            AstOperand::column("name"),
            PredicateCondition::Like,
            AstOperand::literal("%a"),
        ),
    );
    let (result, _) =
        Pipeline::from_ast(&engine, &statement, PipelineOptions::default()).unwrap();
    // ada ends in a; grace and edsger do not
    assert_eq!(result.row_count(), 1);
}

#[test]
fn test_between_filter() {
    let engine = setup_engine();
    let statement = SelectStatement::from_table(TableRef::new("orders")).filter(AstExpr::Between {
        lhs: AstOperand::column("total"),
        lower: AstOperand::literal(80i64),
        upper: AstOperand::literal(400i64),
    });
    let (result, _) =
        Pipeline::from_ast(&engine, &statement, PipelineOptions::default()).unwrap();
    assert_eq!(result.row_count(), 3);
}

#[test]
fn test_plan_cache_round_trip() {
    let engine = setup_engine();
    let statement = SelectStatement::from_table(TableRef::new("orders")).filter(
        AstExpr::compare(
            AstOperand::column("total"),
            PredicateCondition::GreaterThan,
            AstOperand::literal(100i64),
        ),
    );
    let options = PipelineOptions {
        use_plan_cache: true,
        ..PipelineOptions::default()
    };

    let (_, first) = Pipeline::from_ast(&engine, &statement, options.clone()).unwrap();
    assert!(!first.plan_cache_hit);
    let (result, second) = Pipeline::from_ast(&engine, &statement, options).unwrap();
    assert!(second.plan_cache_hit);
    assert_eq!(result.row_count(), 2);
}

#[test]
fn test_invalid_input_surfaces() {
    let engine = setup_engine();

    let missing = SelectStatement::from_table(TableRef::new("nope"));
    let err = Pipeline::from_ast(&engine, &missing, PipelineOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let bad_types = SelectStatement::from_table(TableRef::new("customers")).filter(
        AstExpr::compare(
            AstOperand::column("name"),
            PredicateCondition::Equals,
            AstOperand::literal(42),
        ),
    );
    let err = Pipeline::from_ast(&engine, &bad_types, PipelineOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[test]
fn test_timeout_cancels_execution() {
    let engine = setup_engine();
    let statement = SelectStatement::from_table(TableRef::new("orders"));
    let options = PipelineOptions {
        timeout: Some(Duration::ZERO),
        ..PipelineOptions::default()
    };
    let err = Pipeline::from_ast(&engine, &statement, options).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[test]
fn test_cleanup_temporaries_option() {
    let engine = setup_engine();
    let statement = SelectStatement::from_table(TableRef::new("orders")).filter(
        AstExpr::compare(
            AstOperand::column("total"),
            PredicateCondition::LessThan,
            AstOperand::literal(500i64),
        ),
    );
    let options = PipelineOptions {
        cleanup_temporaries: true,
        ..PipelineOptions::default()
    };
    // The returned table stays readable after operator cleanup
    let (result, _) = Pipeline::from_ast(&engine, &statement, options).unwrap();
    assert_eq!(result.materialize_rows().len(), 4);
}
