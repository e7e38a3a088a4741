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

//! Snapshot-isolation tests through the full pipeline

use stratadb::{
    ColumnDefinition, DataType, Engine, ErrorKind, Pipeline, PipelineOptions, SelectStatement,
    TableRef, TransactionPhase, Value,
};

fn engine_with_accounts() -> Engine {
    let engine = Engine::new();
    engine
        .create_table(
            "accounts",
            vec![
                ColumnDefinition::new("id", DataType::Int32, false),
                ColumnDefinition::new("balance", DataType::Int64, false),
            ],
        )
        .unwrap();
    engine
}

fn query_rows(engine: &Engine, options: PipelineOptions) -> u64 {
    let statement = SelectStatement::from_table(TableRef::new("accounts"));
    let (result, _) = Pipeline::from_ast(engine, &statement, options).unwrap();
    result.row_count()
}

#[test]
fn test_snapshot_sees_only_prior_commits() {
    let engine = engine_with_accounts();
    let table = engine.catalog().get_table("accounts").unwrap();

    let writer = engine.begin_transaction();
    writer
        .insert(&table, &[Value::Int32(1), Value::Int64(100)])
        .unwrap();

    // A reader that started before the commit sees nothing
    let early_reader = engine.begin_transaction();
    writer.commit().unwrap();
    let late_reader = engine.begin_transaction();

    let early = PipelineOptions {
        transaction: Some(early_reader),
        ..PipelineOptions::default()
    };
    let late = PipelineOptions {
        transaction: Some(late_reader),
        ..PipelineOptions::default()
    };
    assert_eq!(query_rows(&engine, early), 0);
    assert_eq!(query_rows(&engine, late), 1);
}

#[test]
fn test_own_writes_visible_before_commit() {
    let engine = engine_with_accounts();
    let table = engine.catalog().get_table("accounts").unwrap();

    let tx = engine.begin_transaction();
    tx.insert(&table, &[Value::Int32(1), Value::Int64(50)])
        .unwrap();

    let options = PipelineOptions {
        transaction: Some(tx.clone()),
        ..PipelineOptions::default()
    };
    assert_eq!(query_rows(&engine, options), 1);

    // Other transactions still see nothing
    let other = PipelineOptions {
        transaction: Some(engine.begin_transaction()),
        ..PipelineOptions::default()
    };
    assert_eq!(query_rows(&engine, other), 0);
    tx.rollback().unwrap();
}

#[test]
fn test_delete_visibility_and_conflict() {
    let engine = engine_with_accounts();
    let table = engine.catalog().get_table("accounts").unwrap();

    let setup = engine.begin_transaction();
    let row_id = setup
        .insert(&table, &[Value::Int32(1), Value::Int64(100)])
        .unwrap();
    setup.commit().unwrap();

    let deleter = engine.begin_transaction();
    deleter.delete(&table, row_id).unwrap();

    // A concurrent delete of the same row aborts
    let rival = engine.begin_transaction();
    let err = rival.delete(&table, row_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransactionAborted);
    assert_eq!(rival.phase(), TransactionPhase::RolledBack);

    deleter.commit().unwrap();

    // Post-delete snapshots see the row gone
    let reader = PipelineOptions {
        transaction: Some(engine.begin_transaction()),
        ..PipelineOptions::default()
    };
    assert_eq!(query_rows(&engine, reader), 0);
}

#[test]
fn test_rollback_undoes_inserts() {
    let engine = engine_with_accounts();
    let table = engine.catalog().get_table("accounts").unwrap();

    let tx = engine.begin_transaction();
    tx.insert(&table, &[Value::Int32(1), Value::Int64(1)])
        .unwrap();
    tx.insert(&table, &[Value::Int32(2), Value::Int64(2)])
        .unwrap();
    tx.rollback().unwrap();

    let reader = PipelineOptions {
        transaction: Some(engine.begin_transaction()),
        ..PipelineOptions::default()
    };
    assert_eq!(query_rows(&engine, reader), 0);
}

#[test]
fn test_commit_ids_are_monotonic() {
    let engine = engine_with_accounts();
    let table = engine.catalog().get_table("accounts").unwrap();

    let mut last = 0;
    for i in 0..5 {
        let tx = engine.begin_transaction();
        tx.insert(&table, &[Value::Int32(i), Value::Int64(0)])
            .unwrap();
        let cid = tx.commit().unwrap();
        assert!(cid > last);
        last = cid;
    }
    assert_eq!(engine.transaction_manager().last_commit_id(), last);
}
