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

//! # StrataDB - in-memory columnar query engine
//!
//! StrataDB is an in-memory, columnar, MVCC-enabled relational query
//! engine core. It consumes parsed SQL, compiles it to a logical plan,
//! reorders the joins with a cost-based dynamic-programming search, and
//! executes a pipeline of operators over chunked columnar tables.
//!
//! ## Key pieces
//!
//! - **Chunked columnar storage** - tables partition horizontally into
//!   chunks; sealed chunks dictionary-encode their columns behind
//!   width-compressed attribute vectors
//! - **MVCC snapshot isolation** - rows carry `(begin_cid, end_cid, tid)`;
//!   commits serialize through a monotonic commit-id allocator
//! - **Reference machinery** - scans and joins emit position lists over
//!   their inputs instead of copying values
//! - **DPccp join ordering** - connected-subgraph/complement-pair dynamic
//!   programming with a pluggable cost model, plus a Top-K variant
//! - **Histogram cardinality estimation** - equal-num-elements,
//!   equal-width, and equal-height histograms, strings included via a
//!   finite-alphabet domain
//! - **Cache fabric** - fingerprint-keyed plan and cardinality caches
//!
//! ## Quick start
//!
//! ```rust
//! use stratadb::{
//!     AstExpr, AstOperand, ColumnDefinition, DataType, Engine, Pipeline,
//!     PipelineOptions, PredicateCondition, SelectStatement, TableRef, Value,
//! };
//!
//! let engine = Engine::new();
//! let table = engine
//!     .create_table(
//!         "users",
//!         vec![
//!             ColumnDefinition::new("id", DataType::Int32, false),
//!             ColumnDefinition::new("name", DataType::Text, false),
//!         ],
//!     )
//!     .unwrap();
//! table.append(&[Value::Int32(1), Value::text("ada")]).unwrap();
//! table.append(&[Value::Int32(2), Value::text("grace")]).unwrap();
//!
//! let statement = SelectStatement::from_table(TableRef::new("users")).filter(
//!     AstExpr::compare(
//!         AstOperand::column("id"),
//!         PredicateCondition::GreaterThan,
//!         AstOperand::literal(1),
//!     ),
//! );
//! let (result, _metrics) =
//!     Pipeline::from_ast(&engine, &statement, PipelineOptions::default()).unwrap();
//! assert_eq!(result.row_count(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`core`] - data types, values, identifiers, errors
//! - [`storage`] - segments, chunks, tables, MVCC metadata, catalog
//! - [`txn`] - transactions and the commit-id allocator
//! - [`expr`] - bound predicates and LIKE matching
//! - [`executor`] - physical operators and the execution context
//! - [`optimizer`] - logical plans, join graph, DPccp, plan builder
//! - [`statistics`] - histograms and cardinality estimators
//! - [`cache`] - plan and cardinality caches
//! - [`pipeline`] - the parsed-AST entry point

pub mod cache;
pub mod core;
pub mod engine;
pub mod executor;
pub mod expr;
pub mod optimizer;
pub mod pipeline;
pub mod statistics;
pub mod storage;
pub mod txn;

// Re-export the main types for convenience
pub use crate::core::{
    ChunkId, ChunkOffset, ColumnId, CommitId, DataType, Error, ErrorKind, JoinMode,
    PredicateCondition, Result, RowId, TransactionId, Value, NULL_ROW_ID,
};
pub use cache::{CardinalityCache, PlanCache};
pub use engine::Engine;
pub use executor::{
    execute_plan, BoxedOperator, CancellationToken, ExecutionContext, GetTable, JoinNestedLoop,
    PhysicalOperator, TableScan, Validate,
};
pub use expr::{ColumnRef, LikePattern, Operand, Predicate};
pub use optimizer::{
    build_physical_plan, CostModel, DpCcp, DpCcpTopK, EnumerateCcp, JoinGraph, LogicalPlan,
    LogicalPlanRef, Optimizer, OutputSizeCostModel, PlanBlacklist, VertexSet,
};
pub use pipeline::{
    AstExpr, AstOperand, Pipeline, PipelineMetrics, PipelineOptions, SelectStatement, TableRef,
};
pub use statistics::{
    CachedEstimator, CardinalityCacheMode, CardinalityEstimator, ColumnStatisticsEstimator,
    ExecutedEstimator, Histogram, HistogramType, StringDomain, TableStatistics,
};
pub use storage::{
    load_table, Catalog, Chunk, ColumnDefinition, DictionarySegment, PosList, ReferenceSegment,
    Segment, Table, TableType, UseMvcc, ValueSegment,
};
pub use txn::{TransactionContext, TransactionManager, TransactionPhase};
