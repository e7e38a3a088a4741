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

//! The query pipeline
//!
//! `Pipeline::from_ast` is the core's entry point: bind the parsed
//! statement, reorder its joins (consulting the cardinality cache),
//! materialize physical operators, and execute. Recoverable errors
//! propagate to the caller after the transaction context, if any, has been
//! rolled back.

pub mod ast;
pub mod binder;

pub use ast::{AstExpr, AstOperand, JoinClause, SelectStatement, TableRef};
pub use binder::bind;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::core::Result;
use crate::engine::Engine;
use crate::executor::{execute_plan, CancellationToken, ExecutionContext};
use crate::optimizer::{
    build_physical_plan, Optimizer, OutputSizeCostModel, PlanBuilderOptions,
};
use crate::statistics::{
    CachedEstimator, CardinalityCacheMode, CardinalityEstimator, ColumnStatisticsEstimator,
};
use crate::storage::Table;
use crate::txn::TransactionContext;

/// Options for one pipeline execution
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Release intermediate operator state after execution
    pub cleanup_temporaries: bool,
    /// Run inside this transaction (enables MVCC validation)
    pub transaction: Option<TransactionContext>,
    /// Consult and fill the engine's plan cache
    pub use_plan_cache: bool,
    /// Cancel execution after this long
    pub timeout: Option<Duration>,
}

/// Timings and cache observations of one pipeline execution
#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    pub bind_time: Duration,
    pub optimize_time: Duration,
    pub execute_time: Duration,
    pub plan_cache_hit: bool,
    pub result_rows: u64,
}

/// The query pipeline entry point
pub struct Pipeline;

impl Pipeline {
    /// Run a parsed statement against an engine.
    ///
    /// On error inside a transaction, the transaction is rolled back
    /// before the error propagates.
    pub fn from_ast(
        engine: &Engine,
        statement: &SelectStatement,
        options: PipelineOptions,
    ) -> Result<(Arc<Table>, PipelineMetrics)> {
        let result = Self::run(engine, statement, &options);
        if result.is_err() {
            if let Some(transaction) = &options.transaction {
                let _ = transaction.rollback();
            }
        }
        result
    }

    fn run(
        engine: &Engine,
        statement: &SelectStatement,
        options: &PipelineOptions,
    ) -> Result<(Arc<Table>, PipelineMetrics)> {
        let mut metrics = PipelineMetrics::default();

        // Bind
        let started = Instant::now();
        let bound = bind(engine.catalog(), statement)?;
        metrics.bind_time = started.elapsed();

        // Optimize, going through the plan cache when enabled
        let started = Instant::now();
        let fingerprint = bound.signature();
        let optimized = match options
            .use_plan_cache
            .then(|| engine.plan_cache().get(&fingerprint))
            .flatten()
        {
            Some(cached) => {
                metrics.plan_cache_hit = true;
                cached
            }
            None => {
                let mut statistics = ColumnStatisticsEstimator::new();
                for alias in bound.relations() {
                    if let Some((name, _)) = bound.stored_table_for_alias(alias) {
                        if let Some(stats) = engine.statistics_for(name) {
                            statistics.add_table_statistics(name, stats);
                        }
                    }
                }
                let estimator = CachedEstimator::new(
                    Arc::clone(engine.cardinality_cache()),
                    CardinalityCacheMode::ReadAndUpdate,
                    Arc::new(statistics) as Arc<dyn CardinalityEstimator>,
                );
                let optimized =
                    Optimizer::optimize(&bound, &OutputSizeCostModel, &estimator)?;
                if options.use_plan_cache {
                    engine
                        .plan_cache()
                        .insert(fingerprint, Arc::clone(&optimized));
                }
                optimized
            }
        };
        metrics.optimize_time = started.elapsed();

        // Build and execute
        let started = Instant::now();
        let builder_options = PlanBuilderOptions {
            validate: options.transaction.is_some(),
        };
        let mut root = build_physical_plan(&optimized, Some(&builder_options))?;

        let cancel = match options.timeout {
            Some(timeout) => CancellationToken::with_timeout(timeout),
            None => CancellationToken::new(),
        };
        let mut context = ExecutionContext::new().with_cancel(cancel);
        context.transaction = options.transaction.clone();

        let output = execute_plan(&mut root, &context)?;
        metrics.execute_time = started.elapsed();
        metrics.result_rows = output.row_count();

        if options.cleanup_temporaries {
            root.on_cleanup();
        }

        debug!(
            rows = metrics.result_rows,
            cache_hit = metrics.plan_cache_hit,
            "pipeline complete"
        );
        Ok((output, metrics))
    }
}
