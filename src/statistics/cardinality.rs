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

//! Cardinality estimation
//!
//! Three estimators behind one trait:
//!
//! - [`ColumnStatisticsEstimator`] - multiplies histogram-derived predicate
//!   selectivities over base cardinalities; equi-joins use
//!   `|L|·|R| / max(distinct(L.c), distinct(R.c))`
//! - [`ExecutedEstimator`] - runs the subplan and reports ground truth
//! - [`CachedEstimator`] - fingerprints the subproblem, delegates to a
//!   fallback on miss, and (in `ReadAndUpdate` mode) writes the result back
//!
//! Fingerprints are structural: relation aliases are canonicalized by
//! mapping them onto their sorted table names, so two queries that differ
//! only in renaming collapse onto one cache entry.

use std::sync::Arc;

use tracing::debug;

use crate::cache::CardinalityCache;
use crate::core::{JoinMode, Result};
use crate::executor::{execute_plan, ExecutionContext};
use crate::expr::{Operand, Predicate};
use crate::optimizer::plan_builder::build_physical_plan;
use crate::optimizer::{LogicalPlan, LogicalPlanRef};

use super::column_statistics::TableStatistics;

/// Selectivity assumed for non-equi join predicates
pub const DEFAULT_NON_EQUI_SELECTIVITY: f64 = 0.25;

/// Estimates the output cardinality of a logical subplan
pub trait CardinalityEstimator: Send + Sync {
    /// Estimated number of rows the subplan produces
    fn estimate_plan(&self, lqp: &LogicalPlanRef) -> Result<f64>;
}

// =============================================================================
// Column-statistics estimator
// =============================================================================

/// Statistics-driven estimator over registered per-table statistics
pub struct ColumnStatisticsEstimator {
    tables: rustc_hash::FxHashMap<String, Arc<TableStatistics>>,
    non_equi_selectivity: f64,
}

impl Default for ColumnStatisticsEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnStatisticsEstimator {
    /// Create an estimator with the default non-equi fraction
    pub fn new() -> Self {
        Self {
            tables: rustc_hash::FxHashMap::default(),
            non_equi_selectivity: DEFAULT_NON_EQUI_SELECTIVITY,
        }
    }

    /// Override the selectivity fraction for non-equi join predicates
    pub fn with_non_equi_selectivity(mut self, selectivity: f64) -> Self {
        self.non_equi_selectivity = selectivity;
        self
    }

    /// Register statistics for a stored table (by table name)
    pub fn add_table_statistics(&mut self, name: impl Into<String>, stats: Arc<TableStatistics>) {
        self.tables.insert(name.into(), stats);
    }

    fn stats_for_alias<'a>(
        &'a self,
        root: &LogicalPlan,
        alias: &str,
    ) -> Option<&'a TableStatistics> {
        let (name, _) = root.stored_table_for_alias(alias)?;
        self.tables.get(name).map(Arc::as_ref)
    }

    fn base_rows(&self, root: &LogicalPlan, alias: &str, table_rows: u64) -> u64 {
        self.stats_for_alias(root, alias)
            .map(|stats| stats.row_count)
            .unwrap_or(table_rows)
    }

    fn column_distinct(&self, root: &LogicalPlan, predicate_column: &crate::expr::ColumnRef) -> u64 {
        match self.stats_for_alias(root, &predicate_column.relation) {
            Some(stats) => stats.distinct_count(predicate_column.column_id),
            None => root
                .stored_table_for_alias(&predicate_column.relation)
                .map(|(_, table)| table.row_count())
                .unwrap_or(1),
        }
    }

    fn predicate_selectivity(&self, root: &LogicalPlan, predicate: &Predicate) -> f64 {
        let columns = predicate.columns();
        match (columns.first(), predicate.rhs.as_literal()) {
            (Some(column), Some(literal)) => {
                let upper = predicate
                    .upper
                    .as_ref()
                    .and_then(|operand| operand.as_literal());
                match self.stats_for_alias(root, &column.relation) {
                    Some(stats) => match stats.column(column.column_id) {
                        Some(column_stats) => column_stats.predicate_selectivity(
                            predicate.condition,
                            literal,
                            upper,
                            stats.row_count,
                        ),
                        None => DEFAULT_NON_EQUI_SELECTIVITY,
                    },
                    None => DEFAULT_NON_EQUI_SELECTIVITY,
                }
            }
            // Column-vs-column within one subplan: spread over the larger
            // distinct count
            (Some(column), None) => {
                let other = columns.get(1).copied().unwrap_or(column);
                let distinct = self
                    .column_distinct(root, column)
                    .max(self.column_distinct(root, other));
                1.0 / distinct.max(1) as f64
            }
            _ => DEFAULT_NON_EQUI_SELECTIVITY,
        }
    }

    fn estimate_node(&self, root: &LogicalPlan, node: &LogicalPlan) -> Result<f64> {
        match node {
            LogicalPlan::StoredTable { alias, table, .. } => {
                Ok(self.base_rows(root, alias, table.row_count()) as f64)
            }
            LogicalPlan::Predicate { input, predicate } => {
                let input_rows = self.estimate_node(root, input)?;
                Ok(input_rows * self.predicate_selectivity(root, predicate))
            }
            LogicalPlan::Join {
                left,
                right,
                mode,
                predicates,
            } => {
                let left_rows = self.estimate_node(root, left)?;
                let right_rows = self.estimate_node(root, right)?;
                let mut estimate = left_rows * right_rows;

                for predicate in predicates {
                    if predicate.is_equi_join() {
                        let (left_column, right_column) =
                            predicate.join_columns().expect("equi join has columns");
                        let distinct = self
                            .column_distinct(root, left_column)
                            .max(self.column_distinct(root, right_column));
                        estimate /= distinct.max(1) as f64;
                    } else {
                        estimate *= self.non_equi_selectivity;
                    }
                }

                Ok(match mode {
                    JoinMode::Left => estimate.max(left_rows),
                    JoinMode::Right => estimate.max(right_rows),
                    JoinMode::Outer => estimate.max(left_rows).max(right_rows),
                    JoinMode::Semi => estimate.min(left_rows),
                    JoinMode::Anti => (left_rows - estimate).max(0.0),
                    JoinMode::Inner | JoinMode::Cross => estimate,
                })
            }
        }
    }
}

impl CardinalityEstimator for ColumnStatisticsEstimator {
    fn estimate_plan(&self, lqp: &LogicalPlanRef) -> Result<f64> {
        self.estimate_node(lqp, lqp)
    }
}

// =============================================================================
// Executed estimator
// =============================================================================

/// Ground-truth estimator: builds and runs the subplan.
///
/// Exact and expensive; used for debugging estimators and for priming the
/// cardinality cache.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecutedEstimator;

impl CardinalityEstimator for ExecutedEstimator {
    fn estimate_plan(&self, lqp: &LogicalPlanRef) -> Result<f64> {
        let mut root = build_physical_plan(lqp, None)?;
        let output = execute_plan(&mut root, &ExecutionContext::new())?;
        Ok(output.row_count() as f64)
    }
}

// =============================================================================
// Cached estimator
// =============================================================================

/// Whether a cached estimator writes results back on miss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalityCacheMode {
    ReadOnly,
    ReadAndUpdate,
}

/// Fingerprint-keyed caching wrapper around a fallback estimator
pub struct CachedEstimator {
    cache: Arc<CardinalityCache>,
    mode: CardinalityCacheMode,
    fallback: Arc<dyn CardinalityEstimator>,
}

impl CachedEstimator {
    /// Wrap a fallback estimator
    pub fn new(
        cache: Arc<CardinalityCache>,
        mode: CardinalityCacheMode,
        fallback: Arc<dyn CardinalityEstimator>,
    ) -> Self {
        Self {
            cache,
            mode,
            fallback,
        }
    }
}

impl CardinalityEstimator for CachedEstimator {
    fn estimate_plan(&self, lqp: &LogicalPlanRef) -> Result<f64> {
        let fingerprint = cardinality_fingerprint(lqp);
        if let Some(cardinality) = self.cache.get(&fingerprint) {
            return Ok(cardinality);
        }
        let cardinality = self.fallback.estimate_plan(lqp)?;
        if self.mode == CardinalityCacheMode::ReadAndUpdate {
            debug!(%fingerprint, cardinality, "cardinality cache update");
            self.cache.insert(fingerprint, cardinality);
        }
        Ok(cardinality)
    }
}

/// Canonical fingerprint of a subplan: the sorted relation multiset plus
/// the sorted predicates, with aliases normalized away.
///
/// Aliases are ranked by (table name, appearance order) and rewritten to
/// positional names, so plans that differ only in column renaming or
/// commutative predicate order produce equal fingerprints.
pub fn cardinality_fingerprint(lqp: &LogicalPlanRef) -> String {
    let aliases = lqp.relations();
    let mut ranked: Vec<(String, &str)> = aliases
        .iter()
        .map(|alias| {
            let name = lqp
                .stored_table_for_alias(alias)
                .map(|(name, _)| name.to_string())
                .unwrap_or_else(|| format!("?{}", alias));
            (name, *alias)
        })
        .collect();
    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    let canonical_alias = |alias: &str| -> String {
        ranked
            .iter()
            .position(|(_, a)| *a == alias)
            .map(|rank| format!("r{}", rank))
            .unwrap_or_else(|| format!("?{}", alias))
    };

    let mut relations: Vec<String> = ranked.iter().map(|(name, _)| name.clone()).collect();
    relations.sort();

    let canonical_operand = |operand: &Operand| -> String {
        match operand {
            Operand::Column(column) => {
                format!("{}.c{}", canonical_alias(&column.relation), column.column_id)
            }
            Operand::Literal(value) => format!("lit:{:?}", value),
        }
    };

    let mut predicates: Vec<String> = lqp
        .predicates()
        .into_iter()
        .map(|predicate| {
            let mut sides = [
                canonical_operand(&predicate.lhs),
                canonical_operand(&predicate.rhs),
            ];
            // Commutative conditions compare the same regardless of side
            if matches!(
                predicate.condition,
                crate::core::PredicateCondition::Equals
                    | crate::core::PredicateCondition::NotEquals
            ) {
                sides.sort();
            }
            match &predicate.upper {
                Some(upper) => format!(
                    "{} {} {} and {}",
                    sides[0],
                    predicate.condition,
                    sides[1],
                    canonical_operand(upper)
                ),
                None => format!("{} {} {}", sides[0], predicate.condition, sides[1]),
            }
        })
        .collect();
    predicates.sort();

    format!("[{}]|[{}]", relations.join(","), predicates.join(";"))
}
