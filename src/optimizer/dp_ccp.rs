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

//! DPccp join ordering
//!
//! Dynamic programming over connected-subgraph/complement pairs. Singleton
//! vertex sets are seeded with their local predicates applied; every
//! csg-cmp-pair then joins the cached best plans of its sides under all
//! connecting predicates, costed as
//! `C(L) + C(R) + join_cost(est(L), est(R), est(join))`. Ties keep the
//! plan discovered first.
//!
//! [`DpCcpTopK`] keeps up to K plans per vertex set and cross-products the
//! candidate lists; a [`PlanBlacklist`] forces probed plans to infinite
//! cost so alternatives surface.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::core::{Error, JoinMode, Result};
use crate::statistics::CardinalityEstimator;

use super::cost::{Cost, CostModel};
use super::enumerate_ccp::EnumerateCcp;
use super::join_graph::{JoinGraph, VertexSet};
use super::logical_plan::{LogicalPlan, LogicalPlanRef};

/// A candidate plan for one vertex set
#[derive(Debug, Clone)]
pub struct JoinPlan {
    pub lqp: LogicalPlanRef,
    pub cost: Cost,
    pub cardinality: f64,
}

/// Structural signatures of plans forced to infinite cost
#[derive(Debug, Default)]
pub struct PlanBlacklist {
    signatures: FxHashSet<String>,
}

impl PlanBlacklist {
    /// An empty blacklist
    pub fn new() -> Self {
        Self::default()
    }

    /// Blacklist one plan shape
    pub fn insert(&mut self, lqp: &LogicalPlanRef) {
        self.signatures.insert(lqp.signature());
    }

    /// Returns true if the plan shape was blacklisted
    pub fn contains(&self, lqp: &LogicalPlanRef) -> bool {
        self.signatures.contains(&lqp.signature())
    }

    /// Number of blacklisted shapes
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    /// Returns true if nothing is blacklisted
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

/// Exhaustive DPccp: the single best plan per vertex set
pub struct DpCcp<'a> {
    cost_model: &'a dyn CostModel,
    estimator: &'a dyn CardinalityEstimator,
}

impl<'a> DpCcp<'a> {
    /// Create the algorithm over a cost model and an estimator
    pub fn new(
        cost_model: &'a dyn CostModel,
        estimator: &'a dyn CardinalityEstimator,
    ) -> Self {
        Self {
            cost_model,
            estimator,
        }
    }

    /// Find the cheapest join order for a connected join graph
    pub fn optimize(&self, graph: &JoinGraph) -> Result<LogicalPlanRef> {
        DpCcpTopK::new(1, self.cost_model, self.estimator, None)
            .optimize(graph)
            .map(|plans| plans.into_iter().next().expect("k >= 1").lqp)
    }
}

/// Top-K DPccp: up to K plans per vertex set, cheapest first
pub struct DpCcpTopK<'a> {
    max_plans_per_set: usize,
    cost_model: &'a dyn CostModel,
    estimator: &'a dyn CardinalityEstimator,
    blacklist: Option<&'a PlanBlacklist>,
}

impl<'a> DpCcpTopK<'a> {
    /// Create the algorithm; `max_plans_per_set` of 1 degenerates to plain
    /// DPccp
    pub fn new(
        max_plans_per_set: usize,
        cost_model: &'a dyn CostModel,
        estimator: &'a dyn CardinalityEstimator,
        blacklist: Option<&'a PlanBlacklist>,
    ) -> Self {
        debug_assert!(max_plans_per_set >= 1);
        Self {
            max_plans_per_set,
            cost_model,
            estimator,
            blacklist,
        }
    }

    /// The K cheapest join orders for a connected join graph
    pub fn optimize(&self, graph: &JoinGraph) -> Result<Vec<JoinPlan>> {
        let vertex_count = graph.vertex_count();
        let mut cache: FxHashMap<VertexSet, Vec<JoinPlan>> = FxHashMap::default();

        // Seed singletons with their local predicates applied
        for vertex in 0..vertex_count {
            let mut lqp = std::sync::Arc::clone(&graph.vertices[vertex]);
            for predicate in graph.find_local_predicates(vertex) {
                lqp = LogicalPlan::predicate(lqp, predicate);
            }
            let cardinality = self.estimator.estimate_plan(&lqp)?;
            cache.insert(
                VertexSet::single(vertex),
                vec![JoinPlan {
                    lqp,
                    cost: 0.0,
                    cardinality,
                }],
            );
        }

        let pairs = EnumerateCcp::new(vertex_count, &graph.binary_edges()).enumerate();
        for (side_a, side_b) in pairs {
            let predicates = graph.find_predicates(side_a, side_b);
            let union = side_a | side_b;

            let plans_a = cache.get(&side_a).cloned().unwrap_or_default();
            let plans_b = cache.get(&side_b).cloned().unwrap_or_default();

            for plan_a in &plans_a {
                for plan_b in &plans_b {
                    let mode = if predicates.is_empty() {
                        JoinMode::Cross
                    } else {
                        JoinMode::Inner
                    };
                    let lqp = LogicalPlan::join(
                        std::sync::Arc::clone(&plan_a.lqp),
                        std::sync::Arc::clone(&plan_b.lqp),
                        mode,
                        predicates.clone(),
                    );
                    let cardinality = self.estimator.estimate_plan(&lqp)?;
                    let mut cost = plan_a.cost
                        + plan_b.cost
                        + self.cost_model.join_cost(
                            plan_a.cardinality,
                            plan_b.cardinality,
                            cardinality,
                        );
                    if self
                        .blacklist
                        .map(|blacklist| blacklist.contains(&lqp))
                        .unwrap_or(false)
                    {
                        cost = Cost::INFINITY;
                    }

                    let candidates = cache.entry(union).or_default();
                    // Stable insertion: equal costs keep discovery order
                    let position =
                        candidates.partition_point(|existing| existing.cost <= cost);
                    if position < self.max_plans_per_set {
                        candidates.insert(
                            position,
                            JoinPlan {
                                lqp,
                                cost,
                                cardinality,
                            },
                        );
                        candidates.truncate(self.max_plans_per_set);
                    }
                }
            }
        }

        let full = VertexSet::full(vertex_count);
        match cache.remove(&full) {
            Some(plans) if !plans.is_empty() => {
                debug!(
                    vertices = vertex_count,
                    best_cost = plans[0].cost,
                    "join ordering complete"
                );
                Ok(plans)
            }
            _ => Err(Error::unsupported(
                "join ordering over a disconnected join graph",
            )),
        }
    }
}
