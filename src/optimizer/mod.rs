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

//! Cost-based optimizer
//!
//! The optimization this engine specifies is join ordering: the LQP's
//! reorderable region becomes a join hypergraph, DPccp searches the
//! connected-subgraph/complement pairs for the cheapest order under a
//! pluggable cost model and cardinality estimator, and the plan builder
//! materializes the winner into physical operators.

pub mod cost;
pub mod dp_ccp;
pub mod enumerate_ccp;
pub mod join_graph;
pub mod logical_plan;
pub mod plan_builder;

pub use cost::{Cost, CostModel, NestedLoopCostModel, OutputSizeCostModel};
pub use dp_ccp::{DpCcp, DpCcpTopK, JoinPlan, PlanBlacklist};
pub use enumerate_ccp::EnumerateCcp;
pub use join_graph::{JoinGraph, JoinGraphEdge, VertexSet, MAX_VERTICES};
pub use logical_plan::{LogicalPlan, LogicalPlanRef};
pub use plan_builder::{build_physical_plan, PlanBuilderOptions};

use tracing::{debug, warn};

use crate::core::Result;
use crate::statistics::CardinalityEstimator;

/// The optimizer entry point
pub struct Optimizer;

impl Optimizer {
    /// Reorder the joins of `lqp` when a connected join graph with at
    /// least two vertices exists; otherwise the plan passes through.
    pub fn optimize(
        lqp: &LogicalPlanRef,
        cost_model: &dyn CostModel,
        estimator: &dyn CardinalityEstimator,
    ) -> Result<LogicalPlanRef> {
        let Some(graph) = JoinGraph::from_lqp(lqp)? else {
            return Ok(std::sync::Arc::clone(lqp));
        };

        match DpCcp::new(cost_model, estimator).optimize(&graph) {
            Ok(optimized) => {
                debug!(vertices = graph.vertex_count(), "join order optimized");
                Ok(optimized)
            }
            Err(error) if error.is_recoverable() => {
                // A disconnected graph (cross products) keeps its input order
                warn!(%error, "join ordering skipped");
                Ok(std::sync::Arc::clone(lqp))
            }
            Err(error) => Err(error),
        }
    }
}
