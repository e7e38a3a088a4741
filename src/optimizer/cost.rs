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

//! Cost models for join ordering
//!
//! A cost model scores one join given the cardinalities of its inputs and
//! its estimated output; the DP accumulates subplan costs on top. The
//! constants are relative units, not wall-clock time.

/// Plan cost in relative units
pub type Cost = f64;

/// Scores a candidate join
pub trait CostModel: Send + Sync {
    /// Cost of joining inputs of the given cardinalities into an output of
    /// `output_cardinality` rows
    fn join_cost(
        &self,
        left_cardinality: f64,
        right_cardinality: f64,
        output_cardinality: f64,
    ) -> Cost;
}

/// The classic textbook model: a join costs its output size.
///
/// Favors plans with small intermediate results and makes DP outcomes easy
/// to verify by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputSizeCostModel;

impl CostModel for OutputSizeCostModel {
    fn join_cost(
        &self,
        _left_cardinality: f64,
        _right_cardinality: f64,
        output_cardinality: f64,
    ) -> Cost {
        output_cardinality
    }
}

/// Tuple-at-a-time model for the nested-loop executor: every pair of input
/// rows is compared, every output row materialized.
#[derive(Debug, Clone)]
pub struct NestedLoopCostModel {
    /// Cost for one comparison in the inner loop
    pub compare_cost: f64,
    /// Cost to emit one output row
    pub output_cost: f64,
}

impl Default for NestedLoopCostModel {
    fn default() -> Self {
        Self {
            compare_cost: 0.01,
            output_cost: 1.0,
        }
    }
}

impl CostModel for NestedLoopCostModel {
    fn join_cost(
        &self,
        left_cardinality: f64,
        right_cardinality: f64,
        output_cardinality: f64,
    ) -> Cost {
        left_cardinality * right_cardinality * self.compare_cost
            + output_cardinality * self.output_cost
    }
}
