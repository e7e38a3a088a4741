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

//! Physical operators
//!
//! Operators consume and produce tables. Scans and joins emit References
//! tables carrying position lists over their inputs; [`GetTable`] emits the
//! stored data table itself. Execution is fork-join: a scan may partition
//! its work by chunk across rayon workers and joins before emitting, and
//! every operator observes the cancellation token at chunk boundaries.

pub mod get_table;
pub mod join_nested_loop;
pub mod operator;
pub mod table_scan;
pub mod validate;

pub use get_table::GetTable;
pub use join_nested_loop::JoinNestedLoop;
pub use operator::{
    execute_plan, BoxedOperator, CancellationToken, ExecutionContext, ParallelConfig,
    PhysicalOperator, DEFAULT_PARALLEL_SCAN_THRESHOLD,
};
pub use table_scan::TableScan;
pub use validate::Validate;
