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

//! The physical operator protocol
//!
//! Operators form a DAG with at most two inputs per node and materialize
//! their output as a table:
//!
//! 1. `execute()` - compute the output; idempotent within one execution
//! 2. `get_output()` - the output table; `None` before execute
//! 3. `deep_copy()` - an independent subtree for re-execution
//! 4. `on_cleanup()` - release intermediate state once downstream consumers
//!    are done
//!
//! Operators observe the [`CancellationToken`] between chunks and surface
//! `Cancelled`; they never yield inside a chunk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::{Error, Result};
use crate::storage::Table;
use crate::txn::TransactionContext;

/// Shared cancel flag with an optional deadline
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// A token that never fires unless cancelled explicitly
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that fires once `timeout` has elapsed
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Cancel explicitly
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true once cancelled or past the deadline
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Suspension-point check: `Cancelled` once the token fired
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Default row threshold below which chunk-parallel execution is skipped
pub const DEFAULT_PARALLEL_SCAN_THRESHOLD: usize = 10_000;

/// Configuration for fork-join chunk parallelism
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Whether parallel execution is enabled
    pub enabled: bool,
    /// Minimum input rows before a scan partitions work by chunk
    pub min_rows_for_parallel_scan: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_rows_for_parallel_scan: DEFAULT_PARALLEL_SCAN_THRESHOLD,
        }
    }
}

/// Per-execution state handed to every operator
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub cancel: CancellationToken,
    pub transaction: Option<TransactionContext>,
    pub parallel: ParallelConfig,
}

impl ExecutionContext {
    /// A context with no transaction, no deadline, default parallelism
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a transaction
    pub fn with_transaction(mut self, transaction: TransactionContext) -> Self {
        self.transaction = Some(transaction);
        self
    }

    /// Attach a cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// A boxed operator subtree
pub type BoxedOperator = Box<dyn PhysicalOperator>;

/// A node of the physical plan
pub trait PhysicalOperator: Send + std::fmt::Debug {
    /// Operator name for plan descriptions and logs
    fn name(&self) -> &'static str;

    /// Compute the output table.
    ///
    /// Executes the input subtrees first. Idempotent: once an output
    /// exists, repeated calls return without recomputation.
    fn execute(&mut self, ctx: &ExecutionContext) -> Result<()>;

    /// The output table; `None` before `execute`
    fn get_output(&self) -> Option<Arc<Table>>;

    /// An independent copy of this operator subtree, without outputs
    fn deep_copy(&self) -> BoxedOperator;

    /// Drop intermediate state no longer required downstream
    fn on_cleanup(&mut self) {}
}

/// Execute a plan tree and return the root's output
pub fn execute_plan(root: &mut BoxedOperator, ctx: &ExecutionContext) -> Result<Arc<Table>> {
    root.execute(ctx)?;
    root.get_output()
        .ok_or_else(|| Error::Internal(format!("operator {} produced no output", root.name())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_token() {
        let token = CancellationToken::new();
        assert!(token.check().is_ok());
        token.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(Error::Cancelled));
    }

    #[test]
    fn test_deadline_token() {
        let token = CancellationToken::with_timeout(Duration::from_secs(3600));
        assert!(token.check().is_ok());
        let expired = CancellationToken::with_timeout(Duration::ZERO);
        assert!(expired.is_cancelled());
    }

    #[test]
    fn test_clones_share_cancel_flag() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
