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

//! Stored-table leaf operator
//!
//! `GetTable` hands a catalog-resolved table downstream unchanged. It is the
//! one operator that promises chunk order: the stored order is the order
//! consumers observe.

use std::sync::Arc;

use crate::core::Result;
use crate::storage::Table;

use super::operator::{BoxedOperator, ExecutionContext, PhysicalOperator};

/// Leaf operator emitting a stored data table
#[derive(Debug)]
pub struct GetTable {
    table: Arc<Table>,
    output: Option<Arc<Table>>,
}

impl GetTable {
    /// Create a leaf over a resolved table
    pub fn new(table: Arc<Table>) -> Self {
        Self {
            table,
            output: None,
        }
    }
}

impl PhysicalOperator for GetTable {
    fn name(&self) -> &'static str {
        "GetTable"
    }

    fn execute(&mut self, ctx: &ExecutionContext) -> Result<()> {
        if self.output.is_some() {
            return Ok(());
        }
        ctx.cancel.check()?;
        self.output = Some(Arc::clone(&self.table));
        Ok(())
    }

    fn get_output(&self) -> Option<Arc<Table>> {
        self.output.clone()
    }

    fn deep_copy(&self) -> BoxedOperator {
        Box::new(GetTable::new(Arc::clone(&self.table)))
    }

    fn on_cleanup(&mut self) {
        self.output = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, Error, Value};
    use crate::executor::operator::CancellationToken;
    use crate::storage::{ColumnDefinition, TableType, UseMvcc, DEFAULT_CHUNK_SIZE};

    fn stored_table() -> Arc<Table> {
        let table = Table::new(
            vec![ColumnDefinition::new("a", DataType::Int32, false)],
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        );
        table.append(&[Value::Int32(1)]).unwrap();
        Arc::new(table)
    }

    #[test]
    fn test_emits_stored_table() {
        let table = stored_table();
        let mut op = GetTable::new(Arc::clone(&table));
        assert!(op.get_output().is_none());

        op.execute(&ExecutionContext::new()).unwrap();
        assert!(Arc::ptr_eq(&op.get_output().unwrap(), &table));
    }

    #[test]
    fn test_cancelled_before_output() {
        let mut op = GetTable::new(stored_table());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ctx = ExecutionContext::new().with_cancel(cancel);
        assert_eq!(op.execute(&ctx), Err(Error::Cancelled));
        assert!(op.get_output().is_none());
    }
}
