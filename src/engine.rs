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

//! The engine context
//!
//! One [`Engine`] owns everything a query needs: the table catalog, the
//! transaction manager, table statistics, and the cache fabric. There are
//! no process-wide singletons; tests instantiate an isolated engine per
//! case and every entry point receives the engine explicitly.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::cache::{CardinalityCache, PlanCache};
use crate::core::Result;
use crate::statistics::{StringDomain, TableStatistics};
use crate::storage::{
    Catalog, ColumnDefinition, Table, TableType, UseMvcc, DEFAULT_CHUNK_SIZE,
};
use crate::txn::{TransactionContext, TransactionManager};

/// The explicit context replacing storage/transaction/cache singletons
#[derive(Default)]
pub struct Engine {
    catalog: Catalog,
    transaction_manager: TransactionManager,
    plan_cache: PlanCache,
    cardinality_cache: Arc<CardinalityCache>,
    statistics: RwLock<FxHashMap<String, Arc<TableStatistics>>>,
}

impl Engine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// The table catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The transaction manager
    pub fn transaction_manager(&self) -> &TransactionManager {
        &self.transaction_manager
    }

    /// The query plan cache
    pub fn plan_cache(&self) -> &PlanCache {
        &self.plan_cache
    }

    /// The shared cardinality cache
    pub fn cardinality_cache(&self) -> &Arc<CardinalityCache> {
        &self.cardinality_cache
    }

    /// Begin a transaction against this engine
    pub fn begin_transaction(&self) -> TransactionContext {
        self.transaction_manager.begin()
    }

    /// Create and register an MVCC-enabled data table
    pub fn create_table(
        &self,
        name: impl Into<String>,
        column_definitions: Vec<ColumnDefinition>,
    ) -> Result<Arc<Table>> {
        let table = Arc::new(Table::new(
            column_definitions,
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::Yes,
        ));
        self.catalog.add_table(name, Arc::clone(&table))?;
        Ok(table)
    }

    /// Scan a table and (re)generate its statistics
    pub fn analyze_table(
        &self,
        name: &str,
        string_domain: Option<StringDomain>,
    ) -> Result<()> {
        let table = self.catalog.get_table(name)?;
        let statistics = Arc::new(TableStatistics::generate(&table, string_domain)?);
        self.statistics.write().insert(name.to_string(), statistics);
        Ok(())
    }

    /// Statistics generated by a prior [`analyze_table`](Self::analyze_table)
    pub fn statistics_for(&self, name: &str) -> Option<Arc<TableStatistics>> {
        self.statistics.read().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, Value};

    #[test]
    fn test_engine_isolation() {
        let first = Engine::new();
        let second = Engine::new();
        first
            .create_table(
                "t",
                vec![ColumnDefinition::new("a", DataType::Int32, false)],
            )
            .unwrap();
        assert!(first.catalog().has_table("t"));
        assert!(!second.catalog().has_table("t"));
    }

    #[test]
    fn test_analyze_and_lookup() {
        let engine = Engine::new();
        let table = engine
            .create_table(
                "t",
                vec![ColumnDefinition::new("a", DataType::Int32, false)],
            )
            .unwrap();
        table.append(&[Value::Int32(1)]).unwrap();
        table.append(&[Value::Int32(2)]).unwrap();

        assert!(engine.statistics_for("t").is_none());
        engine.analyze_table("t", None).unwrap();
        let stats = engine.statistics_for("t").unwrap();
        assert_eq!(stats.row_count, 2);
    }
}
