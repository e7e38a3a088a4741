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

//! Named-table catalog
//!
//! The catalog is owned by an [`Engine`](crate::engine::Engine) instance and
//! passed explicitly wherever tables are resolved; there is no process-wide
//! storage singleton, so tests instantiate an isolated engine per case.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::core::{Error, Result};

use super::table::Table;

/// Thread-safe registry of named tables
#[derive(Debug, Default)]
pub struct Catalog {
    tables: RwLock<FxHashMap<String, Arc<Table>>>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under a name
    pub fn add_table(&self, name: impl Into<String>, table: Arc<Table>) -> Result<()> {
        let name = name.into();
        let mut tables = self.tables.write();
        if tables.contains_key(&name) {
            return Err(Error::TableAlreadyExists(name));
        }
        tables.insert(name, table);
        Ok(())
    }

    /// Resolve a table by name
    pub fn get_table(&self, name: &str) -> Result<Arc<Table>> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Returns true if a table with this name exists
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    /// Remove a table; the table stays alive for queries still holding it
    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.tables
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Sorted list of registered table names
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;
    use crate::storage::table::{ColumnDefinition, TableType, UseMvcc, DEFAULT_CHUNK_SIZE};

    fn table() -> Arc<Table> {
        Arc::new(Table::new(
            vec![ColumnDefinition::new("a", DataType::Int32, false)],
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        ))
    }

    #[test]
    fn test_add_get_drop() {
        let catalog = Catalog::new();
        catalog.add_table("t", table()).unwrap();
        assert!(catalog.has_table("t"));
        assert!(catalog.get_table("t").is_ok());
        assert!(matches!(
            catalog.add_table("t", table()),
            Err(Error::TableAlreadyExists(_))
        ));
        catalog.drop_table("t").unwrap();
        assert!(matches!(
            catalog.get_table("t"),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_table_names_sorted() {
        let catalog = Catalog::new();
        catalog.add_table("zebra", table()).unwrap();
        catalog.add_table("ant", table()).unwrap();
        assert_eq!(catalog.table_names(), vec!["ant", "zebra"]);
    }
}
