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

//! Reference segments and position lists
//!
//! A [`ReferenceSegment`] carries no values of its own: it names a column of
//! a data table and a shared [`PosList`] of row ids to read through. All
//! reference segments emitted together by one operator call share the same
//! `Arc<PosList>`, which keeps the output chunk row-aligned across columns.
//!
//! The referenced table handle is a strong `Arc`. Reference cycles cannot
//! form because data tables never contain reference segments (checked at
//! `append_chunk`) and flattening always re-targets the deepest data table.

use std::sync::Arc;

use crate::core::{ColumnId, RowId, Value};

use super::table::Table;

/// An ordered sequence of row ids; the backbone of reference segments
pub type PosList = Vec<RowId>;

/// A segment whose values are read through a position list into another table
#[derive(Debug, Clone)]
pub struct ReferenceSegment {
    referenced_table: Arc<Table>,
    referenced_column: ColumnId,
    pos_list: Arc<PosList>,
}

impl ReferenceSegment {
    /// Create a reference segment
    pub fn new(
        referenced_table: Arc<Table>,
        referenced_column: ColumnId,
        pos_list: Arc<PosList>,
    ) -> Self {
        Self {
            referenced_table,
            referenced_column,
            pos_list,
        }
    }

    /// Number of rows (the position list length)
    pub fn len(&self) -> usize {
        self.pos_list.len()
    }

    /// Returns true if the position list is empty
    pub fn is_empty(&self) -> bool {
        self.pos_list.is_empty()
    }

    /// The table this segment reads through
    pub fn referenced_table(&self) -> &Arc<Table> {
        &self.referenced_table
    }

    /// The column of the referenced table this segment reads
    pub fn referenced_column(&self) -> ColumnId {
        self.referenced_column
    }

    /// The shared position list
    pub fn pos_list(&self) -> &Arc<PosList> {
        &self.pos_list
    }

    /// Resolve the row at `offset` through the referenced table.
    ///
    /// `NULL_ROW_ID` entries resolve to NULL without touching the table.
    pub fn value_at(&self, offset: usize) -> Value {
        let row_id = self.pos_list[offset];
        if row_id.is_null() {
            return Value::Null;
        }
        self.referenced_table
            .value_at(row_id, self.referenced_column)
    }

    /// Returns true if the row at `offset` resolves to NULL
    pub fn is_null_at(&self, offset: usize) -> bool {
        self.value_at(offset).is_null()
    }
}
