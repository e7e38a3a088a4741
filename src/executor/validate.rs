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

//! MVCC visibility operator
//!
//! `Validate` filters its input to the rows visible to the executing
//! transaction's snapshot and emits them as a References table, one output
//! chunk per input chunk with one shared position list. Chunks without MVCC
//! metadata pass through as fully visible.

use std::sync::Arc;

use crate::core::{Error, Result, RowId};
use crate::storage::{
    ColumnDefinition, PosList, ReferenceSegment, Segment, Table, TableType, UseMvcc,
    DEFAULT_CHUNK_SIZE,
};

use super::operator::{BoxedOperator, ExecutionContext, PhysicalOperator};

/// Snapshot-visibility filter; requires a transaction context
#[derive(Debug)]
pub struct Validate {
    input: BoxedOperator,
    output: Option<Arc<Table>>,
}

impl Validate {
    /// Create a validate operator over an input subtree
    pub fn new(input: BoxedOperator) -> Self {
        Self {
            input,
            output: None,
        }
    }
}

impl PhysicalOperator for Validate {
    fn name(&self) -> &'static str {
        "Validate"
    }

    fn execute(&mut self, ctx: &ExecutionContext) -> Result<()> {
        if self.output.is_some() {
            return Ok(());
        }
        let transaction = ctx.transaction.as_ref().ok_or_else(|| {
            Error::unsupported("Validate requires a transaction context")
        })?;
        let snapshot_cid = transaction.snapshot_cid();
        let own_tid = transaction.tid();

        self.input.execute(ctx)?;
        let input_table = self.input.get_output().ok_or_else(|| {
            Error::Internal("Validate input produced no output".into())
        })?;

        if input_table.table_type() == TableType::References {
            return Err(Error::unsupported(
                "Validate runs directly on stored tables",
            ));
        }

        let definitions: Vec<ColumnDefinition> = input_table.column_definitions().to_vec();
        let output = Table::new(
            definitions,
            TableType::References,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        );

        for (chunk_id, chunk) in input_table.chunks().into_iter().enumerate() {
            ctx.cancel.check()?;

            let mut pos_list: PosList = Vec::new();
            match chunk.mvcc_data() {
                Some(mvcc) => {
                    let vectors = mvcc.read();
                    for offset in 0..chunk.size() {
                        if vectors.is_visible(offset as usize, snapshot_cid, own_tid) {
                            pos_list.push(RowId::new(chunk_id as u32, offset));
                        }
                    }
                }
                None => {
                    pos_list.extend((0..chunk.size()).map(|offset| {
                        RowId::new(chunk_id as u32, offset)
                    }));
                }
            }

            if pos_list.is_empty() {
                continue;
            }

            let pos_list = Arc::new(pos_list);
            let segments: Vec<Arc<Segment>> = (0..input_table.column_count())
                .map(|column_id| {
                    Arc::new(Segment::Reference(ReferenceSegment::new(
                        Arc::clone(&input_table),
                        column_id,
                        Arc::clone(&pos_list),
                    )))
                })
                .collect();
            output.append_chunk(segments, None)?;
        }

        self.output = Some(Arc::new(output));
        Ok(())
    }

    fn get_output(&self) -> Option<Arc<Table>> {
        self.output.clone()
    }

    fn deep_copy(&self) -> BoxedOperator {
        Box::new(Validate::new(self.input.deep_copy()))
    }

    fn on_cleanup(&mut self) {
        self.output = None;
        self.input.on_cleanup();
    }
}
