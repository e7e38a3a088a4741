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

//! Predicate scan operator
//!
//! `TableScan` evaluates one predicate over one column and emits the
//! matching rows as a References table, one output chunk per surviving
//! input chunk. Chunk statistics prune chunks that cannot match; above a
//! row threshold, chunks are evaluated fork-join in parallel and merged in
//! chunk order. Scanning a References input flattens: the emitted segments
//! reference the underlying data table, never the scanned one.

use std::sync::Arc;

use rayon::prelude::*;

use crate::core::{
    ChunkId, ChunkOffset, ColumnId, DataType, Error, PredicateCondition, Result, RowId, Value,
};
use crate::expr::{satisfies, LikePattern};
use crate::storage::{
    Chunk, ColumnDefinition, PosList, ReferenceSegment, Segment, Table, TableType, UseMvcc,
    DEFAULT_CHUNK_SIZE,
};

use super::operator::{BoxedOperator, ExecutionContext, PhysicalOperator};

/// Single-column predicate scan
#[derive(Debug)]
pub struct TableScan {
    input: BoxedOperator,
    column_id: ColumnId,
    condition: PredicateCondition,
    value: Value,
    upper: Option<Value>,
    /// When set, the right-hand side is this column instead of `value`
    rhs_column: Option<ColumnId>,
    output: Option<Arc<Table>>,
}

impl TableScan {
    /// Scan for `column <condition> value`
    pub fn new(
        input: BoxedOperator,
        column_id: ColumnId,
        condition: PredicateCondition,
        value: Value,
    ) -> Self {
        Self {
            input,
            column_id,
            condition,
            value,
            upper: None,
            rhs_column: None,
            output: None,
        }
    }

    /// Scan for `column BETWEEN value AND upper`
    pub fn between(input: BoxedOperator, column_id: ColumnId, value: Value, upper: Value) -> Self {
        Self {
            input,
            column_id,
            condition: PredicateCondition::Between,
            value,
            upper: Some(upper),
            rhs_column: None,
            output: None,
        }
    }

    /// Scan for `column <condition> other_column` (post-join filters)
    pub fn column_vs_column(
        input: BoxedOperator,
        column_id: ColumnId,
        condition: PredicateCondition,
        rhs_column: ColumnId,
    ) -> Self {
        Self {
            input,
            column_id,
            condition,
            value: Value::Null,
            upper: None,
            rhs_column: Some(rhs_column),
            output: None,
        }
    }

    fn compile_pattern(&self, input: &Table) -> Result<Option<LikePattern>> {
        if !self.condition.is_pattern() {
            return Ok(None);
        }
        if input.column_data_type(self.column_id) != DataType::Text {
            return Err(Error::unsupported(format!(
                "{} on non-text column '{}'",
                self.condition,
                input.column_name(self.column_id)
            )));
        }
        let pattern = self.value.as_str().ok_or_else(|| {
            Error::unsupported("pattern conditions require a text literal")
        })?;
        Ok(Some(LikePattern::new(pattern)?))
    }

    /// Emit one output chunk for the matches of one input chunk
    fn emit_chunk(
        output: &Table,
        input_table: &Arc<Table>,
        chunk: &Chunk,
        chunk_id: ChunkId,
        matches: Vec<ChunkOffset>,
    ) -> Result<()> {
        if matches.is_empty() {
            return Ok(());
        }

        match input_table.table_type() {
            TableType::Data => {
                let pos_list: Arc<PosList> = Arc::new(
                    matches
                        .iter()
                        .map(|&offset| RowId::new(chunk_id, offset))
                        .collect(),
                );
                let segments: Vec<Arc<Segment>> = (0..input_table.column_count())
                    .map(|column_id| {
                        Arc::new(Segment::Reference(ReferenceSegment::new(
                            Arc::clone(input_table),
                            column_id,
                            Arc::clone(&pos_list),
                        )))
                    })
                    .collect();
                output.append_chunk(segments, None)
            }
            TableType::References => {
                // Flatten: pick the matching row ids out of each column's
                // input position list, sharing the output list between
                // columns that shared their input list.
                let mut flattened: Vec<(*const PosList, Arc<PosList>)> = Vec::new();
                let mut segments: Vec<Arc<Segment>> = Vec::new();
                for column_id in 0..input_table.column_count() {
                    let input_segment = chunk.get_segment(column_id);
                    let Segment::Reference(reference) = input_segment.as_ref() else {
                        return Err(Error::Internal(
                            "references table held a non-reference segment".into(),
                        ));
                    };
                    let input_pos = reference.pos_list();
                    let key = Arc::as_ptr(input_pos);
                    let pos_list = match flattened.iter().find(|(k, _)| *k == key) {
                        Some((_, existing)) => Arc::clone(existing),
                        None => {
                            let list: Arc<PosList> = Arc::new(
                                matches
                                    .iter()
                                    .map(|&offset| input_pos[offset as usize])
                                    .collect(),
                            );
                            flattened.push((key, Arc::clone(&list)));
                            list
                        }
                    };
                    segments.push(Arc::new(Segment::Reference(ReferenceSegment::new(
                        Arc::clone(reference.referenced_table()),
                        reference.referenced_column(),
                        pos_list,
                    ))));
                }
                output.append_chunk(segments, None)
            }
        }
    }
}

/// Borrowed predicate state shared across parallel chunk scans
struct ChunkScanner<'a> {
    column_id: ColumnId,
    condition: PredicateCondition,
    value: &'a Value,
    upper: Option<&'a Value>,
    rhs_column: Option<ColumnId>,
    pattern: Option<&'a LikePattern>,
}

impl ChunkScanner<'_> {
    /// Matching offsets within one chunk's scan column
    fn scan(&self, chunk: &Chunk) -> Result<Vec<ChunkOffset>> {
        if let Some(rhs_column) = self.rhs_column {
            return self.scan_column_vs_column(chunk, rhs_column);
        }
        // Statistics only exist on sealed data chunks; a miss means scan.
        if let Some(stats) = chunk.statistics() {
            let prunable = match (self.condition, self.upper) {
                (PredicateCondition::Between, Some(upper)) => {
                    stats.can_prune(
                        self.column_id,
                        PredicateCondition::GreaterThanEquals,
                        self.value,
                    ) || stats.can_prune(self.column_id, PredicateCondition::LessThanEquals, upper)
                }
                _ => stats.can_prune(self.column_id, self.condition, self.value),
            };
            if prunable {
                return Ok(Vec::new());
            }
        }

        let segment = chunk.get_segment(self.column_id);
        let mut matches = Vec::new();
        let mut first_error: Option<Error> = None;
        segment.for_each_position(&mut |value, is_null, offset| {
            if is_null || first_error.is_some() {
                return;
            }
            let matched = match self.condition {
                PredicateCondition::Like => self
                    .pattern
                    .map(|p| value.as_str().is_some_and(|s| p.matches(s)))
                    .unwrap_or(false),
                PredicateCondition::NotLike => self
                    .pattern
                    .map(|p| value.as_str().is_some_and(|s| !p.matches(s)))
                    .unwrap_or(false),
                PredicateCondition::Between => {
                    let lower_ok =
                        satisfies(&value, self.value, PredicateCondition::GreaterThanEquals);
                    let upper_ok = self
                        .upper
                        .map(|u| satisfies(&value, u, PredicateCondition::LessThanEquals))
                        .unwrap_or(Ok(false));
                    match (lower_ok, upper_ok) {
                        (Ok(l), Ok(u)) => l && u,
                        (Err(e), _) | (_, Err(e)) => {
                            first_error = Some(e);
                            false
                        }
                    }
                }
                condition => match satisfies(&value, self.value, condition) {
                    Ok(matched) => matched,
                    Err(e) => {
                        first_error = Some(e);
                        false
                    }
                },
            };
            if matched {
                matches.push(offset);
            }
        });

        match first_error {
            Some(error) => Err(error),
            None => Ok(matches),
        }
    }

    /// Row-aligned comparison of two columns of the same chunk
    fn scan_column_vs_column(
        &self,
        chunk: &Chunk,
        rhs_column: ColumnId,
    ) -> Result<Vec<ChunkOffset>> {
        let lhs = chunk.get_segment(self.column_id).materialize();
        let rhs = chunk.get_segment(rhs_column).materialize();
        let mut matches = Vec::new();
        for (offset, ((lhs_value, lhs_null), (rhs_value, rhs_null))) in
            lhs.iter().zip(&rhs).enumerate()
        {
            if *lhs_null || *rhs_null {
                continue;
            }
            if satisfies(lhs_value, rhs_value, self.condition)? {
                matches.push(offset as ChunkOffset);
            }
        }
        Ok(matches)
    }
}

impl PhysicalOperator for TableScan {
    fn name(&self) -> &'static str {
        "TableScan"
    }

    fn execute(&mut self, ctx: &ExecutionContext) -> Result<()> {
        if self.output.is_some() {
            return Ok(());
        }
        self.input.execute(ctx)?;
        let input_table = self.input.get_output().ok_or_else(|| {
            Error::Internal("TableScan input produced no output".into())
        })?;

        if self.column_id >= input_table.column_count() {
            return Err(Error::ColumnNotFound(format!(
                "column id {}",
                self.column_id
            )));
        }
        if let Some(rhs_column) = self.rhs_column {
            if rhs_column >= input_table.column_count() {
                return Err(Error::ColumnNotFound(format!("column id {}", rhs_column)));
            }
        }
        let pattern = if self.rhs_column.is_none() {
            self.compile_pattern(&input_table)?
        } else {
            None
        };
        let scanner = ChunkScanner {
            column_id: self.column_id,
            condition: self.condition,
            value: &self.value,
            upper: self.upper.as_ref(),
            rhs_column: self.rhs_column,
            pattern: pattern.as_ref(),
        };

        let output = Table::new(
            input_table.column_definitions().to_vec(),
            TableType::References,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        );

        let chunks = input_table.chunks();
        let run_parallel = ctx.parallel.enabled
            && chunks.len() > 1
            && input_table.row_count() as usize >= ctx.parallel.min_rows_for_parallel_scan;

        let per_chunk_matches: Vec<Vec<ChunkOffset>> = if run_parallel {
            chunks
                .par_iter()
                .map(|chunk| {
                    ctx.cancel.check()?;
                    scanner.scan(chunk.as_ref())
                })
                .collect::<Result<Vec<_>>>()?
        } else {
            let mut all = Vec::with_capacity(chunks.len());
            for chunk in &chunks {
                ctx.cancel.check()?;
                all.push(scanner.scan(chunk.as_ref())?);
            }
            all
        };

        for (chunk_id, matches) in per_chunk_matches.into_iter().enumerate() {
            Self::emit_chunk(
                &output,
                &input_table,
                chunks[chunk_id].as_ref(),
                chunk_id as ChunkId,
                matches,
            )?;
        }

        self.output = Some(Arc::new(output));
        Ok(())
    }

    fn get_output(&self) -> Option<Arc<Table>> {
        self.output.clone()
    }

    fn deep_copy(&self) -> BoxedOperator {
        Box::new(TableScan {
            input: self.input.deep_copy(),
            column_id: self.column_id,
            condition: self.condition,
            value: self.value.clone(),
            upper: self.upper.clone(),
            rhs_column: self.rhs_column,
            output: None,
        })
    }

    fn on_cleanup(&mut self) {
        self.output = None;
        self.input.on_cleanup();
    }
}
