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

//! Nested-loop join
//!
//! The reference join: chunk-blocked loops over both inputs, supporting
//! every join mode (Inner, Left, Right, Outer, Cross, Semi, Anti) and every
//! predicate condition including LIKE. Performance is far behind a hash or
//! sort-merge join; its value is completeness and NULL-correctness.
//!
//! Output is a References table: left columns then right columns, each side
//! sharing one position list. References inputs are flattened so the output
//! always points at the deepest data tables, and an input References table
//! with zero chunks falls back to a dummy data table so downstream
//! operators never see a dangling reference.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::{
    ChunkId, ColumnId, DataType, Error, JoinMode, PredicateCondition, Result, RowId, Value,
    NULL_ROW_ID,
};
use crate::expr::{satisfies, LikePattern};
use crate::storage::{
    ColumnDefinition, PosList, ReferenceSegment, Segment, Table, TableType, UseMvcc,
    DEFAULT_CHUNK_SIZE,
};

use super::operator::{BoxedOperator, ExecutionContext, PhysicalOperator};

/// Predicate evaluation for one join, with LIKE patterns compiled on demand
struct JoinComparator {
    condition: PredicateCondition,
    /// Right mode swaps the loop sides; the comparator restores the
    /// original operand order instead of flipping the condition
    swapped: bool,
    pattern_cache: FxHashMap<String, LikePattern>,
}

impl JoinComparator {
    fn new(condition: PredicateCondition, swapped: bool) -> Self {
        Self {
            condition,
            swapped,
            pattern_cache: FxHashMap::default(),
        }
    }

    fn matches(&mut self, outer: &Value, inner: &Value) -> Result<bool> {
        let (left, right) = if self.swapped {
            (inner, outer)
        } else {
            (outer, inner)
        };
        match self.condition {
            PredicateCondition::Like | PredicateCondition::NotLike => {
                let subject = left.as_str().ok_or_else(|| {
                    Error::unsupported("LIKE join on non-text operand")
                })?;
                let pattern_text = right.as_str().ok_or_else(|| {
                    Error::unsupported("LIKE join on non-text operand")
                })?;
                if !self.pattern_cache.contains_key(pattern_text) {
                    let compiled = LikePattern::new(pattern_text)?;
                    self.pattern_cache
                        .insert(pattern_text.to_string(), compiled);
                }
                let matched = self.pattern_cache[pattern_text].matches(subject);
                Ok(if self.condition == PredicateCondition::NotLike {
                    !matched
                } else {
                    matched
                })
            }
            condition => satisfies(left, right, condition),
        }
    }
}

/// The reference nested-loop join operator
#[derive(Debug)]
pub struct JoinNestedLoop {
    left: BoxedOperator,
    right: BoxedOperator,
    mode: JoinMode,
    column_ids: (ColumnId, ColumnId),
    condition: PredicateCondition,
    output: Option<Arc<Table>>,
}

impl JoinNestedLoop {
    /// Join `left.column_ids.0 <condition> right.column_ids.1` under `mode`
    pub fn new(
        left: BoxedOperator,
        right: BoxedOperator,
        mode: JoinMode,
        column_ids: (ColumnId, ColumnId),
        condition: PredicateCondition,
    ) -> Self {
        debug_assert!(mode != JoinMode::Cross, "use JoinNestedLoop::cross");
        Self {
            left,
            right,
            mode,
            column_ids,
            condition,
            output: None,
        }
    }

    /// Cartesian product of both inputs
    pub fn cross(left: BoxedOperator, right: BoxedOperator) -> Self {
        Self {
            left,
            right,
            mode: JoinMode::Cross,
            column_ids: (0, 0),
            condition: PredicateCondition::Equals,
            output: None,
        }
    }

    /// Output schema: left columns then right columns, nullability widened
    /// on a side that outer-join NULL extension can reach
    fn output_definitions(&self, left: &Table, right: &Table) -> Vec<ColumnDefinition> {
        let left_may_null = matches!(self.mode, JoinMode::Right | JoinMode::Outer);
        let right_may_null = matches!(self.mode, JoinMode::Left | JoinMode::Outer);

        let mut definitions: Vec<ColumnDefinition> = left
            .column_definitions()
            .iter()
            .map(|def| {
                ColumnDefinition::new(
                    def.name.clone(),
                    def.data_type,
                    def.nullable || left_may_null,
                )
            })
            .collect();
        if !self.mode.emits_left_only() {
            definitions.extend(right.column_definitions().iter().map(|def| {
                ColumnDefinition::new(
                    def.name.clone(),
                    def.data_type,
                    def.nullable || right_may_null,
                )
            }));
        }
        definitions
    }

    /// Emit one side's columns, flattening References inputs so the output
    /// references the deepest data table
    fn write_output_segments(
        segments: &mut Vec<Arc<Segment>>,
        input_table: &Arc<Table>,
        pos_list: &Arc<PosList>,
    ) -> Result<()> {
        for column_id in 0..input_table.column_count() {
            let segment: Segment = if input_table.table_type() == TableType::References {
                if input_table.chunk_count() > 0 {
                    // De-reference to the underlying data-table row ids so
                    // the output can feed another join
                    let mut new_pos_list: PosList = Vec::with_capacity(pos_list.len());
                    for row_id in pos_list.iter() {
                        if row_id.is_null() {
                            new_pos_list.push(NULL_ROW_ID);
                            continue;
                        }
                        let chunk = input_table.get_chunk(row_id.chunk_id).ok_or_else(|| {
                            Error::Internal("join input chunk disappeared".into())
                        })?;
                        let input_segment = chunk.get_segment(column_id);
                        let Segment::Reference(reference) = input_segment.as_ref() else {
                            return Err(Error::Internal(
                                "references table held a non-reference segment".into(),
                            ));
                        };
                        new_pos_list.push(reference.pos_list()[row_id.chunk_offset as usize]);
                    }

                    let first_chunk = input_table.get_chunk(0).expect("chunk count checked");
                    let first_segment = first_chunk.get_segment(column_id);
                    let Segment::Reference(reference) = first_segment.as_ref() else {
                        return Err(Error::Internal(
                            "references table held a non-reference segment".into(),
                        ));
                    };
                    Segment::Reference(ReferenceSegment::new(
                        Arc::clone(reference.referenced_table()),
                        reference.referenced_column(),
                        Arc::new(new_pos_list),
                    ))
                } else {
                    // No chunks to deduce the referenced table from; the
                    // position list holds only NULL_ROW_IDs, so reference a
                    // dummy table of the same schema.
                    let dummy = Table::create_dummy_table(
                        input_table.column_definitions().to_vec(),
                    );
                    Segment::Reference(ReferenceSegment::new(
                        dummy,
                        column_id,
                        Arc::clone(pos_list),
                    ))
                }
            } else {
                Segment::Reference(ReferenceSegment::new(
                    Arc::clone(input_table),
                    column_id,
                    Arc::clone(pos_list),
                ))
            };
            segments.push(Arc::new(segment));
        }
        Ok(())
    }
}

impl PhysicalOperator for JoinNestedLoop {
    fn name(&self) -> &'static str {
        "JoinNestedLoop"
    }

    fn execute(&mut self, ctx: &ExecutionContext) -> Result<()> {
        if self.output.is_some() {
            return Ok(());
        }
        self.left.execute(ctx)?;
        self.right.execute(ctx)?;
        let left_table = self.left.get_output().ok_or_else(|| {
            Error::Internal("join left input produced no output".into())
        })?;
        let right_table = self.right.get_output().ok_or_else(|| {
            Error::Internal("join right input produced no output".into())
        })?;

        let definitions = self.output_definitions(&left_table, &right_table);
        let output = Table::new(
            definitions,
            TableType::References,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        );

        // Right outer swaps the loop sides so the outer side drives the
        // outer loop; the comparator keeps the original operand order.
        let swapped = self.mode == JoinMode::Right;
        let (outer_table, inner_table) = if swapped {
            (&right_table, &left_table)
        } else {
            (&left_table, &right_table)
        };
        let (outer_column, inner_column) = if swapped {
            (self.column_ids.1, self.column_ids.0)
        } else {
            self.column_ids
        };

        if self.condition.is_pattern() && self.mode != JoinMode::Cross {
            let left_type = left_table.column_data_type(self.column_ids.0);
            let right_type = right_table.column_data_type(self.column_ids.1);
            if left_type != DataType::Text || right_type != DataType::Text {
                return Err(Error::unsupported(format!(
                    "{} join requires text columns on both sides",
                    self.condition
                )));
            }
        }

        let is_cross = self.mode == JoinMode::Cross;
        let is_outer_join = matches!(
            self.mode,
            JoinMode::Left | JoinMode::Right | JoinMode::Outer
        );
        let track_inner_matches = self.mode == JoinMode::Outer;
        let emits_left_only = self.mode.emits_left_only();

        let mut comparator = JoinComparator::new(self.condition, swapped);
        let mut pos_outer: PosList = Vec::new();
        let mut pos_inner: PosList = Vec::new();

        // Materialize the inner join column once per chunk; the inner loop
        // revisits it for every outer row.
        let inner_chunks: Vec<Vec<(Value, bool)>> = inner_table
            .chunks()
            .iter()
            .map(|chunk| chunk.get_segment(inner_column).materialize())
            .collect();
        let mut inner_matches: Vec<Vec<bool>> = inner_chunks
            .iter()
            .map(|values| vec![false; values.len()])
            .collect();

        for (outer_chunk_id, outer_chunk) in outer_table.chunks().into_iter().enumerate() {
            ctx.cancel.check()?;
            let outer_values = outer_chunk.get_segment(outer_column).materialize();
            let mut outer_matches = vec![false; outer_values.len()];

            for (inner_chunk_id, inner_values) in inner_chunks.iter().enumerate() {
                for (outer_offset, (outer_value, outer_null)) in outer_values.iter().enumerate() {
                    if *outer_null && !is_cross {
                        continue;
                    }
                    for (inner_offset, (inner_value, inner_null)) in
                        inner_values.iter().enumerate()
                    {
                        if *inner_null && !is_cross {
                            continue;
                        }
                        let matched =
                            is_cross || comparator.matches(outer_value, inner_value)?;
                        if !matched {
                            continue;
                        }
                        outer_matches[outer_offset] = true;
                        if track_inner_matches {
                            inner_matches[inner_chunk_id][inner_offset] = true;
                        }
                        if emits_left_only {
                            continue;
                        }
                        pos_outer.push(RowId::new(
                            outer_chunk_id as ChunkId,
                            outer_offset as u32,
                        ));
                        pos_inner.push(RowId::new(
                            inner_chunk_id as ChunkId,
                            inner_offset as u32,
                        ));
                    }
                }
            }

            match self.mode {
                JoinMode::Semi => {
                    for (offset, matched) in outer_matches.iter().enumerate() {
                        if *matched {
                            pos_outer
                                .push(RowId::new(outer_chunk_id as ChunkId, offset as u32));
                        }
                    }
                }
                JoinMode::Anti => {
                    for (offset, matched) in outer_matches.iter().enumerate() {
                        if !*matched {
                            pos_outer
                                .push(RowId::new(outer_chunk_id as ChunkId, offset as u32));
                        }
                    }
                }
                _ if is_outer_join => {
                    // Unmatched rows of the outer side survive with NULL
                    // extension, NULL-valued join keys included
                    for (offset, matched) in outer_matches.iter().enumerate() {
                        if !*matched {
                            pos_outer
                                .push(RowId::new(outer_chunk_id as ChunkId, offset as u32));
                            pos_inner.push(NULL_ROW_ID);
                        }
                    }
                }
                _ => {}
            }
        }

        // Full outer: one pass over the inner side for its unmatched rows
        if track_inner_matches {
            for (inner_chunk_id, matches) in inner_matches.iter().enumerate() {
                ctx.cancel.check()?;
                for (inner_offset, matched) in matches.iter().enumerate() {
                    if !*matched {
                        pos_outer.push(NULL_ROW_ID);
                        pos_inner.push(RowId::new(
                            inner_chunk_id as ChunkId,
                            inner_offset as u32,
                        ));
                    }
                }
            }
        }

        // Restore left/right orientation for the output columns
        let (left_source, left_pos, right_source, right_pos) = if swapped {
            (inner_table, pos_inner, outer_table, pos_outer)
        } else {
            (outer_table, pos_outer, inner_table, pos_inner)
        };

        if !left_pos.is_empty() || !right_pos.is_empty() {
            let left_pos = Arc::new(left_pos);
            let right_pos = Arc::new(right_pos);
            let mut segments: Vec<Arc<Segment>> = Vec::new();
            Self::write_output_segments(&mut segments, left_source, &left_pos)?;
            if !emits_left_only {
                Self::write_output_segments(&mut segments, right_source, &right_pos)?;
            }
            output.append_chunk(segments, None)?;
        }

        self.output = Some(Arc::new(output));
        Ok(())
    }

    fn get_output(&self) -> Option<Arc<Table>> {
        self.output.clone()
    }

    fn deep_copy(&self) -> BoxedOperator {
        Box::new(JoinNestedLoop {
            left: self.left.deep_copy(),
            right: self.right.deep_copy(),
            mode: self.mode,
            column_ids: self.column_ids,
            condition: self.condition,
            output: None,
        })
    }

    fn on_cleanup(&mut self) {
        self.output = None;
        self.left.on_cleanup();
        self.right.on_cleanup();
    }
}
