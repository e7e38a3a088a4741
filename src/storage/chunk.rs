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

//! Chunks: fixed-capacity horizontal table partitions
//!
//! A chunk stores its rows column by column, one [`Segment`] per column,
//! plus optional MVCC metadata and per-column min/max statistics. Only the
//! last chunk of a table is mutable; sealing marks a chunk immutable, after
//! which its segments may be swapped for encoded ones but never appended to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{
    ChunkOffset, ColumnId, Error, PredicateCondition, Result, Value,
};

use super::mvcc::MvccData;
use super::segment::Segment;

/// Per-column min/max statistics of one sealed chunk.
///
/// Used by scans to skip chunks that cannot contain a match.
#[derive(Debug, Clone, Default)]
pub struct ChunkStatistics {
    /// (min, max) per column; None when the column was all-NULL or the
    /// statistics were not collected
    ranges: Vec<Option<(Value, Value)>>,
}

impl ChunkStatistics {
    /// Collect min/max per column from the chunk's segments
    pub fn from_segments(segments: &[Arc<Segment>]) -> Self {
        let ranges = segments
            .iter()
            .map(|segment| {
                let mut min: Option<Value> = None;
                let mut max: Option<Value> = None;
                segment.for_each_position(&mut |value, is_null, _| {
                    if is_null {
                        return;
                    }
                    match &min {
                        Some(m) if value.total_cmp(m).is_ge() => {}
                        _ => min = Some(value.clone()),
                    }
                    match &max {
                        Some(m) if value.total_cmp(m).is_le() => {}
                        _ => max = Some(value),
                    }
                });
                min.zip(max)
            })
            .collect();
        Self { ranges }
    }

    /// Returns true if no row of the chunk can satisfy `column <cond> value`
    pub fn can_prune(
        &self,
        column_id: ColumnId,
        condition: PredicateCondition,
        value: &Value,
    ) -> bool {
        let Some(Some((min, max))) = self.ranges.get(column_id as usize) else {
            return false;
        };
        if value.is_null() {
            return false;
        }
        match condition {
            PredicateCondition::Equals => {
                value.total_cmp(min).is_lt() || value.total_cmp(max).is_gt()
            }
            PredicateCondition::LessThan => value.total_cmp(min).is_le(),
            PredicateCondition::LessThanEquals => value.total_cmp(min).is_lt(),
            PredicateCondition::GreaterThan => value.total_cmp(max).is_ge(),
            PredicateCondition::GreaterThanEquals => value.total_cmp(max).is_gt(),
            _ => false,
        }
    }
}

/// A horizontal partition of a table, stored column by column
#[derive(Debug)]
pub struct Chunk {
    segments: RwLock<Vec<Arc<Segment>>>,
    mvcc: Option<Arc<MvccData>>,
    statistics: RwLock<Option<Arc<ChunkStatistics>>>,
    mutable: AtomicBool,
}

impl Chunk {
    /// The last chunk offset is reserved for NULL row references.
    pub const MAX_SIZE: ChunkOffset = ChunkOffset::MAX - 1;

    /// Create a chunk from pre-built segments (sealed or growing)
    pub fn new(segments: Vec<Arc<Segment>>, mvcc: Option<Arc<MvccData>>) -> Self {
        Self {
            segments: RwLock::new(segments),
            mvcc,
            statistics: RwLock::new(None),
            mutable: AtomicBool::new(true),
        }
    }

    /// Number of rows
    pub fn size(&self) -> ChunkOffset {
        let segments = self.segments.read();
        segments.first().map_or(0, |s| s.len() as ChunkOffset)
    }

    /// Number of columns
    pub fn column_count(&self) -> ColumnId {
        self.segments.read().len() as ColumnId
    }

    /// Returns whether new rows can still be appended
    pub fn is_mutable(&self) -> bool {
        self.mutable.load(Ordering::Acquire)
    }

    /// Seal the chunk: no further appends, statistics become collectable
    pub fn mark_immutable(&self) {
        self.mutable.store(false, Ordering::Release);
    }

    /// Atomically access the segment at `column_id`.
    ///
    /// Concurrently with operator execution, value segments may be swapped
    /// for dictionary segments. A caller holding the returned `Arc` keeps
    /// observing the segment it resolved, without inconsistency.
    pub fn get_segment(&self, column_id: ColumnId) -> Arc<Segment> {
        Arc::clone(&self.segments.read()[column_id as usize])
    }

    /// Snapshot of all segment handles
    pub fn segments(&self) -> Vec<Arc<Segment>> {
        self.segments.read().clone()
    }

    /// Atomically replace the segment at `column_id`.
    ///
    /// Readers that already hold the old `Arc` continue on it safely.
    pub fn replace_column(&self, column_id: ColumnId, segment: Arc<Segment>) {
        let mut segments = self.segments.write();
        segments[column_id as usize] = segment;
    }

    /// MVCC metadata, if this chunk tracks visibility
    pub fn mvcc_data(&self) -> Option<&Arc<MvccData>> {
        self.mvcc.as_ref()
    }

    /// Returns true if this chunk tracks MVCC visibility
    pub fn has_mvcc_data(&self) -> bool {
        self.mvcc.is_some()
    }

    /// Per-column statistics, if collected
    pub fn statistics(&self) -> Option<Arc<ChunkStatistics>> {
        self.statistics.read().clone()
    }

    /// Collect and attach min/max statistics (sealed chunks only)
    pub fn generate_statistics(&self) {
        debug_assert!(!self.is_mutable(), "statistics on a mutable chunk");
        let stats = ChunkStatistics::from_segments(&self.segments.read());
        *self.statistics.write() = Some(Arc::new(stats));
    }

    /// Append one row, given as boundary values.
    ///
    /// Slow path intended for tests and tiny fixtures; the bulk path is
    /// [`Table::append_chunk`](super::table::Table::append_chunk).
    pub fn append(&self, values: &[Value]) -> Result<()> {
        if !self.is_mutable() {
            return Err(Error::unsupported("append on a sealed chunk"));
        }
        let mut segments = self.segments.write();
        if values.len() != segments.len() {
            return Err(Error::ColumnCountMismatch {
                expected: segments.len(),
                got: values.len(),
            });
        }
        let size = segments.first().map_or(0, |s| s.len());
        if size as u64 >= Self::MAX_SIZE as u64 {
            return Err(Error::unsupported("chunk is at maximum capacity"));
        }
        for (segment, value) in segments.iter_mut().zip(values) {
            Arc::make_mut(segment).append(value)?;
        }
        Ok(())
    }

    /// Replace every value segment with its dictionary-encoded form
    pub fn encode_columns(&self) {
        debug_assert!(!self.is_mutable(), "encoding a mutable chunk");
        let handles = self.segments();
        for (column_id, segment) in handles.iter().enumerate() {
            if segment.is_mutable() {
                let encoded = Arc::new(segment.dictionary_encode());
                self.replace_column(column_id as ColumnId, encoded);
            }
        }
    }
}
