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

//! Tables: ordered lists of fixed-capacity chunks
//!
//! A table is a schema plus a chunk list. Data tables own their values;
//! References tables consist purely of reference segments whose chunks each
//! share one position list. All chunks of a table have the same column
//! count; at most the last chunk is mutable, and `append_chunk` seals the
//! previous last chunk.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{
    ChunkId, ChunkOffset, ColumnId, CommitId, DataType, Error, Result, RowId, TransactionId,
    Value,
};

use super::chunk::Chunk;
use super::mvcc::MvccData;
use super::segment::Segment;

/// Name, type, and nullability of one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl ColumnDefinition {
    /// Create a column definition
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

/// Whether a table owns its values or references another table's
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    /// Newly materialized values
    Data,
    /// Reference segments over a data table
    References,
}

/// Whether a data table tracks MVCC visibility metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseMvcc {
    Yes,
    No,
}

/// Default number of rows per chunk
pub const DEFAULT_CHUNK_SIZE: ChunkOffset = 65_535;

/// An in-memory columnar table
#[derive(Debug)]
pub struct Table {
    column_definitions: Vec<ColumnDefinition>,
    table_type: TableType,
    target_chunk_size: ChunkOffset,
    chunks: RwLock<Vec<Arc<Chunk>>>,
    use_mvcc: bool,
}

impl Table {
    /// Create an empty table
    pub fn new(
        column_definitions: Vec<ColumnDefinition>,
        table_type: TableType,
        target_chunk_size: ChunkOffset,
        use_mvcc: UseMvcc,
    ) -> Self {
        debug_assert!(target_chunk_size > 0, "chunk size must be positive");
        Self {
            column_definitions,
            table_type,
            target_chunk_size,
            chunks: RwLock::new(Vec::new()),
            use_mvcc: use_mvcc == UseMvcc::Yes && table_type == TableType::Data,
        }
    }

    /// Empty data table with the given schema, used as the reference target
    /// for all-NULL position lists when an input References table has no
    /// chunks to deduce the real target from
    pub fn create_dummy_table(column_definitions: Vec<ColumnDefinition>) -> Arc<Table> {
        Arc::new(Table::new(
            column_definitions,
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        ))
    }

    // =========================================================================
    // Schema accessors
    // =========================================================================

    /// Number of columns
    pub fn column_count(&self) -> ColumnId {
        self.column_definitions.len() as ColumnId
    }

    /// All column definitions
    pub fn column_definitions(&self) -> &[ColumnDefinition] {
        &self.column_definitions
    }

    /// Name of the column at `column_id`
    pub fn column_name(&self, column_id: ColumnId) -> &str {
        &self.column_definitions[column_id as usize].name
    }

    /// Data type of the column at `column_id`
    pub fn column_data_type(&self, column_id: ColumnId) -> DataType {
        self.column_definitions[column_id as usize].data_type
    }

    /// Nullability of the column at `column_id`
    pub fn column_is_nullable(&self, column_id: ColumnId) -> bool {
        self.column_definitions[column_id as usize].nullable
    }

    /// Resolve a column name to its id
    pub fn column_id_by_name(&self, name: &str) -> Result<ColumnId> {
        self.column_definitions
            .iter()
            .position(|def| def.name == name)
            .map(|i| i as ColumnId)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Data or References
    pub fn table_type(&self) -> TableType {
        self.table_type
    }

    /// Rows per chunk this table aims for
    pub fn target_chunk_size(&self) -> ChunkOffset {
        self.target_chunk_size
    }

    /// Returns true if data chunks of this table carry MVCC metadata
    pub fn uses_mvcc(&self) -> bool {
        self.use_mvcc
    }

    // =========================================================================
    // Chunk access
    // =========================================================================

    /// Number of chunks
    pub fn chunk_count(&self) -> ChunkId {
        self.chunks.read().len() as ChunkId
    }

    /// The chunk at `chunk_id`
    pub fn get_chunk(&self, chunk_id: ChunkId) -> Option<Arc<Chunk>> {
        self.chunks.read().get(chunk_id as usize).cloned()
    }

    /// Snapshot of all chunk handles
    pub fn chunks(&self) -> Vec<Arc<Chunk>> {
        self.chunks.read().clone()
    }

    /// Total number of rows across all chunks
    pub fn row_count(&self) -> u64 {
        self.chunks
            .read()
            .iter()
            .map(|chunk| chunk.size() as u64)
            .sum()
    }

    /// Resolve a single cell; panics on NULL_ROW_ID (callers check first)
    pub fn value_at(&self, row_id: RowId, column_id: ColumnId) -> Value {
        match self.get_chunk(row_id.chunk_id) {
            Some(chunk) => chunk
                .get_segment(column_id)
                .value_at(row_id.chunk_offset as usize),
            None => Value::Null,
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Append a complete chunk built from the given segments.
    ///
    /// Seals the previous last chunk. For References tables, every segment
    /// must be a reference segment and all segments of the chunk must share
    /// one position list; for Data tables, reference segments are rejected.
    pub fn append_chunk(
        &self,
        segments: Vec<Arc<Segment>>,
        mvcc: Option<Arc<MvccData>>,
    ) -> Result<()> {
        if segments.len() != self.column_definitions.len() {
            return Err(Error::ColumnCountMismatch {
                expected: self.column_definitions.len(),
                got: segments.len(),
            });
        }
        let size = segments.first().map_or(0, |s| s.len());
        if segments.iter().any(|s| s.len() != size) {
            return Err(Error::invalid_input(
                "segments of one chunk must have equal row counts",
            ));
        }

        match self.table_type {
            TableType::References => {
                // Segments emitted together share position lists per input
                // side; a join chunk carries one list for its left and one
                // for its right columns. Row alignment is what the table
                // enforces: every list must have the chunk's row count.
                for segment in &segments {
                    let Segment::Reference(reference) = segment.as_ref() else {
                        return Err(Error::invalid_input(
                            "references table requires reference segments",
                        ));
                    };
                    if reference.pos_list().len() != size {
                        return Err(Error::invalid_input(
                            "position lists of one reference chunk must align row-wise",
                        ));
                    }
                }
            }
            TableType::Data => {
                if segments
                    .iter()
                    .any(|s| matches!(s.as_ref(), Segment::Reference(_)))
                {
                    return Err(Error::invalid_input(
                        "data table cannot hold reference segments",
                    ));
                }
            }
        }

        let mut chunks = self.chunks.write();
        if let Some(last) = chunks.last() {
            last.mark_immutable();
        }
        let chunk = Chunk::new(segments, mvcc);
        if self.table_type == TableType::References {
            chunk.mark_immutable();
        }
        chunks.push(Arc::new(chunk));
        Ok(())
    }

    /// Append one row, visible from commit id 0.
    ///
    /// Slow test/debug path; allocates a fresh mutable chunk when the last
    /// one is full or sealed.
    pub fn append(&self, values: &[Value]) -> Result<RowId> {
        self.append_row(values, 0, crate::core::INVALID_TRANSACTION_ID)
    }

    /// Append one uncommitted row owned by `tid` (stamped at commit)
    pub fn append_uncommitted(&self, values: &[Value], tid: TransactionId) -> Result<RowId> {
        self.append_row(values, crate::core::MAX_COMMIT_ID, tid)
    }

    fn append_row(
        &self,
        values: &[Value],
        begin_cid: CommitId,
        tid: TransactionId,
    ) -> Result<RowId> {
        if self.table_type != TableType::Data {
            return Err(Error::unsupported("row append on a references table"));
        }
        if values.len() != self.column_definitions.len() {
            return Err(Error::ColumnCountMismatch {
                expected: self.column_definitions.len(),
                got: values.len(),
            });
        }
        for (def, value) in self.column_definitions.iter().zip(values) {
            if value.is_null() && !def.nullable {
                return Err(Error::NullNotAllowed(def.name.clone()));
            }
            if !value.matches_type(def.data_type) {
                return Err(Error::TypeMismatch {
                    column: def.name.clone(),
                    expected: def.data_type.to_string(),
                    got: value
                        .data_type()
                        .map(|dt| dt.to_string())
                        .unwrap_or_else(|| "NULL".into()),
                });
            }
        }

        let mut chunks = self.chunks.write();
        let needs_new_chunk = match chunks.last() {
            Some(chunk) => !chunk.is_mutable() || chunk.size() >= self.target_chunk_size,
            None => true,
        };
        if needs_new_chunk {
            if let Some(last) = chunks.last() {
                last.mark_immutable();
            }
            let segments = self
                .column_definitions
                .iter()
                .map(|def| Arc::new(Segment::new_value_segment(def.data_type, def.nullable)))
                .collect();
            let mvcc = self
                .use_mvcc
                .then(|| Arc::new(MvccData::new(0, 0)));
            chunks.push(Arc::new(Chunk::new(segments, mvcc)));
        }

        let chunk = chunks.last().expect("chunk allocated above");
        chunk.append(values)?;
        if let Some(mvcc) = chunk.mvcc_data() {
            mvcc.grow(begin_cid, tid);
        }
        let row_id = RowId::new(
            (chunks.len() - 1) as ChunkId,
            chunk.size() - 1,
        );
        Ok(row_id)
    }

    /// Seal every chunk and swap value segments for dictionary segments
    pub fn encode_all_chunks(&self) {
        for chunk in self.chunks() {
            chunk.mark_immutable();
            chunk.encode_columns();
            chunk.generate_statistics();
        }
    }

    /// Materialize all rows as boundary values (tests and small results)
    pub fn materialize_rows(&self) -> Vec<Vec<Value>> {
        let mut rows = Vec::new();
        for chunk in self.chunks() {
            let segments: Vec<_> = (0..self.column_count())
                .map(|column_id| chunk.get_segment(column_id))
                .collect();
            for offset in 0..chunk.size() as usize {
                rows.push(
                    segments
                        .iter()
                        .map(|segment| segment.value_at(offset))
                        .collect(),
                );
            }
        }
        rows
    }
}

/// Bulk-load a data table from rows, chunked at `chunk_size`
pub fn load_table(
    column_definitions: Vec<ColumnDefinition>,
    rows: &[Vec<Value>],
    chunk_size: ChunkOffset,
) -> Result<Arc<Table>> {
    let table = Table::new(
        column_definitions,
        TableType::Data,
        chunk_size,
        UseMvcc::Yes,
    );
    for row in rows {
        table.append(row)?;
    }
    Ok(Arc::new(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::reference_segment::{PosList, ReferenceSegment};

    fn int_text_defs() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("a", DataType::Int32, false),
            ColumnDefinition::new("b", DataType::Text, true),
        ]
    }

    fn small_table(chunk_size: ChunkOffset) -> Table {
        Table::new(int_text_defs(), TableType::Data, chunk_size, UseMvcc::No)
    }

    #[test]
    fn test_append_allocates_chunks() {
        let table = small_table(2);
        for i in 0..5 {
            table
                .append(&[Value::Int32(i), Value::text(format!("r{}", i))])
                .unwrap();
        }
        assert_eq!(table.row_count(), 5);
        assert_eq!(table.chunk_count(), 3);
        // Only the last chunk stays mutable
        assert!(!table.get_chunk(0).unwrap().is_mutable());
        assert!(!table.get_chunk(1).unwrap().is_mutable());
        assert!(table.get_chunk(2).unwrap().is_mutable());
    }

    #[test]
    fn test_append_chunk_seals_previous() {
        let table = small_table(100);
        table.append(&[Value::Int32(1), Value::Null]).unwrap();
        assert!(table.get_chunk(0).unwrap().is_mutable());

        let mut seg_a = Segment::new_value_segment(DataType::Int32, false);
        seg_a.append(&Value::Int32(2)).unwrap();
        let mut seg_b = Segment::new_value_segment(DataType::Text, true);
        seg_b.append(&Value::text("x")).unwrap();
        table
            .append_chunk(vec![Arc::new(seg_a), Arc::new(seg_b)], None)
            .unwrap();

        assert!(!table.get_chunk(0).unwrap().is_mutable());
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_schema_checks() {
        let table = small_table(10);
        assert!(table.append(&[Value::Int32(1)]).is_err());
        assert!(table
            .append(&[Value::Null, Value::text("x")])
            .is_err());
        assert!(table
            .append(&[Value::text("wrong"), Value::Null])
            .is_err());
        assert_eq!(table.column_id_by_name("b").unwrap(), 1);
        assert!(table.column_id_by_name("zz").is_err());
    }

    #[test]
    fn test_references_table_invariants() {
        let data = Arc::new(small_table(10));
        data.append(&[Value::Int32(1), Value::text("x")]).unwrap();

        let refs = Table::new(
            int_text_defs(),
            TableType::References,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::No,
        );

        let pos_list: Arc<PosList> = Arc::new(vec![RowId::new(0, 0)]);
        let seg_a = Arc::new(Segment::Reference(ReferenceSegment::new(
            Arc::clone(&data),
            0,
            Arc::clone(&pos_list),
        )));
        let seg_b = Arc::new(Segment::Reference(ReferenceSegment::new(
            Arc::clone(&data),
            1,
            Arc::clone(&pos_list),
        )));
        refs.append_chunk(vec![seg_a, seg_b], None).unwrap();
        assert_eq!(refs.row_count(), 1);

        // A chunk whose position lists do not align row-wise is rejected
        let misaligned: Arc<PosList> = Arc::new(vec![RowId::new(0, 0), RowId::new(0, 0)]);
        let seg_c = Arc::new(Segment::Reference(ReferenceSegment::new(
            Arc::clone(&data),
            0,
            Arc::clone(&pos_list),
        )));
        let seg_d = Arc::new(Segment::Reference(ReferenceSegment::new(
            Arc::clone(&data),
            1,
            misaligned,
        )));
        assert!(refs.append_chunk(vec![seg_c, seg_d], None).is_err());

        // Data tables reject reference segments
        let data2 = small_table(10);
        let seg_e = Arc::new(Segment::Reference(ReferenceSegment::new(
            Arc::clone(&data),
            0,
            Arc::clone(&pos_list),
        )));
        let seg_f = Arc::new(Segment::Reference(ReferenceSegment::new(
            data,
            1,
            pos_list,
        )));
        assert!(data2.append_chunk(vec![seg_e, seg_f], None).is_err());
    }

    #[test]
    fn test_value_at_resolves_through_reference() {
        let data = Arc::new(small_table(10));
        data.append(&[Value::Int32(7), Value::text("seven")]).unwrap();

        let pos_list: Arc<PosList> = Arc::new(vec![RowId::new(0, 0)]);
        let reference = ReferenceSegment::new(Arc::clone(&data), 1, pos_list);
        assert_eq!(reference.value_at(0), Value::text("seven"));
    }

    #[test]
    fn test_load_table_and_encode() {
        let rows: Vec<Vec<Value>> = (0..10)
            .map(|i| vec![Value::Int32(i % 3), Value::text("t")])
            .collect();
        let table = load_table(int_text_defs(), &rows, 4).unwrap();
        assert_eq!(table.row_count(), 10);
        assert_eq!(table.chunk_count(), 3);

        table.encode_all_chunks();
        let chunk = table.get_chunk(0).unwrap();
        assert_eq!(chunk.get_segment(0).unique_values_count(), Some(3));
        assert_eq!(table.materialize_rows().len(), 10);
    }
}
