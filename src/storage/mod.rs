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

//! Columnar storage layer
//!
//! Chunked tables built from immutable-after-seal segments:
//!
//! - [`ValueSegment`] - dense values plus null flags, mutable until sealed
//! - [`DictionarySegment`] / [`FixedStringDictionarySegment`] - sorted
//!   dictionary plus width-compressed attribute vector
//! - [`ReferenceSegment`] - position list over a data table
//! - [`Chunk`] / [`Table`] - the horizontal partitioning on top
//! - [`MvccData`] - per-chunk `(begin_cid, end_cid, tid)` visibility rows
//! - [`Catalog`] - the engine-owned name registry

pub mod catalog;
pub mod chunk;
pub mod compressed_vector;
pub mod dictionary_segment;
pub mod fixed_string;
pub mod mvcc;
pub mod reference_segment;
pub mod segment;
pub mod table;
pub mod value_segment;

pub use catalog::Catalog;
pub use chunk::{Chunk, ChunkStatistics};
pub use compressed_vector::CompressedVector;
pub use dictionary_segment::{
    DictionarySegment, FixedStringDictionarySegment, INVALID_VALUE_ID,
};
pub use fixed_string::FixedStringVector;
pub use mvcc::{MvccData, MvccVectors};
pub use reference_segment::{PosList, ReferenceSegment};
pub use segment::{Segment, SegmentEncoding, FIXED_STRING_LENGTH_LIMIT};
pub use table::{
    load_table, ColumnDefinition, Table, TableType, UseMvcc, DEFAULT_CHUNK_SIZE,
};
pub use value_segment::{NativeType, ValueSegment};
