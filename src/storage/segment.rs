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

//! The tagged segment variant and its iteration dispatcher
//!
//! [`Segment`] closes the cross product of (encoding, scalar type) into one
//! enum. Operators never match on it directly; they call
//! [`Segment::for_each_position`], which resolves the encoding and the data
//! type in a single `match` and then drives a tight, variant-monomorphic
//! loop that hands `(value, is_null, chunk_offset)` to the caller.

use std::sync::Arc;

use crate::core::{ChunkOffset, DataType, Error, Result, Value};

use super::dictionary_segment::{DictionarySegment, FixedStringDictionarySegment};
use super::reference_segment::ReferenceSegment;
use super::value_segment::ValueSegment;

/// Text columns whose longest string stays at or below this byte length are
/// dictionary-encoded into the packed fixed-width buffer.
pub const FIXED_STRING_LENGTH_LIMIT: usize = 32;

/// Segment encoding tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentEncoding {
    Value,
    Dictionary,
    FixedStringDictionary,
    Reference,
}

/// One column slice of one chunk, in any encoding
#[derive(Debug, Clone)]
pub enum Segment {
    ValueInt32(ValueSegment<i32>),
    ValueInt64(ValueSegment<i64>),
    ValueFloat32(ValueSegment<f32>),
    ValueFloat64(ValueSegment<f64>),
    ValueText(ValueSegment<Arc<str>>),
    ValueBoolean(ValueSegment<bool>),
    DictionaryInt32(DictionarySegment<i32>),
    DictionaryInt64(DictionarySegment<i64>),
    DictionaryFloat32(DictionarySegment<f32>),
    DictionaryFloat64(DictionarySegment<f64>),
    DictionaryText(DictionarySegment<Arc<str>>),
    DictionaryBoolean(DictionarySegment<bool>),
    FixedStringDictionary(FixedStringDictionarySegment),
    Reference(ReferenceSegment),
}

/// Dispatch over every non-reference variant with a uniform body
macro_rules! dispatch_stored {
    ($self:expr, $seg:ident => $body:expr, $reference:ident => $ref_body:expr) => {
        match $self {
            Segment::ValueInt32($seg) => $body,
            Segment::ValueInt64($seg) => $body,
            Segment::ValueFloat32($seg) => $body,
            Segment::ValueFloat64($seg) => $body,
            Segment::ValueText($seg) => $body,
            Segment::ValueBoolean($seg) => $body,
            Segment::DictionaryInt32($seg) => $body,
            Segment::DictionaryInt64($seg) => $body,
            Segment::DictionaryFloat32($seg) => $body,
            Segment::DictionaryFloat64($seg) => $body,
            Segment::DictionaryText($seg) => $body,
            Segment::DictionaryBoolean($seg) => $body,
            Segment::FixedStringDictionary($seg) => $body,
            Segment::Reference($reference) => $ref_body,
        }
    };
}

impl Segment {
    /// Create an empty, mutable value segment for the given column type
    pub fn new_value_segment(data_type: DataType, nullable: bool) -> Segment {
        match data_type {
            DataType::Int32 => Segment::ValueInt32(ValueSegment::new(nullable)),
            DataType::Int64 => Segment::ValueInt64(ValueSegment::new(nullable)),
            DataType::Float32 => Segment::ValueFloat32(ValueSegment::new(nullable)),
            DataType::Float64 => Segment::ValueFloat64(ValueSegment::new(nullable)),
            DataType::Text => Segment::ValueText(ValueSegment::new(nullable)),
            DataType::Boolean => Segment::ValueBoolean(ValueSegment::new(nullable)),
        }
    }

    /// Number of rows in this segment
    pub fn len(&self) -> usize {
        dispatch_stored!(self, seg => seg.len(), reference => reference.len())
    }

    /// Returns true if the segment holds no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The encoding of this segment
    pub fn encoding(&self) -> SegmentEncoding {
        match self {
            Segment::ValueInt32(_)
            | Segment::ValueInt64(_)
            | Segment::ValueFloat32(_)
            | Segment::ValueFloat64(_)
            | Segment::ValueText(_)
            | Segment::ValueBoolean(_) => SegmentEncoding::Value,
            Segment::DictionaryInt32(_)
            | Segment::DictionaryInt64(_)
            | Segment::DictionaryFloat32(_)
            | Segment::DictionaryFloat64(_)
            | Segment::DictionaryText(_)
            | Segment::DictionaryBoolean(_) => SegmentEncoding::Dictionary,
            Segment::FixedStringDictionary(_) => SegmentEncoding::FixedStringDictionary,
            Segment::Reference(_) => SegmentEncoding::Reference,
        }
    }

    /// The scalar type this segment stores (resolved through the referenced
    /// table for reference segments)
    pub fn data_type(&self) -> DataType {
        match self {
            Segment::ValueInt32(_) | Segment::DictionaryInt32(_) => DataType::Int32,
            Segment::ValueInt64(_) | Segment::DictionaryInt64(_) => DataType::Int64,
            Segment::ValueFloat32(_) | Segment::DictionaryFloat32(_) => DataType::Float32,
            Segment::ValueFloat64(_) | Segment::DictionaryFloat64(_) => DataType::Float64,
            Segment::ValueText(_)
            | Segment::DictionaryText(_)
            | Segment::FixedStringDictionary(_) => DataType::Text,
            Segment::ValueBoolean(_) | Segment::DictionaryBoolean(_) => DataType::Boolean,
            Segment::Reference(reference) => reference
                .referenced_table()
                .column_data_type(reference.referenced_column()),
        }
    }

    /// Random access by offset
    pub fn value_at(&self, offset: usize) -> Value {
        dispatch_stored!(self, seg => seg.value_at(offset), reference => reference.value_at(offset))
    }

    /// Returns true if the row at `offset` is NULL
    pub fn is_null_at(&self, offset: usize) -> bool {
        dispatch_stored!(self, seg => seg.is_null_at(offset), reference => reference.is_null_at(offset))
    }

    /// Iterate all positions as `(value, is_null, chunk_offset)`.
    ///
    /// This is the dispatcher operators go through: encoding and data type
    /// are resolved once, after which each variant runs its own tight loop.
    /// Reference segments resolve every row id through the referenced
    /// column; `NULL_ROW_ID` entries surface as `(Null, true, offset)`.
    pub fn for_each_position<F>(&self, f: &mut F)
    where
        F: FnMut(Value, bool, ChunkOffset),
    {
        match self {
            Segment::Reference(reference) => {
                for (offset, _) in reference.pos_list().iter().enumerate() {
                    let value = reference.value_at(offset);
                    let is_null = value.is_null();
                    f(value, is_null, offset as ChunkOffset);
                }
            }
            _ => {
                dispatch_stored!(self, seg => {
                    for offset in 0..seg.len() {
                        let value = seg.value_at(offset);
                        let is_null = value.is_null();
                        f(value, is_null, offset as ChunkOffset);
                    }
                }, _reference => unreachable!("reference handled above"))
            }
        }
    }

    /// Materialize all positions into a vector (scratch buffer for join
    /// kernels that loop over one side repeatedly)
    pub fn materialize(&self) -> Vec<(Value, bool)> {
        let mut out = Vec::with_capacity(self.len());
        self.for_each_position(&mut |value, is_null, _| out.push((value, is_null)));
        out
    }

    /// Returns true if rows can still be appended (value encoding only)
    pub fn is_mutable(&self) -> bool {
        self.encoding() == SegmentEncoding::Value
    }

    /// Append a boundary value to a mutable segment
    pub fn append(&mut self, value: &Value) -> Result<()> {
        match self {
            Segment::ValueInt32(seg) => seg.append(value),
            Segment::ValueInt64(seg) => seg.append(value),
            Segment::ValueFloat32(seg) => seg.append(value),
            Segment::ValueFloat64(seg) => seg.append(value),
            Segment::ValueText(seg) => seg.append(value),
            Segment::ValueBoolean(seg) => seg.append(value),
            _ => Err(Error::unsupported(
                "append on a sealed (non-value) segment",
            )),
        }
    }

    /// Distinct non-null value count, known exactly for dictionary encodings
    pub fn unique_values_count(&self) -> Option<usize> {
        match self {
            Segment::DictionaryInt32(seg) => Some(seg.unique_values_count()),
            Segment::DictionaryInt64(seg) => Some(seg.unique_values_count()),
            Segment::DictionaryFloat32(seg) => Some(seg.unique_values_count()),
            Segment::DictionaryFloat64(seg) => Some(seg.unique_values_count()),
            Segment::DictionaryText(seg) => Some(seg.unique_values_count()),
            Segment::DictionaryBoolean(seg) => Some(seg.unique_values_count()),
            Segment::FixedStringDictionary(seg) => Some(seg.unique_values_count()),
            _ => None,
        }
    }

    /// Dictionary-encode a value segment; non-value segments pass through
    /// unchanged.
    ///
    /// Text segments whose longest string fits
    /// [`FIXED_STRING_LENGTH_LIMIT`] (and which contain no NUL bytes) use
    /// the packed fixed-width dictionary.
    pub fn dictionary_encode(&self) -> Segment {
        match self {
            Segment::ValueInt32(seg) => Segment::DictionaryInt32(DictionarySegment::encode(seg)),
            Segment::ValueInt64(seg) => Segment::DictionaryInt64(DictionarySegment::encode(seg)),
            Segment::ValueFloat32(seg) => {
                Segment::DictionaryFloat32(DictionarySegment::encode(seg))
            }
            Segment::ValueFloat64(seg) => {
                Segment::DictionaryFloat64(DictionarySegment::encode(seg))
            }
            Segment::ValueBoolean(seg) => {
                Segment::DictionaryBoolean(DictionarySegment::encode(seg))
            }
            Segment::ValueText(seg) => {
                let fits_fixed = seg.values().iter().all(|s| {
                    s.len() <= FIXED_STRING_LENGTH_LIMIT && !s.as_bytes().contains(&0)
                });
                if fits_fixed {
                    Segment::FixedStringDictionary(FixedStringDictionarySegment::encode(seg))
                } else {
                    Segment::DictionaryText(DictionarySegment::encode(seg))
                }
            }
            other => other.clone(),
        }
    }
}
