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

//! Dictionary-encoded segments
//!
//! A [`DictionarySegment`] replaces a sealed value segment with a sorted,
//! deduplicated dictionary plus a width-compressed attribute vector of
//! dictionary indices. NULL is encoded as the distinguished value id
//! `dictionary.len()`, so every attribute-vector entry lies in
//! `[0, dictionary.len()]`.
//!
//! [`FixedStringDictionarySegment`] is the text specialization whose
//! dictionary lives in a packed fixed-width buffer; it is chosen when every
//! string of the input fits a bounded length.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::core::{Value, ValueId};

use super::compressed_vector::CompressedVector;
use super::fixed_string::FixedStringVector;
use super::value_segment::{NativeType, ValueSegment};

/// Value id returned by lookups for values above the dictionary range
pub const INVALID_VALUE_ID: ValueId = ValueId::MAX;

/// A dictionary-compressed, immutable segment
#[derive(Debug, Clone)]
pub struct DictionarySegment<T: NativeType> {
    dictionary: Arc<Vec<T>>,
    attribute_vector: CompressedVector,
    null_value_id: ValueId,
}

impl<T: NativeType> DictionarySegment<T> {
    /// Encode a value segment.
    ///
    /// Builds the dictionary from all non-null positions, sorts and
    /// deduplicates it, then writes one attribute-vector entry per input row:
    /// the binary-search index for non-null rows, `null_value_id` for null
    /// rows. The attribute vector width is sized for `dictionary.len() + 1`.
    pub fn encode(segment: &ValueSegment<T>) -> Self {
        let mut dictionary: Vec<T> = match segment.null_flags() {
            Some(nulls) => segment
                .values()
                .iter()
                .zip(nulls)
                .filter(|(_, &is_null)| !is_null)
                .map(|(v, _)| v.clone())
                .collect(),
            None => segment.values().to_vec(),
        };

        dictionary.sort_by(|a, b| a.compare(b));
        dictionary.dedup_by(|a, b| a.compare(b) == Ordering::Equal);
        dictionary.shrink_to_fit();

        let null_value_id = dictionary.len() as ValueId;
        let max_value = dictionary.len() as u32 + 1;
        let mut attribute_vector = CompressedVector::with_capacity(max_value, segment.len());

        for offset in 0..segment.len() {
            match segment.get(offset) {
                Some(value) => {
                    let value_id = dictionary
                        .binary_search_by(|probe| probe.compare(value))
                        .expect("encoded value missing from dictionary")
                        as u32;
                    attribute_vector.push(value_id);
                }
                None => attribute_vector.push(null_value_id),
            }
        }

        Self {
            dictionary: Arc::new(dictionary),
            attribute_vector,
            null_value_id,
        }
    }

    /// Number of rows in this segment
    pub fn len(&self) -> usize {
        self.attribute_vector.len()
    }

    /// Returns true if the segment holds no rows
    pub fn is_empty(&self) -> bool {
        self.attribute_vector.is_empty()
    }

    /// The sorted, unique dictionary
    pub fn dictionary(&self) -> &[T] {
        &self.dictionary
    }

    /// The compressed attribute vector
    pub fn attribute_vector(&self) -> &CompressedVector {
        &self.attribute_vector
    }

    /// The value id that encodes NULL (`dictionary.len()`)
    pub fn null_value_id(&self) -> ValueId {
        self.null_value_id
    }

    /// Number of distinct non-null values
    pub fn unique_values_count(&self) -> usize {
        self.dictionary.len()
    }

    /// The attribute-vector entry for a row
    pub fn value_id_at(&self, offset: usize) -> ValueId {
        self.attribute_vector.get(offset)
    }

    /// Returns true if the row at `offset` is NULL
    pub fn is_null_at(&self, offset: usize) -> bool {
        self.value_id_at(offset) == self.null_value_id
    }

    /// Dictionary lookup; None for the null id
    pub fn value_of_value_id(&self, value_id: ValueId) -> Option<&T> {
        self.dictionary.get(value_id as usize)
    }

    /// Typed access; None for NULL rows
    pub fn get(&self, offset: usize) -> Option<&T> {
        self.value_of_value_id(self.value_id_at(offset))
    }

    /// Boundary-value access
    pub fn value_at(&self, offset: usize) -> Value {
        match self.get(offset) {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    /// Id of the first dictionary entry >= `value`, or [`INVALID_VALUE_ID`]
    /// if every entry is smaller
    pub fn lower_bound(&self, value: &T) -> ValueId {
        match self
            .dictionary
            .binary_search_by(|probe| probe.compare(value))
        {
            Ok(index) => index as ValueId,
            Err(index) if index < self.dictionary.len() => index as ValueId,
            Err(_) => INVALID_VALUE_ID,
        }
    }

    /// Id of the first dictionary entry > `value`, or [`INVALID_VALUE_ID`]
    pub fn upper_bound(&self, value: &T) -> ValueId {
        let index = self
            .dictionary
            .partition_point(|probe| probe.compare(value) != Ordering::Greater);
        if index < self.dictionary.len() {
            index as ValueId
        } else {
            INVALID_VALUE_ID
        }
    }
}

/// Dictionary segment for text with a packed fixed-width dictionary
#[derive(Debug, Clone)]
pub struct FixedStringDictionarySegment {
    dictionary: Arc<FixedStringVector>,
    attribute_vector: CompressedVector,
    null_value_id: ValueId,
}

impl FixedStringDictionarySegment {
    /// Encode a text value segment into a fixed-width dictionary segment.
    ///
    /// The dictionary stride is the longest observed string; every stored
    /// string is right-padded to it, while lookups and equality always see
    /// the original, unpadded string.
    pub fn encode(segment: &ValueSegment<Arc<str>>) -> Self {
        let mut distinct: Vec<&str> = (0..segment.len())
            .filter_map(|offset| segment.get(offset).map(|s| s.as_ref()))
            .collect();
        distinct.sort_unstable();
        distinct.dedup();

        let string_length = distinct.iter().map(|s| s.len()).max().unwrap_or(0);
        let dictionary = FixedStringVector::from_strings(distinct.iter().copied(), string_length);

        let null_value_id = dictionary.len() as ValueId;
        let max_value = dictionary.len() as u32 + 1;
        let mut attribute_vector = CompressedVector::with_capacity(max_value, segment.len());

        for offset in 0..segment.len() {
            match segment.get(offset) {
                Some(value) => {
                    let value_id = distinct
                        .binary_search(&value.as_ref())
                        .expect("encoded string missing from dictionary")
                        as u32;
                    attribute_vector.push(value_id);
                }
                None => attribute_vector.push(null_value_id),
            }
        }

        Self {
            dictionary: Arc::new(dictionary),
            attribute_vector,
            null_value_id,
        }
    }

    /// Number of rows in this segment
    pub fn len(&self) -> usize {
        self.attribute_vector.len()
    }

    /// Returns true if the segment holds no rows
    pub fn is_empty(&self) -> bool {
        self.attribute_vector.is_empty()
    }

    /// The packed dictionary
    pub fn dictionary(&self) -> &FixedStringVector {
        &self.dictionary
    }

    /// The value id that encodes NULL
    pub fn null_value_id(&self) -> ValueId {
        self.null_value_id
    }

    /// Number of distinct non-null strings
    pub fn unique_values_count(&self) -> usize {
        self.dictionary.len()
    }

    /// The attribute-vector entry for a row
    pub fn value_id_at(&self, offset: usize) -> ValueId {
        self.attribute_vector.get(offset)
    }

    /// Returns true if the row at `offset` is NULL
    pub fn is_null_at(&self, offset: usize) -> bool {
        self.value_id_at(offset) == self.null_value_id
    }

    /// Unpadded string access; None for NULL rows
    pub fn get(&self, offset: usize) -> Option<&str> {
        let value_id = self.value_id_at(offset);
        if value_id == self.null_value_id {
            None
        } else {
            Some(self.dictionary.get(value_id as usize))
        }
    }

    /// Boundary-value access
    pub fn value_at(&self, offset: usize) -> Value {
        match self.get(offset) {
            Some(s) => Value::text(s),
            None => Value::Null,
        }
    }

    /// Id of the first dictionary entry >= `value`, or [`INVALID_VALUE_ID`]
    pub fn lower_bound(&self, value: &str) -> ValueId {
        let index = self.dictionary.lower_bound(value);
        if index < self.dictionary.len() {
            index as ValueId
        } else {
            INVALID_VALUE_ID
        }
    }
}
