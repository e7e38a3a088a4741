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

//! Uncompressed value segments
//!
//! A [`ValueSegment`] stores one column of one chunk as a dense vector of
//! native values plus, for nullable columns, a parallel null-flag vector.
//! Value segments are the only mutable segment variant; they accept appends
//! until their chunk is sealed, after which the chunk encoder may replace
//! them with dictionary segments.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::core::{DataType, Error, Result, Value};

/// Scalar types that can back a typed segment.
///
/// The closed set mirrors [`DataType`]: i32, i64, f32, f64, `Arc<str>`, bool.
pub trait NativeType: Clone + Send + Sync + 'static {
    /// The engine data type this native type stores
    const DATA_TYPE: DataType;

    /// Wrap a native value into the boundary-crossing [`Value`]
    fn to_value(&self) -> Value;

    /// Unwrap a [`Value`] of the matching type; None for NULL or mismatch
    fn from_value(value: &Value) -> Option<Self>;

    /// Placeholder stored at NULL positions of the dense value vector
    fn default_value() -> Self;

    /// Total order used for dictionary sorting and range checks.
    ///
    /// Floats order via IEEE-754 `total_cmp` so NaN has a defined position.
    fn compare(&self, other: &Self) -> Ordering;
}

impl NativeType for i32 {
    const DATA_TYPE: DataType = DataType::Int32;

    fn to_value(&self) -> Value {
        Value::Int32(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int32()
    }

    fn default_value() -> Self {
        0
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl NativeType for i64 {
    const DATA_TYPE: DataType = DataType::Int64;

    fn to_value(&self) -> Value {
        Value::Int64(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    fn default_value() -> Self {
        0
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl NativeType for f32 {
    const DATA_TYPE: DataType = DataType::Float32;

    fn to_value(&self) -> Value {
        Value::Float32(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float32(v) => Some(*v),
            _ => None,
        }
    }

    fn default_value() -> Self {
        0.0
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl NativeType for f64 {
    const DATA_TYPE: DataType = DataType::Float64;

    fn to_value(&self) -> Value {
        Value::Float64(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    fn default_value() -> Self {
        0.0
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl NativeType for Arc<str> {
    const DATA_TYPE: DataType = DataType::Text;

    fn to_value(&self) -> Value {
        Value::Text(Arc::clone(self))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(Arc::clone(s)),
            _ => None,
        }
    }

    fn default_value() -> Self {
        Arc::from("")
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.as_ref().cmp(other.as_ref())
    }
}

impl NativeType for bool {
    const DATA_TYPE: DataType = DataType::Boolean;

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_boolean()
    }

    fn default_value() -> Self {
        false
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

/// A dense, optionally nullable column slice
#[derive(Debug, Clone)]
pub struct ValueSegment<T: NativeType> {
    values: Vec<T>,
    /// Parallel null flags; None for non-nullable columns
    nulls: Option<Vec<bool>>,
}

impl<T: NativeType> ValueSegment<T> {
    /// Create an empty segment
    pub fn new(nullable: bool) -> Self {
        Self {
            values: Vec::new(),
            nulls: nullable.then(Vec::new),
        }
    }

    /// Create a segment from a value vector (non-nullable)
    pub fn from_values(values: Vec<T>) -> Self {
        Self {
            values,
            nulls: None,
        }
    }

    /// Create a nullable segment from values and parallel null flags
    pub fn from_nullable(values: Vec<T>, nulls: Vec<bool>) -> Self {
        assert_eq!(values.len(), nulls.len(), "null vector must be parallel");
        Self {
            values,
            nulls: Some(nulls),
        }
    }

    /// Append a boundary value, NULL included for nullable segments
    pub fn append(&mut self, value: &Value) -> Result<()> {
        if value.is_null() {
            match &mut self.nulls {
                Some(nulls) => {
                    self.values.push(T::default_value());
                    nulls.push(true);
                    Ok(())
                }
                None => Err(Error::NullNotAllowed(String::new())),
            }
        } else {
            let native = T::from_value(value).ok_or_else(|| Error::TypeMismatch {
                column: String::new(),
                expected: T::DATA_TYPE.to_string(),
                got: value
                    .data_type()
                    .map(|dt| dt.to_string())
                    .unwrap_or_else(|| "NULL".into()),
            })?;
            self.values.push(native);
            if let Some(nulls) = &mut self.nulls {
                nulls.push(false);
            }
            Ok(())
        }
    }
}

impl<T: NativeType> ValueSegment<T> {
    /// Number of rows in this segment
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the segment holds no rows
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true if the segment tracks null flags
    pub fn is_nullable(&self) -> bool {
        self.nulls.is_some()
    }

    /// The raw value vector (null positions hold unspecified defaults)
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// The parallel null flags, if nullable
    pub fn null_flags(&self) -> Option<&[bool]> {
        self.nulls.as_deref()
    }

    /// Returns true if the row at `offset` is NULL
    pub fn is_null_at(&self, offset: usize) -> bool {
        self.nulls.as_ref().map_or(false, |n| n[offset])
    }

    /// Typed access; None for NULL rows
    pub fn get(&self, offset: usize) -> Option<&T> {
        if self.is_null_at(offset) {
            None
        } else {
            Some(&self.values[offset])
        }
    }

    /// Boundary-value access
    pub fn value_at(&self, offset: usize) -> Value {
        match self.get(offset) {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}
