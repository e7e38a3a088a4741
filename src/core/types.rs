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

//! Core type definitions for StrataDB
//!
//! This module defines the fundamental types: DataType, PredicateCondition,
//! JoinMode, and the identifier newtypes used across the storage and
//! execution layers.

use std::fmt;
use std::str::FromStr;

use super::error::Error;

/// Scalar data types supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    /// 32-bit signed integer
    Int32 = 0,

    /// 64-bit signed integer
    Int64 = 1,

    /// 32-bit floating point number
    Float32 = 2,

    /// 64-bit floating point number
    Float64 = 3,

    /// UTF-8 text string
    Text = 4,

    /// Boolean true/false
    Boolean = 5,
}

impl DataType {
    /// Returns true if this type is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int32 | DataType::Int64 | DataType::Float32 | DataType::Float64
        )
    }

    /// Returns true if this type is floating point
    pub fn is_floating_point(&self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Returns the type ID as u8
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Create DataType from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DataType::Int32),
            1 => Some(DataType::Int64),
            2 => Some(DataType::Float32),
            3 => Some(DataType::Float64),
            4 => Some(DataType::Text),
            5 => Some(DataType::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int32 => write!(f, "INT32"),
            DataType::Int64 => write!(f, "INT64"),
            DataType::Float32 => write!(f, "FLOAT32"),
            DataType::Float64 => write!(f, "FLOAT64"),
            DataType::Text => write!(f, "TEXT"),
            DataType::Boolean => write!(f, "BOOLEAN"),
        }
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INT32" | "INT" | "INTEGER" => Ok(DataType::Int32),
            "INT64" | "BIGINT" | "LONG" => Ok(DataType::Int64),
            "FLOAT32" | "FLOAT" | "REAL" => Ok(DataType::Float32),
            "FLOAT64" | "DOUBLE" => Ok(DataType::Float64),
            "TEXT" | "STRING" | "VARCHAR" => Ok(DataType::Text),
            "BOOLEAN" | "BOOL" => Ok(DataType::Boolean),
            _ => Err(Error::invalid_input(format!("unknown data type: {}", s))),
        }
    }
}

/// Predicate conditions for scans, joins, and histogram queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PredicateCondition {
    /// Equality (=)
    Equals = 0,

    /// Inequality (!=)
    NotEquals = 1,

    /// Less than (<)
    LessThan = 2,

    /// Less than or equal (<=)
    LessThanEquals = 3,

    /// Greater than (>)
    GreaterThan = 4,

    /// Greater than or equal (>=)
    GreaterThanEquals = 5,

    /// Pattern matching (LIKE)
    Like = 6,

    /// Negated pattern matching (NOT LIKE)
    NotLike = 7,

    /// Closed range (BETWEEN low AND high)
    Between = 8,
}

impl PredicateCondition {
    /// Returns the negation of this condition
    pub fn negate(&self) -> Option<Self> {
        match self {
            PredicateCondition::Equals => Some(PredicateCondition::NotEquals),
            PredicateCondition::NotEquals => Some(PredicateCondition::Equals),
            PredicateCondition::LessThan => Some(PredicateCondition::GreaterThanEquals),
            PredicateCondition::LessThanEquals => Some(PredicateCondition::GreaterThan),
            PredicateCondition::GreaterThan => Some(PredicateCondition::LessThanEquals),
            PredicateCondition::GreaterThanEquals => Some(PredicateCondition::LessThan),
            PredicateCondition::Like => Some(PredicateCondition::NotLike),
            PredicateCondition::NotLike => Some(PredicateCondition::Like),
            PredicateCondition::Between => None,
        }
    }

    /// Returns the condition with its operand sides flipped (a op b -> b op' a)
    pub fn flip(&self) -> Option<Self> {
        match self {
            PredicateCondition::Equals => Some(PredicateCondition::Equals),
            PredicateCondition::NotEquals => Some(PredicateCondition::NotEquals),
            PredicateCondition::LessThan => Some(PredicateCondition::GreaterThan),
            PredicateCondition::LessThanEquals => Some(PredicateCondition::GreaterThanEquals),
            PredicateCondition::GreaterThan => Some(PredicateCondition::LessThan),
            PredicateCondition::GreaterThanEquals => Some(PredicateCondition::LessThanEquals),
            PredicateCondition::Like | PredicateCondition::NotLike | PredicateCondition::Between => {
                None
            }
        }
    }

    /// Returns true for LIKE / NOT LIKE
    pub fn is_pattern(&self) -> bool {
        matches!(self, PredicateCondition::Like | PredicateCondition::NotLike)
    }
}

impl fmt::Display for PredicateCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateCondition::Equals => write!(f, "="),
            PredicateCondition::NotEquals => write!(f, "!="),
            PredicateCondition::LessThan => write!(f, "<"),
            PredicateCondition::LessThanEquals => write!(f, "<="),
            PredicateCondition::GreaterThan => write!(f, ">"),
            PredicateCondition::GreaterThanEquals => write!(f, ">="),
            PredicateCondition::Like => write!(f, "LIKE"),
            PredicateCondition::NotLike => write!(f, "NOT LIKE"),
            PredicateCondition::Between => write!(f, "BETWEEN"),
        }
    }
}

impl FromStr for PredicateCondition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "=" | "==" => Ok(PredicateCondition::Equals),
            "!=" | "<>" => Ok(PredicateCondition::NotEquals),
            "<" => Ok(PredicateCondition::LessThan),
            "<=" => Ok(PredicateCondition::LessThanEquals),
            ">" => Ok(PredicateCondition::GreaterThan),
            ">=" => Ok(PredicateCondition::GreaterThanEquals),
            "LIKE" => Ok(PredicateCondition::Like),
            "NOT LIKE" | "NOTLIKE" => Ok(PredicateCondition::NotLike),
            "BETWEEN" => Ok(PredicateCondition::Between),
            _ => Err(Error::invalid_input(format!("unknown condition: {}", s))),
        }
    }
}

/// Join modes supported by the join operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinMode {
    /// Matching rows only
    Inner,
    /// All left rows, right side null-extended on mismatch
    Left,
    /// All right rows, left side null-extended on mismatch
    Right,
    /// Full outer: all rows from both sides
    Outer,
    /// Cartesian product, no predicate
    Cross,
    /// Left rows with at least one match, left columns only
    Semi,
    /// Left rows with no match, left columns only
    Anti,
}

impl JoinMode {
    /// Returns true if unmatched left rows survive with null extension
    pub fn left_is_outer(&self) -> bool {
        matches!(self, JoinMode::Left | JoinMode::Outer)
    }

    /// Returns true if unmatched right rows survive with null extension
    pub fn right_is_outer(&self) -> bool {
        matches!(self, JoinMode::Right | JoinMode::Outer)
    }

    /// Returns true if the output carries only the left input's columns
    pub fn emits_left_only(&self) -> bool {
        matches!(self, JoinMode::Semi | JoinMode::Anti)
    }
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinMode::Inner => write!(f, "INNER"),
            JoinMode::Left => write!(f, "LEFT"),
            JoinMode::Right => write!(f, "RIGHT"),
            JoinMode::Outer => write!(f, "FULL OUTER"),
            JoinMode::Cross => write!(f, "CROSS"),
            JoinMode::Semi => write!(f, "SEMI"),
            JoinMode::Anti => write!(f, "ANTI"),
        }
    }
}

// =============================================================================
// Identifier newtypes
// =============================================================================

/// Index of a chunk within a table
pub type ChunkId = u32;

/// Offset of a row within a chunk
pub type ChunkOffset = u32;

/// Index of a column within a table or chunk
pub type ColumnId = u16;

/// Index into a dictionary segment's dictionary
pub type ValueId = u32;

/// Transaction identifier
pub type TransactionId = u32;

/// Commit identifier; also used as snapshot id
pub type CommitId = u32;

/// Commit id sentinel meaning "not yet committed" / "+infinity"
pub const MAX_COMMIT_ID: CommitId = CommitId::MAX;

/// Transaction id sentinel meaning "no transaction holds this row"
pub const INVALID_TRANSACTION_ID: TransactionId = 0;

/// Chunk offset sentinel reserved for NULL row references
pub const INVALID_CHUNK_OFFSET: ChunkOffset = ChunkOffset::MAX;

/// Reference to a single row: chunk plus offset within the chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId {
    pub chunk_id: ChunkId,
    pub chunk_offset: ChunkOffset,
}

/// Sentinel row id distinguishable from any valid row; used for the
/// null-extended side of outer joins
pub const NULL_ROW_ID: RowId = RowId {
    chunk_id: ChunkId::MAX,
    chunk_offset: INVALID_CHUNK_OFFSET,
};

impl RowId {
    /// Create a new row id
    pub fn new(chunk_id: ChunkId, chunk_offset: ChunkOffset) -> Self {
        Self {
            chunk_id,
            chunk_offset,
        }
    }

    /// Returns true if this is the NULL sentinel
    pub fn is_null(&self) -> bool {
        self.chunk_offset == INVALID_CHUNK_OFFSET
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "RowId(NULL)")
        } else {
            write!(f, "RowId({}, {})", self.chunk_id, self.chunk_offset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // DataType tests
    // =========================================================================

    #[test]
    fn test_datatype_display_roundtrip() {
        for dt in [
            DataType::Int32,
            DataType::Int64,
            DataType::Float32,
            DataType::Float64,
            DataType::Text,
            DataType::Boolean,
        ] {
            assert_eq!(dt.to_string().parse::<DataType>().unwrap(), dt);
        }
        assert!("UNKNOWN".parse::<DataType>().is_err());
    }

    #[test]
    fn test_datatype_is_numeric() {
        assert!(DataType::Int32.is_numeric());
        assert!(DataType::Float64.is_numeric());
        assert!(!DataType::Text.is_numeric());
        assert!(!DataType::Boolean.is_numeric());
    }

    #[test]
    fn test_datatype_u8_conversion() {
        for (i, dt) in [
            DataType::Int32,
            DataType::Int64,
            DataType::Float32,
            DataType::Float64,
            DataType::Text,
            DataType::Boolean,
        ]
        .iter()
        .enumerate()
        {
            assert_eq!(dt.as_u8(), i as u8);
            assert_eq!(DataType::from_u8(i as u8), Some(*dt));
        }
        assert_eq!(DataType::from_u8(100), None);
    }

    // =========================================================================
    // PredicateCondition tests
    // =========================================================================

    #[test]
    fn test_condition_negate() {
        assert_eq!(
            PredicateCondition::Equals.negate(),
            Some(PredicateCondition::NotEquals)
        );
        assert_eq!(
            PredicateCondition::LessThan.negate(),
            Some(PredicateCondition::GreaterThanEquals)
        );
        assert_eq!(
            PredicateCondition::Like.negate(),
            Some(PredicateCondition::NotLike)
        );
        assert_eq!(PredicateCondition::Between.negate(), None);
    }

    #[test]
    fn test_condition_flip() {
        assert_eq!(
            PredicateCondition::LessThan.flip(),
            Some(PredicateCondition::GreaterThan)
        );
        assert_eq!(
            PredicateCondition::Equals.flip(),
            Some(PredicateCondition::Equals)
        );
        assert_eq!(PredicateCondition::Like.flip(), None);
    }

    #[test]
    fn test_condition_from_str() {
        assert_eq!(
            "=".parse::<PredicateCondition>().unwrap(),
            PredicateCondition::Equals
        );
        assert_eq!(
            "<>".parse::<PredicateCondition>().unwrap(),
            PredicateCondition::NotEquals
        );
        assert_eq!(
            "NOT LIKE".parse::<PredicateCondition>().unwrap(),
            PredicateCondition::NotLike
        );
        assert!("~".parse::<PredicateCondition>().is_err());
    }

    // =========================================================================
    // JoinMode tests
    // =========================================================================

    #[test]
    fn test_join_mode_outer_flags() {
        assert!(JoinMode::Left.left_is_outer());
        assert!(JoinMode::Outer.left_is_outer());
        assert!(JoinMode::Outer.right_is_outer());
        assert!(!JoinMode::Inner.left_is_outer());
        assert!(JoinMode::Semi.emits_left_only());
        assert!(JoinMode::Anti.emits_left_only());
        assert!(!JoinMode::Left.emits_left_only());
    }

    // =========================================================================
    // RowId tests
    // =========================================================================

    #[test]
    fn test_row_id_null_sentinel() {
        assert!(NULL_ROW_ID.is_null());
        assert!(!RowId::new(0, 0).is_null());
        assert_ne!(NULL_ROW_ID, RowId::new(0, 0));
        assert_eq!(NULL_ROW_ID.to_string(), "RowId(NULL)");
    }
}
