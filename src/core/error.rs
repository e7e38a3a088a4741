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

//! Error types for StrataDB
//!
//! All recoverable conditions are reported through [`Error`]; there is no
//! out-of-band termination. Every variant collapses to one of the five
//! [`ErrorKind`] tags that the pipeline boundary exposes to callers.

use thiserror::Error;

/// Result type alias for StrataDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error classification exposed at the pipeline boundary.
///
/// `InvalidInput`, `Unsupported`, `TransactionAborted` and `Cancelled` are
/// recoverable and become observable results; `Internal` means an invariant
/// broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed query or type mismatch surfaced by the pipeline
    InvalidInput,
    /// A combination the engine rejects
    Unsupported,
    /// MVCC conflict at commit
    TransactionAborted,
    /// Deadline or explicit cancel
    Cancelled,
    /// An invariant broke
    Internal,
}

/// Main error type for StrataDB operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // =========================================================================
    // Input errors
    // =========================================================================
    /// Table not found in the catalog
    #[error("table '{0}' not found")]
    TableNotFound(String),

    /// Table already exists when trying to register
    #[error("table '{0}' already exists")]
    TableAlreadyExists(String),

    /// Column not found in table schema
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// Row or value does not match the column type
    #[error("type mismatch for column '{column}': expected {expected}, got {got}")]
    TypeMismatch {
        column: String,
        expected: String,
        got: String,
    },

    /// Row width does not match the table schema
    #[error("column count mismatch: expected {expected}, got {got}")]
    ColumnCountMismatch { expected: usize, got: usize },

    /// NULL written into a non-nullable column
    #[error("column '{0}' is not nullable")]
    NullNotAllowed(String),

    /// Generic malformed input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // =========================================================================
    // Unsupported combinations
    // =========================================================================
    /// A combination the engine rejects (e.g. LIKE on a non-text column)
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A string predicate referred to characters outside the histogram's
    /// supported alphabet
    #[error("string '{value}' contains characters outside the supported alphabet")]
    UnsupportedCharacters { value: String },

    // =========================================================================
    // Transaction errors
    // =========================================================================
    /// Write-write conflict detected during MVCC commit
    #[error("transaction {tid} aborted: {reason}")]
    TransactionAborted { tid: u32, reason: String },

    // =========================================================================
    // Cancellation
    // =========================================================================
    /// Deadline elapsed or the query was cancelled explicitly
    #[error("operation cancelled")]
    Cancelled,

    // =========================================================================
    // Internal errors
    // =========================================================================
    /// An invariant broke; non-recoverable
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a generic invalid-input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an unsupported-combination error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Create an internal error
    ///
    /// Debug builds additionally panic via `debug_assert!`, so broken
    /// invariants surface at the point of detection instead of the pipeline
    /// boundary.
    pub fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        debug_assert!(false, "internal error: {}", msg);
        Error::Internal(msg)
    }

    /// Collapse this error to its pipeline-boundary classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TableNotFound(_)
            | Error::TableAlreadyExists(_)
            | Error::ColumnNotFound(_)
            | Error::TypeMismatch { .. }
            | Error::ColumnCountMismatch { .. }
            | Error::NullNotAllowed(_)
            | Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Unsupported(_) | Error::UnsupportedCharacters { .. } => ErrorKind::Unsupported,
            Error::TransactionAborted { .. } => ErrorKind::TransactionAborted,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if the error is recoverable at the pipeline boundary
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }
}
