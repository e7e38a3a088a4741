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

//! Per-chunk MVCC visibility metadata
//!
//! Every row of an MVCC-enabled chunk carries `(begin_cid, end_cid, tid)`:
//! the commit id that made it visible, the commit id that deleted it
//! (`MAX_COMMIT_ID` while live), and the id of the transaction currently
//! holding the row for modification. The three vectors sit behind one
//! shared/exclusive lock per chunk, taken shared during reads and exclusive
//! while a commit stamps its rows.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::{
    CommitId, TransactionId, INVALID_TRANSACTION_ID, MAX_COMMIT_ID,
};

/// The parallel MVCC vectors of one chunk
#[derive(Debug)]
pub struct MvccVectors {
    pub begin_cids: Vec<CommitId>,
    pub end_cids: Vec<CommitId>,
    pub tids: Vec<TransactionId>,
}

impl MvccVectors {
    /// Number of tracked rows
    pub fn len(&self) -> usize {
        self.begin_cids.len()
    }

    /// Returns true if no rows are tracked
    pub fn is_empty(&self) -> bool {
        self.begin_cids.is_empty()
    }

    /// Snapshot visibility for the row at `offset`.
    ///
    /// A row is visible to a snapshot iff it was committed at or before the
    /// snapshot and not deleted at or before it. The transaction that holds
    /// the row flips the begin-side test: its own uncommitted inserts are
    /// visible, its own pending deletes are not.
    pub fn is_visible(
        &self,
        offset: usize,
        snapshot_cid: CommitId,
        own_tid: TransactionId,
    ) -> bool {
        let row_is_ours =
            own_tid != INVALID_TRANSACTION_ID && self.tids[offset] == own_tid;
        snapshot_cid < self.end_cids[offset]
            && ((snapshot_cid >= self.begin_cids[offset]) != row_is_ours)
    }
}

/// Shared/exclusive-locked MVCC metadata block
#[derive(Debug)]
pub struct MvccData {
    inner: RwLock<MvccVectors>,
}

impl MvccData {
    /// Create metadata for `size` rows, all committed at `begin_cid`
    pub fn new(size: usize, begin_cid: CommitId) -> Self {
        Self {
            inner: RwLock::new(MvccVectors {
                begin_cids: vec![begin_cid; size],
                end_cids: vec![MAX_COMMIT_ID; size],
                tids: vec![INVALID_TRANSACTION_ID; size],
            }),
        }
    }

    /// Create metadata for `size` uncommitted rows owned by `tid`
    pub fn new_uncommitted(size: usize, tid: TransactionId) -> Self {
        Self {
            inner: RwLock::new(MvccVectors {
                begin_cids: vec![MAX_COMMIT_ID; size],
                end_cids: vec![MAX_COMMIT_ID; size],
                tids: vec![tid; size],
            }),
        }
    }

    /// Lock the metadata for reading (shared)
    pub fn read(&self) -> RwLockReadGuard<'_, MvccVectors> {
        self.inner.read()
    }

    /// Lock the metadata for commit stamping (exclusive)
    pub fn write(&self) -> RwLockWriteGuard<'_, MvccVectors> {
        self.inner.write()
    }

    /// Track one appended row, committed at `begin_cid`
    pub fn grow(&self, begin_cid: CommitId, tid: TransactionId) {
        let mut inner = self.inner.write();
        inner.begin_cids.push(begin_cid);
        inner.end_cids.push(MAX_COMMIT_ID);
        inner.tids.push(tid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_committed_rows_visible() {
        let mvcc = MvccData::new(3, 5);
        let vectors = mvcc.read();
        assert!(vectors.is_visible(0, 5, INVALID_TRANSACTION_ID));
        assert!(vectors.is_visible(2, 100, INVALID_TRANSACTION_ID));
        // Snapshot taken before the commit
        assert!(!vectors.is_visible(0, 4, INVALID_TRANSACTION_ID));
    }

    #[test]
    fn test_deleted_rows_invisible_after_end() {
        let mvcc = MvccData::new(1, 1);
        mvcc.write().end_cids[0] = 7;
        let vectors = mvcc.read();
        assert!(vectors.is_visible(0, 6, INVALID_TRANSACTION_ID));
        assert!(!vectors.is_visible(0, 7, INVALID_TRANSACTION_ID));
    }

    #[test]
    fn test_own_uncommitted_rows_visible_to_owner_only() {
        let mvcc = MvccData::new_uncommitted(1, 42);
        let vectors = mvcc.read();
        assert!(vectors.is_visible(0, 10, 42));
        assert!(!vectors.is_visible(0, 10, 43));
        assert!(!vectors.is_visible(0, 10, INVALID_TRANSACTION_ID));
    }

    #[test]
    fn test_grow() {
        let mvcc = MvccData::new(1, 1);
        mvcc.grow(2, INVALID_TRANSACTION_ID);
        assert_eq!(mvcc.read().len(), 2);
        assert!(mvcc.read().is_visible(1, 2, INVALID_TRANSACTION_ID));
    }
}
