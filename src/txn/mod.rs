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

//! Transactions and snapshot isolation
//!
//! A [`TransactionContext`] carries a transaction id, the snapshot commit id
//! taken at begin, and the write set needed to stamp or undo MVCC metadata.
//! Commits are serialized through the [`TransactionManager`]'s monotonically
//! increasing commit-id allocator: each commit takes the allocator lock,
//! stamps its rows under the owning chunks' exclusive MVCC locks, then
//! publishes the new commit id.
//!
//! Write-write conflicts surface as `TransactionAborted` at the point of the
//! conflicting claim, and the context rolls its prior claims back.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::core::{
    CommitId, Error, Result, RowId, TransactionId, INVALID_TRANSACTION_ID, MAX_COMMIT_ID,
};
use crate::storage::Table;

/// Lifecycle phase of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPhase {
    Active,
    Committed,
    RolledBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOp {
    Insert,
    Delete,
}

#[derive(Debug)]
struct WriteRecord {
    table: Arc<Table>,
    row_id: RowId,
    op: WriteOp,
}

#[derive(Debug)]
struct TmInner {
    next_tid: AtomicU32,
    last_commit_id: AtomicU32,
    /// Serializes commit stamping so commit ids become visible in order
    commit_lock: Mutex<()>,
}

/// Allocates transaction ids and commit ids; shared per engine
#[derive(Debug, Clone)]
pub struct TransactionManager {
    inner: Arc<TmInner>,
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionManager {
    /// Create a manager with commit history starting at id 0
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TmInner {
                next_tid: AtomicU32::new(1),
                last_commit_id: AtomicU32::new(0),
                commit_lock: Mutex::new(()),
            }),
        }
    }

    /// The most recently published commit id
    pub fn last_commit_id(&self) -> CommitId {
        self.inner.last_commit_id.load(Ordering::Acquire)
    }

    /// Begin a transaction with a snapshot of the current commit state
    pub fn begin(&self) -> TransactionContext {
        let tid = self.inner.next_tid.fetch_add(1, Ordering::Relaxed);
        let snapshot_cid = self.last_commit_id();
        debug!(tid, snapshot_cid, "transaction begin");
        TransactionContext {
            tid,
            snapshot_cid,
            manager: self.clone(),
            state: Arc::new(Mutex::new(TxState {
                phase: TransactionPhase::Active,
                write_set: Vec::new(),
            })),
        }
    }
}

#[derive(Debug)]
struct TxState {
    phase: TransactionPhase,
    write_set: Vec<WriteRecord>,
}

/// One transaction's id, snapshot, and write set
#[derive(Debug, Clone)]
pub struct TransactionContext {
    tid: TransactionId,
    snapshot_cid: CommitId,
    manager: TransactionManager,
    state: Arc<Mutex<TxState>>,
}

impl TransactionContext {
    /// This transaction's id
    pub fn tid(&self) -> TransactionId {
        self.tid
    }

    /// The commit id this transaction reads as of
    pub fn snapshot_cid(&self) -> CommitId {
        self.snapshot_cid
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> TransactionPhase {
        self.state.lock().phase
    }

    /// Returns true while the transaction accepts reads and writes
    pub fn is_active(&self) -> bool {
        self.phase() == TransactionPhase::Active
    }

    fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::TransactionAborted {
                tid: self.tid,
                reason: "transaction is no longer active".into(),
            })
        }
    }

    /// Insert a row; it becomes visible to others only after commit
    pub fn insert(&self, table: &Arc<Table>, values: &[crate::core::Value]) -> Result<RowId> {
        self.ensure_active()?;
        let row_id = table.append_uncommitted(values, self.tid)?;
        self.state.lock().write_set.push(WriteRecord {
            table: Arc::clone(table),
            row_id,
            op: WriteOp::Insert,
        });
        Ok(row_id)
    }

    /// Claim a row for deletion; stamped invisible at commit.
    ///
    /// Fails with `TransactionAborted` when another transaction holds the
    /// row or a newer version already deleted it; prior claims of this
    /// transaction are rolled back before the error propagates.
    pub fn delete(&self, table: &Arc<Table>, row_id: RowId) -> Result<()> {
        self.ensure_active()?;
        let chunk = table.get_chunk(row_id.chunk_id).ok_or_else(|| {
            Error::invalid_input(format!("delete of unknown row {}", row_id))
        })?;
        let mvcc = chunk
            .mvcc_data()
            .ok_or_else(|| Error::unsupported("delete on a table without MVCC metadata"))?;

        {
            let mut vectors = mvcc.write();
            let offset = row_id.chunk_offset as usize;
            let holder = vectors.tids[offset];
            if holder != INVALID_TRANSACTION_ID && holder != self.tid {
                drop(vectors);
                self.rollback()?;
                return Err(Error::TransactionAborted {
                    tid: self.tid,
                    reason: format!("row {} is locked by transaction {}", row_id, holder),
                });
            }
            if vectors.end_cids[offset] != MAX_COMMIT_ID {
                drop(vectors);
                self.rollback()?;
                return Err(Error::TransactionAborted {
                    tid: self.tid,
                    reason: format!("row {} was deleted by a newer commit", row_id),
                });
            }
            vectors.tids[offset] = self.tid;
        }

        self.state.lock().write_set.push(WriteRecord {
            table: Arc::clone(table),
            row_id,
            op: WriteOp::Delete,
        });
        Ok(())
    }

    /// Commit: allocate the next commit id and stamp every written row
    pub fn commit(&self) -> Result<CommitId> {
        let mut state = self.state.lock();
        if state.phase != TransactionPhase::Active {
            return Err(Error::TransactionAborted {
                tid: self.tid,
                reason: "commit on a finished transaction".into(),
            });
        }

        let _serialize = self.manager.inner.commit_lock.lock();
        let commit_id = self.manager.last_commit_id() + 1;

        for record in &state.write_set {
            let chunk = record
                .table
                .get_chunk(record.row_id.chunk_id)
                .expect("written chunk disappeared");
            let mvcc = chunk.mvcc_data().expect("written chunk lost MVCC data");
            let mut vectors = mvcc.write();
            let offset = record.row_id.chunk_offset as usize;
            match record.op {
                WriteOp::Insert => vectors.begin_cids[offset] = commit_id,
                WriteOp::Delete => vectors.end_cids[offset] = commit_id,
            }
            vectors.tids[offset] = INVALID_TRANSACTION_ID;
        }

        self.manager
            .inner
            .last_commit_id
            .store(commit_id, Ordering::Release);
        state.phase = TransactionPhase::Committed;
        debug!(tid = self.tid, commit_id, "transaction committed");
        Ok(commit_id)
    }

    /// Roll back: undo claims and leave uncommitted inserts invisible
    pub fn rollback(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.phase != TransactionPhase::Active {
            return Ok(());
        }

        for record in &state.write_set {
            let chunk = record
                .table
                .get_chunk(record.row_id.chunk_id)
                .expect("written chunk disappeared");
            let mvcc = chunk.mvcc_data().expect("written chunk lost MVCC data");
            let mut vectors = mvcc.write();
            let offset = record.row_id.chunk_offset as usize;
            match record.op {
                // begin stays at MAX, so the row can never become visible
                WriteOp::Insert => vectors.end_cids[offset] = 0,
                WriteOp::Delete => {}
            }
            vectors.tids[offset] = INVALID_TRANSACTION_ID;
        }

        state.phase = TransactionPhase::RolledBack;
        debug!(tid = self.tid, "transaction rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, Value};
    use crate::storage::{ColumnDefinition, TableType, UseMvcc, DEFAULT_CHUNK_SIZE};

    fn mvcc_table() -> Arc<Table> {
        Arc::new(Table::new(
            vec![ColumnDefinition::new("a", DataType::Int32, false)],
            TableType::Data,
            DEFAULT_CHUNK_SIZE,
            UseMvcc::Yes,
        ))
    }

    fn visible_row_count(table: &Table, snapshot_cid: CommitId, tid: TransactionId) -> usize {
        let mut count = 0;
        for chunk in table.chunks() {
            let mvcc = chunk.mvcc_data().unwrap();
            let vectors = mvcc.read();
            for offset in 0..vectors.len() {
                if vectors.is_visible(offset, snapshot_cid, tid) {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_insert_visible_after_commit_only() {
        let table = mvcc_table();
        let manager = TransactionManager::new();

        let tx = manager.begin();
        tx.insert(&table, &[Value::Int32(1)]).unwrap();

        // Uncommitted: visible to the writer, invisible to a fresh snapshot
        assert_eq!(visible_row_count(&table, tx.snapshot_cid(), tx.tid()), 1);
        let other = manager.begin();
        assert_eq!(
            visible_row_count(&table, other.snapshot_cid(), other.tid()),
            0
        );

        let commit_id = tx.commit().unwrap();
        assert_eq!(commit_id, 1);
        assert_eq!(manager.last_commit_id(), 1);

        // A snapshot taken after the commit sees the row
        let later = manager.begin();
        assert_eq!(
            visible_row_count(&table, later.snapshot_cid(), later.tid()),
            1
        );
        // The earlier snapshot still does not
        assert_eq!(
            visible_row_count(&table, other.snapshot_cid(), other.tid()),
            0
        );
    }

    #[test]
    fn test_rollback_hides_inserts() {
        let table = mvcc_table();
        let manager = TransactionManager::new();

        let tx = manager.begin();
        tx.insert(&table, &[Value::Int32(1)]).unwrap();
        tx.rollback().unwrap();

        let later = manager.begin();
        assert_eq!(
            visible_row_count(&table, later.snapshot_cid(), later.tid()),
            0
        );
        assert!(!tx.is_active());
        assert!(tx.insert(&table, &[Value::Int32(2)]).is_err());
    }

    #[test]
    fn test_delete_commit_and_snapshot() {
        let table = mvcc_table();
        let manager = TransactionManager::new();

        let tx = manager.begin();
        let row_id = tx.insert(&table, &[Value::Int32(1)]).unwrap();
        tx.commit().unwrap();

        let reader_before = manager.begin();

        let deleter = manager.begin();
        deleter.delete(&table, row_id).unwrap();
        deleter.commit().unwrap();

        // The pre-delete snapshot still sees the row
        assert_eq!(
            visible_row_count(&table, reader_before.snapshot_cid(), reader_before.tid()),
            1
        );
        let reader_after = manager.begin();
        assert_eq!(
            visible_row_count(&table, reader_after.snapshot_cid(), reader_after.tid()),
            0
        );
    }

    #[test]
    fn test_write_write_conflict_aborts() {
        let table = mvcc_table();
        let manager = TransactionManager::new();

        let setup = manager.begin();
        let row_id = setup.insert(&table, &[Value::Int32(1)]).unwrap();
        setup.commit().unwrap();

        let first = manager.begin();
        let second = manager.begin();
        first.delete(&table, row_id).unwrap();

        let err = second.delete(&table, row_id).unwrap_err();
        assert!(matches!(err, Error::TransactionAborted { .. }));
        assert!(!second.is_active());

        // The first holder can still commit
        first.commit().unwrap();
    }
}
