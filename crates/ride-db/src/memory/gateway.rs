//! In-memory PersistenceGateway
//!
//! All records live in one ordered map behind a mutex. A batch is validated
//! against every precondition before any operation is applied, under the same
//! lock, which gives the all-or-nothing guarantee.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use ride_core::{
    Cursor, DomainError, IndexQuery, Page, PersistenceGateway, Precondition, Record, RecordKey,
    RepoResult, WriteOp,
};

/// Ordered in-memory record store
#[derive(Debug, Default)]
pub struct MemoryGateway {
    records: Mutex<BTreeMap<RecordKey, Record>>,
    fail_writes: AtomicBool,
}

impl MemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Make every subsequent write fail with a database error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    fn ensure_writable(&self) -> RepoResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("store unavailable".to_string()));
        }
        Ok(())
    }
}

fn check(stored: Option<&Record>, key: RecordKey, precondition: Option<Precondition>) -> RepoResult<()> {
    let holds = match precondition {
        None => true,
        Some(Precondition::NotExists) => stored.is_none(),
        Some(Precondition::Version(expected)) => stored.is_some_and(|r| r.version() == expected),
    };
    if holds {
        Ok(())
    } else {
        Err(DomainError::PreconditionFailed(format!(
            "{key} was modified concurrently"
        )))
    }
}

/// Version a record is stored with after a successful write
fn stored_version(stored: Option<&Record>, record: &Record, precondition: Option<Precondition>) -> i64 {
    match precondition {
        Some(Precondition::Version(expected)) => expected + 1,
        Some(Precondition::NotExists) => record.version(),
        None => stored.map_or(record.version(), |s| s.version() + 1),
    }
}

fn apply(records: &mut BTreeMap<RecordKey, Record>, op: WriteOp) {
    match op {
        WriteOp::Put {
            mut record,
            precondition,
        } => {
            let key = record.key();
            let version = stored_version(records.get(&key), &record, precondition);
            record.set_version(version);
            records.insert(key, record);
        }
        WriteOp::Delete { key, .. } => {
            records.remove(&key);
        }
    }
}

fn op_precondition(op: &WriteOp) -> Option<Precondition> {
    match op {
        WriteOp::Put { precondition, .. } | WriteOp::Delete { precondition, .. } => *precondition,
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn get(&self, key: &RecordKey) -> RepoResult<Option<Record>> {
        // Let concurrent callers interleave the way they would around real I/O
        tokio::task::yield_now().await;
        Ok(self.records.lock().get(key).cloned())
    }

    async fn put(&self, record: Record, precondition: Option<Precondition>) -> RepoResult<()> {
        self.atomic_multi_write(vec![WriteOp::Put {
            record,
            precondition,
        }])
        .await
    }

    async fn query_by_index(
        &self,
        query: &IndexQuery,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> RepoResult<Page<Record>> {
        let after = cursor.map(Cursor::sort_key).transpose()?;
        tokio::task::yield_now().await;

        let mut matching: Vec<Record> = {
            let records = self.records.lock();
            records
                .values()
                .filter(|record| query.matches(record))
                .filter(|record| after.is_none_or(|after| query.sort_key(record) > after))
                .cloned()
                .collect()
        };
        matching.sort_by_key(|record| query.sort_key(record));
        matching.truncate(limit.max(1).saturating_add(1));

        Ok(Page::from_overfetch(query, matching, limit))
    }

    async fn atomic_multi_write(&self, ops: Vec<WriteOp>) -> RepoResult<()> {
        self.ensure_writable()?;
        WriteOp::ensure_distinct_keys(&ops)?;

        let mut records = self.records.lock();
        for op in &ops {
            let key = op.key();
            check(records.get(&key), key, op_precondition(op))?;
        }
        for op in ops {
            apply(&mut records, op);
        }
        Ok(())
    }
}
