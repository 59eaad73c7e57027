//! Persistence port - the storage contract the ride domain relies on
//!
//! The store is a keyed record store with conditional writes, secondary-index
//! range queries with opaque cursors, and an all-or-nothing batch write. A
//! ride's counters and its participations form one consistency unit, so every
//! state change is committed through [`PersistenceGateway::atomic_multi_write`].

use std::collections::HashSet;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::entities::{Participation, ParticipationStatus, Ride, RideStatus};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for persistence operations
pub type RepoResult<T> = Result<T, DomainError>;

/// Page size used when a helper walks an index to exhaustion
const SCAN_PAGE_SIZE: usize = 200;

/// Primary key of a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKey {
    Ride(Snowflake),
    Participation { ride_id: Snowflake, user_id: Snowflake },
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ride(id) => write!(f, "ride/{id}"),
            Self::Participation { ride_id, user_id } => {
                write!(f, "ride/{ride_id}/participation/{user_id}")
            }
        }
    }
}

/// A stored record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Ride(Ride),
    Participation(Participation),
}

impl Record {
    pub fn key(&self) -> RecordKey {
        match self {
            Self::Ride(ride) => RecordKey::Ride(ride.id),
            Self::Participation(p) => RecordKey::Participation {
                ride_id: p.ride_id,
                user_id: p.user_id,
            },
        }
    }

    pub fn version(&self) -> i64 {
        match self {
            Self::Ride(ride) => ride.version,
            Self::Participation(p) => p.version,
        }
    }

    pub fn set_version(&mut self, version: i64) {
        match self {
            Self::Ride(ride) => ride.version = version,
            Self::Participation(p) => p.version = version,
        }
    }

    pub fn into_ride(self) -> Option<Ride> {
        match self {
            Self::Ride(ride) => Some(ride),
            Self::Participation(_) => None,
        }
    }

    pub fn into_participation(self) -> Option<Participation> {
        match self {
            Self::Participation(p) => Some(p),
            Self::Ride(_) => None,
        }
    }
}

/// Condition a write must satisfy against the stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// No record is stored under the key
    NotExists,
    /// The stored record has exactly this version
    Version(i64),
}

/// One operation of a batch write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Put {
        record: Record,
        precondition: Option<Precondition>,
    },
    Delete {
        key: RecordKey,
        precondition: Option<Precondition>,
    },
}

impl WriteOp {
    /// Insert a record that must not exist yet
    pub fn create(record: Record) -> Self {
        Self::Put {
            record,
            precondition: Some(Precondition::NotExists),
        }
    }

    /// Overwrite a record only if nobody changed it since it was read
    pub fn update(record: Record) -> Self {
        let version = record.version();
        Self::Put {
            record,
            precondition: Some(Precondition::Version(version)),
        }
    }

    pub fn key(&self) -> RecordKey {
        match self {
            Self::Put { record, .. } => record.key(),
            Self::Delete { key, .. } => *key,
        }
    }

    /// Batches may touch each key at most once
    pub fn ensure_distinct_keys(ops: &[WriteOp]) -> RepoResult<()> {
        let mut seen = HashSet::with_capacity(ops.len());
        for op in ops {
            let key = op.key();
            if !seen.insert(key) {
                return Err(DomainError::ValidationError(format!(
                    "batch writes {key} more than once"
                )));
            }
        }
        Ok(())
    }
}

/// Secondary indexes available for range queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexQuery {
    /// Participations of one ride ordered by user ID
    ParticipationsByRide {
        ride_id: Snowflake,
        status: Option<ParticipationStatus>,
    },
    /// Participations of one user ordered by ride ID
    ParticipationsByUser { user_id: Snowflake },
    /// Rides of one club ordered by ride ID
    RidesByClub {
        club_id: Snowflake,
        status: Option<RideStatus>,
    },
}

impl IndexQuery {
    /// The ordering key a record occupies within this index
    pub fn sort_key(&self, record: &Record) -> Snowflake {
        match (self, record) {
            (Self::ParticipationsByRide { .. }, Record::Participation(p)) => p.user_id,
            (Self::ParticipationsByUser { .. }, Record::Participation(p)) => p.ride_id,
            (_, Record::Ride(ride)) => ride.id,
            (Self::RidesByClub { .. }, Record::Participation(p)) => p.id,
        }
    }

    /// Whether a record belongs to this index range
    pub fn matches(&self, record: &Record) -> bool {
        match (self, record) {
            (Self::ParticipationsByRide { ride_id, status }, Record::Participation(p)) => {
                p.ride_id == *ride_id && status.is_none_or(|s| p.status == s)
            }
            (Self::ParticipationsByUser { user_id }, Record::Participation(p)) => {
                p.user_id == *user_id
            }
            (Self::RidesByClub { club_id, status }, Record::Ride(ride)) => {
                ride.club_id == *club_id && status.is_none_or(|s| ride.status == s)
            }
            _ => false,
        }
    }
}

/// Opaque pagination cursor: "resume strictly after this sort key"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor(String);

impl Cursor {
    pub fn after(sort_key: Snowflake) -> Self {
        Self(URL_SAFE_NO_PAD.encode(sort_key.into_inner().to_be_bytes()))
    }

    /// Decode the sort key; malformed cursors are a caller error
    pub fn sort_key(&self) -> RepoResult<Snowflake> {
        let bytes = URL_SAFE_NO_PAD
            .decode(&self.0)
            .map_err(|_| DomainError::ValidationError("malformed cursor".to_string()))?;
        let raw: [u8; 8] = bytes
            .try_into()
            .map_err(|_| DomainError::ValidationError("malformed cursor".to_string()))?;
        Ok(Snowflake::new(i64::from_be_bytes(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Cursor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One page of an index query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

impl Page<Record> {
    /// Build a page from up to `limit + 1` records already ordered by the index
    /// sort key; the extra record only signals that another page exists.
    pub fn from_overfetch(query: &IndexQuery, mut records: Vec<Record>, limit: usize) -> Self {
        let limit = limit.max(1);
        if records.len() <= limit {
            return Self {
                items: records,
                next_cursor: None,
            };
        }
        records.truncate(limit);
        let next_cursor = records.last().map(|last| Cursor::after(query.sort_key(last)));
        Self {
            items: records,
            next_cursor,
        }
    }
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Read one record
    async fn get(&self, key: &RecordKey) -> RepoResult<Option<Record>>;

    /// Write one record, optionally guarded by a precondition
    async fn put(&self, record: Record, precondition: Option<Precondition>) -> RepoResult<()>;

    /// Range query over a secondary index, resuming after `cursor`
    async fn query_by_index(
        &self,
        query: &IndexQuery,
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> RepoResult<Page<Record>>;

    /// Commit every operation or none of them
    async fn atomic_multi_write(&self, ops: Vec<WriteOp>) -> RepoResult<()>;

    async fn find_ride(&self, ride_id: Snowflake) -> RepoResult<Option<Ride>> {
        Ok(self
            .get(&RecordKey::Ride(ride_id))
            .await?
            .and_then(Record::into_ride))
    }

    async fn find_participation(
        &self,
        ride_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<Participation>> {
        Ok(self
            .get(&RecordKey::Participation { ride_id, user_id })
            .await?
            .and_then(Record::into_participation))
    }

    /// Every participation of a ride (optionally of one status), across all pages
    async fn participations_for_ride(
        &self,
        ride_id: Snowflake,
        status: Option<ParticipationStatus>,
    ) -> RepoResult<Vec<Participation>> {
        let query = IndexQuery::ParticipationsByRide { ride_id, status };
        let mut cursor: Option<Cursor> = None;
        let mut all = Vec::new();
        loop {
            let page = self
                .query_by_index(&query, cursor.as_ref(), SCAN_PAGE_SIZE)
                .await?;
            all.extend(page.items.into_iter().filter_map(Record::into_participation));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(all),
            }
        }
    }
}
