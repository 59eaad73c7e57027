//! Ports - the interfaces the domain requires from infrastructure
//!
//! The domain layer defines what it needs; `ride-db` provides the
//! PostgreSQL and in-memory implementations.

mod membership;
mod persistence;

pub use membership::MembershipProvider;
pub use persistence::{
    Cursor, IndexQuery, Page, PersistenceGateway, Precondition, Record, RecordKey, RepoResult,
    WriteOp,
};
