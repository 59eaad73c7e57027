//! PostgreSQL implementations of the ride-core ports

mod error;
mod gateway;
mod membership;

pub use gateway::PgPersistenceGateway;
pub use membership::PgMembershipProvider;
