//! In-process implementations of the ride-core ports
//!
//! Used by the service and integration tests, and by embedders that do not
//! need durability. Semantics match the PostgreSQL gateway.

mod gateway;
mod membership;

pub use gateway::MemoryGateway;
pub use membership::MemoryMembershipProvider;
