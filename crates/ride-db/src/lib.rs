//! # ride-db
//!
//! Persistence layer implementing the ride-core ports.
//!
//! ## Overview
//!
//! - Connection pool management and bundled migrations
//! - Database models with SQLx `FromRow` derives
//! - Entity <-> model mappers
//! - `PgPersistenceGateway` / `PgMembershipProvider` for PostgreSQL
//! - `MemoryGateway` / `MemoryMembershipProvider` for tests and embedded use
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ride_db::{create_pool, run_migrations, PgPersistenceGateway, PoolConfig};
//!
//! let pool = create_pool(&PoolConfig::from(&config.database)).await?;
//! run_migrations(&pool).await?;
//! let gateway = PgPersistenceGateway::new(pool);
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use memory::{MemoryGateway, MemoryMembershipProvider};
pub use pool::{create_pool, run_migrations, PgPool, PoolConfig};
pub use repositories::{PgMembershipProvider, PgPersistenceGateway};
