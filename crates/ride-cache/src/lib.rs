//! # ride-cache
//!
//! In-process caching for the ride engine.
//!
//! Only derived, cheap-to-rebuild data lives here. The capability cache holds
//! the system capability set resolved for a `(user, system role)` pair so the
//! authorization gate does not recompute it on every request. Club memberships
//! are never cached: a revoked membership must take effect immediately.
//!
//! ## Example
//!
//! ```ignore
//! use ride_cache::CapabilityCache;
//!
//! let cache = CapabilityCache::new(Duration::from_secs(300));
//! let caps = cache.get_or_insert_with(user_id, SystemRole::User, || {
//!     SystemCapabilities::for_role(SystemRole::User)
//! });
//! ```

pub mod capability;

pub use capability::{CapabilityCache, SharedCapabilityCache};
