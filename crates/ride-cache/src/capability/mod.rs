//! Capability caching

mod ttl_cache;

pub use ttl_cache::{CapabilityCache, SharedCapabilityCache};
