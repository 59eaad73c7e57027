//! Capability resolution
//!
//! System capabilities come from the caller's platform role and are cached
//! per `(user, role)`; club capabilities are a direct matrix lookup.

use ride_core::{AuthContext, ClubRole, RideCapabilities, Snowflake, SystemCapabilities};
use tracing::debug;

use super::context::ServiceContext;

/// Capability resolver
pub struct CapabilityResolver<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> CapabilityResolver<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// System capabilities of the caller. Unauthenticated callers hold none.
    pub fn derive_capabilities(&self, auth: &AuthContext) -> SystemCapabilities {
        if !auth.is_authenticated {
            return SystemCapabilities::empty();
        }
        self.ctx
            .capability_cache()
            .get_or_insert_with(auth.user_id, auth.system_role, || {
                SystemCapabilities::for_role(auth.system_role)
            })
    }

    pub fn has_system_capability(&self, auth: &AuthContext, capability: SystemCapabilities) -> bool {
        self.derive_capabilities(auth).contains(capability)
    }

    /// Club/ride matrix lookup
    #[inline]
    pub fn club_capabilities(&self, role: ClubRole) -> RideCapabilities {
        RideCapabilities::for_role(role)
    }

    /// Forget cached sets of a user, e.g. after their system role changed
    pub fn invalidate_user(&self, user_id: Snowflake) {
        self.ctx.capability_cache().invalidate_user(user_id);
        debug!(user_id = %user_id, "Invalidated cached capabilities");
    }

    /// Drop expired cache entries
    pub fn sweep_expired(&self) -> usize {
        self.ctx.capability_cache().sweep_expired()
    }
}
