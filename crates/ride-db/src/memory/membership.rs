//! In-memory MembershipProvider

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use ride_core::{
    ClubRole, DomainError, Membership, MembershipProvider, MembershipStatus, RepoResult, Snowflake,
};

#[derive(Debug, Default)]
pub struct MemoryMembershipProvider {
    memberships: RwLock<HashMap<(Snowflake, Snowflake), Membership>>,
    unavailable: AtomicBool,
}

impl MemoryMembershipProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn insert(&self, membership: Membership) {
        self.memberships
            .write()
            .insert((membership.club_id, membership.user_id), membership);
    }

    /// Add an active member with the given club role
    pub fn add_member(&self, club_id: Snowflake, user_id: Snowflake, role: ClubRole) {
        self.insert(Membership::new(club_id, user_id, role));
    }

    /// Returns false when there is no such membership
    pub fn set_status(&self, club_id: Snowflake, user_id: Snowflake, status: MembershipStatus) -> bool {
        match self.memberships.write().get_mut(&(club_id, user_id)) {
            Some(membership) => {
                membership.status = status;
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, club_id: Snowflake, user_id: Snowflake) -> Option<Membership> {
        self.memberships.write().remove(&(club_id, user_id))
    }

    /// Make lookups fail as if the membership service were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl MembershipProvider for MemoryMembershipProvider {
    async fn find_membership(
        &self,
        club_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<Membership>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("membership store unavailable".to_string()));
        }
        Ok(self.memberships.read().get(&(club_id, user_id)).cloned())
    }
}
