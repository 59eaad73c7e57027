//! Membership port - read access to the club membership subsystem

use async_trait::async_trait;

use crate::entities::Membership;
use crate::value_objects::Snowflake;

use super::persistence::RepoResult;

#[async_trait]
pub trait MembershipProvider: Send + Sync {
    /// Membership of `user_id` in `club_id`, `None` when the user never joined
    async fn find_membership(
        &self,
        club_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<Membership>>;
}
