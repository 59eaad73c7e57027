//! PostgreSQL implementation of MembershipProvider

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use ride_core::{Membership, MembershipProvider, RepoResult, Snowflake};

use crate::models::ClubMembershipModel;

use super::error::map_db_error;

/// Reads club memberships; never cached, so suspensions apply immediately
#[derive(Clone)]
pub struct PgMembershipProvider {
    pool: PgPool,
}

impl PgMembershipProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipProvider for PgMembershipProvider {
    #[instrument(skip(self))]
    async fn find_membership(
        &self,
        club_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<Membership>> {
        let row = sqlx::query_as::<_, ClubMembershipModel>(
            r#"
            SELECT club_id, user_id, role, status, joined_at
            FROM club_memberships
            WHERE club_id = $1 AND user_id = $2
            "#,
        )
        .bind(club_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(Membership::try_from).transpose()
    }
}

impl std::fmt::Debug for PgMembershipProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgMembershipProvider").finish_non_exhaustive()
    }
}
