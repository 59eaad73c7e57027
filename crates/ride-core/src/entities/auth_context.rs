//! Authentication context supplied by the identity provider

use serde::{Deserialize, Serialize};

use crate::value_objects::{Snowflake, SystemRole};

/// Caller identity. Trusted as given; the ride domain never verifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Snowflake,
    pub email: String,
    pub system_role: SystemRole,
    pub is_authenticated: bool,
}

impl AuthContext {
    pub fn user(user_id: Snowflake, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            system_role: SystemRole::User,
            is_authenticated: true,
        }
    }

    pub fn site_admin(user_id: Snowflake, email: impl Into<String>) -> Self {
        Self {
            system_role: SystemRole::SiteAdmin,
            ..Self::user(user_id, email)
        }
    }
}
