//! Platform-wide and club-scoped roles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Platform-wide role carried by the authentication context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    #[default]
    User,
    SiteAdmin,
}

impl SystemRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::SiteAdmin => "site_admin",
        }
    }
}

impl fmt::Display for SystemRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "site_admin" => Ok(Self::SiteAdmin),
            other => Err(DomainError::ValidationError(format!("unknown system role: {other}"))),
        }
    }
}

/// Club-scoped membership role, ordered by authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClubRole {
    Member,
    Captain,
    Admin,
    Owner,
}

impl ClubRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Captain => "captain",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for ClubRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClubRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "captain" => Ok(Self::Captain),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            other => Err(DomainError::ValidationError(format!("unknown club role: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_club_role_ordering() {
        assert!(ClubRole::Owner > ClubRole::Admin);
        assert!(ClubRole::Admin > ClubRole::Captain);
        assert!(ClubRole::Captain > ClubRole::Member);
    }

    #[test]
    fn test_role_strings() {
        for role in [ClubRole::Member, ClubRole::Captain, ClubRole::Admin, ClubRole::Owner] {
            assert_eq!(role.as_str().parse::<ClubRole>().unwrap(), role);
        }
        assert_eq!("site_admin".parse::<SystemRole>().unwrap(), SystemRole::SiteAdmin);
        assert!("root".parse::<SystemRole>().is_err());
    }
}
