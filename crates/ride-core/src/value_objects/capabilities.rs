//! Capability bitflags and the static role -> capability matrices
//!
//! Two independent tables: the system matrix keyed by [`SystemRole`] and the
//! club/ride matrix keyed by [`ClubRole`]. Both are compile-time constants;
//! resolving a role is a single match, never a computation.

use bitflags::bitflags;
use std::fmt;

use super::roles::{ClubRole, SystemRole};

bitflags! {
    /// Platform-wide capabilities
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SystemCapabilities: u32 {
        /// Operate the platform itself
        const MANAGE_PLATFORM  = 1 << 0;
        /// Act on any club as if holding every ride capability
        const MANAGE_ALL_CLUBS = 1 << 1;
    }
}

bitflags! {
    /// Ride capabilities granted by a club membership role
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RideCapabilities: u32 {
        const VIEW_CLUB_RIDES        = 1 << 0;
        const JOIN_RIDES             = 1 << 1;
        const CREATE_RIDE_PROPOSALS  = 1 << 2;
        const VIEW_DRAFT_RIDES       = 1 << 3;
        const PUBLISH_OFFICIAL_RIDES = 1 << 4;
        const MANAGE_PARTICIPANTS    = 1 << 5;
        const MANAGE_RIDES           = 1 << 6;
        const CANCEL_RIDES           = 1 << 7;
        const ASSIGN_LEADERSHIP      = 1 << 8;

        const MEMBER = Self::VIEW_CLUB_RIDES.bits()
            | Self::JOIN_RIDES.bits()
            | Self::CREATE_RIDE_PROPOSALS.bits();

        const CAPTAIN = Self::MEMBER.bits()
            | Self::VIEW_DRAFT_RIDES.bits()
            | Self::PUBLISH_OFFICIAL_RIDES.bits()
            | Self::MANAGE_PARTICIPANTS.bits();

        const ADMIN = Self::CAPTAIN.bits()
            | Self::MANAGE_RIDES.bits()
            | Self::CANCEL_RIDES.bits()
            | Self::ASSIGN_LEADERSHIP.bits();
    }
}

const SYSTEM_TAGS: [(SystemCapabilities, &str); 2] = [
    (SystemCapabilities::MANAGE_PLATFORM, "manage_platform"),
    (SystemCapabilities::MANAGE_ALL_CLUBS, "manage_all_clubs"),
];

const RIDE_TAGS: [(RideCapabilities, &str); 9] = [
    (RideCapabilities::VIEW_CLUB_RIDES, "view_club_rides"),
    (RideCapabilities::JOIN_RIDES, "join_rides"),
    (RideCapabilities::CREATE_RIDE_PROPOSALS, "create_ride_proposals"),
    (RideCapabilities::VIEW_DRAFT_RIDES, "view_draft_rides"),
    (RideCapabilities::PUBLISH_OFFICIAL_RIDES, "publish_official_rides"),
    (RideCapabilities::MANAGE_PARTICIPANTS, "manage_participants"),
    (RideCapabilities::MANAGE_RIDES, "manage_rides"),
    (RideCapabilities::CANCEL_RIDES, "cancel_rides"),
    (RideCapabilities::ASSIGN_LEADERSHIP, "assign_leadership"),
];

impl SystemCapabilities {
    /// System matrix lookup
    #[inline]
    pub const fn for_role(role: SystemRole) -> Self {
        match role {
            SystemRole::User => Self::empty(),
            SystemRole::SiteAdmin => {
                Self::from_bits_truncate(Self::MANAGE_PLATFORM.bits() | Self::MANAGE_ALL_CLUBS.bits())
            }
        }
    }

    /// Capability tags contained in this set
    pub fn tags(&self) -> Vec<&'static str> {
        SYSTEM_TAGS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, tag)| *tag)
            .collect()
    }
}

impl RideCapabilities {
    /// Club/ride matrix lookup
    #[inline]
    pub const fn for_role(role: ClubRole) -> Self {
        match role {
            ClubRole::Member => Self::MEMBER,
            ClubRole::Captain => Self::CAPTAIN,
            ClubRole::Admin => Self::ADMIN,
            ClubRole::Owner => Self::all(),
        }
    }

    /// Capability tags contained in this set
    pub fn tags(&self) -> Vec<&'static str> {
        RIDE_TAGS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, tag)| *tag)
            .collect()
    }

    /// Resolve a single capability from its tag (e.g. `manage_rides`)
    pub fn from_tag(tag: &str) -> Option<Self> {
        RIDE_TAGS
            .iter()
            .find(|(_, name)| *name == tag)
            .map(|(flag, _)| *flag)
    }
}

impl fmt::Display for RideCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tags().join(","))
    }
}

impl fmt::Display for SystemCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tags().join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_matrix() {
        assert!(SystemCapabilities::for_role(SystemRole::User).is_empty());
        let admin = SystemCapabilities::for_role(SystemRole::SiteAdmin);
        assert!(admin.contains(SystemCapabilities::MANAGE_ALL_CLUBS));
        assert_eq!(admin.tags(), vec!["manage_platform", "manage_all_clubs"]);
    }

    #[test]
    fn test_member_capabilities() {
        let member = RideCapabilities::for_role(ClubRole::Member);
        assert_eq!(
            member.tags(),
            vec!["view_club_rides", "join_rides", "create_ride_proposals"]
        );
        assert!(!member.contains(RideCapabilities::MANAGE_RIDES));
    }

    #[test]
    fn test_matrix_is_cumulative() {
        let member = RideCapabilities::for_role(ClubRole::Member);
        let captain = RideCapabilities::for_role(ClubRole::Captain);
        let admin = RideCapabilities::for_role(ClubRole::Admin);
        let owner = RideCapabilities::for_role(ClubRole::Owner);

        assert!(captain.contains(member));
        assert!(admin.contains(captain));
        assert!(owner.contains(admin));
        assert!(captain.contains(RideCapabilities::MANAGE_PARTICIPANTS));
        assert!(!captain.contains(RideCapabilities::CANCEL_RIDES));
        assert!(admin.contains(RideCapabilities::ASSIGN_LEADERSHIP));
    }

    #[test]
    fn test_owner_has_every_tag() {
        let owner = RideCapabilities::for_role(ClubRole::Owner);
        assert_eq!(owner.tags().len(), RIDE_TAGS.len());
    }

    #[test]
    fn test_from_tag() {
        assert_eq!(
            RideCapabilities::from_tag("cancel_rides"),
            Some(RideCapabilities::CANCEL_RIDES)
        );
        assert_eq!(RideCapabilities::from_tag("fly"), None);
    }
}
