//! Authorization gate
//!
//! Ride capability checks run an ordered chain of rules. Each rule either
//! grants, denies, or defers to the next one; falling off the end denies.
//!
//! 1. the caller must be authenticated
//! 2. `manage_all_clubs` (platform override) grants anything
//! 3. the caller must hold an active membership in the ride's club
//! 4. a ride's creator may manage and cancel it
//! 5. the club role matrix decides
//!
//! Authorization fails closed: if the membership subsystem errors the
//! request is denied, never granted.

use ride_core::{
    AuthContext, DomainError, Membership, Ride, RideCapabilities, RideScope, RideStatus,
    Snowflake, SystemCapabilities,
};
use tracing::{debug, instrument, warn};

use super::capability::CapabilityResolver;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Capabilities a ride's own creator holds regardless of club role
const CREATOR_CAPABILITIES: RideCapabilities =
    RideCapabilities::MANAGE_RIDES.union(RideCapabilities::CANCEL_RIDES);

/// Outcome of one rule
#[derive(Debug, Clone, PartialEq, Eq)]
enum Decision {
    Grant,
    Deny(String),
    Defer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Authenticated,
    PlatformOverride,
    ActiveMembership,
    CreatorOverride,
    MembershipMatrix,
}

const RIDE_CAPABILITY_CHAIN: [Rule; 5] = [
    Rule::Authenticated,
    Rule::PlatformOverride,
    Rule::ActiveMembership,
    Rule::CreatorOverride,
    Rule::MembershipMatrix,
];

/// Caller's membership as seen by the gate
#[derive(Debug, Clone, PartialEq, Eq)]
enum MembershipState {
    NotLoaded,
    Missing,
    Unavailable,
    Found(Membership),
}

impl MembershipState {
    fn active(&self) -> Option<&Membership> {
        match self {
            Self::Found(membership) if membership.is_active() => Some(membership),
            _ => None,
        }
    }
}

/// Everything the rules look at
#[derive(Debug)]
struct Evaluation<'r> {
    auth: &'r AuthContext,
    system: SystemCapabilities,
    capability: RideCapabilities,
    club_id: Snowflake,
    ride_created_by: Option<Snowflake>,
    membership: MembershipState,
    /// Matrix capabilities of the active membership's club role
    club: RideCapabilities,
}

impl Rule {
    fn needs_membership(self) -> bool {
        matches!(self, Self::ActiveMembership | Self::MembershipMatrix)
    }

    fn evaluate(self, eval: &Evaluation<'_>) -> Decision {
        match self {
            Self::Authenticated => {
                if eval.auth.is_authenticated {
                    Decision::Defer
                } else {
                    Decision::Deny("authentication required".to_string())
                }
            }
            Self::PlatformOverride => {
                if eval.system.contains(SystemCapabilities::MANAGE_ALL_CLUBS) {
                    Decision::Grant
                } else {
                    Decision::Defer
                }
            }
            Self::ActiveMembership => match &eval.membership {
                MembershipState::Found(m) if m.is_active() => Decision::Defer,
                MembershipState::Found(m) => Decision::Deny(format!(
                    "membership in club {} is {}",
                    eval.club_id,
                    m.status.as_str()
                )),
                MembershipState::Missing => {
                    Decision::Deny(format!("not a member of club {}", eval.club_id))
                }
                MembershipState::Unavailable | MembershipState::NotLoaded => {
                    Decision::Deny("membership could not be verified".to_string())
                }
            },
            Self::CreatorOverride => {
                let is_creator = eval.ride_created_by == Some(eval.auth.user_id);
                if is_creator && CREATOR_CAPABILITIES.contains(eval.capability) {
                    Decision::Grant
                } else {
                    Decision::Defer
                }
            }
            Self::MembershipMatrix => match eval.membership.active() {
                Some(_) if eval.club.contains(eval.capability) => Decision::Grant,
                Some(m) => Decision::Deny(format!(
                    "club role {} lacks {}",
                    m.role.as_str(),
                    eval.capability.tags().join(", ")
                )),
                None => Decision::Deny("membership could not be verified".to_string()),
            },
        }
    }
}

/// Authorization gate
pub struct AuthorizationGate<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthorizationGate<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Require a ride capability in a club
    ///
    /// # Errors
    /// `InsufficientPrivileges` when the chain denies
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn require_ride_capability(
        &self,
        capability: RideCapabilities,
        auth: &AuthContext,
        club_id: Snowflake,
        ride_id: Option<Snowflake>,
        ride_created_by: Option<Snowflake>,
    ) -> ServiceResult<()> {
        let resolver = CapabilityResolver::new(self.ctx);
        let mut eval = Evaluation {
            auth,
            system: resolver.derive_capabilities(auth),
            capability,
            club_id,
            ride_created_by,
            membership: MembershipState::NotLoaded,
            club: RideCapabilities::empty(),
        };

        for rule in RIDE_CAPABILITY_CHAIN {
            if rule.needs_membership() && eval.membership == MembershipState::NotLoaded {
                eval.membership = self.load_membership(club_id, auth.user_id).await;
                eval.club = eval
                    .membership
                    .active()
                    .map_or(RideCapabilities::empty(), |m| resolver.club_capabilities(m.role));
            }
            match rule.evaluate(&eval) {
                Decision::Grant => {
                    debug!(?rule, club_id = %club_id, ?ride_id, "Ride capability granted");
                    return Ok(());
                }
                Decision::Deny(reason) => return Err(Self::deny(rule, club_id, ride_id, reason)),
                Decision::Defer => {}
            }
        }

        Err(Self::deny(
            Rule::MembershipMatrix,
            club_id,
            ride_id,
            "no rule granted access".to_string(),
        ))
    }

    /// Require a capability on an existing ride, honouring its creator
    pub async fn require_for_ride(
        &self,
        capability: RideCapabilities,
        auth: &AuthContext,
        ride: &Ride,
    ) -> ServiceResult<()> {
        self.require_ride_capability(
            capability,
            auth,
            ride.club_id,
            Some(ride.id),
            Some(ride.created_by),
        )
        .await
    }

    /// Visibility of a ride to the caller. Never errors; any lookup failure hides the ride.
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn can_view_ride(
        &self,
        auth: &AuthContext,
        club_id: Snowflake,
        status: RideStatus,
        scope: RideScope,
        created_by: Snowflake,
        is_public: bool,
    ) -> bool {
        let resolver = CapabilityResolver::new(self.ctx);
        if resolver.has_system_capability(auth, SystemCapabilities::MANAGE_ALL_CLUBS) {
            return true;
        }
        if is_public && status == RideStatus::Published {
            return true;
        }
        if !auth.is_authenticated {
            return false;
        }

        // Only club rides exist; they require an active membership
        match scope {
            RideScope::Club => {}
        }
        let membership = self.load_membership(club_id, auth.user_id).await;
        let Some(membership) = membership.active() else {
            return false;
        };

        if status == RideStatus::Draft {
            created_by == auth.user_id
                || resolver
                    .club_capabilities(membership.role)
                    .contains(RideCapabilities::VIEW_DRAFT_RIDES)
        } else {
            true
        }
    }

    pub async fn can_view(&self, auth: &AuthContext, ride: &Ride) -> bool {
        self.can_view_ride(
            auth,
            ride.club_id,
            ride.status,
            ride.scope,
            ride.created_by,
            ride.is_public,
        )
        .await
    }

    /// Hidden rides are reported as missing so their existence does not leak
    pub async fn ensure_visible(&self, auth: &AuthContext, ride: &Ride) -> ServiceResult<()> {
        if self.can_view(auth, ride).await {
            Ok(())
        } else {
            Err(DomainError::RideNotFound(ride.id).into())
        }
    }

    async fn load_membership(&self, club_id: Snowflake, user_id: Snowflake) -> MembershipState {
        match self.ctx.memberships().find_membership(club_id, user_id).await {
            Ok(Some(membership)) => MembershipState::Found(membership),
            Ok(None) => MembershipState::Missing,
            Err(e) => {
                warn!(club_id = %club_id, user_id = %user_id, error = %e, "Membership lookup failed, denying");
                MembershipState::Unavailable
            }
        }
    }

    fn deny(
        rule: Rule,
        club_id: Snowflake,
        ride_id: Option<Snowflake>,
        reason: String,
    ) -> ServiceError {
        debug!(?rule, club_id = %club_id, ?ride_id, reason = %reason, "Ride capability denied");
        DomainError::InsufficientPrivileges(reason).into()
    }
}
