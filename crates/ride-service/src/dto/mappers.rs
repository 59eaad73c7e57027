//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs.

use ride_core::{Page, Participation, Ride};

use super::responses::{ParticipationResponse, RidePageResponse, RideResponse};

// ============================================================================
// Ride Mappers
// ============================================================================

impl From<&Ride> for RideResponse {
    fn from(ride: &Ride) -> Self {
        Self {
            id: ride.id,
            club_id: ride.club_id,
            title: ride.title.clone(),
            description: ride.description.clone(),
            status: ride.status,
            scope: ride.scope,
            audience: ride.audience,
            start_date_time: ride.start_date_time,
            estimated_duration_minutes: ride.estimated_duration_minutes,
            max_participants: ride.max_participants,
            current_participants: ride.current_participants,
            waitlist_count: ride.waitlist_count,
            remaining_slots: ride.remaining_slots(),
            allow_waitlist: ride.allow_waitlist,
            is_public: ride.is_public,
            created_by: ride.created_by,
            published_by: ride.published_by,
            published_at: ride.published_at,
            cancellation_reason: ride.cancellation_reason.clone(),
            created_at: ride.created_at,
            updated_at: ride.updated_at,
        }
    }
}

impl From<Ride> for RideResponse {
    fn from(ride: Ride) -> Self {
        Self::from(&ride)
    }
}

impl From<Page<Ride>> for RidePageResponse {
    fn from(page: Page<Ride>) -> Self {
        Self {
            rides: page.items.iter().map(RideResponse::from).collect(),
            next_cursor: page.next_cursor.map(|cursor| cursor.as_str().to_string()),
        }
    }
}

// ============================================================================
// Participation Mappers
// ============================================================================

impl From<&Participation> for ParticipationResponse {
    fn from(p: &Participation) -> Self {
        Self {
            id: p.id,
            ride_id: p.ride_id,
            club_id: p.club_id,
            user_id: p.user_id,
            role: p.role,
            status: p.status,
            waitlist_position: p.waitlist_position,
            message: p.message.clone(),
            joined_at: p.joined_at,
            attendance_status: p.attendance_status,
            evidence: p.evidence.clone(),
            updated_at: p.updated_at,
        }
    }
}

impl From<Participation> for ParticipationResponse {
    fn from(p: Participation) -> Self {
        Self::from(&p)
    }
}
