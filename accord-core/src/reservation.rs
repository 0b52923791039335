//! Reservation data as consumed from the reservation store.
//!
//! The storage engine itself lives elsewhere; these are the shapes the
//! transfer orchestrator reads and writes across that boundary.

use crate::{AgentId, ProjectId, ReservationId, ReservationMode, Timestamp};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A file reservation held by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Reservation {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub reservation_id: ReservationId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_id: ProjectId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    /// Glob patterns the reservation covers.
    pub patterns: Vec<String>,
    pub mode: ReservationMode,
    pub reason: Option<String>,
    pub task_id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub acquired_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub expires_at: Timestamp,
}

impl Reservation {
    /// Check if the reservation has expired based on current time.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Calculate remaining duration until expiry.
    pub fn remaining_ttl(&self, now: Timestamp) -> Option<Duration> {
        if now >= self.expires_at {
            None
        } else {
            let duration = self.expires_at - now;
            duration.to_std().ok()
        }
    }
}

/// Parameters for creating a reservation in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewReservation {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_id: ProjectId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    pub patterns: Vec<String>,
    pub mode: ReservationMode,
    #[cfg_attr(feature = "openapi", schema(value_type = u64))]
    pub ttl: Duration,
    pub reason: Option<String>,
    pub task_id: Option<String>,
}

/// Store response to a reservation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReservationGrant {
    pub granted: bool,
    /// Existing reservations that blocked the grant, when not granted.
    pub conflicts: Vec<Reservation>,
}

/// Store response to a reservation release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReservationRelease {
    pub released: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn make_reservation(ttl_secs: i64) -> Reservation {
        let now = Utc::now();
        Reservation {
            reservation_id: Uuid::now_v7(),
            project_id: Uuid::now_v7(),
            agent_id: Uuid::now_v7(),
            patterns: vec!["src/**/*.rs".to_string()],
            mode: ReservationMode::Exclusive,
            reason: Some("refactor".to_string()),
            task_id: None,
            acquired_at: now,
            expires_at: now + chrono::Duration::seconds(ttl_secs),
        }
    }

    #[test]
    fn test_remaining_ttl_positive() {
        let reservation = make_reservation(300);
        let remaining = reservation.remaining_ttl(Utc::now()).unwrap();
        assert!(remaining <= Duration::from_secs(300));
        assert!(remaining > Duration::from_secs(290));
    }

    #[test]
    fn test_remaining_ttl_expired() {
        let reservation = make_reservation(-10);
        assert!(reservation.is_expired(Utc::now()));
        assert!(reservation.remaining_ttl(Utc::now()).is_none());
    }
}
