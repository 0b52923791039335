//! Input data aggregation.
//!
//! Four independent fetches run concurrently: requester priority, holder
//! priority, historical outcomes, and the holder's active reservations.
//! Each branch carries its own deadline and degrades to `None` on any
//! failure; a dead collaborator costs one signal, never the aggregation.

use crate::ports::{
    OutcomeHistory, OutcomeHistorySource, PrioritySnapshot, PrioritySource, ReservationStore,
};
use accord_core::{
    ConflictResolutionRequest, InputSourceFlags, PriorityTier, Reservation, Timestamp, WorkItemId,
};
use chrono::Duration as ChronoDuration;
use std::time::Duration;
use tracing::debug;

/// Upper bound on reservations fetched per holder.
const RESERVATION_FETCH_LIMIT: usize = 50;

/// Options for one aggregation run.
#[derive(Debug, Clone, Copy)]
pub struct GatherOptions {
    /// Skip the historical-outcome lookup entirely.
    pub skip_history_lookup: bool,
    /// Per-branch deadline; a branch that misses it degrades to `None`.
    pub timeout: Duration,
}

impl Default for GatherOptions {
    fn default() -> Self {
        Self {
            skip_history_lookup: false,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Whatever the four input sources produced; every field independently optional.
#[derive(Debug, Clone, Default)]
pub struct ResolutionInputs {
    pub requester_priority: Option<PrioritySnapshot>,
    pub holder_priority: Option<PrioritySnapshot>,
    pub history: Option<OutcomeHistory>,
    pub holder_reservations: Option<Vec<Reservation>>,
}

impl ResolutionInputs {
    /// Which sources produced data, for the audit record.
    pub fn source_flags(&self) -> InputSourceFlags {
        InputSourceFlags {
            requester_priority: self.requester_priority.is_some(),
            holder_priority: self.holder_priority.is_some(),
            history: self.history.is_some(),
            holder_reservations: self.holder_reservations.is_some(),
        }
    }

    /// Deadline pressure: the requester's deadline is within 24 hours, or
    /// its priority is P0/P1.
    pub fn deadline_pressure(&self, now: Timestamp) -> bool {
        let Some(priority) = &self.requester_priority else {
            return false;
        };
        if matches!(priority.tier, PriorityTier::P0 | PriorityTier::P1) {
            return true;
        }
        priority
            .deadline
            .is_some_and(|deadline| deadline - now <= ChronoDuration::hours(24))
    }

    /// Holder progress percentage, when the priority source reported it.
    pub fn holder_progress(&self) -> Option<f64> {
        self.holder_priority.as_ref()?.progress_percent
    }

    /// The holder's soonest-expiring active reservation, when known.
    pub fn earliest_holder_expiry(&self) -> Option<Timestamp> {
        self.holder_reservations
            .as_ref()?
            .iter()
            .map(|r| r.expires_at)
            .min()
    }
}

async fn fetch_priority_branch(
    source: &dyn PrioritySource,
    work_item: Option<WorkItemId>,
    timeout: Duration,
    label: &str,
) -> Option<PrioritySnapshot> {
    let work_item = work_item?;
    match tokio::time::timeout(timeout, source.fetch_priority(work_item)).await {
        Ok(Ok(snapshot)) => Some(snapshot),
        Ok(Err(err)) => {
            debug!(source = label, %work_item, error = %err, "priority fetch degraded");
            None
        }
        Err(_) => {
            debug!(source = label, %work_item, "priority fetch timed out");
            None
        }
    }
}

/// Gather all four input signals concurrently.
///
/// The join is fan-out/fan-in: total latency is bounded by the slowest
/// branch, and branches never see each other's failures.
pub async fn gather_inputs(
    priority_source: &dyn PrioritySource,
    history_source: &dyn OutcomeHistorySource,
    reservation_store: &dyn ReservationStore,
    request: &ConflictResolutionRequest,
    options: GatherOptions,
) -> ResolutionInputs {
    let requester_branch = fetch_priority_branch(
        priority_source,
        request.requesting_work_item_id,
        options.timeout,
        "requester_priority",
    );

    let holder_branch = fetch_priority_branch(
        priority_source,
        request.holding_work_item_id,
        options.timeout,
        "holder_priority",
    );

    let history_branch = async {
        if options.skip_history_lookup || !history_source.is_enabled() {
            return None;
        }
        match tokio::time::timeout(
            options.timeout,
            history_source.outcome_history(&request.contested_resources),
        )
        .await
        {
            Ok(Ok(history)) => Some(history),
            Ok(Err(err)) => {
                debug!(error = %err, "outcome history degraded");
                None
            }
            Err(_) => {
                debug!("outcome history timed out");
                None
            }
        }
    };

    let reservations_branch = async {
        let holder = request.holding_agent_id?;
        match tokio::time::timeout(
            options.timeout,
            reservation_store.list_reservations(
                request.project_id,
                holder,
                RESERVATION_FETCH_LIMIT,
            ),
        )
        .await
        {
            Ok(Ok(reservations)) => Some(reservations),
            Ok(Err(err)) => {
                debug!(holder = %holder, error = %err, "reservation listing degraded");
                None
            }
            Err(_) => {
                debug!(holder = %holder, "reservation listing timed out");
                None
            }
        }
    };

    let (requester_priority, holder_priority, history, holder_reservations) = tokio::join!(
        requester_branch,
        holder_branch,
        history_branch,
        reservations_branch
    );

    ResolutionInputs {
        requester_priority,
        holder_priority,
        history,
        holder_reservations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::UrgencyLevel;
    use chrono::Utc;

    fn snapshot(tier: PriorityTier, deadline: Option<Timestamp>) -> PrioritySnapshot {
        PrioritySnapshot {
            tier,
            urgency: UrgencyLevel::Normal,
            deadline,
            progress_percent: None,
            time_invested_ms: None,
            remaining_estimate_ms: None,
        }
    }

    #[test]
    fn test_deadline_pressure_from_tier() {
        let inputs = ResolutionInputs {
            requester_priority: Some(snapshot(PriorityTier::P1, None)),
            ..Default::default()
        };
        assert!(inputs.deadline_pressure(Utc::now()));
    }

    #[test]
    fn test_deadline_pressure_from_near_deadline() {
        let now = Utc::now();
        let inputs = ResolutionInputs {
            requester_priority: Some(snapshot(
                PriorityTier::P3,
                Some(now + ChronoDuration::hours(6)),
            )),
            ..Default::default()
        };
        assert!(inputs.deadline_pressure(now));
    }

    #[test]
    fn test_no_deadline_pressure_without_signals() {
        let now = Utc::now();
        let inputs = ResolutionInputs::default();
        assert!(!inputs.deadline_pressure(now));

        let far = ResolutionInputs {
            requester_priority: Some(snapshot(
                PriorityTier::P3,
                Some(now + ChronoDuration::days(7)),
            )),
            ..Default::default()
        };
        assert!(!far.deadline_pressure(now));
    }

    #[test]
    fn test_source_flags_reflect_availability() {
        let inputs = ResolutionInputs {
            requester_priority: Some(snapshot(PriorityTier::P2, None)),
            holder_reservations: Some(vec![]),
            ..Default::default()
        };
        let flags = inputs.source_flags();
        assert!(flags.requester_priority);
        assert!(!flags.holder_priority);
        assert!(!flags.history);
        assert!(flags.holder_reservations);
        assert_eq!(flags.available_count(), 2);
    }
}
