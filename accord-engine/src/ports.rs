//! Collaborator ports.
//!
//! The engine never talks to storage, priority ranking, history search, or
//! the notification hub directly; it consumes these traits. Implementations
//! live with their owning subsystems, and accord-test-utils provides
//! in-memory versions for tests.

use accord_core::{
    AgentId, CheckpointId, MessageId, NewReservation, NotificationEvent, PortError, PriorityTier,
    ProjectId, Reservation, ReservationGrant, ReservationId, ReservationRelease,
    ResourceIdentifier, StrategyKind, SubscriptionId, Timestamp, UrgencyLevel, WorkItemId,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result alias for port calls.
pub type PortResult<T> = Result<T, PortError>;

/// Priority ranking for one work item, as reported by the priority service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritySnapshot {
    pub tier: PriorityTier,
    pub urgency: UrgencyLevel,
    pub deadline: Option<Timestamp>,
    /// Progress of the work item in percent, when the agent reports it.
    pub progress_percent: Option<f64>,
    pub time_invested_ms: Option<i64>,
    pub remaining_estimate_ms: Option<i64>,
}

/// Aggregated outcomes of past conflicts over similar resources.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutcomeHistory {
    pub similar_conflict_count: usize,
    pub strategy_outcomes: Vec<StrategyOutcome>,
    /// How closely the past conflicts match this resource set, 0.0-1.0.
    pub relevance_score: f64,
}

/// Past outcomes of one strategy kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyOutcome {
    pub kind: StrategyKind,
    pub success_count: usize,
    pub failure_count: usize,
    pub avg_resolution_time_ms: i64,
}

impl OutcomeHistory {
    /// Historical success rate for a strategy kind, when any samples exist.
    pub fn success_rate(&self, kind: StrategyKind) -> Option<f64> {
        let outcome = self.strategy_outcomes.iter().find(|o| o.kind == kind)?;
        let total = outcome.success_count + outcome.failure_count;
        if total == 0 {
            return None;
        }
        Some(outcome.success_count as f64 / total as f64)
    }

    /// Number of historical samples for a strategy kind.
    pub fn sample_size(&self, kind: StrategyKind) -> usize {
        self.strategy_outcomes
            .iter()
            .find(|o| o.kind == kind)
            .map(|o| o.success_count + o.failure_count)
            .unwrap_or(0)
    }
}

/// Source of work-item priority rankings.
#[async_trait]
pub trait PrioritySource: Send + Sync {
    async fn fetch_priority(&self, work_item: WorkItemId) -> PortResult<PrioritySnapshot>;
}

/// Source of historical conflict-outcome statistics.
#[async_trait]
pub trait OutcomeHistorySource: Send + Sync {
    /// Whether the history service is available at all; checked before
    /// issuing a lookup.
    fn is_enabled(&self) -> bool;

    async fn outcome_history(
        &self,
        resources: &[ResourceIdentifier],
    ) -> PortResult<OutcomeHistory>;
}

/// The reservation storage engine, at its interface boundary.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn get_reservation(&self, id: ReservationId) -> PortResult<Option<Reservation>>;

    async fn release_reservation(
        &self,
        id: ReservationId,
        agent_id: AgentId,
    ) -> PortResult<ReservationRelease>;

    async fn create_reservation(&self, new: NewReservation) -> PortResult<ReservationGrant>;

    async fn list_reservations(
        &self,
        project_id: ProjectId,
        agent_id: AgentId,
        limit: usize,
    ) -> PortResult<Vec<Reservation>>;
}

/// Checkpoint store; only ownership transfer is needed here.
/// Implementations are supplied by the surrounding system.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn transfer_ownership(
        &self,
        checkpoint_id: CheckpointId,
        from: AgentId,
        to: AgentId,
    ) -> PortResult<()>;
}

/// Message store; pending messages are forwarded to the receiving agent.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn forward_message(
        &self,
        message_id: MessageId,
        from: AgentId,
        to: AgentId,
    ) -> PortResult<()>;
}

/// Subscription store; active subscriptions are re-pointed to the receiver.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn transfer_subscription(
        &self,
        subscription_id: SubscriptionId,
        from: AgentId,
        to: AgentId,
    ) -> PortResult<()>;
}

/// Workspace notification hub. Publishing is best-effort: the engine logs
/// failures and moves on.
#[async_trait]
pub trait NotificationHub: Send + Sync {
    async fn publish(&self, channel: &str, event: NotificationEvent) -> PortResult<()>;
}
