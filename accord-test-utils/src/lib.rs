//! Accord Test Utilities
//!
//! Centralized test infrastructure for the Accord workspace:
//! - In-memory mock implementations of every engine port
//! - A recording notification hub for event assertions
//! - Fixtures for common requests, reservations, and manifests

// Re-export core types for convenience
pub use accord_core::{
    AgentId, ConflictResolutionRequest, HandoffRecord, NewReservation, NotificationEvent,
    PortError, PriorityTier, ProjectId, Reservation, ReservationClaim, ReservationGrant,
    ReservationId, ReservationMode, ReservationRelease, ResourceIdentifier, ResourceManifest,
    StrategyKind, UrgencyLevel, WorkItemId,
};
pub use accord_engine::{
    CheckpointStore, MessageStore, NotificationHub, OutcomeHistory, OutcomeHistorySource,
    PortResult, PrioritySnapshot, PrioritySource, ReservationStore, StrategyOutcome,
    SubscriptionStore,
};

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

// ============================================================================
// PRIORITY SOURCE MOCKS
// ============================================================================

/// Priority source backed by a fixed map, with optional artificial latency.
#[derive(Default)]
pub struct StaticPrioritySource {
    snapshots: Mutex<HashMap<WorkItemId, PrioritySnapshot>>,
    latency: Option<Duration>,
}

impl StaticPrioritySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(self, work_item: WorkItemId, snapshot: PrioritySnapshot) -> Self {
        self.snapshots
            .lock()
            .expect("snapshots lock")
            .insert(work_item, snapshot);
        self
    }

    /// Delay every fetch; used to exercise per-branch timeouts.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait]
impl PrioritySource for StaticPrioritySource {
    async fn fetch_priority(&self, work_item: WorkItemId) -> PortResult<PrioritySnapshot> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.snapshots
            .lock()
            .expect("snapshots lock")
            .get(&work_item)
            .cloned()
            .ok_or_else(|| PortError::unavailable("priority", "work item not ranked"))
    }
}

/// Priority source that always reports itself unavailable.
pub struct FailingPrioritySource;

#[async_trait]
impl PrioritySource for FailingPrioritySource {
    async fn fetch_priority(&self, _work_item: WorkItemId) -> PortResult<PrioritySnapshot> {
        Err(PortError::unavailable("priority", "service down"))
    }
}

/// Build a priority snapshot with sensible defaults.
pub fn priority_snapshot(tier: PriorityTier) -> PrioritySnapshot {
    PrioritySnapshot {
        tier,
        urgency: UrgencyLevel::Normal,
        deadline: None,
        progress_percent: None,
        time_invested_ms: None,
        remaining_estimate_ms: None,
    }
}

// ============================================================================
// HISTORY SOURCE MOCKS
// ============================================================================

/// History source returning one fixed outcome set.
pub struct StaticHistorySource {
    enabled: bool,
    history: OutcomeHistory,
    latency: Option<Duration>,
}

impl StaticHistorySource {
    pub fn new(history: OutcomeHistory) -> Self {
        Self {
            enabled: true,
            history,
            latency: None,
        }
    }

    /// A history service that reports itself disabled.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            history: OutcomeHistory::default(),
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait]
impl OutcomeHistorySource for StaticHistorySource {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn outcome_history(
        &self,
        _resources: &[ResourceIdentifier],
    ) -> PortResult<OutcomeHistory> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.history.clone())
    }
}

/// Build a history with one strategy outcome at the given success/failure counts.
pub fn history_with_outcome(kind: StrategyKind, successes: usize, failures: usize) -> OutcomeHistory {
    OutcomeHistory {
        similar_conflict_count: successes + failures,
        strategy_outcomes: vec![StrategyOutcome {
            kind,
            success_count: successes,
            failure_count: failures,
            avg_resolution_time_ms: 90_000,
        }],
        relevance_score: 1.0,
    }
}

// ============================================================================
// RESERVATION STORE MOCK
// ============================================================================

/// In-memory reservation store with exclusive-mode conflict detection over
/// exact pattern overlap.
#[derive(Default)]
pub struct InMemoryReservationStore {
    reservations: Mutex<HashMap<ReservationId, Reservation>>,
    denied_agents: Mutex<Vec<AgentId>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every reservation grant for this agent, simulating a
    /// conflicting reservation appearing between release and re-create.
    pub fn deny_grants_for(&self, agent_id: AgentId) {
        self.denied_agents
            .lock()
            .expect("denied lock")
            .push(agent_id);
    }

    /// Seed a reservation directly, bypassing conflict checks.
    pub fn insert(&self, reservation: Reservation) {
        self.reservations
            .lock()
            .expect("reservations lock")
            .insert(reservation.reservation_id, reservation);
    }

    /// Every reservation currently held by an agent.
    pub fn held_by(&self, agent_id: AgentId) -> Vec<Reservation> {
        self.reservations
            .lock()
            .expect("reservations lock")
            .values()
            .filter(|r| r.agent_id == agent_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.reservations.lock().expect("reservations lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn get_reservation(&self, id: ReservationId) -> PortResult<Option<Reservation>> {
        Ok(self
            .reservations
            .lock()
            .expect("reservations lock")
            .get(&id)
            .cloned())
    }

    async fn release_reservation(
        &self,
        id: ReservationId,
        agent_id: AgentId,
    ) -> PortResult<ReservationRelease> {
        let mut reservations = self.reservations.lock().expect("reservations lock");
        match reservations.get(&id) {
            Some(r) if r.agent_id == agent_id => {
                reservations.remove(&id);
                Ok(ReservationRelease {
                    released: true,
                    error: None,
                })
            }
            Some(_) => Ok(ReservationRelease {
                released: false,
                error: Some("not the holder".to_string()),
            }),
            None => Ok(ReservationRelease {
                released: false,
                error: Some("not found".to_string()),
            }),
        }
    }

    async fn create_reservation(&self, new: NewReservation) -> PortResult<ReservationGrant> {
        if self
            .denied_agents
            .lock()
            .expect("denied lock")
            .contains(&new.agent_id)
        {
            return Ok(ReservationGrant {
                granted: false,
                conflicts: vec![],
            });
        }

        let mut reservations = self.reservations.lock().expect("reservations lock");
        let conflicts: Vec<Reservation> = reservations
            .values()
            .filter(|existing| {
                existing.project_id == new.project_id
                    && existing.agent_id != new.agent_id
                    && (existing.mode == ReservationMode::Exclusive
                        || new.mode == ReservationMode::Exclusive)
                    && existing.patterns.iter().any(|p| new.patterns.contains(p))
            })
            .cloned()
            .collect();

        if !conflicts.is_empty() {
            return Ok(ReservationGrant {
                granted: false,
                conflicts,
            });
        }

        let now = Utc::now();
        let reservation = Reservation {
            reservation_id: Uuid::now_v7(),
            project_id: new.project_id,
            agent_id: new.agent_id,
            patterns: new.patterns,
            mode: new.mode,
            reason: new.reason,
            task_id: new.task_id,
            acquired_at: now,
            expires_at: now
                + chrono::Duration::from_std(new.ttl)
                    .unwrap_or_else(|_| chrono::Duration::seconds(60)),
        };
        reservations.insert(reservation.reservation_id, reservation);
        Ok(ReservationGrant {
            granted: true,
            conflicts: vec![],
        })
    }

    async fn list_reservations(
        &self,
        project_id: ProjectId,
        agent_id: AgentId,
        limit: usize,
    ) -> PortResult<Vec<Reservation>> {
        Ok(self
            .reservations
            .lock()
            .expect("reservations lock")
            .values()
            .filter(|r| r.project_id == project_id && r.agent_id == agent_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Reservation store that fails every call; exercises degradation paths.
pub struct FailingReservationStore;

#[async_trait]
impl ReservationStore for FailingReservationStore {
    async fn get_reservation(&self, _id: ReservationId) -> PortResult<Option<Reservation>> {
        Err(PortError::unavailable("reservations", "store down"))
    }

    async fn release_reservation(
        &self,
        _id: ReservationId,
        _agent_id: AgentId,
    ) -> PortResult<ReservationRelease> {
        Err(PortError::unavailable("reservations", "store down"))
    }

    async fn create_reservation(&self, _new: NewReservation) -> PortResult<ReservationGrant> {
        Err(PortError::unavailable("reservations", "store down"))
    }

    async fn list_reservations(
        &self,
        _project_id: ProjectId,
        _agent_id: AgentId,
        _limit: usize,
    ) -> PortResult<Vec<Reservation>> {
        Err(PortError::unavailable("reservations", "store down"))
    }
}

// ============================================================================
// CHECKPOINT / MESSAGE / SUBSCRIPTION STUBS
// ============================================================================

/// Records ownership-transfer calls and fails the ids it is told to fail.
#[derive(Default)]
pub struct StubTransferStore {
    calls: Mutex<Vec<(Uuid, AgentId, AgentId)>>,
    failing: Mutex<Vec<Uuid>>,
}

impl StubTransferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make transfers of this id fail.
    pub fn fail_for(&self, id: Uuid) {
        self.failing.lock().expect("failing lock").push(id);
    }

    /// All recorded (id, from, to) calls, in order.
    pub fn calls(&self) -> Vec<(Uuid, AgentId, AgentId)> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, id: Uuid, from: AgentId, to: AgentId) -> PortResult<()> {
        if self.failing.lock().expect("failing lock").contains(&id) {
            return Err(PortError::rejected("transfer store", "configured failure"));
        }
        self.calls.lock().expect("calls lock").push((id, from, to));
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for StubTransferStore {
    async fn transfer_ownership(&self, id: Uuid, from: AgentId, to: AgentId) -> PortResult<()> {
        self.record(id, from, to)
    }
}

#[async_trait]
impl MessageStore for StubTransferStore {
    async fn forward_message(&self, id: Uuid, from: AgentId, to: AgentId) -> PortResult<()> {
        self.record(id, from, to)
    }
}

#[async_trait]
impl SubscriptionStore for StubTransferStore {
    async fn transfer_subscription(&self, id: Uuid, from: AgentId, to: AgentId) -> PortResult<()> {
        self.record(id, from, to)
    }
}

// ============================================================================
// NOTIFICATION HUB MOCK
// ============================================================================

/// Hub that records published events; can be told to fail every publish.
#[derive(Default)]
pub struct RecordingHub {
    events: Mutex<Vec<(String, NotificationEvent)>>,
    failing: bool,
}

impl RecordingHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hub whose every publish fails.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    /// All (channel, event) pairs published so far.
    pub fn events(&self) -> Vec<(String, NotificationEvent)> {
        self.events.lock().expect("events lock").clone()
    }

    /// Event-type tags published so far, in order.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .expect("events lock")
            .iter()
            .map(|(_, e)| e.event_type())
            .collect()
    }
}

#[async_trait]
impl NotificationHub for RecordingHub {
    async fn publish(&self, channel: &str, event: NotificationEvent) -> PortResult<()> {
        if self.failing {
            return Err(PortError::unavailable("hub", "publish refused"));
        }
        self.events
            .lock()
            .expect("events lock")
            .push((channel.to_string(), event));
        Ok(())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// A reservation held by `agent_id`, expiring `ttl_secs` from now.
pub fn reservation_for(
    project_id: ProjectId,
    agent_id: AgentId,
    patterns: Vec<String>,
    ttl_secs: i64,
) -> Reservation {
    let now = Utc::now();
    Reservation {
        reservation_id: Uuid::now_v7(),
        project_id,
        agent_id,
        patterns,
        mode: ReservationMode::Exclusive,
        reason: Some("test fixture".to_string()),
        task_id: None,
        acquired_at: now,
        expires_at: now + chrono::Duration::seconds(ttl_secs),
    }
}

/// A manifest claim mirroring a reservation.
pub fn claim_for(reservation: &Reservation) -> ReservationClaim {
    ReservationClaim {
        reservation_id: reservation.reservation_id,
        patterns: reservation.patterns.clone(),
        mode: reservation.mode,
        expires_at: reservation.expires_at,
    }
}

/// An acknowledged handoff carrying the given manifest.
pub fn acknowledged_handoff(
    project_id: ProjectId,
    source: AgentId,
    receiver: AgentId,
    manifest: ResourceManifest,
) -> HandoffRecord {
    HandoffRecord::new(source, project_id, manifest).acknowledge(receiver)
}
