//! Engine state: suggestion cache, audit ring, and live criteria.
//!
//! All process-wide mutable state lives in this one store, constructed
//! explicitly and injected into the engine. Suggestions are short-lived by
//! design and the audit ring is bounded; nothing here survives a restart.

use accord_core::{
    AutoResolutionCriteria, ConflictId, ResolutionAuditRecord, ResolutionSuggestion, Timestamp,
};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Mutable engine state with an explicit `reset` for tests.
pub struct ResolutionStore {
    suggestions: DashMap<ConflictId, ResolutionSuggestion>,
    audit: Mutex<VecDeque<ResolutionAuditRecord>>,
    criteria: RwLock<AutoResolutionCriteria>,
    audit_capacity: usize,
    /// Per-conflict guards serializing cache-miss recomputation.
    flights: DashMap<ConflictId, Arc<Mutex<()>>>,
}

impl ResolutionStore {
    pub fn new(audit_capacity: usize) -> Self {
        Self {
            suggestions: DashMap::new(),
            audit: Mutex::new(VecDeque::with_capacity(audit_capacity.min(64))),
            criteria: RwLock::new(AutoResolutionCriteria::default()),
            audit_capacity,
            flights: DashMap::new(),
        }
    }

    /// Look up an unexpired suggestion. Expired entries are removed and
    /// treated as absent, never returned stale.
    pub fn suggestion(&self, conflict_id: ConflictId, now: Timestamp) -> Option<ResolutionSuggestion> {
        let entry = self.suggestions.get(&conflict_id)?;
        if entry.is_expired(now) {
            drop(entry);
            self.suggestions.remove(&conflict_id);
            return None;
        }
        Some(entry.clone())
    }

    /// Cache a suggestion, replacing any prior entry for the conflict.
    pub fn store_suggestion(&self, suggestion: ResolutionSuggestion) {
        self.suggestions.insert(suggestion.conflict_id, suggestion);
    }

    /// Remove a cached suggestion; returns whether one was present.
    pub fn invalidate(&self, conflict_id: ConflictId) -> bool {
        self.suggestions.remove(&conflict_id).is_some()
    }

    /// Drop every expired suggestion. Maintenance hook for long-lived engines.
    pub fn prune_expired(&self, now: Timestamp) -> usize {
        let before = self.suggestions.len();
        self.suggestions.retain(|_, s| !s.is_expired(now));
        // Guards for conflicts with no live suggestion are recreated on
        // demand; dropping them keeps the map bounded by active conflicts.
        self.flights
            .retain(|conflict_id, _| self.suggestions.contains_key(conflict_id));
        before - self.suggestions.len()
    }

    /// Append an audit record, evicting the oldest beyond capacity.
    pub async fn append_audit(&self, record: ResolutionAuditRecord) {
        let mut audit = self.audit.lock().await;
        if audit.len() == self.audit_capacity {
            audit.pop_front();
        }
        audit.push_back(record);
    }

    /// The most recent `limit` audit records, newest last.
    pub async fn recent_audit(&self, limit: usize) -> Vec<ResolutionAuditRecord> {
        let audit = self.audit.lock().await;
        let skip = audit.len().saturating_sub(limit);
        audit.iter().skip(skip).cloned().collect()
    }

    pub async fn criteria(&self) -> AutoResolutionCriteria {
        self.criteria.read().await.clone()
    }

    /// Replace the live criteria wholesale.
    pub async fn set_criteria(&self, criteria: AutoResolutionCriteria) {
        *self.criteria.write().await = criteria;
    }

    /// The single-flight guard for a conflict id.
    pub fn flight_guard(&self, conflict_id: ConflictId) -> Arc<Mutex<()>> {
        self.flights
            .entry(conflict_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Reset cache, audit log, and criteria to defaults. Test support only.
    pub async fn reset(&self) {
        self.suggestions.clear();
        self.flights.clear();
        self.audit.lock().await.clear();
        *self.criteria.write().await = AutoResolutionCriteria::default();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::{
        ConfidenceReport, ExpectedOutcome, ImpactLevel, InputSourceFlags, ResolutionStrategy,
        ScoredStrategy, StrategyKind, WaitParams,
    };
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn suggestion(conflict_id: ConflictId, ttl_ms: i64) -> ResolutionSuggestion {
        let now = Utc::now();
        ResolutionSuggestion {
            suggestion_id: Uuid::now_v7(),
            conflict_id,
            recommended: ScoredStrategy::new(
                ResolutionStrategy::Wait(WaitParams {
                    estimated_wait_ms: 60_000,
                    polling_interval_ms: 30_000,
                    timeout_ms: 300_000,
                }),
                70.0,
                vec![],
                ExpectedOutcome {
                    success_probability: 0.85,
                    estimated_time_ms: 60_000,
                    requester_impact: ImpactLevel::Medium,
                    holder_impact: ImpactLevel::None,
                    side_effects: vec![],
                },
            ),
            alternatives: vec![],
            confidence: ConfidenceReport {
                value: 70.0,
                breakdown: vec![],
            },
            rationale: String::new(),
            auto_resolution_eligible: false,
            estimated_resolution_time_ms: 60_000,
            risks: vec![],
            created_at: now,
            expires_at: now + Duration::milliseconds(ttl_ms),
        }
    }

    fn audit_record(conflict_id: ConflictId) -> ResolutionAuditRecord {
        ResolutionAuditRecord::new(
            Uuid::now_v7(),
            conflict_id,
            Uuid::now_v7(),
            StrategyKind::Wait,
            70.0,
            InputSourceFlags::default(),
            5,
        )
    }

    #[test]
    fn test_expired_suggestion_treated_as_absent() {
        let store = ResolutionStore::new(10);
        let conflict_id = Uuid::now_v7();
        store.store_suggestion(suggestion(conflict_id, -1));
        assert!(store.suggestion(conflict_id, Utc::now()).is_none());
        // the expired entry was evicted, not merely hidden
        assert_eq!(store.suggestions.len(), 0);
    }

    #[test]
    fn test_store_overwrites_prior_entry() {
        let store = ResolutionStore::new(10);
        let conflict_id = Uuid::now_v7();
        let first = suggestion(conflict_id, 30_000);
        let second = suggestion(conflict_id, 30_000);
        store.store_suggestion(first);
        store.store_suggestion(second.clone());
        let cached = store.suggestion(conflict_id, Utc::now()).unwrap();
        assert_eq!(cached.suggestion_id, second.suggestion_id);
    }

    #[test]
    fn test_prune_expired_counts_removals() {
        let store = ResolutionStore::new(10);
        store.store_suggestion(suggestion(Uuid::now_v7(), -1));
        store.store_suggestion(suggestion(Uuid::now_v7(), 30_000));
        assert_eq!(store.prune_expired(Utc::now()), 1);
    }

    #[tokio::test]
    async fn test_audit_ring_is_bounded() {
        let store = ResolutionStore::new(3);
        let mut ids = Vec::new();
        for _ in 0..5 {
            let record = audit_record(Uuid::now_v7());
            ids.push(record.audit_id);
            store.append_audit(record).await;
        }
        let recent = store.recent_audit(10).await;
        assert_eq!(recent.len(), 3);
        // the two oldest were evicted
        assert_eq!(recent[0].audit_id, ids[2]);
        assert_eq!(recent[2].audit_id, ids[4]);
    }

    #[tokio::test]
    async fn test_recent_audit_returns_newest() {
        let store = ResolutionStore::new(10);
        for _ in 0..4 {
            store.append_audit(audit_record(Uuid::now_v7())).await;
        }
        let recent = store.recent_audit(2).await;
        assert_eq!(recent.len(), 2);
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let store = ResolutionStore::new(10);
        let conflict_id = Uuid::now_v7();
        store.store_suggestion(suggestion(conflict_id, 30_000));
        store.append_audit(audit_record(conflict_id)).await;
        store
            .set_criteria(AutoResolutionCriteria {
                min_confidence: 99.0,
                ..Default::default()
            })
            .await;

        store.reset().await;
        assert!(store.suggestion(conflict_id, Utc::now()).is_none());
        assert!(store.recent_audit(10).await.is_empty());
        assert_eq!(store.criteria().await, AutoResolutionCriteria::default());
    }
}
