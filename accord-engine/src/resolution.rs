//! Conflict resolution orchestration.
//!
//! `ResolutionEngine` composes input aggregation, strategy scoring,
//! confidence, risk, and eligibility into one operation, owns the
//! suggestion cache and audit trail through an injected store, and
//! contains every internal error behind a structured response.

use crate::aggregate::{gather_inputs, GatherOptions};
use crate::confidence::confidence_report;
use crate::eligibility::{check_eligibility, EligibilitySignals};
use crate::ports::{NotificationHub, OutcomeHistorySource, PrioritySource, ReservationStore};
use crate::rationale::render_rationale;
use crate::risk::assess_risks;
use crate::scoring::score_strategies;
use crate::state::ResolutionStore;
use accord_core::{
    conflict_channel, AccordResult, AutoResolutionCriteria, AutoResolutionUpdate, ConflictId,
    ConflictResolutionRequest, DurationMs, EngineConfig, NotificationEvent, ProjectId,
    ResolutionAuditRecord, ResolutionError, ResolutionResponse, ResolutionStrategy,
    ResolutionSuggestion,
};
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Maximum runner-up strategies attached to a suggestion.
const MAX_ALTERNATIVES: usize = 3;

/// Options for one resolution request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionOptions {
    /// Bypass the suggestion cache and recompute.
    pub force_recalculate: bool,
    /// Skip the historical-outcome lookup.
    pub skip_history_lookup: bool,
    /// Per-source fetch deadline; engine default when unset.
    pub timeout_ms: Option<DurationMs>,
}

/// The conflict resolution engine.
pub struct ResolutionEngine {
    priority_source: Arc<dyn PrioritySource>,
    history_source: Arc<dyn OutcomeHistorySource>,
    reservation_store: Arc<dyn ReservationStore>,
    hub: Arc<dyn NotificationHub>,
    store: Arc<ResolutionStore>,
    config: EngineConfig,
}

impl ResolutionEngine {
    /// Create an engine over the given collaborator ports.
    pub fn new(
        priority_source: Arc<dyn PrioritySource>,
        history_source: Arc<dyn OutcomeHistorySource>,
        reservation_store: Arc<dyn ReservationStore>,
        hub: Arc<dyn NotificationHub>,
        config: EngineConfig,
    ) -> AccordResult<Self> {
        config.validate()?;
        let store = Arc::new(ResolutionStore::new(config.audit_capacity));
        Ok(Self {
            priority_source,
            history_source,
            reservation_store,
            hub,
            store,
            config,
        })
    }

    /// Resolve a conflict into a ranked suggestion.
    ///
    /// Always returns a structured response; internal failures surface as
    /// `success: false` with an error message, never as an Err or a panic.
    #[instrument(skip(self, request, options), fields(conflict_id = %request.conflict_id))]
    pub async fn request_resolution(
        &self,
        request: &ConflictResolutionRequest,
        options: ResolutionOptions,
    ) -> ResolutionResponse {
        let started = Instant::now();

        if let Err(err) = request.validate() {
            return ResolutionResponse::failed(err.to_string());
        }

        if !options.force_recalculate {
            if let Some(hit) = self.store.suggestion(request.conflict_id, Utc::now()) {
                debug!(suggestion_id = %hit.suggestion_id, "suggestion cache hit");
                return ResolutionResponse::ok(hit);
            }
        }

        // Single-flight: concurrent misses for the same conflict serialize
        // here, and the losers pick up the winner's cached suggestion.
        let guard = self.store.flight_guard(request.conflict_id);
        let _flight = guard.lock().await;

        if !options.force_recalculate {
            if let Some(hit) = self.store.suggestion(request.conflict_id, Utc::now()) {
                debug!(suggestion_id = %hit.suggestion_id, "suggestion computed by concurrent request");
                return ResolutionResponse::ok(hit);
            }
        }

        match self.compute_suggestion(request, options, started).await {
            Ok(suggestion) => ResolutionResponse::ok(suggestion),
            Err(err) => {
                warn!(
                    error = %err,
                    processing_ms = started.elapsed().as_millis() as i64,
                    "resolution failed"
                );
                ResolutionResponse::failed(err.to_string())
            }
        }
    }

    async fn compute_suggestion(
        &self,
        request: &ConflictResolutionRequest,
        options: ResolutionOptions,
        started: Instant,
    ) -> AccordResult<ResolutionSuggestion> {
        let timeout_ms = options
            .timeout_ms
            .unwrap_or(self.config.default_fetch_timeout_ms)
            .max(1) as u64;
        let gather_options = GatherOptions {
            skip_history_lookup: options.skip_history_lookup,
            timeout: Duration::from_millis(timeout_ms),
        };

        let inputs = gather_inputs(
            self.priority_source.as_ref(),
            self.history_source.as_ref(),
            self.reservation_store.as_ref(),
            request,
            gather_options,
        )
        .await;

        let now = Utc::now();
        let mut strategies = score_strategies(request, &inputs, now);
        if strategies.is_empty() {
            // Unreachable in practice: escalate has no prerequisites.
            return Err(ResolutionError::NoViableStrategy.into());
        }

        let recommended = strategies.remove(0);
        let alternatives: Vec<_> = strategies.into_iter().take(MAX_ALTERNATIVES).collect();

        let confidence =
            confidence_report(&recommended, &request.contested_resources, &inputs, now);
        let risks = assess_risks(recommended.kind(), &request.contested_resources);

        let criteria = self.store.criteria().await;
        let eligibility = check_eligibility(
            &criteria,
            &EligibilitySignals {
                strategy: recommended.kind(),
                estimated_wait_ms: match &recommended.strategy {
                    ResolutionStrategy::Wait(params) => Some(params.estimated_wait_ms),
                    _ => None,
                },
                confidence: confidence.value,
                has_critical_resource: request.has_critical_resource(),
                prior_failed_attempts: 0,
                both_agents_enabled: None,
            },
        );

        let rationale = render_rationale(&recommended, &confidence, &risks, &inputs);

        let estimated_resolution_time_ms = recommended.expected_outcome.estimated_time_ms;
        let strategy_kind = recommended.kind();
        let suggestion = ResolutionSuggestion {
            suggestion_id: Uuid::now_v7(),
            conflict_id: request.conflict_id,
            recommended,
            alternatives,
            confidence: confidence.clone(),
            rationale,
            auto_resolution_eligible: eligibility.eligible,
            estimated_resolution_time_ms,
            risks,
            created_at: now,
            expires_at: now + ChronoDuration::milliseconds(self.config.suggestion_ttl_ms),
        };

        self.store.store_suggestion(suggestion.clone());

        let processing_ms = started.elapsed().as_millis() as DurationMs;
        self.store
            .append_audit(ResolutionAuditRecord::new(
                Uuid::now_v7(),
                request.conflict_id,
                suggestion.suggestion_id,
                strategy_kind,
                confidence.value,
                inputs.source_flags(),
                processing_ms,
            ))
            .await;

        self.publish_conflict_event(
            request.project_id,
            NotificationEvent::ResolutionSuggested {
                conflict_id: request.conflict_id,
                suggestion: suggestion.clone(),
            },
        )
        .await;

        debug!(
            suggestion_id = %suggestion.suggestion_id,
            strategy = %strategy_kind,
            confidence = confidence.value,
            processing_ms,
            "resolution suggested"
        );

        Ok(suggestion)
    }

    /// Remove a cached suggestion; returns whether one was present.
    pub fn invalidate_suggestion(&self, conflict_id: ConflictId) -> bool {
        self.store.invalidate(conflict_id)
    }

    /// The most recent `limit` audit records.
    pub async fn audit_records(&self, limit: usize) -> Vec<ResolutionAuditRecord> {
        self.store.recent_audit(limit).await
    }

    /// Read the live auto-resolution criteria.
    pub async fn auto_resolution_criteria(&self) -> AutoResolutionCriteria {
        self.store.criteria().await
    }

    /// Merge a partial update into the live criteria, validating the result
    /// before it replaces the single live copy.
    pub async fn update_auto_resolution_criteria(
        &self,
        update: AutoResolutionUpdate,
    ) -> AccordResult<AutoResolutionCriteria> {
        let merged = self.store.criteria().await.merged(&update);
        merged.validate()?;
        self.store.set_criteria(merged.clone()).await;
        Ok(merged)
    }

    /// Drop expired cache entries.
    pub fn prune_expired_suggestions(&self) -> usize {
        self.store.prune_expired(Utc::now())
    }

    /// Reset cache, audit trail, and criteria to defaults. Test support.
    pub async fn clear_resolution_state(&self) {
        self.store.reset().await;
    }

    async fn publish_conflict_event(&self, project_id: ProjectId, event: NotificationEvent) {
        let channel = conflict_channel(&self.config.conflict_channel_prefix, project_id);
        let event_type = event.event_type();
        if let Err(err) = self.hub.publish(&channel, event).await {
            // Best-effort: a dead hub never fails a resolution.
            warn!(channel = %channel, event_type, error = %err, "event publish failed");
        }
    }
}
