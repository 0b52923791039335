//! Conflict resolution entities: requests, suggestions, risks, criteria,
//! and the audit trail.

use crate::{
    AccordResult, AgentId, AuditRecordId, ConfigError, ConflictId, CorrelationId, DurationMs,
    ProjectId, ResourceKind, RiskCategory, RiskSeverity, ScoredStrategy, StrategyKind,
    SuggestionId, Timestamp, UrgencyLevel, ValidationError, WorkItemId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contested file, directory, or pattern inside the shared workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResourceIdentifier {
    pub path: String,
    pub kind: ResourceKind,
    /// Critical resources disable auto-resolution and raise a data-loss risk.
    pub critical: bool,
}

impl ResourceIdentifier {
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ResourceKind::File,
            critical: false,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ResourceKind::Directory,
            critical: false,
        }
    }

    pub fn pattern(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ResourceKind::Pattern,
            critical: false,
        }
    }

    /// Mark the resource as critical.
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }
}

/// A request to resolve contention between two agents over a resource set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConflictResolutionRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub conflict_id: ConflictId,
    /// Project workspace the conflict lives in; scopes notification channels
    /// and reservation lookups.
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_id: ProjectId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub requesting_agent_id: AgentId,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub holding_agent_id: Option<AgentId>,
    /// Priority-source key for the requesting agent's work item.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub requesting_work_item_id: Option<WorkItemId>,
    /// Priority-source key for the holding agent's work item.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub holding_work_item_id: Option<WorkItemId>,
    pub contested_resources: Vec<ResourceIdentifier>,
    /// Caller-preferred strategies, most preferred first.
    pub preferred_strategies: Vec<StrategyKind>,
    pub urgency_override: Option<UrgencyLevel>,
}

impl ConflictResolutionRequest {
    /// Create a request for a single requesting agent.
    pub fn new(
        conflict_id: ConflictId,
        project_id: ProjectId,
        requesting_agent_id: AgentId,
        contested_resources: Vec<ResourceIdentifier>,
    ) -> Self {
        Self {
            conflict_id,
            project_id,
            requesting_agent_id,
            holding_agent_id: None,
            requesting_work_item_id: None,
            holding_work_item_id: None,
            contested_resources,
            preferred_strategies: Vec::new(),
            urgency_override: None,
        }
    }

    /// Set the holding agent.
    pub fn with_holder(mut self, holding_agent_id: AgentId) -> Self {
        self.holding_agent_id = Some(holding_agent_id);
        self
    }

    /// Set the priority-source keys for both sides.
    pub fn with_work_items(
        mut self,
        requesting: Option<WorkItemId>,
        holding: Option<WorkItemId>,
    ) -> Self {
        self.requesting_work_item_id = requesting;
        self.holding_work_item_id = holding;
        self
    }

    /// Set preferred strategies, most preferred first.
    pub fn with_preferred_strategies(mut self, preferred: Vec<StrategyKind>) -> Self {
        self.preferred_strategies = preferred;
        self
    }

    /// Override the urgency for this request.
    pub fn with_urgency(mut self, urgency: UrgencyLevel) -> Self {
        self.urgency_override = Some(urgency);
        self
    }

    /// Whether any contested resource is marked critical.
    pub fn has_critical_resource(&self) -> bool {
        self.contested_resources.iter().any(|r| r.critical)
    }

    /// Validate the request before resolution.
    pub fn validate(&self) -> AccordResult<()> {
        if self.contested_resources.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "contested_resources".to_string(),
            }
            .into());
        }
        if self.holding_agent_id == Some(self.requesting_agent_id) {
            return Err(ValidationError::InvalidValue {
                field: "holding_agent_id".to_string(),
                reason: "an agent cannot contend with itself".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// One assessed risk of applying a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RiskAssessment {
    pub category: RiskCategory,
    pub severity: RiskSeverity,
    pub description: String,
    /// Probability of the risk materializing, 0-100.
    pub probability: f64,
    pub mitigation: String,
}

/// One contributing factor in a confidence breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConfidenceFactor {
    pub signal: String,
    /// Signed contribution to the confidence value.
    pub delta: f64,
}

/// Confidence in the recommended strategy, with the signals that built it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConfidenceReport {
    /// Confidence value in [0, 100].
    pub value: f64,
    pub breakdown: Vec<ConfidenceFactor>,
}

/// Which of the four aggregated input sources produced data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InputSourceFlags {
    pub requester_priority: bool,
    pub holder_priority: bool,
    pub history: bool,
    pub holder_reservations: bool,
}

impl InputSourceFlags {
    /// Number of sources that produced data.
    pub fn available_count(&self) -> usize {
        [
            self.requester_priority,
            self.holder_priority,
            self.history,
            self.holder_reservations,
        ]
        .iter()
        .filter(|b| **b)
        .count()
    }
}

/// Process-wide criteria gating auto-resolution.
///
/// Exactly one live copy exists per engine; updates replace it wholesale
/// through `update_auto_resolution_criteria`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AutoResolutionCriteria {
    /// Minimum confidence for auto-resolution, 0-100.
    pub min_confidence: f64,
    /// Maximum acceptable wait for an auto-resolved wait strategy.
    pub max_wait_time_ms: DurationMs,
    /// Disable auto-resolution whenever a critical resource is contested.
    pub disabled_for_critical: bool,
    /// Require both agents to have opted in to auto-resolution.
    pub require_both_agents_enabled: bool,
    /// Maximum prior failed auto-resolution attempts before requiring confirmation.
    pub max_prior_failed_attempts: u32,
}

impl Default for AutoResolutionCriteria {
    fn default() -> Self {
        Self {
            min_confidence: 80.0,
            max_wait_time_ms: 10 * 60 * 1000,
            disabled_for_critical: true,
            require_both_agents_enabled: false,
            max_prior_failed_attempts: 2,
        }
    }
}

/// Partial update applied to the live criteria; unset fields keep their value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AutoResolutionUpdate {
    pub min_confidence: Option<f64>,
    pub max_wait_time_ms: Option<DurationMs>,
    pub disabled_for_critical: Option<bool>,
    pub require_both_agents_enabled: Option<bool>,
    pub max_prior_failed_attempts: Option<u32>,
}

impl AutoResolutionCriteria {
    /// Validate the criteria before they replace the live copy.
    pub fn validate(&self) -> AccordResult<()> {
        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(ConfigError::InvalidValue {
                field: "min_confidence".to_string(),
                value: self.min_confidence.to_string(),
                reason: "min_confidence must be within 0-100".to_string(),
            }
            .into());
        }

        if self.max_wait_time_ms <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_wait_time_ms".to_string(),
                value: self.max_wait_time_ms.to_string(),
                reason: "max_wait_time_ms must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Apply a partial update, returning the merged criteria.
    pub fn merged(&self, update: &AutoResolutionUpdate) -> Self {
        Self {
            min_confidence: update.min_confidence.unwrap_or(self.min_confidence),
            max_wait_time_ms: update.max_wait_time_ms.unwrap_or(self.max_wait_time_ms),
            disabled_for_critical: update
                .disabled_for_critical
                .unwrap_or(self.disabled_for_critical),
            require_both_agents_enabled: update
                .require_both_agents_enabled
                .unwrap_or(self.require_both_agents_enabled),
            max_prior_failed_attempts: update
                .max_prior_failed_attempts
                .unwrap_or(self.max_prior_failed_attempts),
        }
    }
}

/// Outcome of the auto-resolution eligibility gate.
///
/// `reasons` records every check performed, pass or fail, for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EligibilityDecision {
    pub eligible: bool,
    pub reasons: Vec<String>,
    pub criteria: AutoResolutionCriteria,
}

/// The engine's output for one resolution request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResolutionSuggestion {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub suggestion_id: SuggestionId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub conflict_id: ConflictId,
    pub recommended: ScoredStrategy,
    /// Up to three runner-up strategies, best first.
    pub alternatives: Vec<ScoredStrategy>,
    pub confidence: ConfidenceReport,
    pub rationale: String,
    pub auto_resolution_eligible: bool,
    pub estimated_resolution_time_ms: DurationMs,
    pub risks: Vec<RiskAssessment>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub expires_at: Timestamp,
}

impl ResolutionSuggestion {
    /// Check if the suggestion has expired based on current time.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// Structured result of a resolution request; the engine never lets an
/// internal error escape as a panic or an unwrapped Err.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResolutionResponse {
    pub success: bool,
    pub suggestion: Option<ResolutionSuggestion>,
    pub error: Option<String>,
}

impl ResolutionResponse {
    pub fn ok(suggestion: ResolutionSuggestion) -> Self {
        Self {
            success: true,
            suggestion: Some(suggestion),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            suggestion: None,
            error: Some(error.into()),
        }
    }
}

/// Immutable record of one resolution decision, kept in a bounded ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResolutionAuditRecord {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub audit_id: AuditRecordId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub correlation_id: CorrelationId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub conflict_id: ConflictId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub suggestion_id: SuggestionId,
    pub strategy: StrategyKind,
    pub confidence: f64,
    pub input_sources: InputSourceFlags,
    pub processing_ms: DurationMs,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl ResolutionAuditRecord {
    /// Create a new audit record stamped with the current time.
    pub fn new(
        correlation_id: CorrelationId,
        conflict_id: ConflictId,
        suggestion_id: SuggestionId,
        strategy: StrategyKind,
        confidence: f64,
        input_sources: InputSourceFlags,
        processing_ms: DurationMs,
    ) -> Self {
        Self {
            audit_id: Uuid::now_v7(),
            correlation_id,
            conflict_id,
            suggestion_id,
            strategy,
            confidence,
            input_sources,
            processing_ms,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
