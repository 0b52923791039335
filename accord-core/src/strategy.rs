//! Resolution strategy sum type.
//!
//! A strategy is one of five closed variants; every site that inspects one
//! matches exhaustively, so adding a variant forces all of them to be
//! revisited at compile time.

use crate::{
    AgentId, CoordinationProtocol, DurationMs, EscalationTarget, ImpactLevel, MergeStrategy,
    ResourceIdentifier, StrategyKind, UrgencyLevel,
};
use serde::{Deserialize, Serialize};

/// Parameters for the wait strategy: the requester polls until the holder
/// finishes or the wait times out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WaitParams {
    pub estimated_wait_ms: DurationMs,
    pub polling_interval_ms: DurationMs,
    pub timeout_ms: DurationMs,
}

/// One side of a split: the resources a single agent keeps working on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResourcePartition {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub agent_id: AgentId,
    pub resources: Vec<ResourceIdentifier>,
}

/// Parameters for the split strategy: a positional two-way partition of the
/// contested resources, merged back once both sides finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SplitParams {
    pub partitions: Vec<ResourcePartition>,
    pub merge_strategy: MergeStrategy,
}

/// Parameters for the transfer strategy: reservations move from the holder
/// to the requester after an optional checkpoint and grace period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TransferParams {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub from_agent_id: AgentId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub to_agent_id: AgentId,
    pub checkpoint_required: bool,
    pub grace_period_ms: DurationMs,
}

/// Parameters for the coordinate strategy: both agents keep working under an
/// explicit protocol on a shared channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CoordinateParams {
    pub protocol: CoordinationProtocol,
    pub channel: String,
    pub sync_interval_ms: DurationMs,
}

/// Parameters for the escalate strategy: the conflict is raised out of band
/// with enough context for whoever picks it up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EscalateParams {
    pub target: EscalationTarget,
    pub urgency: UrgencyLevel,
    pub context_summary: String,
}

/// A candidate way to resolve a conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionStrategy {
    Wait(WaitParams),
    Split(SplitParams),
    Transfer(TransferParams),
    Coordinate(CoordinateParams),
    Escalate(EscalateParams),
}

impl ResolutionStrategy {
    /// The discriminator for this strategy.
    pub fn kind(&self) -> StrategyKind {
        match self {
            ResolutionStrategy::Wait(_) => StrategyKind::Wait,
            ResolutionStrategy::Split(_) => StrategyKind::Split,
            ResolutionStrategy::Transfer(_) => StrategyKind::Transfer,
            ResolutionStrategy::Coordinate(_) => StrategyKind::Coordinate,
            ResolutionStrategy::Escalate(_) => StrategyKind::Escalate,
        }
    }
}

/// A single prerequisite check attached to a scored strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Prerequisite {
    pub description: String,
    pub satisfied: bool,
}

impl Prerequisite {
    pub fn satisfied(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            satisfied: true,
        }
    }

    pub fn unsatisfied(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            satisfied: false,
        }
    }
}

/// Projected outcome of applying a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExpectedOutcome {
    /// Probability of success in [0, 1]
    pub success_probability: f64,
    pub estimated_time_ms: DurationMs,
    pub requester_impact: ImpactLevel,
    pub holder_impact: ImpactLevel,
    pub side_effects: Vec<String>,
}

/// A strategy together with its score, prerequisites, and projected outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ScoredStrategy {
    pub strategy: ResolutionStrategy,
    /// Score in [0, 100]; clamped at construction.
    pub score: f64,
    pub prerequisites: Vec<Prerequisite>,
    pub expected_outcome: ExpectedOutcome,
}

impl ScoredStrategy {
    /// Create a scored strategy, clamping the score into [0, 100].
    pub fn new(
        strategy: ResolutionStrategy,
        score: f64,
        prerequisites: Vec<Prerequisite>,
        expected_outcome: ExpectedOutcome,
    ) -> Self {
        Self {
            strategy,
            score: score.clamp(0.0, 100.0),
            prerequisites,
            expected_outcome,
        }
    }

    /// The discriminator for the wrapped strategy.
    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Add to the score, re-clamping into [0, 100].
    pub fn boost(&mut self, delta: f64) {
        self.score = (self.score + delta).clamp(0.0, 100.0);
    }

    /// Whether every prerequisite is currently satisfied.
    pub fn prerequisites_satisfied(&self) -> bool {
        self.prerequisites.iter().all(|p| p.satisfied)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn wait_strategy() -> ResolutionStrategy {
        ResolutionStrategy::Wait(WaitParams {
            estimated_wait_ms: 60_000,
            polling_interval_ms: 5_000,
            timeout_ms: 600_000,
        })
    }

    fn outcome() -> ExpectedOutcome {
        ExpectedOutcome {
            success_probability: 0.8,
            estimated_time_ms: 60_000,
            requester_impact: ImpactLevel::Medium,
            holder_impact: ImpactLevel::None,
            side_effects: vec![],
        }
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(wait_strategy().kind(), StrategyKind::Wait);
        let transfer = ResolutionStrategy::Transfer(TransferParams {
            from_agent_id: Uuid::now_v7(),
            to_agent_id: Uuid::now_v7(),
            checkpoint_required: true,
            grace_period_ms: 30_000,
        });
        assert_eq!(transfer.kind(), StrategyKind::Transfer);
    }

    #[test]
    fn test_score_clamped_on_construction() {
        let over = ScoredStrategy::new(wait_strategy(), 140.0, vec![], outcome());
        assert_eq!(over.score, 100.0);

        let under = ScoredStrategy::new(wait_strategy(), -10.0, vec![], outcome());
        assert_eq!(under.score, 0.0);
    }

    #[test]
    fn test_boost_clamps() {
        let mut scored = ScoredStrategy::new(wait_strategy(), 95.0, vec![], outcome());
        scored.boost(10.0);
        assert_eq!(scored.score, 100.0);
        scored.boost(-200.0);
        assert_eq!(scored.score, 0.0);
    }

    #[test]
    fn test_prerequisites_satisfied() {
        let scored = ScoredStrategy::new(
            wait_strategy(),
            70.0,
            vec![
                Prerequisite::satisfied("holder is making progress"),
                Prerequisite::unsatisfied("wait fits within the requester deadline"),
            ],
            outcome(),
        );
        assert!(!scored.prerequisites_satisfied());
    }

    #[test]
    fn test_strategy_serde_tagged() {
        let json = serde_json::to_value(wait_strategy()).unwrap();
        assert_eq!(json["type"], "wait");
    }
}
