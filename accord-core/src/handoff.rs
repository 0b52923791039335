//! Handoff entities: the record produced by the surrounding handoff
//! workflow, the resource manifest it carries, and transfer results.

use crate::{
    AgentId, CheckpointId, HandoffId, MessageId, ProjectId, ReservationId, ReservationMode,
    SubscriptionId, Timestamp, TransferPhase,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reservation as listed in a resource manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReservationClaim {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub reservation_id: ReservationId,
    pub patterns: Vec<String>,
    pub mode: ReservationMode,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub expires_at: Timestamp,
}

/// The enumerated set of resources an agent owns, subject to transfer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ResourceManifest {
    pub file_reservations: Vec<ReservationClaim>,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub checkpoints: Vec<CheckpointId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub pending_messages: Vec<MessageId>,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub active_subscriptions: Vec<SubscriptionId>,
}

impl ResourceManifest {
    /// Total number of resources across all four categories.
    pub fn total_resources(&self) -> usize {
        self.file_reservations.len()
            + self.checkpoints.len()
            + self.pending_messages.len()
            + self.active_subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_resources() == 0
    }
}

/// The request half of a handoff: who is ceding what, in which project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HandoffRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub source_agent_id: AgentId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub project_id: ProjectId,
    pub resource_manifest: ResourceManifest,
}

/// Acknowledgment that a receiving agent has accepted the handoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HandoffAcknowledgment {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub receiving_agent_id: AgentId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub acknowledged_at: Timestamp,
}

/// A handoff between two agents, produced by the surrounding workflow.
/// The transfer orchestrator only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HandoffRecord {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub handoff_id: HandoffId,
    pub request: HandoffRequest,
    pub acknowledgment: Option<HandoffAcknowledgment>,
}

impl HandoffRecord {
    /// Create an unacknowledged handoff.
    pub fn new(source_agent_id: AgentId, project_id: ProjectId, manifest: ResourceManifest) -> Self {
        Self {
            handoff_id: Uuid::now_v7(),
            request: HandoffRequest {
                source_agent_id,
                project_id,
                resource_manifest: manifest,
            },
            acknowledgment: None,
        }
    }

    /// Acknowledge the handoff for a receiving agent.
    pub fn acknowledge(mut self, receiving_agent_id: AgentId) -> Self {
        self.acknowledgment = Some(HandoffAcknowledgment {
            receiving_agent_id,
            acknowledged_at: Utc::now(),
        });
        self
    }

    /// The receiving agent, when acknowledged.
    pub fn receiving_agent(&self) -> Option<AgentId> {
        self.acknowledgment.as_ref().map(|a| a.receiving_agent_id)
    }
}

/// Options controlling a transfer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TransferOptions {
    /// Continue past failed resources instead of stopping at the first.
    pub allow_partial: bool,
}

/// Progress emitted after each individual resource transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TransferProgress {
    pub total_resources: usize,
    pub transferred_resources: usize,
    pub current_resource: String,
    pub phase: TransferPhase,
}

/// One successfully completed per-resource transfer, recorded so it can be
/// reversed by `rollback_transfer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CompletedTransfer {
    pub phase: TransferPhase,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub resource_id: Uuid,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub source_agent_id: AgentId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub target_agent_id: AgentId,
}

/// Final result of a transfer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TransferResult {
    /// True iff zero resources failed.
    pub success: bool,
    pub transferred_resources: usize,
    /// Ids of resources that failed to transfer.
    pub failed_resources: Vec<String>,
    pub error: Option<String>,
    /// Everything that completed, in execution order, for rollback.
    pub completed: Vec<CompletedTransfer>,
}

impl TransferResult {
    /// A result for a transfer that could not start.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            transferred_resources: 0,
            failed_resources: Vec::new(),
            error: Some(error.into()),
            completed: Vec::new(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn claim() -> ReservationClaim {
        ReservationClaim {
            reservation_id: Uuid::now_v7(),
            patterns: vec!["docs/**".to_string()],
            mode: ReservationMode::Shared,
            expires_at: Utc::now() + chrono::Duration::minutes(5),
        }
    }

    #[test]
    fn test_manifest_total_resources() {
        let manifest = ResourceManifest {
            file_reservations: vec![claim(), claim()],
            checkpoints: vec![Uuid::now_v7()],
            pending_messages: vec![],
            active_subscriptions: vec![Uuid::now_v7()],
        };
        assert_eq!(manifest.total_resources(), 4);
        assert!(!manifest.is_empty());
        assert!(ResourceManifest::default().is_empty());
    }

    #[test]
    fn test_handoff_acknowledge() {
        let source = Uuid::now_v7();
        let receiver = Uuid::now_v7();
        let handoff = HandoffRecord::new(source, Uuid::now_v7(), ResourceManifest::default());
        assert!(handoff.receiving_agent().is_none());

        let acknowledged = handoff.acknowledge(receiver);
        assert_eq!(acknowledged.receiving_agent(), Some(receiver));
    }
}
