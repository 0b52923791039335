//! Identity types for Accord entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Duration in milliseconds for TTL and timeout values.
pub type DurationMs = i64;

/// Identifier of a conflict between two agents over a resource set.
pub type ConflictId = Uuid;

/// Identifier of a resolution suggestion produced by the engine.
pub type SuggestionId = Uuid;

/// Identifier of an agent participating in the workspace.
pub type AgentId = Uuid;

/// Identifier of the work item a priority ranking is attached to.
pub type WorkItemId = Uuid;

/// Identifier of a file reservation held in the reservation store.
pub type ReservationId = Uuid;

/// Identifier of a checkpoint owned by an agent.
pub type CheckpointId = Uuid;

/// Identifier of a pending inter-agent message.
pub type MessageId = Uuid;

/// Identifier of an active event subscription.
pub type SubscriptionId = Uuid;

/// Identifier of a handoff between two agents.
pub type HandoffId = Uuid;

/// Identifier of a shared project workspace.
pub type ProjectId = Uuid;

/// Identifier of an audit record.
pub type AuditRecordId = Uuid;

/// Correlation identifier threading one resolution request through the audit trail.
pub type CorrelationId = Uuid;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_id_is_v7() {
        let id = new_entity_id();
        assert_eq!(id.get_version_num(), 7);
    }

    #[test]
    fn test_entity_ids_are_sortable() {
        let id1 = new_entity_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = new_entity_id();
        // UUIDv7 should be lexicographically sortable by time
        assert!(id1.to_string() < id2.to_string());
    }
}
