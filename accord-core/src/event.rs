//! Notification event types.
//!
//! Events the engine publishes to the workspace notification hub. Delivery
//! is fire-and-forget; the hub's fan-out mechanics live elsewhere.

use crate::{ConflictId, HandoffId, ProjectId, ResolutionSuggestion, TransferResult};
use serde::{Deserialize, Serialize};

/// Events published to workspace notification channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NotificationEvent {
    /// A resolution suggestion was produced for a conflict.
    ResolutionSuggested {
        conflict_id: ConflictId,
        suggestion: ResolutionSuggestion,
    },

    /// A resource transfer run started.
    TransferStarted {
        handoff_id: HandoffId,
        total_resources: usize,
    },

    /// A resource transfer run finished, successfully or not.
    TransferCompleted {
        handoff_id: HandoffId,
        result: TransferResult,
    },
}

impl NotificationEvent {
    /// Short event-type tag used in log lines and hub metadata.
    pub fn event_type(&self) -> &'static str {
        match self {
            NotificationEvent::ResolutionSuggested { .. } => "resolution.suggested",
            NotificationEvent::TransferStarted { .. } => "handoff.transfer_started",
            NotificationEvent::TransferCompleted { .. } => "handoff.transfer_completed",
        }
    }
}

/// Channel name for a project's conflict events.
pub fn conflict_channel(prefix: &str, project_id: ProjectId) -> String {
    format!("{}:{}", prefix, project_id)
}

/// Channel name for a project's handoff events.
pub fn handoff_channel(prefix: &str, project_id: ProjectId) -> String {
    format!("{}:{}", prefix, project_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_event_type_tags() {
        let event = NotificationEvent::TransferStarted {
            handoff_id: Uuid::now_v7(),
            total_resources: 3,
        };
        assert_eq!(event.event_type(), "handoff.transfer_started");
    }

    #[test]
    fn test_channel_names_scoped_by_project() {
        let project = Uuid::now_v7();
        let channel = conflict_channel("workspace:conflicts", project);
        assert!(channel.starts_with("workspace:conflicts:"));
        assert!(channel.ends_with(&project.to_string()));
    }

    #[test]
    fn test_event_serde_tagged() {
        let event = NotificationEvent::TransferStarted {
            handoff_id: Uuid::now_v7(),
            total_resources: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TransferStarted");
    }
}
