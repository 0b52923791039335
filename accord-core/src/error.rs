//! Error types for Accord operations

use crate::ReservationId;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by collaborator ports (priority source, history source,
/// reservation store, checkpoint/message/subscription stores).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("Source {source_name} unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },

    #[error("Request to {source_name} timed out after {elapsed_ms}ms")]
    Timeout { source_name: String, elapsed_ms: i64 },

    #[error("Request rejected by {source_name}: {reason}")]
    Rejected { source_name: String, reason: String },
}

impl PortError {
    /// Convenience constructor for an unavailable source.
    pub fn unavailable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        PortError::Unavailable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for a rejected request.
    pub fn rejected(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        PortError::Rejected {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Conflict resolution errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("No viable resolution strategies found")]
    NoViableStrategy,

    #[error("Suggestion not found for conflict {conflict_id}")]
    SuggestionNotFound { conflict_id: Uuid },

    #[error("Resolution failed for conflict {conflict_id}: {reason}")]
    Internal { conflict_id: Uuid, reason: String },
}

/// Resource transfer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("Handoff {handoff_id} has no acknowledged receiving agent")]
    NotAcknowledged { handoff_id: Uuid },

    #[error("Reservation {reservation_id} not found")]
    ReservationNotFound { reservation_id: ReservationId },

    #[error("Reservation {reservation_id} is held by {holder}, not {expected}")]
    OwnershipMismatch {
        reservation_id: ReservationId,
        holder: Uuid,
        expected: Uuid,
    },

    #[error("Reservation grant for {reservation_id} conflicted with {conflict_count} existing reservations")]
    GrantConflict {
        reservation_id: ReservationId,
        conflict_count: usize,
    },

    #[error("Transfer of {resource_id} failed: {reason}")]
    ResourceFailed { resource_id: Uuid, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Validation errors on caller-supplied requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for all Accord errors.
#[derive(Debug, Clone, Error)]
pub enum AccordError {
    #[error("Port error: {0}")]
    Port(#[from] PortError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for Accord operations.
pub type AccordResult<T> = Result<T, AccordError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_display_unavailable() {
        let err = PortError::unavailable("priority", "connection refused");
        let msg = format!("{}", err);
        assert!(msg.contains("priority"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_resolution_error_display_no_viable_strategy() {
        let msg = format!("{}", ResolutionError::NoViableStrategy);
        assert_eq!(msg, "No viable resolution strategies found");
    }

    #[test]
    fn test_transfer_error_display_ownership_mismatch() {
        let err = TransferError::OwnershipMismatch {
            reservation_id: Uuid::nil(),
            holder: Uuid::nil(),
            expected: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("is held by"));
    }

    #[test]
    fn test_accord_error_from_variants() {
        let port = AccordError::from(PortError::unavailable("history", "down"));
        assert!(matches!(port, AccordError::Port(_)));

        let resolution = AccordError::from(ResolutionError::NoViableStrategy);
        assert!(matches!(resolution, AccordError::Resolution(_)));

        let transfer = AccordError::from(TransferError::NotAcknowledged {
            handoff_id: Uuid::nil(),
        });
        assert!(matches!(transfer, AccordError::Transfer(_)));

        let config = AccordError::from(ConfigError::MissingRequired {
            field: "suggestion_ttl_ms".to_string(),
        });
        assert!(matches!(config, AccordError::Config(_)));
    }
}
