//! Accord Core - Entity Types
//!
//! Pure data structures with no behavior beyond constructors, accessors,
//! and validation. All other crates depend on this. This crate contains
//! ONLY data types - no business logic.

mod config;
mod conflict;
mod enums;
mod error;
mod event;
mod handoff;
mod identity;
mod reservation;
mod strategy;

pub use config::EngineConfig;
pub use conflict::{
    AutoResolutionCriteria, AutoResolutionUpdate, ConfidenceFactor, ConfidenceReport,
    ConflictResolutionRequest, EligibilityDecision, InputSourceFlags, ResolutionAuditRecord,
    ResolutionResponse, ResolutionSuggestion, ResourceIdentifier, RiskAssessment,
};
pub use enums::{
    CoordinationProtocol, EscalationTarget, ImpactLevel, MergeStrategy, PriorityTier,
    PriorityTierParseError, ReservationMode, ReservationModeParseError, ResourceKind,
    RiskCategory, RiskSeverity, StrategyKind, StrategyKindParseError, TransferPhase,
    UrgencyLevel,
};
pub use error::{
    AccordError, AccordResult, ConfigError, PortError, ResolutionError, TransferError,
    ValidationError,
};
pub use event::{conflict_channel, handoff_channel, NotificationEvent};
pub use handoff::{
    CompletedTransfer, HandoffAcknowledgment, HandoffRecord, HandoffRequest, ReservationClaim,
    ResourceManifest, TransferOptions, TransferProgress, TransferResult,
};
pub use identity::{
    new_entity_id, AgentId, AuditRecordId, CheckpointId, ConflictId, CorrelationId, DurationMs,
    EntityId, HandoffId, MessageId, ProjectId, ReservationId, SubscriptionId, SuggestionId,
    Timestamp, WorkItemId,
};
pub use reservation::{NewReservation, Reservation, ReservationGrant, ReservationRelease};
pub use strategy::{
    CoordinateParams, EscalateParams, ExpectedOutcome, Prerequisite, ResolutionStrategy,
    ResourcePartition, ScoredStrategy, SplitParams, TransferParams, WaitParams,
};
