//! Accord Engine - Conflict Resolution & Resource Transfer
//!
//! The decision and orchestration core for agents contending over shared
//! workspace resources:
//! - Input aggregation from priority, history, and reservation sources
//! - Strategy scoring across wait/split/transfer/coordinate/escalate
//! - Confidence, risk, and auto-resolution eligibility
//! - Suggestion caching with a bounded audit trail
//! - Resource transfer between agents with compensating rollback
//!
//! Storage engines, transports, and the notification fan-out live behind
//! the port traits in [`ports`].

pub mod aggregate;
pub mod confidence;
pub mod eligibility;
pub mod ports;
pub mod rationale;
pub mod risk;
pub mod scoring;
pub mod state;
pub mod transfer;

mod resolution;

pub use aggregate::{gather_inputs, GatherOptions, ResolutionInputs};
pub use eligibility::{check_eligibility, EligibilitySignals};
pub use ports::{
    CheckpointStore, MessageStore, NotificationHub, OutcomeHistory, OutcomeHistorySource,
    PortResult, PrioritySnapshot, PrioritySource, ReservationStore, StrategyOutcome,
    SubscriptionStore,
};
pub use resolution::{ResolutionEngine, ResolutionOptions};
pub use state::ResolutionStore;
pub use transfer::TransferOrchestrator;
