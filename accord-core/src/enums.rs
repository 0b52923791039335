//! Enum types for Accord entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// PRIORITY & URGENCY
// ============================================================================

/// Priority tier of a work item, P0 (highest) through P4 (lowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum PriorityTier {
    P0,
    P1,
    P2,
    P3,
    P4,
}

impl PriorityTier {
    /// Numeric rank used by scoring: P0 = 4 down to P4 = 0.
    pub fn rank(&self) -> i64 {
        match self {
            PriorityTier::P0 => 4,
            PriorityTier::P1 => 3,
            PriorityTier::P2 => 2,
            PriorityTier::P3 => 1,
            PriorityTier::P4 => 0,
        }
    }

    /// Signed rank difference, positive when `self` outranks `other`.
    pub fn tier_gap(&self, other: PriorityTier) -> i64 {
        self.rank() - other.rank()
    }

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            PriorityTier::P0 => "P0",
            PriorityTier::P1 => "P1",
            PriorityTier::P2 => "P2",
            PriorityTier::P3 => "P3",
            PriorityTier::P4 => "P4",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, PriorityTierParseError> {
        match s.to_uppercase().as_str() {
            "P0" => Ok(PriorityTier::P0),
            "P1" => Ok(PriorityTier::P1),
            "P2" => Ok(PriorityTier::P2),
            "P3" => Ok(PriorityTier::P3),
            "P4" => Ok(PriorityTier::P4),
            _ => Err(PriorityTierParseError(s.to_string())),
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for PriorityTier {
    type Err = PriorityTierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid priority tier string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityTierParseError(pub String);

impl fmt::Display for PriorityTierParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid priority tier: {}", self.0)
    }
}

impl std::error::Error for PriorityTierParseError {}

/// Urgency attached to a priority ranking or a resolution request override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum UrgencyLevel {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UrgencyLevel::Low => "Low",
            UrgencyLevel::Normal => "Normal",
            UrgencyLevel::High => "High",
            UrgencyLevel::Critical => "Critical",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// RESOURCES & RESERVATIONS
// ============================================================================

/// Kind of contested resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ResourceKind {
    /// A single file path
    File,
    /// A directory subtree
    Directory,
    /// A glob pattern covering several paths
    Pattern,
}

impl ResourceKind {
    /// Whether a resource of this kind can be partitioned between two agents.
    pub fn is_divisible(&self) -> bool {
        matches!(self, ResourceKind::Directory | ResourceKind::Pattern)
    }
}

/// Reservation mode determining concurrency behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ReservationMode {
    /// Only one holder can reserve the patterns
    Exclusive,
    /// Multiple holders can reserve the patterns
    Shared,
}

impl ReservationMode {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ReservationMode::Exclusive => "Exclusive",
            ReservationMode::Shared => "Shared",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, ReservationModeParseError> {
        match s.to_lowercase().as_str() {
            "exclusive" => Ok(ReservationMode::Exclusive),
            "shared" => Ok(ReservationMode::Shared),
            _ => Err(ReservationModeParseError(s.to_string())),
        }
    }
}

impl fmt::Display for ReservationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for ReservationMode {
    type Err = ReservationModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid reservation mode string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationModeParseError(pub String);

impl fmt::Display for ReservationModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid reservation mode: {}", self.0)
    }
}

impl std::error::Error for ReservationModeParseError {}

// ============================================================================
// STRATEGIES
// ============================================================================

/// Discriminator for the five resolution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum StrategyKind {
    /// Requester waits for the holder to finish
    Wait,
    /// Contested resources are partitioned between the agents
    Split,
    /// Reservations move from the holder to the requester
    Transfer,
    /// Both agents proceed under an explicit coordination protocol
    Coordinate,
    /// The conflict is raised to a human or the orchestrator
    Escalate,
}

impl StrategyKind {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            StrategyKind::Wait => "Wait",
            StrategyKind::Split => "Split",
            StrategyKind::Transfer => "Transfer",
            StrategyKind::Coordinate => "Coordinate",
            StrategyKind::Escalate => "Escalate",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, StrategyKindParseError> {
        match s.to_lowercase().as_str() {
            "wait" => Ok(StrategyKind::Wait),
            "split" => Ok(StrategyKind::Split),
            "transfer" => Ok(StrategyKind::Transfer),
            "coordinate" => Ok(StrategyKind::Coordinate),
            "escalate" => Ok(StrategyKind::Escalate),
            _ => Err(StrategyKindParseError(s.to_string())),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for StrategyKind {
    type Err = StrategyKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid strategy kind string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyKindParseError(pub String);

impl fmt::Display for StrategyKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid strategy kind: {}", self.0)
    }
}

impl std::error::Error for StrategyKindParseError {}

// ============================================================================
// RISK & IMPACT
// ============================================================================

/// Severity of an assessed risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskSeverity::Low => "Low",
            RiskSeverity::Medium => "Medium",
            RiskSeverity::High => "High",
        };
        write!(f, "{}", s)
    }
}

/// Category of an assessed risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum RiskCategory {
    /// Work in a critical resource could be lost
    DataLoss,
    /// An agent is slowed down or blocked
    Performance,
    /// An agent's in-flight work is interrupted
    UserImpact,
    /// The agents could end up mutually blocked
    Deadlock,
    Other,
}

/// Expected impact of a strategy on one of the two agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ImpactLevel {
    None,
    Low,
    Medium,
    High,
}

// ============================================================================
// STRATEGY PARAMETERS
// ============================================================================

/// How split partitions are merged back together once both agents finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum MergeStrategy {
    /// Partitions are merged one after the other
    Sequential,
    /// Partitions are merged with a three-way diff
    ThreeWay,
    /// A human merges the partitions
    Manual,
}

/// Protocol two coordinating agents agree to work under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum CoordinationProtocol {
    /// Agents alternate exclusive access
    TurnBased,
    /// Agents divide the resource into regions
    RegionSplit,
    /// Agents work the same resource together
    PairedWork,
}

/// Where an escalated conflict is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EscalationTarget {
    Human,
    Orchestrator,
}

// ============================================================================
// TRANSFER PHASES
// ============================================================================

/// Ordered phases of a resource transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum TransferPhase {
    Reservations,
    Checkpoints,
    Messages,
    Subscriptions,
}

impl TransferPhase {
    /// Phases in execution order. Later phases assume a clean reservation state.
    pub fn ordered() -> [TransferPhase; 4] {
        [
            TransferPhase::Reservations,
            TransferPhase::Checkpoints,
            TransferPhase::Messages,
            TransferPhase::Subscriptions,
        ]
    }

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            TransferPhase::Reservations => "Reservations",
            TransferPhase::Checkpoints => "Checkpoints",
            TransferPhase::Messages => "Messages",
            TransferPhase::Subscriptions => "Subscriptions",
        }
    }
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

// =============================================================================
// TESTS
// =============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_strategy_kind() -> impl Strategy<Value = StrategyKind> {
        prop_oneof![
            Just(StrategyKind::Wait),
            Just(StrategyKind::Split),
            Just(StrategyKind::Transfer),
            Just(StrategyKind::Coordinate),
            Just(StrategyKind::Escalate),
        ]
    }

    fn arb_tier() -> impl Strategy<Value = PriorityTier> {
        prop_oneof![
            Just(PriorityTier::P0),
            Just(PriorityTier::P1),
            Just(PriorityTier::P2),
            Just(PriorityTier::P3),
            Just(PriorityTier::P4),
        ]
    }

    proptest! {
        // Parsing accepts any casing of the canonical representation.
        #[test]
        fn strategy_kind_parse_is_case_insensitive(kind in arb_strategy_kind()) {
            let lower = kind.as_db_str().to_lowercase();
            let upper = kind.as_db_str().to_uppercase();
            prop_assert_eq!(StrategyKind::from_db_str(&lower).unwrap(), kind);
            prop_assert_eq!(StrategyKind::from_db_str(&upper).unwrap(), kind);
        }

        #[test]
        fn priority_tier_gap_is_antisymmetric(a in arb_tier(), b in arb_tier()) {
            prop_assert_eq!(a.tier_gap(b), -b.tier_gap(a));
        }

        #[test]
        fn priority_tier_display_roundtrips(tier in arb_tier()) {
            let rendered = tier.to_string();
            prop_assert_eq!(rendered.parse::<PriorityTier>().unwrap(), tier);
        }
    }
}
