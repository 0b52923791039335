//! Engine configuration

use crate::{AccordResult, ConfigError, DurationMs};
use serde::{Deserialize, Serialize};

/// Configuration for the resolution engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EngineConfig {
    /// How long a cached suggestion stays valid.
    pub suggestion_ttl_ms: DurationMs,
    /// Most-recent-N audit records retained in memory.
    pub audit_capacity: usize,
    /// Default per-branch deadline for input-source fetches.
    pub default_fetch_timeout_ms: DurationMs,
    /// Channel prefix for conflict events.
    pub conflict_channel_prefix: String,
    /// Channel prefix for handoff events.
    pub handoff_channel_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            suggestion_ttl_ms: 30_000,
            audit_capacity: 500,
            default_fetch_timeout_ms: 5_000,
            conflict_channel_prefix: "workspace:conflicts".to_string(),
            handoff_channel_prefix: "workspace:handoffs".to_string(),
        }
    }
}

impl EngineConfig {
    /// Validate the engine configuration.
    pub fn validate(&self) -> AccordResult<()> {
        if self.suggestion_ttl_ms <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "suggestion_ttl_ms".to_string(),
                value: self.suggestion_ttl_ms.to_string(),
                reason: "suggestion_ttl_ms must be positive".to_string(),
            }
            .into());
        }

        if self.audit_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "audit_capacity".to_string(),
                value: self.audit_capacity.to_string(),
                reason: "audit_capacity must be positive".to_string(),
            }
            .into());
        }

        if self.default_fetch_timeout_ms <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_fetch_timeout_ms".to_string(),
                value: self.default_fetch_timeout_ms.to_string(),
                reason: "default_fetch_timeout_ms must be positive".to_string(),
            }
            .into());
        }

        if self.conflict_channel_prefix.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "conflict_channel_prefix".to_string(),
            }
            .into());
        }

        if self.handoff_channel_prefix.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "handoff_channel_prefix".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
