//! Auto-resolution eligibility gate.
//!
//! A plain boolean gate over the live criteria. Every check performed is
//! recorded in `reasons`, pass or fail, so an operator can always see why a
//! suggestion was or was not auto-applied.

use accord_core::{AutoResolutionCriteria, DurationMs, EligibilityDecision, StrategyKind};

/// Confidence above which non-wait strategies may auto-resolve.
const NON_WAIT_CONFIDENCE_FLOOR: f64 = 95.0;

/// The signals the gate evaluates, extracted from a suggestion in progress.
#[derive(Debug, Clone, Copy)]
pub struct EligibilitySignals {
    pub strategy: StrategyKind,
    /// Estimated wait for wait strategies; `None` otherwise.
    pub estimated_wait_ms: Option<DurationMs>,
    pub confidence: f64,
    pub has_critical_resource: bool,
    /// Failed auto-resolution attempts already made for this conflict.
    pub prior_failed_attempts: u32,
    /// Whether both agents opted in to auto-resolution; `None` when unknown.
    pub both_agents_enabled: Option<bool>,
}

/// Evaluate the auto-resolution gate.
pub fn check_eligibility(
    criteria: &AutoResolutionCriteria,
    signals: &EligibilitySignals,
) -> EligibilityDecision {
    let mut reasons = Vec::new();
    let mut eligible = true;

    let mut check = |passed: bool, reason: String| {
        reasons.push(format!(
            "{}: {}",
            reason,
            if passed { "pass" } else { "fail" }
        ));
        if !passed {
            eligible = false;
        }
    };

    check(
        signals.confidence >= criteria.min_confidence,
        format!(
            "confidence {:.0} meets minimum {:.0}",
            signals.confidence, criteria.min_confidence
        ),
    );

    match (signals.strategy, signals.estimated_wait_ms) {
        (StrategyKind::Wait, Some(wait_ms)) => check(
            wait_ms <= criteria.max_wait_time_ms,
            format!(
                "estimated wait {}ms within maximum {}ms",
                wait_ms, criteria.max_wait_time_ms
            ),
        ),
        (StrategyKind::Wait, None) => check(false, "estimated wait known".to_string()),
        _ => check(true, "wait-time bound not applicable".to_string()),
    }

    if criteria.disabled_for_critical {
        check(
            !signals.has_critical_resource,
            "no critical resource contested".to_string(),
        );
    } else {
        check(true, "critical-resource gate disabled".to_string());
    }

    if signals.strategy != StrategyKind::Wait {
        check(
            signals.confidence >= NON_WAIT_CONFIDENCE_FLOOR,
            format!(
                "non-wait strategy requires confidence {:.0}",
                NON_WAIT_CONFIDENCE_FLOOR
            ),
        );
    } else {
        check(true, "wait strategy exempt from confidence floor".to_string());
    }

    if criteria.require_both_agents_enabled {
        check(
            signals.both_agents_enabled == Some(true),
            "both agents opted in to auto-resolution".to_string(),
        );
    } else {
        check(true, "agent opt-in not required".to_string());
    }

    check(
        signals.prior_failed_attempts <= criteria.max_prior_failed_attempts,
        format!(
            "prior failed attempts {} within maximum {}",
            signals.prior_failed_attempts, criteria.max_prior_failed_attempts
        ),
    );

    EligibilityDecision {
        eligible,
        reasons,
        criteria: criteria.clone(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn wait_signals(confidence: f64, wait_ms: DurationMs) -> EligibilitySignals {
        EligibilitySignals {
            strategy: StrategyKind::Wait,
            estimated_wait_ms: Some(wait_ms),
            confidence,
            has_critical_resource: false,
            prior_failed_attempts: 0,
            both_agents_enabled: None,
        }
    }

    #[test]
    fn test_confident_short_wait_is_eligible() {
        let criteria = AutoResolutionCriteria::default();
        let decision = check_eligibility(&criteria, &wait_signals(90.0, 60_000));
        assert!(decision.eligible);
    }

    #[test]
    fn test_every_check_is_reported() {
        let criteria = AutoResolutionCriteria::default();
        let decision = check_eligibility(&criteria, &wait_signals(90.0, 60_000));
        assert_eq!(decision.reasons.len(), 6);
        assert!(decision.reasons.iter().all(|r| r.ends_with("pass")));
    }

    #[test]
    fn test_low_confidence_fails() {
        let criteria = AutoResolutionCriteria::default();
        let decision = check_eligibility(&criteria, &wait_signals(70.0, 60_000));
        assert!(!decision.eligible);
        assert!(decision.reasons.iter().any(|r| r.contains("confidence") && r.ends_with("fail")));
    }

    #[test]
    fn test_excessive_wait_fails() {
        let criteria = AutoResolutionCriteria::default();
        let decision = check_eligibility(
            &criteria,
            &wait_signals(95.0, criteria.max_wait_time_ms + 1),
        );
        assert!(!decision.eligible);
    }

    #[test]
    fn test_critical_resource_blocks_regardless_of_confidence() {
        let criteria = AutoResolutionCriteria::default();
        let mut signals = wait_signals(99.0, 1_000);
        signals.has_critical_resource = true;
        let decision = check_eligibility(&criteria, &signals);
        assert!(!decision.eligible);

        let relaxed = AutoResolutionCriteria {
            disabled_for_critical: false,
            ..Default::default()
        };
        assert!(check_eligibility(&relaxed, &signals).eligible);
    }

    #[test]
    fn test_non_wait_needs_very_high_confidence() {
        let criteria = AutoResolutionCriteria::default();
        let transfer = EligibilitySignals {
            strategy: StrategyKind::Transfer,
            estimated_wait_ms: None,
            confidence: 90.0,
            has_critical_resource: false,
            prior_failed_attempts: 0,
            both_agents_enabled: None,
        };
        assert!(!check_eligibility(&criteria, &transfer).eligible);

        let very_confident = EligibilitySignals {
            confidence: 96.0,
            ..transfer
        };
        assert!(check_eligibility(&criteria, &very_confident).eligible);
    }

    #[test]
    fn test_opt_in_requirement_blocks_unknown() {
        let criteria = AutoResolutionCriteria {
            require_both_agents_enabled: true,
            ..Default::default()
        };
        let decision = check_eligibility(&criteria, &wait_signals(90.0, 60_000));
        assert!(!decision.eligible);

        let mut signals = wait_signals(90.0, 60_000);
        signals.both_agents_enabled = Some(true);
        assert!(check_eligibility(&criteria, &signals).eligible);
    }

    #[test]
    fn test_too_many_prior_failures_blocks() {
        let criteria = AutoResolutionCriteria::default();
        let mut signals = wait_signals(90.0, 60_000);
        signals.prior_failed_attempts = criteria.max_prior_failed_attempts + 1;
        assert!(!check_eligibility(&criteria, &signals).eligible);
    }
}
