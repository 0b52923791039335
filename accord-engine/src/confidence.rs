//! Confidence modeling.
//!
//! Confidence starts from the recommended strategy's own score and grows
//! only with corroborating signals; an absent signal contributes nothing,
//! so sparse input data can never inflate the value.

use crate::aggregate::ResolutionInputs;
use accord_core::{
    ConfidenceFactor, ConfidenceReport, ResourceIdentifier, ScoredStrategy, StrategyKind,
    Timestamp,
};

const BOTH_PRIORITIES_BONUS: f64 = 10.0;
const SINGLE_PRIORITY_BONUS: f64 = 5.0;
const PROGRESS_SIGNAL_BONUS: f64 = 5.0;
const HISTORY_MAX_BONUS: f64 = 20.0;
const DEADLINE_PRESSURE_PENALTY: f64 = -5.0;
const CRITICAL_RESOURCE_PENALTY: f64 = -10.0;

/// Build the confidence report for a recommended strategy.
pub fn confidence_report(
    recommended: &ScoredStrategy,
    resources: &[ResourceIdentifier],
    inputs: &ResolutionInputs,
    now: Timestamp,
) -> ConfidenceReport {
    let mut breakdown = Vec::new();
    let mut value = 0.0;

    let mut add = |signal: &str, delta: f64| -> f64 {
        breakdown.push(ConfidenceFactor {
            signal: signal.to_string(),
            delta,
        });
        delta
    };

    value += add("strategy score", recommended.score * 0.5);

    let priorities_known = inputs.requester_priority.is_some() as usize
        + inputs.holder_priority.is_some() as usize;
    match priorities_known {
        2 => value += add("both agent priorities known", BOTH_PRIORITIES_BONUS),
        1 => value += add("one agent priority known", SINGLE_PRIORITY_BONUS),
        _ => {}
    }

    if inputs.holder_progress().is_some() {
        value += add("holder progress known", PROGRESS_SIGNAL_BONUS);
    }

    if let Some(history) = &inputs.history {
        let kind = recommended.kind();
        if let Some(rate) = history.success_rate(kind) {
            let relevance = history.relevance_score.clamp(0.0, 1.0);
            value += add(
                "historical success rate for this strategy",
                rate * HISTORY_MAX_BONUS * relevance,
            );
        }
    }

    if inputs.deadline_pressure(now) && recommended.kind() != StrategyKind::Transfer {
        value += add(
            "deadline pressure favors immediate takeover",
            DEADLINE_PRESSURE_PENALTY,
        );
    }

    if resources.iter().any(|r| r.critical) {
        value += add("critical resource contested", CRITICAL_RESOURCE_PENALTY);
    }

    ConfidenceReport {
        value: value.clamp(0.0, 100.0),
        breakdown,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{OutcomeHistory, PrioritySnapshot, StrategyOutcome};
    use accord_core::{
        ExpectedOutcome, ImpactLevel, PriorityTier, ResolutionStrategy, UrgencyLevel, WaitParams,
    };
    use chrono::Utc;

    fn recommended(score: f64) -> ScoredStrategy {
        ScoredStrategy::new(
            ResolutionStrategy::Wait(WaitParams {
                estimated_wait_ms: 60_000,
                polling_interval_ms: 30_000,
                timeout_ms: 300_000,
            }),
            score,
            vec![],
            ExpectedOutcome {
                success_probability: 0.85,
                estimated_time_ms: 60_000,
                requester_impact: ImpactLevel::Medium,
                holder_impact: ImpactLevel::None,
                side_effects: vec![],
            },
        )
    }

    fn priority(tier: PriorityTier) -> PrioritySnapshot {
        PrioritySnapshot {
            tier,
            urgency: UrgencyLevel::Normal,
            deadline: None,
            progress_percent: None,
            time_invested_ms: None,
            remaining_estimate_ms: None,
        }
    }

    #[test]
    fn test_bare_inputs_yield_half_score() {
        let report = confidence_report(
            &recommended(70.0),
            &[ResourceIdentifier::file("a.rs")],
            &ResolutionInputs::default(),
            Utc::now(),
        );
        assert_eq!(report.value, 35.0);
        assert_eq!(report.breakdown.len(), 1);
    }

    #[test]
    fn test_signals_raise_confidence() {
        let sparse = confidence_report(
            &recommended(70.0),
            &[ResourceIdentifier::file("a.rs")],
            &ResolutionInputs::default(),
            Utc::now(),
        );

        let inputs = ResolutionInputs {
            requester_priority: Some(priority(PriorityTier::P2)),
            holder_priority: Some(PrioritySnapshot {
                progress_percent: Some(60.0),
                ..priority(PriorityTier::P2)
            }),
            history: Some(OutcomeHistory {
                similar_conflict_count: 10,
                strategy_outcomes: vec![StrategyOutcome {
                    kind: StrategyKind::Wait,
                    success_count: 9,
                    failure_count: 1,
                    avg_resolution_time_ms: 90_000,
                }],
                relevance_score: 1.0,
            }),
            ..Default::default()
        };
        let rich = confidence_report(
            &recommended(70.0),
            &[ResourceIdentifier::file("a.rs")],
            &inputs,
            Utc::now(),
        );
        assert!(rich.value > sparse.value);
        // 35 base + 10 priorities + 5 progress + 0.9 * 20 history
        assert_eq!(rich.value, 35.0 + 10.0 + 5.0 + 18.0);
    }

    #[test]
    fn test_history_bonus_scales_with_success_rate() {
        let history_with_rate = |success: usize, failure: usize| OutcomeHistory {
            similar_conflict_count: success + failure,
            strategy_outcomes: vec![StrategyOutcome {
                kind: StrategyKind::Wait,
                success_count: success,
                failure_count: failure,
                avg_resolution_time_ms: 90_000,
            }],
            relevance_score: 1.0,
        };

        let weak = confidence_report(
            &recommended(70.0),
            &[ResourceIdentifier::file("a.rs")],
            &ResolutionInputs {
                history: Some(history_with_rate(2, 8)),
                ..Default::default()
            },
            Utc::now(),
        );
        let strong = confidence_report(
            &recommended(70.0),
            &[ResourceIdentifier::file("a.rs")],
            &ResolutionInputs {
                history: Some(history_with_rate(8, 2)),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(strong.value > weak.value);
    }

    #[test]
    fn test_critical_resource_lowers_confidence() {
        let plain = confidence_report(
            &recommended(70.0),
            &[ResourceIdentifier::file("a.rs")],
            &ResolutionInputs::default(),
            Utc::now(),
        );
        let critical = confidence_report(
            &recommended(70.0),
            &[ResourceIdentifier::file("a.rs").critical()],
            &ResolutionInputs::default(),
            Utc::now(),
        );
        assert_eq!(plain.value - critical.value, 10.0);
    }

    #[test]
    fn test_value_clamped_to_range() {
        let report = confidence_report(
            &recommended(0.0),
            &[ResourceIdentifier::file("a.rs").critical()],
            &ResolutionInputs::default(),
            Utc::now(),
        );
        assert_eq!(report.value, 0.0);
    }
}
