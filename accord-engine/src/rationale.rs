//! Rationale rendering.

use crate::aggregate::ResolutionInputs;
use accord_core::{ConfidenceReport, RiskAssessment, RiskSeverity, ScoredStrategy, StrategyKind};

/// Render the human-readable explanation attached to a suggestion.
///
/// Always names the strategy and the confidence value; mentions the
/// historical sample size whenever history contributed.
pub fn render_rationale(
    recommended: &ScoredStrategy,
    confidence: &ConfidenceReport,
    risks: &[RiskAssessment],
    inputs: &ResolutionInputs,
) -> String {
    let kind = recommended.kind();
    let mut rationale = format!(
        "Recommending {} (score {:.0}) with confidence {:.0}/100.",
        kind, recommended.score, confidence.value
    );

    match kind {
        StrategyKind::Wait => {
            rationale.push_str(" The holder is expected to finish soon enough that waiting costs less than interrupting.");
        }
        StrategyKind::Split => {
            rationale.push_str(" The contested resources can be partitioned so both agents keep working.");
        }
        StrategyKind::Transfer => {
            rationale.push_str(" The requester's work outranks the holder's; moving the reservations unblocks the higher-priority task.");
        }
        StrategyKind::Coordinate => {
            rationale.push_str(" Both agents can share the resources under an explicit coordination protocol.");
        }
        StrategyKind::Escalate => {
            rationale.push_str(" No automated strategy is clearly safe; raising the conflict out of band.");
        }
    }

    if let Some(history) = &inputs.history {
        let samples = history.sample_size(kind);
        if samples > 0 {
            if let Some(rate) = history.success_rate(kind) {
                rationale.push_str(&format!(
                    " {} similar past conflicts used this strategy with a {:.0}% success rate.",
                    samples,
                    rate * 100.0
                ));
            }
        }
    }

    let high_risks = risks
        .iter()
        .filter(|r| r.severity == RiskSeverity::High)
        .count();
    if high_risks > 0 {
        rationale.push_str(&format!(
            " Note: {} high-severity risk(s) identified.",
            high_risks
        ));
    }

    rationale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{OutcomeHistory, StrategyOutcome};
    use accord_core::{
        ConfidenceFactor, ExpectedOutcome, ImpactLevel, ResolutionStrategy, WaitParams,
    };

    fn recommended() -> ScoredStrategy {
        ScoredStrategy::new(
            ResolutionStrategy::Wait(WaitParams {
                estimated_wait_ms: 60_000,
                polling_interval_ms: 30_000,
                timeout_ms: 300_000,
            }),
            72.0,
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

    fn confidence(value: f64) -> ConfidenceReport {
        ConfidenceReport {
            value,
            breakdown: vec![ConfidenceFactor {
                signal: "strategy score".to_string(),
                delta: value,
            }],
        }
    }

    #[test]
    fn test_rationale_names_strategy_and_confidence() {
        let rationale = render_rationale(
            &recommended(),
            &confidence(64.0),
            &[],
            &ResolutionInputs::default(),
        );
        assert!(rationale.contains("Wait"));
        assert!(rationale.contains("64"));
    }

    #[test]
    fn test_rationale_mentions_history_sample_size() {
        let inputs = ResolutionInputs {
            history: Some(OutcomeHistory {
                similar_conflict_count: 12,
                strategy_outcomes: vec![StrategyOutcome {
                    kind: StrategyKind::Wait,
                    success_count: 9,
                    failure_count: 3,
                    avg_resolution_time_ms: 80_000,
                }],
                relevance_score: 0.8,
            }),
            ..Default::default()
        };
        let rationale = render_rationale(&recommended(), &confidence(70.0), &[], &inputs);
        assert!(rationale.contains("12 similar past conflicts"));
        assert!(rationale.contains("75%"));
    }

    #[test]
    fn test_rationale_flags_high_severity_risks() {
        let risks = crate::risk::assess_risks(
            StrategyKind::Wait,
            &[accord_core::ResourceIdentifier::file("a.rs").critical()],
        );
        let rationale = render_rationale(
            &recommended(),
            &confidence(70.0),
            &risks,
            &ResolutionInputs::default(),
        );
        assert!(rationale.contains("high-severity"));
    }
}
