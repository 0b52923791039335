//! Risk assessment.
//!
//! Deterministic over (strategy, resources): a critical resource always
//! raises a high-severity data-loss risk, and each strategy carries exactly
//! one risk of its own.

use accord_core::{ResourceIdentifier, RiskAssessment, RiskCategory, RiskSeverity, StrategyKind};

/// Assess the risks of applying a strategy to a resource set.
pub fn assess_risks(kind: StrategyKind, resources: &[ResourceIdentifier]) -> Vec<RiskAssessment> {
    let mut risks = Vec::with_capacity(2);

    if resources.iter().any(|r| r.critical) {
        risks.push(RiskAssessment {
            category: RiskCategory::DataLoss,
            severity: RiskSeverity::High,
            description: "A critical resource is contested; in-flight work could be lost"
                .to_string(),
            probability: 90.0,
            mitigation: "Checkpoint the holder's work before applying any strategy".to_string(),
        });
    }

    risks.push(strategy_risk(kind));
    risks
}

fn strategy_risk(kind: StrategyKind) -> RiskAssessment {
    match kind {
        StrategyKind::Wait => RiskAssessment {
            category: RiskCategory::Performance,
            severity: RiskSeverity::Low,
            description: "The requesting agent is delayed until the holder finishes".to_string(),
            probability: 100.0,
            mitigation: "Bound the wait with a timeout and re-evaluate on expiry".to_string(),
        },
        StrategyKind::Transfer => RiskAssessment {
            category: RiskCategory::UserImpact,
            severity: RiskSeverity::Medium,
            description: "The holding agent's in-flight work is interrupted".to_string(),
            probability: 80.0,
            mitigation: "Require a checkpoint and honor the grace period before moving resources"
                .to_string(),
        },
        StrategyKind::Split => RiskAssessment {
            category: RiskCategory::Other,
            severity: RiskSeverity::Medium,
            description: "Partitioned work can produce merge conflicts when recombined"
                .to_string(),
            probability: 40.0,
            mitigation: "Merge partitions with a three-way diff and review the result".to_string(),
        },
        StrategyKind::Coordinate => RiskAssessment {
            category: RiskCategory::Deadlock,
            severity: RiskSeverity::Medium,
            description: "Both agents could block waiting on each other's sync points".to_string(),
            probability: 15.0,
            mitigation: "Bound every sync interval and escalate when a sync is missed".to_string(),
        },
        StrategyKind::Escalate => RiskAssessment {
            category: RiskCategory::Performance,
            severity: RiskSeverity::Medium,
            description: "Both agents block until a human responds".to_string(),
            probability: 70.0,
            mitigation: "Attach full context so the escalation can be resolved in one pass"
                .to_string(),
        },
    }
}
