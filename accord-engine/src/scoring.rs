//! Strategy scoring.
//!
//! Five independent scorers, each returning a scored strategy or `None` when
//! the strategy is not applicable to the request. Scores live in [0, 100];
//! `ScoredStrategy::new` clamps on construction and every adjustment goes
//! through `boost`, so no path can escape the range.

use crate::aggregate::ResolutionInputs;
use accord_core::{
    ConflictResolutionRequest, CoordinateParams, CoordinationProtocol, DurationMs,
    EscalateParams, EscalationTarget, ExpectedOutcome, ImpactLevel, MergeStrategy, Prerequisite,
    ResolutionStrategy, ResourcePartition, ScoredStrategy, SplitParams, StrategyKind, Timestamp,
    TransferParams, UrgencyLevel, WaitParams,
};

const WAIT_BASE_SCORE: f64 = 70.0;
const SPLIT_BASE_SCORE: f64 = 50.0;
const TRANSFER_BASE_SCORE: f64 = 60.0;
const COORDINATE_BASE_SCORE: f64 = 40.0;
const ESCALATE_BASE_SCORE: f64 = 30.0;

/// Compatibility bonus for split, applied at half weight.
const SPLIT_COMPATIBILITY_BONUS: f64 = 15.0 * 0.5;
/// Collaboration bonus for coordinate, fixed heuristic at half weight.
const COORDINATE_COLLABORATION_BONUS: f64 = 17.5;
/// Fallback bonus for escalate, applied unconditionally.
const ESCALATE_FALLBACK_BONUS: f64 = 20.0;

/// Wait penalty when the requester outranks the holder by more than one
/// tier. Together with the transfer bonus below, a two-tier gap outweighs
/// even a near-complete holder, so takeover beats waiting.
const WAIT_PRIORITY_GAP_PENALTY: f64 = 25.0;
/// Transfer bonus per tier of positive priority difference.
const TRANSFER_PRIORITY_BONUS_PER_TIER: f64 = 15.0;
const TRANSFER_PRIORITY_BONUS_CAP: f64 = 30.0;
/// Flat penalty for handing resources to lower-priority work.
const TRANSFER_DOWNGRADE_PENALTY: f64 = 25.0;

const FIVE_MINUTES_MS: DurationMs = 5 * 60 * 1000;
const TEN_MINUTES_MS: DurationMs = 10 * 60 * 1000;
const THIRTY_MINUTES_MS: DurationMs = 30 * 60 * 1000;

/// Score every applicable strategy, apply caller preferences, and rank
/// descending. The sort is stable; ties keep scorer order.
pub fn score_strategies(
    request: &ConflictResolutionRequest,
    inputs: &ResolutionInputs,
    now: Timestamp,
) -> Vec<ScoredStrategy> {
    let mut strategies: Vec<ScoredStrategy> = [
        score_wait(request, inputs, now),
        score_split(request),
        score_transfer(request, inputs),
        score_coordinate(request),
        score_escalate(request),
    ]
    .into_iter()
    .flatten()
    .collect();

    apply_preference_boost(&mut strategies, &request.preferred_strategies);
    strategies.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    strategies
}

/// Derive the estimated wait for the holder to finish, in priority order:
/// reservation expiry, explicit remaining estimate, extrapolation from
/// progress, then a ten-minute default.
pub fn estimated_wait_ms(inputs: &ResolutionInputs, now: Timestamp) -> DurationMs {
    if let Some(expiry) = inputs.earliest_holder_expiry() {
        let remaining = (expiry - now).num_milliseconds();
        if remaining > 0 {
            return remaining;
        }
    }

    if let Some(holder) = &inputs.holder_priority {
        if let Some(remaining) = holder.remaining_estimate_ms {
            return remaining;
        }
        if let (Some(progress), Some(invested)) = (holder.progress_percent, holder.time_invested_ms)
        {
            if progress > 0.0 {
                let projected_total = invested as f64 / progress * 100.0;
                return (projected_total - invested as f64) as DurationMs;
            }
        }
    }

    TEN_MINUTES_MS
}

fn score_wait(
    request: &ConflictResolutionRequest,
    inputs: &ResolutionInputs,
    now: Timestamp,
) -> Option<ScoredStrategy> {
    let estimated = estimated_wait_ms(inputs, now);

    let mut score = WAIT_BASE_SCORE;
    match inputs.holder_progress() {
        Some(progress) if progress >= 80.0 => score += 20.0,
        Some(progress) if progress >= 50.0 => score += 10.0,
        _ => {}
    }

    if estimated < FIVE_MINUTES_MS {
        score += 10.0;
    } else if estimated > THIRTY_MINUTES_MS {
        score -= 20.0;
    }

    if let (Some(requester), Some(holder)) = (&inputs.requester_priority, &inputs.holder_priority)
    {
        if requester.tier.tier_gap(holder.tier) > 1 {
            score -= WAIT_PRIORITY_GAP_PENALTY;
        }
    }

    let prerequisites = vec![Prerequisite {
        description: "Holding agent identified".to_string(),
        satisfied: request.holding_agent_id.is_some(),
    }];

    let strategy = ResolutionStrategy::Wait(WaitParams {
        estimated_wait_ms: estimated,
        polling_interval_ms: 30_000,
        timeout_ms: (estimated * 3).max(FIVE_MINUTES_MS),
    });

    Some(ScoredStrategy::new(
        strategy,
        score,
        prerequisites,
        ExpectedOutcome {
            success_probability: 0.85,
            estimated_time_ms: estimated,
            requester_impact: ImpactLevel::Medium,
            holder_impact: ImpactLevel::None,
            side_effects: vec![],
        },
    ))
}

fn score_split(request: &ConflictResolutionRequest) -> Option<ScoredStrategy> {
    let resources = &request.contested_resources;
    // A lone indivisible file leaves nothing to partition.
    if resources.len() == 1 && !resources[0].kind.is_divisible() {
        return None;
    }
    let holder = request.holding_agent_id?;

    let mut score = SPLIT_BASE_SCORE + SPLIT_COMPATIBILITY_BONUS;
    if resources.len() > 5 {
        score -= 20.0;
    }

    // Positional two-way partition: the first half stays with the holder.
    // Deliberately naive; no semantic analysis of the resources.
    let mid = resources.len().div_ceil(2);
    let partitions = vec![
        ResourcePartition {
            agent_id: holder,
            resources: resources[..mid].to_vec(),
        },
        ResourcePartition {
            agent_id: request.requesting_agent_id,
            resources: resources[mid..].to_vec(),
        },
    ];

    let strategy = ResolutionStrategy::Split(SplitParams {
        partitions,
        merge_strategy: MergeStrategy::ThreeWay,
    });

    Some(ScoredStrategy::new(
        strategy,
        score,
        vec![Prerequisite::satisfied("Resource set can be partitioned")],
        ExpectedOutcome {
            success_probability: 0.7,
            estimated_time_ms: FIVE_MINUTES_MS,
            requester_impact: ImpactLevel::Low,
            holder_impact: ImpactLevel::Low,
            side_effects: vec!["Partitions must be merged after completion".to_string()],
        },
    ))
}

fn score_transfer(
    request: &ConflictResolutionRequest,
    inputs: &ResolutionInputs,
) -> Option<ScoredStrategy> {
    let holder = request.holding_agent_id?;

    let mut score = TRANSFER_BASE_SCORE;
    if let (Some(requester), Some(holder_priority)) =
        (&inputs.requester_priority, &inputs.holder_priority)
    {
        let gap = requester.tier.tier_gap(holder_priority.tier);
        if gap > 0 {
            score += (gap as f64 * TRANSFER_PRIORITY_BONUS_PER_TIER)
                .min(TRANSFER_PRIORITY_BONUS_CAP);
        } else if gap < 0 {
            // Handing resources to lower-priority work is discouraged.
            score -= TRANSFER_DOWNGRADE_PENALTY;
        }
    }

    let progress = inputs.holder_progress();
    match progress {
        Some(p) if p >= 80.0 => score -= 20.0,
        Some(p) if p >= 50.0 => score -= 10.0,
        _ => {}
    }

    let strategy = ResolutionStrategy::Transfer(TransferParams {
        from_agent_id: holder,
        to_agent_id: request.requesting_agent_id,
        // Skip the checkpoint only when the holder has barely started.
        checkpoint_required: progress.map_or(true, |p| p >= 10.0),
        grace_period_ms: 30_000,
    });

    Some(ScoredStrategy::new(
        strategy,
        score,
        vec![Prerequisite::satisfied("Holding agent identified")],
        ExpectedOutcome {
            success_probability: 0.8,
            estimated_time_ms: 60_000,
            requester_impact: ImpactLevel::None,
            holder_impact: ImpactLevel::High,
            side_effects: vec!["Holder loses its reservations".to_string()],
        },
    ))
}

fn score_coordinate(request: &ConflictResolutionRequest) -> Option<ScoredStrategy> {
    let mut score = COORDINATE_BASE_SCORE + COORDINATE_COLLABORATION_BONUS;
    if request.contested_resources.len() > 3 {
        score -= 25.0;
    }

    let strategy = ResolutionStrategy::Coordinate(CoordinateParams {
        protocol: CoordinationProtocol::TurnBased,
        channel: format!("coordination:{}", request.conflict_id),
        sync_interval_ms: 60_000,
    });

    Some(ScoredStrategy::new(
        strategy,
        score,
        vec![Prerequisite {
            description: "Both agents identified".to_string(),
            satisfied: request.holding_agent_id.is_some(),
        }],
        ExpectedOutcome {
            success_probability: 0.65,
            estimated_time_ms: TEN_MINUTES_MS,
            requester_impact: ImpactLevel::Medium,
            holder_impact: ImpactLevel::Medium,
            side_effects: vec![],
        },
    ))
}

fn score_escalate(request: &ConflictResolutionRequest) -> Option<ScoredStrategy> {
    let critical = request.has_critical_resource();

    let mut score = ESCALATE_BASE_SCORE;
    if critical {
        score += 25.0;
    }
    if request.urgency_override == Some(UrgencyLevel::Critical) {
        score += 15.0;
    }
    score += ESCALATE_FALLBACK_BONUS;

    let strategy = ResolutionStrategy::Escalate(EscalateParams {
        target: if critical {
            EscalationTarget::Human
        } else {
            EscalationTarget::Orchestrator
        },
        urgency: request.urgency_override.unwrap_or_default(),
        context_summary: format!(
            "Conflict {} over {} resources, requested by agent {}",
            request.conflict_id,
            request.contested_resources.len(),
            request.requesting_agent_id
        ),
    });

    // The universal fallback: no prerequisites, always applicable.
    Some(ScoredStrategy::new(
        strategy,
        score,
        vec![],
        ExpectedOutcome {
            success_probability: 0.95,
            estimated_time_ms: THIRTY_MINUTES_MS,
            requester_impact: ImpactLevel::Medium,
            holder_impact: ImpactLevel::Medium,
            side_effects: vec!["Both agents block on an out-of-band response".to_string()],
        },
    ))
}

/// Boost each caller-preferred strategy by `max(0, 10 - 3 * index)`.
fn apply_preference_boost(strategies: &mut [ScoredStrategy], preferred: &[StrategyKind]) {
    for (index, kind) in preferred.iter().enumerate() {
        let boost = (10.0 - 3.0 * index as f64).max(0.0);
        if boost == 0.0 {
            continue;
        }
        for scored in strategies.iter_mut() {
            if scored.kind() == *kind {
                scored.boost(boost);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PrioritySnapshot;
    use accord_core::{
        PriorityTier, Reservation, ReservationMode, ResourceIdentifier, UrgencyLevel,
    };
    use chrono::Utc;
    use uuid::Uuid;

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

    fn priority_with_progress(tier: PriorityTier, progress: f64) -> PrioritySnapshot {
        PrioritySnapshot {
            progress_percent: Some(progress),
            ..priority(tier)
        }
    }

    fn request_with_holder(resources: Vec<ResourceIdentifier>) -> ConflictResolutionRequest {
        ConflictResolutionRequest::new(
            Uuid::now_v7(),
            Uuid::now_v7(),
            Uuid::now_v7(),
            resources,
        )
        .with_holder(Uuid::now_v7())
    }

    fn holder_reservation(expires_in_mins: i64) -> Reservation {
        let now = Utc::now();
        Reservation {
            reservation_id: Uuid::now_v7(),
            project_id: Uuid::now_v7(),
            agent_id: Uuid::now_v7(),
            patterns: vec!["src/**".to_string()],
            mode: ReservationMode::Exclusive,
            reason: None,
            task_id: None,
            acquired_at: now,
            expires_at: now + chrono::Duration::minutes(expires_in_mins),
        }
    }

    fn score_of(strategies: &[ScoredStrategy], kind: StrategyKind) -> Option<f64> {
        strategies.iter().find(|s| s.kind() == kind).map(|s| s.score)
    }

    #[test]
    fn test_split_not_offered_for_single_file() {
        let request = request_with_holder(vec![ResourceIdentifier::file("a.rs")]);
        let strategies = score_strategies(&request, &ResolutionInputs::default(), Utc::now());
        assert!(score_of(&strategies, StrategyKind::Split).is_none());
    }

    #[test]
    fn test_split_offered_for_single_directory() {
        let request = request_with_holder(vec![ResourceIdentifier::directory("src")]);
        let strategies = score_strategies(&request, &ResolutionInputs::default(), Utc::now());
        assert!(score_of(&strategies, StrategyKind::Split).is_some());
    }

    #[test]
    fn test_split_penalized_beyond_five_resources() {
        let many: Vec<_> = (0..6)
            .map(|i| ResourceIdentifier::file(format!("f{}.rs", i)))
            .collect();
        let few: Vec<_> = (0..3)
            .map(|i| ResourceIdentifier::file(format!("f{}.rs", i)))
            .collect();

        let many_score = score_of(
            &score_strategies(
                &request_with_holder(many),
                &ResolutionInputs::default(),
                Utc::now(),
            ),
            StrategyKind::Split,
        )
        .unwrap();
        let few_score = score_of(
            &score_strategies(
                &request_with_holder(few),
                &ResolutionInputs::default(),
                Utc::now(),
            ),
            StrategyKind::Split,
        )
        .unwrap();
        assert_eq!(few_score - many_score, 20.0);
    }

    #[test]
    fn test_split_partitions_are_positional() {
        let resources: Vec<_> = (0..4)
            .map(|i| ResourceIdentifier::file(format!("f{}.rs", i)))
            .collect();
        let request = request_with_holder(resources.clone());
        let strategies = score_strategies(&request, &ResolutionInputs::default(), Utc::now());
        let split = strategies
            .iter()
            .find(|s| s.kind() == StrategyKind::Split)
            .unwrap();
        let ResolutionStrategy::Split(params) = &split.strategy else {
            panic!("expected split params");
        };
        assert_eq!(params.partitions.len(), 2);
        assert_eq!(params.partitions[0].agent_id, request.holding_agent_id.unwrap());
        assert_eq!(params.partitions[0].resources, resources[..2].to_vec());
        assert_eq!(params.partitions[1].agent_id, request.requesting_agent_id);
        assert_eq!(params.partitions[1].resources, resources[2..].to_vec());
    }

    #[test]
    fn test_transfer_score_decreases_with_holder_progress() {
        let request = request_with_holder(vec![ResourceIdentifier::file("a.rs")]);
        let now = Utc::now();

        let score_at = |progress: f64| {
            let inputs = ResolutionInputs {
                requester_priority: Some(priority(PriorityTier::P2)),
                holder_priority: Some(priority_with_progress(PriorityTier::P2, progress)),
                ..Default::default()
            };
            score_of(
                &score_strategies(&request, &inputs, now),
                StrategyKind::Transfer,
            )
            .unwrap()
        };

        let early = score_at(20.0);
        let midway = score_at(60.0);
        let late = score_at(90.0);
        assert!(early > midway);
        assert!(midway > late);
        assert_eq!(early - midway, 10.0);
        assert_eq!(early - late, 20.0);
    }

    #[test]
    fn test_transfer_discouraged_toward_lower_priority() {
        let request = request_with_holder(vec![ResourceIdentifier::file("a.rs")]);
        let inputs = ResolutionInputs {
            requester_priority: Some(priority(PriorityTier::P4)),
            holder_priority: Some(priority(PriorityTier::P0)),
            ..Default::default()
        };
        let score = score_of(
            &score_strategies(&request, &inputs, Utc::now()),
            StrategyKind::Transfer,
        )
        .unwrap();
        assert_eq!(score, TRANSFER_BASE_SCORE - TRANSFER_DOWNGRADE_PENALTY);
    }

    #[test]
    fn test_transfer_priority_bonus_capped() {
        let request = request_with_holder(vec![ResourceIdentifier::file("a.rs")]);
        let inputs = ResolutionInputs {
            requester_priority: Some(priority(PriorityTier::P0)),
            holder_priority: Some(priority(PriorityTier::P4)),
            ..Default::default()
        };
        let score = score_of(
            &score_strategies(&request, &inputs, Utc::now()),
            StrategyKind::Transfer,
        )
        .unwrap();
        assert_eq!(score, TRANSFER_BASE_SCORE + 30.0);
    }

    #[test]
    fn test_transfer_requires_holder() {
        let request = ConflictResolutionRequest::new(
            Uuid::now_v7(),
            Uuid::now_v7(),
            Uuid::now_v7(),
            vec![ResourceIdentifier::file("a.rs")],
        );
        let strategies = score_strategies(&request, &ResolutionInputs::default(), Utc::now());
        assert!(score_of(&strategies, StrategyKind::Transfer).is_none());
    }

    #[test]
    fn test_wait_estimated_from_reservation_expiry() {
        let now = Utc::now();
        let inputs = ResolutionInputs {
            holder_reservations: Some(vec![holder_reservation(8)]),
            ..Default::default()
        };
        let estimated = estimated_wait_ms(&inputs, now);
        assert!(estimated > 7 * 60 * 1000 && estimated <= 8 * 60 * 1000);
    }

    #[test]
    fn test_wait_estimated_from_remaining_estimate() {
        let inputs = ResolutionInputs {
            holder_priority: Some(PrioritySnapshot {
                remaining_estimate_ms: Some(120_000),
                ..priority(PriorityTier::P2)
            }),
            ..Default::default()
        };
        assert_eq!(estimated_wait_ms(&inputs, Utc::now()), 120_000);
    }

    #[test]
    fn test_wait_estimated_from_progress_extrapolation() {
        // 25% done after 5 minutes projects 15 more minutes.
        let inputs = ResolutionInputs {
            holder_priority: Some(PrioritySnapshot {
                progress_percent: Some(25.0),
                time_invested_ms: Some(5 * 60 * 1000),
                ..priority(PriorityTier::P2)
            }),
            ..Default::default()
        };
        assert_eq!(estimated_wait_ms(&inputs, Utc::now()), 15 * 60 * 1000);
    }

    #[test]
    fn test_wait_estimated_defaults_to_ten_minutes() {
        assert_eq!(
            estimated_wait_ms(&ResolutionInputs::default(), Utc::now()),
            TEN_MINUTES_MS
        );
    }

    #[test]
    fn test_wait_rewards_near_complete_holder() {
        let request = request_with_holder(vec![ResourceIdentifier::file("a.rs")]);
        let now = Utc::now();
        let base = score_of(
            &score_strategies(&request, &ResolutionInputs::default(), now),
            StrategyKind::Wait,
        )
        .unwrap();

        let inputs = ResolutionInputs {
            holder_priority: Some(priority_with_progress(PriorityTier::P2, 85.0)),
            ..Default::default()
        };
        let with_progress = score_of(
            &score_strategies(&request, &inputs, now),
            StrategyKind::Wait,
        )
        .unwrap();
        assert_eq!(with_progress - base, 20.0);
    }

    #[test]
    fn test_wait_penalized_for_long_wait_and_priority_gap() {
        let request = request_with_holder(vec![ResourceIdentifier::file("a.rs")]);
        let inputs = ResolutionInputs {
            requester_priority: Some(priority(PriorityTier::P0)),
            holder_priority: Some(priority(PriorityTier::P2)),
            holder_reservations: Some(vec![holder_reservation(45)]),
            ..Default::default()
        };
        let score = score_of(
            &score_strategies(&request, &inputs, Utc::now()),
            StrategyKind::Wait,
        )
        .unwrap();
        // base - 20 (wait > 30 min) - 25 (priority gap > 1 tier)
        assert_eq!(
            score,
            WAIT_BASE_SCORE - 20.0 - WAIT_PRIORITY_GAP_PENALTY
        );
    }

    #[test]
    fn test_high_priority_requester_beats_waiting_on_near_done_holder() {
        // P0 requester against a P2 holder at 90% progress over a single
        // file: the two-tier priority advantage outweighs the holder being
        // nearly done, so taking over outranks waiting.
        let request = request_with_holder(vec![ResourceIdentifier::file("a.ts")]);
        let inputs = ResolutionInputs {
            requester_priority: Some(priority(PriorityTier::P0)),
            holder_priority: Some(priority_with_progress(PriorityTier::P2, 90.0)),
            ..Default::default()
        };
        let strategies = score_strategies(&request, &inputs, Utc::now());
        let transfer = score_of(&strategies, StrategyKind::Transfer).unwrap();
        let wait = score_of(&strategies, StrategyKind::Wait).unwrap();
        assert!(transfer > wait, "transfer {} should beat wait {}", transfer, wait);
        assert_eq!(strategies[0].kind(), StrategyKind::Transfer);
    }

    #[test]
    fn test_escalate_always_present_with_fallback_bonus() {
        let request = ConflictResolutionRequest::new(
            Uuid::now_v7(),
            Uuid::now_v7(),
            Uuid::now_v7(),
            vec![ResourceIdentifier::file("a.rs")],
        );
        let strategies = score_strategies(&request, &ResolutionInputs::default(), Utc::now());
        let escalate = strategies
            .iter()
            .find(|s| s.kind() == StrategyKind::Escalate)
            .unwrap();
        assert_eq!(escalate.score, ESCALATE_BASE_SCORE + ESCALATE_FALLBACK_BONUS);
        assert!(escalate.prerequisites.is_empty());
    }

    #[test]
    fn test_escalate_boosted_for_critical_resources_and_urgency() {
        let request = ConflictResolutionRequest::new(
            Uuid::now_v7(),
            Uuid::now_v7(),
            Uuid::now_v7(),
            vec![ResourceIdentifier::file("prod.db").critical()],
        )
        .with_urgency(UrgencyLevel::Critical);
        let strategies = score_strategies(&request, &ResolutionInputs::default(), Utc::now());
        let escalate = score_of(&strategies, StrategyKind::Escalate).unwrap();
        assert_eq!(
            escalate,
            ESCALATE_BASE_SCORE + 25.0 + 15.0 + ESCALATE_FALLBACK_BONUS
        );
    }

    #[test]
    fn test_preference_boost_decays_by_position() {
        let request = request_with_holder(vec![ResourceIdentifier::file("a.rs")])
            .with_preferred_strategies(vec![StrategyKind::Coordinate, StrategyKind::Escalate]);
        let strategies = score_strategies(&request, &ResolutionInputs::default(), Utc::now());

        let coordinate = score_of(&strategies, StrategyKind::Coordinate).unwrap();
        let escalate = score_of(&strategies, StrategyKind::Escalate).unwrap();
        assert_eq!(coordinate, COORDINATE_BASE_SCORE + COORDINATE_COLLABORATION_BONUS + 10.0);
        assert_eq!(escalate, ESCALATE_BASE_SCORE + ESCALATE_FALLBACK_BONUS + 7.0);
    }

    #[test]
    fn test_ranking_is_descending() {
        let request = request_with_holder(vec![
            ResourceIdentifier::file("a.rs"),
            ResourceIdentifier::file("b.rs"),
        ]);
        let strategies = score_strategies(&request, &ResolutionInputs::default(), Utc::now());
        assert!(!strategies.is_empty());
        for pair in strategies.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
