//! Resource transfer orchestration.
//!
//! Executes the side effects of a transfer strategy: moving reservations,
//! checkpoint ownership, pending messages, and subscriptions from the
//! handoff's source agent to its acknowledged receiver. Phases run strictly
//! in order and resources in manifest order; rollback is compensating
//! action, not a transaction.

use crate::ports::{
    CheckpointStore, MessageStore, NotificationHub, ReservationStore, SubscriptionStore,
};
use accord_core::{
    handoff_channel, AccordResult, AgentId, CompletedTransfer, EngineConfig, HandoffRecord,
    NewReservation, NotificationEvent, ProjectId, ReservationClaim, ResourceManifest,
    TransferError, TransferOptions, TransferPhase, TransferProgress, TransferResult,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Floor for the TTL of a reservation re-created for the receiving agent.
const MIN_TRANSFER_TTL: Duration = Duration::from_secs(60);

/// Upper bound on reservations listed during rollback and manifest builds.
const LIST_LIMIT: usize = 100;

/// Executes and rolls back resource transfers between agents.
pub struct TransferOrchestrator {
    reservation_store: Arc<dyn ReservationStore>,
    checkpoint_store: Arc<dyn CheckpointStore>,
    message_store: Arc<dyn MessageStore>,
    subscription_store: Arc<dyn SubscriptionStore>,
    hub: Arc<dyn NotificationHub>,
    config: EngineConfig,
}

impl TransferOrchestrator {
    pub fn new(
        reservation_store: Arc<dyn ReservationStore>,
        checkpoint_store: Arc<dyn CheckpointStore>,
        message_store: Arc<dyn MessageStore>,
        subscription_store: Arc<dyn SubscriptionStore>,
        hub: Arc<dyn NotificationHub>,
        config: EngineConfig,
    ) -> Self {
        Self {
            reservation_store,
            checkpoint_store,
            message_store,
            subscription_store,
            hub,
            config,
        }
    }

    /// Transfer every resource in the handoff's manifest to the receiving
    /// agent, in four ordered phases, reporting progress after each one.
    ///
    /// Without `allow_partial` the run stops at the first failed resource;
    /// with it, every resource is attempted and all failures are reported.
    #[instrument(skip(self, handoff, on_progress), fields(handoff_id = %handoff.handoff_id))]
    pub async fn transfer_resources(
        &self,
        handoff: &HandoffRecord,
        options: TransferOptions,
        mut on_progress: impl FnMut(TransferProgress) + Send,
    ) -> TransferResult {
        let Some(receiver) = handoff.receiving_agent() else {
            return TransferResult::rejected(
                TransferError::NotAcknowledged {
                    handoff_id: handoff.handoff_id,
                }
                .to_string(),
            );
        };

        let source = handoff.request.source_agent_id;
        let project_id = handoff.request.project_id;
        let manifest = &handoff.request.resource_manifest;
        let total = manifest.total_resources();

        self.publish_handoff_event(
            project_id,
            NotificationEvent::TransferStarted {
                handoff_id: handoff.handoff_id,
                total_resources: total,
            },
        )
        .await;

        let mut completed: Vec<CompletedTransfer> = Vec::new();
        let mut failed: Vec<String> = Vec::new();
        let mut stopped = false;

        'phases: for phase in TransferPhase::ordered() {
            for (resource_id, label) in phase_resources(manifest, phase) {
                let outcome = self
                    .transfer_one(phase, resource_id, manifest, project_id, source, receiver)
                    .await;

                match outcome {
                    Ok(()) => {
                        completed.push(CompletedTransfer {
                            phase,
                            resource_id,
                            source_agent_id: source,
                            target_agent_id: receiver,
                        });
                        on_progress(TransferProgress {
                            total_resources: total,
                            transferred_resources: completed.len(),
                            current_resource: label,
                            phase,
                        });
                    }
                    Err(err) => {
                        warn!(phase = %phase, resource = %resource_id, error = %err, "resource transfer failed");
                        failed.push(resource_id.to_string());
                        if !options.allow_partial {
                            stopped = true;
                            break 'phases;
                        }
                    }
                }
            }
        }

        let error = if failed.is_empty() {
            None
        } else if stopped {
            Some(format!(
                "Transfer stopped at first failure; {} of {} resources transferred",
                completed.len(),
                total
            ))
        } else {
            Some(format!("{} of {} resources failed", failed.len(), total))
        };

        let result = TransferResult {
            success: failed.is_empty(),
            transferred_resources: completed.len(),
            failed_resources: failed,
            error,
            completed,
        };

        self.publish_handoff_event(
            project_id,
            NotificationEvent::TransferCompleted {
                handoff_id: handoff.handoff_id,
                result: result.clone(),
            },
        )
        .await;

        result
    }

    async fn transfer_one(
        &self,
        phase: TransferPhase,
        resource_id: Uuid,
        manifest: &ResourceManifest,
        project_id: ProjectId,
        source: AgentId,
        receiver: AgentId,
    ) -> Result<(), TransferError> {
        match phase {
            TransferPhase::Reservations => {
                let claim = manifest
                    .file_reservations
                    .iter()
                    .find(|c| c.reservation_id == resource_id)
                    .ok_or(TransferError::ReservationNotFound {
                        reservation_id: resource_id,
                    })?;
                self.transfer_reservation(claim, project_id, source, receiver)
                    .await
            }
            TransferPhase::Checkpoints => self
                .checkpoint_store
                .transfer_ownership(resource_id, source, receiver)
                .await
                .map_err(|err| TransferError::ResourceFailed {
                    resource_id,
                    reason: err.to_string(),
                }),
            TransferPhase::Messages => self
                .message_store
                .forward_message(resource_id, source, receiver)
                .await
                .map_err(|err| TransferError::ResourceFailed {
                    resource_id,
                    reason: err.to_string(),
                }),
            TransferPhase::Subscriptions => self
                .subscription_store
                .transfer_subscription(resource_id, source, receiver)
                .await
                .map_err(|err| TransferError::ResourceFailed {
                    resource_id,
                    reason: err.to_string(),
                }),
        }
    }

    /// Move one reservation: verify ownership, release from the source, and
    /// re-create for the receiver with the remaining TTL (60s floor). On a
    /// grant conflict the source's reservation is restored best-effort.
    async fn transfer_reservation(
        &self,
        claim: &ReservationClaim,
        project_id: ProjectId,
        source: AgentId,
        receiver: AgentId,
    ) -> Result<(), TransferError> {
        let reservation = self
            .reservation_store
            .get_reservation(claim.reservation_id)
            .await
            .map_err(|err| TransferError::ResourceFailed {
                resource_id: claim.reservation_id,
                reason: err.to_string(),
            })?
            .ok_or(TransferError::ReservationNotFound {
                reservation_id: claim.reservation_id,
            })?;

        if reservation.agent_id != source {
            return Err(TransferError::OwnershipMismatch {
                reservation_id: claim.reservation_id,
                holder: reservation.agent_id,
                expected: source,
            });
        }

        let release = self
            .reservation_store
            .release_reservation(claim.reservation_id, source)
            .await
            .map_err(|err| TransferError::ResourceFailed {
                resource_id: claim.reservation_id,
                reason: err.to_string(),
            })?;
        if !release.released {
            return Err(TransferError::ResourceFailed {
                resource_id: claim.reservation_id,
                reason: release
                    .error
                    .unwrap_or_else(|| "release refused".to_string()),
            });
        }

        let ttl = reservation
            .remaining_ttl(Utc::now())
            .map_or(MIN_TRANSFER_TTL, |remaining| remaining.max(MIN_TRANSFER_TTL));

        let grant = self
            .reservation_store
            .create_reservation(NewReservation {
                project_id,
                agent_id: receiver,
                patterns: reservation.patterns.clone(),
                mode: reservation.mode,
                ttl,
                reason: reservation.reason.clone(),
                task_id: reservation.task_id.clone(),
            })
            .await
            .map_err(|err| TransferError::ResourceFailed {
                resource_id: claim.reservation_id,
                reason: err.to_string(),
            })?;

        if !grant.granted {
            // Best-effort restore for the source; not a guaranteed rollback.
            let restore = self
                .reservation_store
                .create_reservation(NewReservation {
                    project_id,
                    agent_id: source,
                    patterns: reservation.patterns.clone(),
                    mode: reservation.mode,
                    ttl,
                    reason: reservation.reason.clone(),
                    task_id: reservation.task_id.clone(),
                })
                .await;
            match restore {
                Ok(grant) if grant.granted => {}
                Ok(_) => warn!(
                    reservation = %claim.reservation_id,
                    "restore after grant conflict was itself refused"
                ),
                Err(err) => warn!(
                    reservation = %claim.reservation_id,
                    error = %err,
                    "restore after grant conflict failed"
                ),
            }
            return Err(TransferError::GrantConflict {
                reservation_id: claim.reservation_id,
                conflict_count: grant.conflicts.len(),
            });
        }

        Ok(())
    }

    /// Walk completed transfers in reverse and reverse each: reservations
    /// move back to the source agent and checkpoint ownership returns.
    /// Messages and subscriptions are re-deliverable by the surrounding
    /// system and are left alone.
    ///
    /// Compensating-action rollback: per-resource failures are logged and
    /// the walk continues. Returns how many resources were rolled back.
    #[instrument(skip(self, handoff, completed), fields(handoff_id = %handoff.handoff_id))]
    pub async fn rollback_transfer(
        &self,
        handoff: &HandoffRecord,
        completed: &[CompletedTransfer],
    ) -> usize {
        let project_id = handoff.request.project_id;
        let mut rolled_back = 0;

        for transfer in completed.iter().rev() {
            let outcome = match transfer.phase {
                TransferPhase::Reservations => {
                    let claim = handoff
                        .request
                        .resource_manifest
                        .file_reservations
                        .iter()
                        .find(|c| c.reservation_id == transfer.resource_id);
                    match claim {
                        Some(claim) => {
                            self.rollback_reservation(
                                claim,
                                project_id,
                                transfer.source_agent_id,
                                transfer.target_agent_id,
                            )
                            .await
                        }
                        None => Err(TransferError::ReservationNotFound {
                            reservation_id: transfer.resource_id,
                        }),
                    }
                }
                TransferPhase::Checkpoints => self
                    .checkpoint_store
                    .transfer_ownership(
                        transfer.resource_id,
                        transfer.target_agent_id,
                        transfer.source_agent_id,
                    )
                    .await
                    .map_err(|err| TransferError::ResourceFailed {
                        resource_id: transfer.resource_id,
                        reason: err.to_string(),
                    }),
                TransferPhase::Messages | TransferPhase::Subscriptions => continue,
            };

            match outcome {
                Ok(()) => {
                    rolled_back += 1;
                    debug!(phase = %transfer.phase, resource = %transfer.resource_id, "rolled back");
                }
                Err(err) => {
                    warn!(
                        phase = %transfer.phase,
                        resource = %transfer.resource_id,
                        error = %err,
                        "rollback step failed"
                    );
                }
            }
        }

        rolled_back
    }

    /// Reverse one reservation move: release the receiver's replacement
    /// reservation (matched by pattern set) and re-create for the source.
    async fn rollback_reservation(
        &self,
        claim: &ReservationClaim,
        project_id: ProjectId,
        source: AgentId,
        receiver: AgentId,
    ) -> Result<(), TransferError> {
        let held = self
            .reservation_store
            .list_reservations(project_id, receiver, LIST_LIMIT)
            .await
            .map_err(|err| TransferError::ResourceFailed {
                resource_id: claim.reservation_id,
                reason: err.to_string(),
            })?;

        if let Some(replacement) = held.into_iter().find(|r| r.patterns == claim.patterns) {
            let release = self
                .reservation_store
                .release_reservation(replacement.reservation_id, receiver)
                .await;
            if let Err(err) = release {
                warn!(
                    reservation = %replacement.reservation_id,
                    error = %err,
                    "failed to release receiver reservation during rollback"
                );
            }
        }

        let grant = self
            .reservation_store
            .create_reservation(NewReservation {
                project_id,
                agent_id: source,
                patterns: claim.patterns.clone(),
                mode: claim.mode,
                ttl: MIN_TRANSFER_TTL,
                reason: None,
                task_id: None,
            })
            .await
            .map_err(|err| TransferError::ResourceFailed {
                resource_id: claim.reservation_id,
                reason: err.to_string(),
            })?;

        if !grant.granted {
            return Err(TransferError::GrantConflict {
                reservation_id: claim.reservation_id,
                conflict_count: grant.conflicts.len(),
            });
        }
        Ok(())
    }

    /// Collect an agent's current reservations into a transfer manifest.
    ///
    /// Checkpoints, pending messages, and subscriptions stay empty until
    /// their stores can enumerate per-agent ownership; the transfer path
    /// already handles non-empty lists.
    pub async fn build_resource_manifest(
        &self,
        project_id: ProjectId,
        agent_id: AgentId,
    ) -> AccordResult<ResourceManifest> {
        let reservations = self
            .reservation_store
            .list_reservations(project_id, agent_id, LIST_LIMIT)
            .await?;

        Ok(ResourceManifest {
            file_reservations: reservations
                .into_iter()
                .map(|r| ReservationClaim {
                    reservation_id: r.reservation_id,
                    patterns: r.patterns,
                    mode: r.mode,
                    expires_at: r.expires_at,
                })
                .collect(),
            checkpoints: Vec::new(),
            pending_messages: Vec::new(),
            active_subscriptions: Vec::new(),
        })
    }

    async fn publish_handoff_event(&self, project_id: ProjectId, event: NotificationEvent) {
        let channel = handoff_channel(&self.config.handoff_channel_prefix, project_id);
        let event_type = event.event_type();
        if let Err(err) = self.hub.publish(&channel, event).await {
            warn!(channel = %channel, event_type, error = %err, "event publish failed");
        }
    }
}

/// The (id, display label) pairs of one phase, in manifest order.
fn phase_resources(manifest: &ResourceManifest, phase: TransferPhase) -> Vec<(Uuid, String)> {
    match phase {
        TransferPhase::Reservations => manifest
            .file_reservations
            .iter()
            .map(|c| (c.reservation_id, format!("reservation {}", c.patterns.join(", "))))
            .collect(),
        TransferPhase::Checkpoints => manifest
            .checkpoints
            .iter()
            .map(|id| (*id, format!("checkpoint {}", id)))
            .collect(),
        TransferPhase::Messages => manifest
            .pending_messages
            .iter()
            .map(|id| (*id, format!("message {}", id)))
            .collect(),
        TransferPhase::Subscriptions => manifest
            .active_subscriptions
            .iter()
            .map(|id| (*id, format!("subscription {}", id)))
            .collect(),
    }
}
