//! Mirror side of replication: applies authority notifications to local
//! read-only state and publishes the matching bus events.
//!
//! Notifications for agents or evidence that no longer resolve (despawned
//! while the message was in flight) are skipped without publishing.

use bevy_ecs::world::{Mut, World};

use crate::ecs::bus::PerceptionBus;
use crate::ecs::clock::SessionClock;
use crate::ecs::components::{AwarenessState, Evidence, PerceptionAgent};
use crate::ecs::events::PerceptionEvent;
use crate::ecs::resources::{AgentRegistry, Inbox, NetEntityMap};
use crate::ecs::time::SimTime;
use crate::id::NetId;
use crate::model::wire::Notification;

/// Exclusive system draining `Inbox::notifications`.
///
/// Runs in `NetPhase::Replicate`, after the command applicator, on mirrors
/// only (`is_mirror`). The authority's applicator discards stray
/// notifications itself.
pub fn apply_inbound_notifications(world: &mut World) {
    let notifications = std::mem::take(&mut world.resource_mut::<Inbox>().notifications);
    if notifications.is_empty() {
        return;
    }
    let now = world.resource::<SessionClock>().time;
    for notification in &notifications {
        if apply_notification(world, notification, now) {
            world
                .resource_mut::<PerceptionBus>()
                .enqueue(PerceptionEvent::from(notification));
        }
    }
}

/// Apply one notification to mirrored state. Returns whether it should be published.
fn apply_notification(world: &mut World, notification: &Notification, now: SimTime) -> bool {
    match notification {
        Notification::AwarenessChanged {
            agent,
            target,
            level,
            stage,
        } => {
            let Some(mut state) = agent_state(world, *agent) else {
                return false;
            };
            state.mirror_entry(*target).mirror_level(*level, *stage, now);
            true
        }
        Notification::StageChanged {
            agent,
            target,
            stage,
        } => {
            let Some(mut state) = agent_state(world, *agent) else {
                return false;
            };
            state.mirror_entry(*target).mirror_stage(*stage);
            true
        }
        Notification::TargetTracked { agent, target } => {
            let Some(mut state) = agent_state(world, *agent) else {
                return false;
            };
            state.track(*target);
            true
        }
        Notification::TargetUntracked { agent, target } => {
            let Some(mut state) = agent_state(world, *agent) else {
                return false;
            };
            state.untrack(*target);
            true
        }
        Notification::StimulusBroadcast { .. } => true,
        Notification::EvidenceChanged {
            evidence, tampered, ..
        } => {
            let Some(entity) = world.resource::<NetEntityMap>().get_entity(*evidence) else {
                tracing::debug!("evidence {evidence} no longer resolves, skipping");
                return false;
            };
            let Some(mut record) = world.get_mut::<Evidence>(entity) else {
                tracing::warn!("{evidence} is not an evidence object on this participant");
                return false;
            };
            record.set_tampered(*tampered);
            true
        }
        Notification::OwnershipChanged { agent, owner } => {
            let Some(entity) = world.resource::<AgentRegistry>().get_by_entity_id(*agent) else {
                tracing::debug!("agent {agent} no longer resolves, skipping ownership change");
                return false;
            };
            world
                .resource_mut::<AgentRegistry>()
                .transfer_ownership(*agent, *owner);
            if let Some(mut component) = world.get_mut::<PerceptionAgent>(entity) {
                component.owner = *owner;
            }
            true
        }
    }
}

fn agent_state(world: &mut World, agent: NetId) -> Option<Mut<'_, AwarenessState>> {
    let Some(entity) = world.resource::<AgentRegistry>().get_by_entity_id(agent) else {
        tracing::debug!("agent {agent} no longer resolves, skipping notification");
        return None;
    };
    world.get_mut::<AwarenessState>(entity)
}
