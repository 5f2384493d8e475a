//! Synchronous, read-only lookups for external collaborators.
//!
//! On the authority these return authoritative values; on a mirror, the
//! last replicated ones. Unknown agents read as untracked.

use bevy_ecs::entity::Entity;
use bevy_ecs::world::World;

use crate::ecs::components::{AwarenessState, Evidence};
use crate::ecs::resources::{AgentRegistry, NetEntityMap};
use crate::id::{NetId, ParticipantId};
use crate::model::stage::AwarenessStage;

fn awareness_state(world: &World, agent: NetId) -> Option<&AwarenessState> {
    let entity = world.get_resource::<AgentRegistry>()?.get_by_entity_id(agent)?;
    world.get::<AwarenessState>(entity)
}

pub fn get_awareness(world: &World, agent: NetId, target: NetId) -> f32 {
    awareness_state(world, agent).map_or(0.0, |s| s.awareness(target))
}

pub fn get_stage(world: &World, agent: NetId, target: NetId) -> AwarenessStage {
    awareness_state(world, agent).map_or(AwarenessStage::None, |s| s.stage(target))
}

pub fn is_tracking(world: &World, agent: NetId, target: NetId) -> bool {
    awareness_state(world, agent).is_some_and(|s| s.is_tracking(target))
}

pub fn get_by_entity_id(world: &World, agent: NetId) -> Option<Entity> {
    world.get_resource::<AgentRegistry>()?.get_by_entity_id(agent)
}

pub fn get_by_participant_id(world: &World, participant: ParticipantId) -> Option<Entity> {
    world
        .get_resource::<AgentRegistry>()?
        .get_by_participant_id(participant)
}

pub fn local_agent(world: &World) -> Option<Entity> {
    world.get_resource::<AgentRegistry>()?.local_agent()
}

/// Tamper flag of an evidence object, `None` if it does not resolve.
pub fn is_evidence_tampered(world: &World, evidence: NetId) -> Option<bool> {
    let entity = world.get_resource::<NetEntityMap>()?.get_entity(evidence)?;
    world.get::<Evidence>(entity).map(Evidence::is_tampered)
}
