use bevy_ecs::entity::Entity;
use bevy_ecs::query::With;
use bevy_ecs::world::World;

use crate::ecs::bus::PerceptionBus;
use crate::ecs::components::*;
use crate::ecs::resources::{AgentRegistry, Inbox, NetEntityMap, Outbox, StimulusRateLimiter};
use crate::id::{NetId, ParticipantId};
use crate::model::stimulus::Position;

fn map_net_id(world: &mut World, id: NetId, entity: Entity) -> bool {
    match world.get_resource_mut::<NetEntityMap>() {
        Some(mut map) => map.insert(id, entity),
        None => false,
    }
}

/// Spawn a perception agent and register it.
///
/// If `id` is already in use, nothing is spawned and the existing entity is
/// returned.
pub fn spawn_agent(
    world: &mut World,
    id: NetId,
    owner: Option<ParticipantId>,
    position: Position,
) -> Entity {
    if let Some(existing) = world.resource::<NetEntityMap>().get_entity(id) {
        tracing::warn!("{id} already spawned, not spawning a second agent");
        return existing;
    }
    let entity = world
        .spawn((
            NetEntity { id },
            PerceptionAgent { owner },
            AwarenessState::default(),
            WorldPosition(position),
        ))
        .id();
    map_net_id(world, id, entity);
    register_agent(world, id, entity);
    entity
}

/// Register an existing agent entity. Re-registration is a logged no-op.
pub fn register_agent(world: &mut World, id: NetId, entity: Entity) -> bool {
    let owner = world.get::<PerceptionAgent>(entity).and_then(|a| a.owner);
    world
        .resource_mut::<AgentRegistry>()
        .register(id, entity, owner)
}

/// Spawn a plain perceivable entity (a player body, a prop).
pub fn spawn_target(world: &mut World, id: NetId, position: Position) -> Entity {
    if let Some(existing) = world.resource::<NetEntityMap>().get_entity(id) {
        tracing::warn!("{id} already spawned");
        return existing;
    }
    let entity = world
        .spawn((NetEntity { id }, WorldPosition(position)))
        .id();
    map_net_id(world, id, entity);
    entity
}

/// Spawn an untampered evidence object.
pub fn spawn_evidence(world: &mut World, id: NetId, tag: &str) -> Entity {
    if let Some(existing) = world.resource::<NetEntityMap>().get_entity(id) {
        tracing::warn!("{id} already spawned");
        return existing;
    }
    let entity = world.spawn((NetEntity { id }, Evidence::new(tag))).id();
    map_net_id(world, id, entity);
    entity
}

/// Despawn a replicated entity, unregistering it first if it is an agent.
///
/// Returns false when `id` does not resolve.
pub fn despawn_net_entity(world: &mut World, id: NetId) -> bool {
    let Some(entity) = world.resource_mut::<NetEntityMap>().remove(id) else {
        return false;
    };
    world.resource_mut::<AgentRegistry>().unregister(id);
    world.despawn(entity);
    true
}

/// Tear the session down: despawn every replicated entity and reset all
/// session-scoped indices and queues.
pub fn teardown_session(world: &mut World) {
    let entities: Vec<Entity> = world
        .query_filtered::<Entity, With<NetEntity>>()
        .iter(world)
        .collect();
    let count = entities.len();
    for entity in entities {
        world.despawn(entity);
    }

    world.resource_mut::<NetEntityMap>().clear();
    world.resource_mut::<AgentRegistry>().clear();
    world.resource_mut::<StimulusRateLimiter>().clear();
    world.resource_mut::<PerceptionBus>().clear_pending();
    world.resource_mut::<Inbox>().clear();
    world.resource_mut::<Outbox>().clear();
    tracing::info!("session torn down, {count} replicated entities despawned");
}
