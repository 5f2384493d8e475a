use std::collections::HashMap;

use bevy_ecs::entity::Entity;
use bevy_ecs::resource::Resource;

use crate::id::NetId;

/// Bidirectional mapping between session-stable `NetId`s and local Bevy entities.
///
/// Covers every replicated entity (agents, targets, evidence). A `NetId`
/// missing from the map is how despawned references are detected.
#[derive(Resource, Debug, Clone, Default)]
pub struct NetEntityMap {
    to_bevy: HashMap<NetId, Entity>,
    to_net: HashMap<Entity, NetId>,
}

impl NetEntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping. Returns false, leaving the map untouched, if the
    /// `NetId` is already mapped.
    pub fn insert(&mut self, net_id: NetId, entity: Entity) -> bool {
        if self.to_bevy.contains_key(&net_id) {
            tracing::warn!("duplicate {net_id} in NetEntityMap, keeping existing entity");
            return false;
        }
        self.to_bevy.insert(net_id, entity);
        self.to_net.insert(entity, net_id);
        true
    }

    /// Remove a mapping, returning the entity it pointed at.
    pub fn remove(&mut self, net_id: NetId) -> Option<Entity> {
        let entity = self.to_bevy.remove(&net_id)?;
        self.to_net.remove(&entity);
        Some(entity)
    }

    /// Look up a Bevy entity by `NetId`.
    pub fn get_entity(&self, net_id: NetId) -> Option<Entity> {
        self.to_bevy.get(&net_id).copied()
    }

    /// Look up a `NetId` by Bevy entity.
    pub fn get_net(&self, entity: Entity) -> Option<NetId> {
        self.to_net.get(&entity).copied()
    }

    pub fn contains(&self, net_id: NetId) -> bool {
        self.to_bevy.contains_key(&net_id)
    }

    pub fn net_ids(&self) -> impl Iterator<Item = NetId> + '_ {
        self.to_bevy.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.to_bevy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_bevy.is_empty()
    }

    pub fn clear(&mut self) {
        self.to_bevy.clear();
        self.to_net.clear();
    }
}

#[cfg(test)]
mod tests {
    use bevy_ecs::world::World;

    use super::*;

    #[test]
    fn insert_and_lookup_both_ways() {
        let mut world = World::new();
        let e = world.spawn_empty().id();
        let mut map = NetEntityMap::new();
        assert!(map.insert(NetId(5), e));
        assert_eq!(map.get_entity(NetId(5)), Some(e));
        assert_eq!(map.get_net(e), Some(NetId(5)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut map = NetEntityMap::new();
        map.insert(NetId(1), a);
        assert!(!map.insert(NetId(1), b));
        assert_eq!(map.get_entity(NetId(1)), Some(a));
        assert_eq!(map.get_net(b), None);
    }

    #[test]
    fn remove_clears_both_directions() {
        let mut world = World::new();
        let e = world.spawn_empty().id();
        let mut map = NetEntityMap::new();
        map.insert(NetId(2), e);
        assert_eq!(map.remove(NetId(2)), Some(e));
        assert!(map.get_net(e).is_none());
        assert!(map.is_empty());
        assert_eq!(map.remove(NetId(2)), None);
    }
}
