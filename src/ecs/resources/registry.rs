use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use bevy_ecs::entity::Entity;
use bevy_ecs::resource::Resource;

use crate::id::{NetId, ParticipantId};

#[derive(Debug, Clone, Copy)]
struct AgentRow {
    entity: Entity,
    owner: Option<ParticipantId>,
}

/// Directory of active perception agents for one participant's world.
///
/// Indexed by `NetId` and by owning participant so lookups never scan the
/// world. A participant owning several agents resolves to the one with the
/// lowest `NetId`. "The local participant's own agent" is cached and
/// recomputed lazily after any write.
#[derive(Resource, Debug)]
pub struct AgentRegistry {
    local_participant: ParticipantId,
    by_net: HashMap<NetId, AgentRow>,
    by_participant: HashMap<ParticipantId, BTreeSet<NetId>>,
    local_cache: OnceLock<Option<Entity>>,
}

impl AgentRegistry {
    pub fn new(local_participant: ParticipantId) -> Self {
        Self {
            local_participant,
            by_net: HashMap::new(),
            by_participant: HashMap::new(),
            local_cache: OnceLock::new(),
        }
    }

    pub fn local_participant(&self) -> ParticipantId {
        self.local_participant
    }

    /// Register an agent. Re-registering an already registered id is a no-op.
    pub fn register(&mut self, net_id: NetId, entity: Entity, owner: Option<ParticipantId>) -> bool {
        if self.by_net.contains_key(&net_id) {
            tracing::warn!("agent {net_id} is already registered");
            return false;
        }
        self.by_net.insert(net_id, AgentRow { entity, owner });
        if let Some(owner) = owner {
            self.index_owner(owner, net_id);
        }
        self.invalidate();
        true
    }

    /// Remove an agent, returning its entity if it was registered.
    pub fn unregister(&mut self, net_id: NetId) -> Option<Entity> {
        let row = self.by_net.remove(&net_id)?;
        if let Some(owner) = row.owner {
            self.unindex_owner(owner, net_id);
        }
        self.invalidate();
        Some(row.entity)
    }

    /// Move an agent to a new owner (or to none). Returns false if the agent
    /// is unknown or already has that owner.
    pub fn transfer_ownership(&mut self, net_id: NetId, owner: Option<ParticipantId>) -> bool {
        let Some(row) = self.by_net.get_mut(&net_id) else {
            return false;
        };
        if row.owner == owner {
            return false;
        }
        let previous = std::mem::replace(&mut row.owner, owner);
        if let Some(previous) = previous {
            self.unindex_owner(previous, net_id);
        }
        if let Some(owner) = owner {
            self.index_owner(owner, net_id);
        }
        self.invalidate();
        true
    }

    pub fn get_by_entity_id(&self, net_id: NetId) -> Option<Entity> {
        self.by_net.get(&net_id).map(|row| row.entity)
    }

    pub fn get_by_participant_id(&self, participant: ParticipantId) -> Option<Entity> {
        let net_id = self.by_participant.get(&participant)?.first()?;
        self.get_by_entity_id(*net_id)
    }

    /// Owner of an agent, or `None` if unowned or unregistered.
    pub fn owner_of(&self, net_id: NetId) -> Option<ParticipantId> {
        self.by_net.get(&net_id).and_then(|row| row.owner)
    }

    /// The agent owned by the local participant, if any.
    pub fn local_agent(&self) -> Option<Entity> {
        *self
            .local_cache
            .get_or_init(|| self.get_by_participant_id(self.local_participant))
    }

    pub fn agents(&self) -> impl Iterator<Item = (NetId, Entity)> + '_ {
        self.by_net.iter().map(|(id, row)| (*id, row.entity))
    }

    pub fn len(&self) -> usize {
        self.by_net.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_net.is_empty()
    }

    /// Drop every entry. Called on session teardown.
    pub fn clear(&mut self) {
        self.by_net.clear();
        self.by_participant.clear();
        self.invalidate();
    }

    fn index_owner(&mut self, owner: ParticipantId, net_id: NetId) {
        let owned = self.by_participant.entry(owner).or_default();
        owned.insert(net_id);
        if owned.len() > 1 {
            tracing::debug!("{owner} owns {} agents", owned.len());
        }
    }

    fn unindex_owner(&mut self, owner: ParticipantId, net_id: NetId) {
        if let Some(owned) = self.by_participant.get_mut(&owner) {
            owned.remove(&net_id);
            if owned.is_empty() {
                self.by_participant.remove(&owner);
            }
        }
    }

    fn invalidate(&mut self) {
        self.local_cache = OnceLock::new();
    }
}

#[cfg(test)]
mod tests {
    use bevy_ecs::world::World;

    use super::*;

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn register_then_lookup() {
        let e = entities(1);
        let mut reg = AgentRegistry::new(ParticipantId(1));
        assert!(reg.register(NetId(10), e[0], Some(ParticipantId(1))));
        assert_eq!(reg.get_by_entity_id(NetId(10)), Some(e[0]));
        assert_eq!(reg.get_by_participant_id(ParticipantId(1)), Some(e[0]));
        assert_eq!(reg.owner_of(NetId(10)), Some(ParticipantId(1)));
    }

    #[test]
    fn unregister_removes_both_indices() {
        let e = entities(1);
        let mut reg = AgentRegistry::new(ParticipantId(1));
        reg.register(NetId(10), e[0], Some(ParticipantId(1)));
        assert_eq!(reg.unregister(NetId(10)), Some(e[0]));
        assert_eq!(reg.get_by_entity_id(NetId(10)), None);
        assert_eq!(reg.get_by_participant_id(ParticipantId(1)), None);
        assert_eq!(reg.unregister(NetId(10)), None);
    }

    #[test]
    fn reregister_is_a_noop() {
        let e = entities(2);
        let mut reg = AgentRegistry::new(ParticipantId(1));
        reg.register(NetId(10), e[0], None);
        assert!(!reg.register(NetId(10), e[1], None));
        assert_eq!(reg.get_by_entity_id(NetId(10)), Some(e[0]));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn local_agent_is_recomputed_after_writes() {
        let e = entities(2);
        let mut reg = AgentRegistry::new(ParticipantId(2));
        assert_eq!(reg.local_agent(), None);

        reg.register(NetId(1), e[0], Some(ParticipantId(2)));
        assert_eq!(reg.local_agent(), Some(e[0]));

        reg.register(NetId(2), e[1], Some(ParticipantId(3)));
        assert!(reg.transfer_ownership(NetId(1), Some(ParticipantId(3))));
        assert_eq!(reg.local_agent(), None);

        assert!(reg.transfer_ownership(NetId(2), Some(ParticipantId(2))));
        assert_eq!(reg.local_agent(), Some(e[1]));

        reg.unregister(NetId(2));
        assert_eq!(reg.local_agent(), None);
    }

    #[test]
    fn transfer_to_same_owner_is_rejected() {
        let e = entities(1);
        let mut reg = AgentRegistry::new(ParticipantId(1));
        reg.register(NetId(1), e[0], Some(ParticipantId(1)));
        assert!(!reg.transfer_ownership(NetId(1), Some(ParticipantId(1))));
        assert!(!reg.transfer_ownership(NetId(99), None));
    }

    #[test]
    fn unregister_older_keeps_newer_owned_agent() {
        let e = entities(2);
        let mut reg = AgentRegistry::new(ParticipantId(1));
        reg.register(NetId(1), e[0], Some(ParticipantId(4)));
        reg.register(NetId(2), e[1], Some(ParticipantId(4)));
        reg.unregister(NetId(1));
        assert_eq!(reg.get_by_participant_id(ParticipantId(4)), Some(e[1]));
    }

    #[test]
    fn unregister_newer_keeps_older_owned_agent() {
        let e = entities(2);
        let mut reg = AgentRegistry::new(ParticipantId(4));
        reg.register(NetId(1), e[0], Some(ParticipantId(4)));
        reg.register(NetId(2), e[1], Some(ParticipantId(4)));
        reg.unregister(NetId(2));
        assert_eq!(reg.owner_of(NetId(1)), Some(ParticipantId(4)));
        assert_eq!(reg.get_by_participant_id(ParticipantId(4)), Some(e[0]));
        assert_eq!(reg.local_agent(), Some(e[0]));
    }

    #[test]
    fn transfer_away_keeps_remaining_owned_agent() {
        let e = entities(2);
        let mut reg = AgentRegistry::new(ParticipantId(4));
        reg.register(NetId(1), e[0], Some(ParticipantId(4)));
        reg.register(NetId(2), e[1], Some(ParticipantId(4)));
        assert_eq!(reg.local_agent(), Some(e[0]));

        assert!(reg.transfer_ownership(NetId(1), Some(ParticipantId(5))));
        assert_eq!(reg.local_agent(), Some(e[1]));
        assert_eq!(reg.get_by_participant_id(ParticipantId(5)), Some(e[0]));

        assert!(reg.transfer_ownership(NetId(2), None));
        assert_eq!(reg.local_agent(), None);
    }

    #[test]
    fn clear_empties_everything() {
        let e = entities(2);
        let mut reg = AgentRegistry::new(ParticipantId(1));
        reg.register(NetId(1), e[0], Some(ParticipantId(1)));
        reg.register(NetId(2), e[1], None);
        assert!(reg.local_agent().is_some());
        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.local_agent(), None);
        assert_eq!(reg.get_by_participant_id(ParticipantId(1)), None);
    }
}
