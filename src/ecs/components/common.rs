use bevy_ecs::component::Component;

use crate::id::{NetId, ParticipantId};
use crate::model::stimulus::Position;

/// Identity component present on every entity that is replicated across the session.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetEntity {
    pub id: NetId,
}

/// Marks an entity capable of perceiving others.
///
/// `owner` is the participant controlling the agent, if any (AI agents have none).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerceptionAgent {
    pub owner: Option<ParticipantId>,
}

/// World-space location, consumed by the spatial query.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct WorldPosition(pub Position);
