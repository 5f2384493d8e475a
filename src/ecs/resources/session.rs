use bevy_ecs::resource::Resource;

use crate::id::ParticipantId;

/// Whether this participant owns the authoritative copy of perception state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Authority,
    Mirror,
}

/// Role of the local participant, fixed when the app is built.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRole {
    role: Role,
    participant: ParticipantId,
}

impl SessionRole {
    pub fn authority() -> Self {
        Self {
            role: Role::Authority,
            participant: ParticipantId::AUTHORITY,
        }
    }

    /// A mirror participant. `None` for participant 0, which is reserved for
    /// the authority.
    pub fn mirror(participant: ParticipantId) -> Option<Self> {
        if participant == ParticipantId::AUTHORITY {
            tracing::warn!("{participant} is reserved for the authority, not a mirror");
            return None;
        }
        Some(Self {
            role: Role::Mirror,
            participant,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn participant(&self) -> ParticipantId {
        self.participant
    }

    pub fn is_authority(&self) -> bool {
        self.role == Role::Authority
    }
}
