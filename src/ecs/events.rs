use bevy_ecs::entity::Entity;
use bevy_ecs::message::Message;

use crate::id::{NetId, ParticipantId};
use crate::model::stage::AwarenessStage;
use crate::model::stimulus::Stimulus;
use crate::model::wire::Notification;

/// Kinds of domain event, used as the event bus subscription key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PerceptionEventKind {
    AwarenessChanged,
    StageChanged,
    TargetTracked,
    TargetUntracked,
    StimulusHeard,
    EvidenceChanged,
    OwnershipChanged,
}

/// Coarse-grained domain events published after a notification has been
/// applied locally.
///
/// Delivered to bus subscribers and written as a Bevy message so systems can
/// consume them with `MessageReader<PerceptionEvent>`.
#[derive(Message, Clone, Debug, PartialEq)]
pub enum PerceptionEvent {
    AwarenessChanged {
        agent: NetId,
        target: NetId,
        level: f32,
        stage: AwarenessStage,
    },
    StageChanged {
        agent: NetId,
        target: NetId,
        stage: AwarenessStage,
    },
    TargetTracked {
        agent: NetId,
        target: NetId,
    },
    TargetUntracked {
        agent: NetId,
        target: NetId,
    },
    StimulusHeard {
        stimulus: Stimulus,
    },
    EvidenceChanged {
        evidence: NetId,
        tampered: bool,
        actor: ParticipantId,
    },
    OwnershipChanged {
        agent: NetId,
        owner: Option<ParticipantId>,
    },
}

impl PerceptionEvent {
    pub fn kind(&self) -> PerceptionEventKind {
        match self {
            PerceptionEvent::AwarenessChanged { .. } => PerceptionEventKind::AwarenessChanged,
            PerceptionEvent::StageChanged { .. } => PerceptionEventKind::StageChanged,
            PerceptionEvent::TargetTracked { .. } => PerceptionEventKind::TargetTracked,
            PerceptionEvent::TargetUntracked { .. } => PerceptionEventKind::TargetUntracked,
            PerceptionEvent::StimulusHeard { .. } => PerceptionEventKind::StimulusHeard,
            PerceptionEvent::EvidenceChanged { .. } => PerceptionEventKind::EvidenceChanged,
            PerceptionEvent::OwnershipChanged { .. } => PerceptionEventKind::OwnershipChanged,
        }
    }

    /// The perceiving agent the event is about, if any.
    pub fn source_agent(&self) -> Option<NetId> {
        match self {
            PerceptionEvent::AwarenessChanged { agent, .. }
            | PerceptionEvent::StageChanged { agent, .. }
            | PerceptionEvent::TargetTracked { agent, .. }
            | PerceptionEvent::TargetUntracked { agent, .. }
            | PerceptionEvent::OwnershipChanged { agent, .. } => Some(*agent),
            PerceptionEvent::StimulusHeard { .. } | PerceptionEvent::EvidenceChanged { .. } => None,
        }
    }
}

impl From<&Notification> for PerceptionEvent {
    fn from(notification: &Notification) -> Self {
        match notification.clone() {
            Notification::AwarenessChanged {
                agent,
                target,
                level,
                stage,
            } => PerceptionEvent::AwarenessChanged {
                agent,
                target,
                level,
                stage,
            },
            Notification::StageChanged {
                agent,
                target,
                stage,
            } => PerceptionEvent::StageChanged {
                agent,
                target,
                stage,
            },
            Notification::TargetTracked { agent, target } => {
                PerceptionEvent::TargetTracked { agent, target }
            }
            Notification::TargetUntracked { agent, target } => {
                PerceptionEvent::TargetUntracked { agent, target }
            }
            Notification::StimulusBroadcast {
                position,
                radius,
                tag,
                intensity,
                origin,
            } => PerceptionEvent::StimulusHeard {
                stimulus: Stimulus {
                    position,
                    radius,
                    tag,
                    intensity,
                    origin,
                },
            },
            Notification::EvidenceChanged {
                evidence,
                tampered,
                actor,
            } => PerceptionEvent::EvidenceChanged {
                evidence,
                tampered,
                actor,
            },
            Notification::OwnershipChanged { agent, owner } => {
                PerceptionEvent::OwnershipChanged { agent, owner }
            }
        }
    }
}

/// A stimulus handed to one agent's local sensing logic on the authority.
///
/// Written exactly once per affected agent per accepted emission.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct StimulusDelivered {
    pub agent: Entity,
    pub agent_id: NetId,
    pub stimulus: Stimulus,
}
