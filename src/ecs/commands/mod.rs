pub mod applicator;
mod apply_stimulus;
pub mod authority;

use bevy_ecs::message::{Message, Messages};
use bevy_ecs::world::World;

use crate::id::NetId;
use crate::model::stimulus::Position;
use crate::model::wire::Request;

pub use applicator::apply_perception_commands;
pub use authority::AuthorityWriter;

/// A locally issued perception operation.
///
/// Sensor logic emits these via `MessageWriter<PerceptionCommand>`. The
/// applicator in `NetPhase::Replicate` applies them directly on the authority
/// and forwards them as requests on a mirror, where they have no local effect.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct PerceptionCommand(pub Request);

impl PerceptionCommand {
    pub fn set_awareness(agent: NetId, target: NetId, level: f32) -> Self {
        Self(Request::SetAwareness {
            agent,
            target,
            level,
        })
    }

    pub fn add_awareness(agent: NetId, target: NetId, delta: f32, max: f32) -> Self {
        Self(Request::AddAwareness {
            agent,
            target,
            delta,
            max,
        })
    }

    pub fn track(agent: NetId, target: NetId) -> Self {
        Self(Request::TrackTarget { agent, target })
    }

    pub fn untrack(agent: NetId, target: NetId) -> Self {
        Self(Request::UntrackTarget { agent, target })
    }

    pub fn emit_stimulus(position: Position, radius: f32, tag: impl Into<String>, intensity: f32) -> Self {
        Self(Request::EmitStimulus {
            position,
            radius,
            tag: tag.into(),
            intensity,
        })
    }

    pub fn tamper_evidence(evidence: NetId) -> Self {
        Self(Request::TamperEvidence { evidence })
    }

    pub fn restore_evidence(evidence: NetId) -> Self {
        Self(Request::RestoreEvidence { evidence })
    }
}

/// Queue a command from outside a system (tests, glue code).
pub fn queue_command(world: &mut World, command: PerceptionCommand) {
    if let Some(mut messages) = world.get_resource_mut::<Messages<PerceptionCommand>>() {
        messages.write(command);
    } else {
        tracing::warn!("PerceptionCommand is not registered, dropping {:?}", command.0);
    }
}
