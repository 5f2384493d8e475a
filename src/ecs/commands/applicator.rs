use bevy_ecs::message::Messages;
use bevy_ecs::world::World;

use crate::ecs::resources::{Inbox, Outbox, SessionRole};

use super::PerceptionCommand;
use super::authority::AuthorityWriter;

/// Exclusive system that drains pending `PerceptionCommand` messages.
///
/// On the authority, local commands and inbound remote requests are applied
/// through an `AuthorityWriter`, and the resulting notifications are broadcast
/// and published locally. On a mirror, local commands are forwarded to the
/// authority as requests and have no local effect. Floats JSON cannot
/// carry are saturated before forwarding.
///
/// Runs in `NetPhase::Replicate`.
pub fn apply_perception_commands(world: &mut World) {
    let local: Vec<PerceptionCommand> = match world.get_resource_mut::<Messages<PerceptionCommand>>() {
        Some(mut messages) => messages.drain().collect(),
        None => Vec::new(),
    };
    let role = *world.resource::<SessionRole>();

    if !role.is_authority() {
        if local.is_empty() {
            return;
        }
        let mut outbox = world.resource_mut::<Outbox>();
        for PerceptionCommand(request) in local {
            let Some(forwarded) = request.wire_safe() else {
                tracing::warn!("dropping {request:?}: the authority would reject it");
                continue;
            };
            tracing::debug!("forwarding {forwarded:?} to the authority");
            outbox.push_request(role.participant(), forwarded);
        }
        return;
    }

    let (remote, stray) = {
        let mut inbox = world.resource_mut::<Inbox>();
        (
            std::mem::take(&mut inbox.requests),
            std::mem::take(&mut inbox.notifications),
        )
    };
    if !stray.is_empty() {
        tracing::warn!("authority dropped {} inbound notifications", stray.len());
    }
    if local.is_empty() && remote.is_empty() {
        return;
    }

    let Some(mut writer) = AuthorityWriter::new(world) else {
        return;
    };
    for PerceptionCommand(request) in local {
        writer.apply_request(role.participant(), request);
    }
    for (from, request) in remote {
        if !writer.permits(from, &request) {
            tracing::warn!("rejected {request:?} from {from}: not permitted by remote policy");
            continue;
        }
        writer.apply_request(from, request);
    }
    let sent = writer.commit();
    if sent > 0 {
        tracing::debug!("broadcasting {sent} perception notifications");
    }
}
