use bevy_ecs::message::MessageWriter;
use bevy_ecs::query::With;
use bevy_ecs::system::{Query, Res};

use crate::ecs::commands::PerceptionCommand;
use crate::ecs::components::{AwarenessState, NetEntity, PerceptionAgent};
use crate::ecs::resources::NetEntityMap;

/// Untrack targets that have been despawned. Authority only.
pub fn purge_despawned_targets(
    entity_map: Res<NetEntityMap>,
    agents: Query<(&NetEntity, &AwarenessState), With<PerceptionAgent>>,
    mut commands: MessageWriter<PerceptionCommand>,
) {
    for (net, state) in agents.iter() {
        for (target, _) in state.tracked() {
            if !entity_map.contains(target) {
                tracing::debug!("{} tracks despawned {target}, untracking", net.id);
                commands.write(PerceptionCommand::untrack(net.id, target));
            }
        }
    }
}
