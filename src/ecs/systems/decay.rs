use bevy_ecs::message::MessageWriter;
use bevy_ecs::query::With;
use bevy_ecs::system::{Query, Res};

use crate::config::PerceptionConfig;
use crate::ecs::clock::SessionClock;
use crate::ecs::commands::PerceptionCommand;
use crate::ecs::components::{AwarenessState, NetEntity, PerceptionAgent};

/// Lower awareness of targets that have not been noticed for a while.
///
/// Authority only. Goes through the normal `SetAwareness` path so clamping,
/// stage edges, and sync suppression all apply.
pub fn decay_awareness(
    clock: Res<SessionClock>,
    config: Res<PerceptionConfig>,
    agents: Query<(&NetEntity, &AwarenessState), With<PerceptionAgent>>,
    mut commands: MessageWriter<PerceptionCommand>,
) {
    let step = config.decay.per_second * clock.tick_secs();
    if step <= 0.0 {
        return;
    }
    for (net, state) in agents.iter() {
        for (target, tracked) in state.tracked() {
            if tracked.level() <= 0.0 {
                continue;
            }
            let idle_ms = tracked
                .last_increase()
                .map_or(u64::MAX, |at| clock.time.millis_since(at));
            if idle_ms < config.decay.delay_ms {
                continue;
            }
            commands.write(PerceptionCommand::set_awareness(
                net.id,
                target,
                (tracked.level() - step).max(0.0),
            ));
        }
    }
}
