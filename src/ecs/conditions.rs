use bevy_ecs::system::Res;

use crate::config::PerceptionConfig;
use crate::ecs::resources::SessionRole;

// Bevy run condition functions (for use with `.run_if()`).

pub fn is_authority(role: Res<SessionRole>) -> bool {
    role.is_authority()
}

pub fn is_mirror(role: Res<SessionRole>) -> bool {
    !role.is_authority()
}

pub fn decay_enabled(config: Res<PerceptionConfig>) -> bool {
    config.decay.is_enabled()
}
