use bevy_ecs::schedule::{ExecutorKind, IntoScheduleConfigs, Schedule, ScheduleLabel, SystemSet};

use super::clock::advance_clock;

/// Schedule label for one network tick.
/// Run manually each tick via `app.world_mut().run_schedule(NetTick)`.
#[derive(ScheduleLabel, Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetTick;

/// Ordered phases within each tick.
///
/// ```text
/// Receive    rotate message buffers
/// Update     external sensor logic, decay, despawn purge
/// Replicate  apply or forward requests, apply inbound notifications
/// Publish    event bus dispatch
/// Last       clock advance
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum NetPhase {
    Receive,
    Update,
    Replicate,
    Publish,
    Last,
}

/// Build a configured `NetTick` schedule with phase ordering.
pub fn configure_net_schedule(executor: ExecutorKind) -> Schedule {
    let mut schedule = Schedule::new(NetTick);
    schedule.set_executor_kind(executor);
    schedule.configure_sets(
        (
            NetPhase::Receive,
            NetPhase::Update,
            NetPhase::Replicate,
            NetPhase::Publish,
            NetPhase::Last,
        )
            .chain(),
    );
    schedule.add_systems(advance_clock.in_set(NetPhase::Last));
    schedule
}
