pub mod app;
pub mod bus;
pub mod clock;
pub mod commands;
pub mod components;
pub mod conditions;
pub mod events;
pub mod query;
pub mod resources;
pub mod schedule;
pub mod spatial;
pub mod spawn;
pub mod systems;
pub mod test_helpers;
pub mod time;

pub use app::{
    build_authority_app, build_mirror_app, build_perception_app,
    build_perception_app_with_executor,
};
pub use bus::{BusContext, PerceptionBus, SubscriberError, SubscriptionId};
pub use clock::SessionClock;
pub use commands::{AuthorityWriter, PerceptionCommand, queue_command};
pub use components::{AwarenessState, Evidence, NetEntity, PerceptionAgent, TrackedTarget, WorldPosition};
pub use conditions::{decay_enabled, is_authority, is_mirror};
pub use events::{PerceptionEvent, PerceptionEventKind, StimulusDelivered};
pub use resources::{
    AgentRegistry, Inbox, NetEntityMap, Outbox, Role, SessionRole, StimulusRateLimiter,
};
pub use schedule::{NetPhase, NetTick, configure_net_schedule};
pub use spatial::{LinearScan, SpatialIndex, SpatialQuery};
pub use spawn::{
    despawn_net_entity, register_agent, spawn_agent, spawn_evidence, spawn_target,
    teardown_session,
};
pub use time::SimTime;
