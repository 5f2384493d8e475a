use bevy_app::App;
use bevy_ecs::message::MessageRegistry;
use bevy_ecs::schedule::{ExecutorKind, IntoScheduleConfigs};

use crate::config::PerceptionConfig;
use crate::id::ParticipantId;

use super::bus::{PerceptionBus, dispatch_perception_events};
use super::clock::SessionClock;
use super::commands::{PerceptionCommand, apply_perception_commands};
use super::conditions::{decay_enabled, is_authority, is_mirror};
use super::events::{PerceptionEvent, StimulusDelivered};
use super::resources::{AgentRegistry, Inbox, NetEntityMap, Outbox, SessionRole, StimulusRateLimiter};
use super::schedule::{NetPhase, configure_net_schedule};
use super::spatial::SpatialQuery;
use super::systems::{apply_inbound_notifications, decay_awareness, purge_despawned_targets};

/// Build a headless app for the session authority.
///
/// Manual tick control:
/// ```no_run
/// # use perception_sync::config::PerceptionConfig;
/// # use perception_sync::ecs::{build_authority_app, NetTick};
/// let mut app = build_authority_app(PerceptionConfig::default());
/// for _ in 0..60 {
///     app.world_mut().run_schedule(NetTick);
/// }
/// ```
pub fn build_authority_app(config: PerceptionConfig) -> App {
    build_perception_app(SessionRole::authority(), config)
}

/// Build a headless app for a mirror participant. `None` for participant 0.
pub fn build_mirror_app(participant: ParticipantId, config: PerceptionConfig) -> Option<App> {
    let role = SessionRole::mirror(participant)?;
    Some(build_perception_app(role, config))
}

/// Build a headless app with a single-threaded executor.
pub fn build_perception_app(role: SessionRole, config: PerceptionConfig) -> App {
    build_perception_app_with_executor(role, config, ExecutorKind::SingleThreaded)
}

/// Build a headless app with a specific executor kind.
pub fn build_perception_app_with_executor(
    role: SessionRole,
    config: PerceptionConfig,
    executor: ExecutorKind,
) -> App {
    let config = config.normalized();
    let mut app = App::empty();

    // Core resources
    app.insert_resource(SessionClock::new(config.tick_millis));
    app.insert_resource(role);
    app.insert_resource(NetEntityMap::new());
    app.insert_resource(AgentRegistry::new(role.participant()));
    app.insert_resource(config);
    app.init_resource::<Outbox>();
    app.init_resource::<Inbox>();
    app.init_resource::<StimulusRateLimiter>();
    app.init_resource::<PerceptionBus>();
    app.init_resource::<SpatialQuery>();

    // Register message types
    MessageRegistry::register_message::<PerceptionCommand>(app.world_mut());
    MessageRegistry::register_message::<PerceptionEvent>(app.world_mut());
    MessageRegistry::register_message::<StimulusDelivered>(app.world_mut());

    let mut schedule = configure_net_schedule(executor);
    schedule.add_systems(bevy_ecs::message::message_update_system.in_set(NetPhase::Receive));
    schedule.add_systems(
        (
            purge_despawned_targets,
            decay_awareness.run_if(decay_enabled),
        )
            .chain()
            .run_if(is_authority)
            .in_set(NetPhase::Update),
    );
    schedule.add_systems(
        (
            apply_perception_commands,
            apply_inbound_notifications.run_if(is_mirror),
        )
            .chain()
            .in_set(NetPhase::Replicate),
    );
    schedule.add_systems(dispatch_perception_events.in_set(NetPhase::Publish));
    app.add_schedule(schedule);

    tracing::info!(
        "built perception app for {} ({:?})",
        role.participant(),
        role.role()
    );
    app
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use bevy_ecs::schedule::IntoScheduleConfigs;

    use super::*;
    use crate::ecs::schedule::NetTick;
    use crate::id::NetId;
    use crate::model::stimulus::Position;
    use crate::model::wire::{Notification, WireMessage};

    #[test]
    fn app_builds_without_panic() {
        let _authority = build_authority_app(PerceptionConfig::default());
        let _mirror = build_mirror_app(ParticipantId(1), PerceptionConfig::default()).unwrap();
    }

    #[test]
    fn mirror_app_refuses_the_authority_id() {
        assert!(build_mirror_app(ParticipantId::AUTHORITY, PerceptionConfig::default()).is_none());
    }

    #[test]
    fn mirror_applies_inbound_notifications() {
        let mut app = build_mirror_app(ParticipantId(1), PerceptionConfig::default()).unwrap();
        crate::ecs::spawn::spawn_agent(
            app.world_mut(),
            NetId(1),
            Some(ParticipantId(1)),
            Position::default(),
        );
        app.world_mut().resource_mut::<Inbox>().deliver(
            ParticipantId::AUTHORITY,
            WireMessage::Notify(Notification::TargetTracked {
                agent: NetId(1),
                target: NetId(2),
            }),
        );
        app.world_mut().run_schedule(NetTick);

        assert!(app.world().resource::<Inbox>().is_empty());
        assert!(crate::ecs::query::is_tracking(app.world(), NetId(1), NetId(2)));
    }

    #[test]
    fn single_tick_advances_clock() {
        let mut app = build_authority_app(PerceptionConfig::default());
        app.world_mut().run_schedule(NetTick);
        let clock = app.world().resource::<SessionClock>();
        assert_eq!(clock.tick_count, 1);
        assert_eq!(clock.time.as_millis(), 16);
    }

    #[test]
    fn role_and_registry_follow_participant() {
        let app = build_mirror_app(ParticipantId(3), PerceptionConfig::default()).unwrap();
        let role = app.world().resource::<SessionRole>();
        assert!(!role.is_authority());
        assert_eq!(
            app.world().resource::<AgentRegistry>().local_participant(),
            ParticipantId(3)
        );
    }

    #[test]
    fn config_is_normalized_on_build() {
        let config = PerceptionConfig {
            tick_millis: 0,
            ..PerceptionConfig::default()
        };
        let app = build_authority_app(config);
        assert_eq!(app.world().resource::<PerceptionConfig>().tick_millis, 16);
    }

    #[test]
    fn phase_ordering_respected() {
        let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        let mut app = build_authority_app(PerceptionConfig::default());
        for (phase, label) in [
            (NetPhase::Receive, "receive"),
            (NetPhase::Update, "update"),
            (NetPhase::Replicate, "replicate"),
            (NetPhase::Publish, "publish"),
            (NetPhase::Last, "last"),
        ] {
            let log = log.clone();
            app.add_systems(
                NetTick,
                (move || {
                    log.lock().unwrap().push(label);
                })
                .in_set(phase),
            );
        }

        app.world_mut().run_schedule(NetTick);

        let entries = log.lock().unwrap();
        assert_eq!(
            *entries,
            vec!["receive", "update", "replicate", "publish", "last"]
        );
    }
}
