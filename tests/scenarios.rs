mod common;

use bevy_ecs::message::Messages;
use common::*;
use perception_sync::config::PerceptionConfig;
use perception_sync::ecs::commands::{PerceptionCommand, queue_command};
use perception_sync::ecs::events::{PerceptionEvent, PerceptionEventKind, StimulusDelivered};
use perception_sync::ecs::resources::Outbox;
use perception_sync::ecs::test_helpers::{command_and_tick, count_kind, record_events, tick};
use perception_sync::ecs::{
    PerceptionBus, build_authority_app, despawn_net_entity, query, spawn_agent,
    spawn_target,
};
use perception_sync::id::{NetId, ParticipantId};
use perception_sync::model::{AwarenessStage, Notification, Position, WireMessage};
use std::sync::{Arc, Mutex};

#[test]
fn set_awareness_on_authority_publishes_one_level_and_one_stage_event() {
    let mut app = build_authority_app(PerceptionConfig::default());
    spawn_agent(app.world_mut(), AGENT, None, Position::default());
    spawn_target(app.world_mut(), TARGET, Position::default());
    let log = record_events(&mut app);

    command_and_tick(&mut app, PerceptionCommand::set_awareness(AGENT, TARGET, 0.5));

    let recorded = events(&log);
    let levels: Vec<_> = recorded
        .iter()
        .filter_map(|e| match e {
            PerceptionEvent::AwarenessChanged { level, stage, .. } => Some((*level, *stage)),
            _ => None,
        })
        .collect();
    let stages: Vec<_> = recorded
        .iter()
        .filter_map(|e| match e {
            PerceptionEvent::StageChanged { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(levels, vec![(0.5, AwarenessStage::Alert)]);
    assert_eq!(stages, vec![AwarenessStage::Alert]);
    assert_eq!(query::get_awareness(app.world(), AGENT, TARGET), 0.5);
    assert_eq!(query::get_stage(app.world(), AGENT, TARGET), AwarenessStage::Alert);
}

#[test]
fn direct_write_on_mirror_has_no_local_effect_or_broadcast() {
    let mut hub = agent_and_target(1, PerceptionConfig::default());
    let log = record_events(hub.mirror_mut(0));

    let mirror = hub.mirror_mut(0);
    command_and_tick(mirror, PerceptionCommand::set_awareness(AGENT, TARGET, 0.9));

    assert_eq!(query::get_awareness(mirror.world(), AGENT, TARGET), 0.0);
    assert!(!query::is_tracking(mirror.world(), AGENT, TARGET));
    assert!(events(&log).is_empty());

    // Forwarded as a request, never as a notification.
    let outbox = mirror.world().resource::<Outbox>();
    assert_eq!(outbox.len(), 1);
    assert!(
        outbox
            .messages()
            .iter()
            .all(|m| matches!(m, WireMessage::Request { .. }))
    );
    assert_eq!(outbox_len(hub.authority()), 0);
}

#[test]
fn stimulus_reaches_only_agents_within_radius() {
    let mut app = build_authority_app(PerceptionConfig::default());
    let origin = Position::new(1.0, 1.0, 0.0);
    let near = spawn_agent(app.world_mut(), NetId(1), None, Position::new(3.0, 1.0, 0.0));
    let mid = spawn_agent(app.world_mut(), NetId(2), None, Position::new(1.0, 5.0, 0.0));
    let far = spawn_agent(app.world_mut(), NetId(3), None, Position::new(1.0, 1.0, 6.0));

    command_and_tick(
        &mut app,
        PerceptionCommand::emit_stimulus(origin, 5.0, "footstep", 3.0),
    );

    let delivered: Vec<StimulusDelivered> = app
        .world_mut()
        .resource_mut::<Messages<StimulusDelivered>>()
        .drain()
        .collect();
    let count_for = |e| delivered.iter().filter(|d| d.agent == e).count();
    assert_eq!(count_for(near), 1);
    assert_eq!(count_for(mid), 1);
    assert_eq!(count_for(far), 0);
    assert!(delivered.iter().all(|d| d.stimulus.tag == "footstep"));
    assert!(delivered.iter().all(|d| d.stimulus.intensity == 3.0));
}

#[test]
fn eleventh_stimulus_in_one_window_is_dropped() {
    let mut app = build_authority_app(PerceptionConfig::default());
    let log = record_events(&mut app);

    for _ in 0..11 {
        queue_command(
            app.world_mut(),
            PerceptionCommand::emit_stimulus(Position::default(), 4.0, "footstep", 1.0),
        );
    }
    tick(&mut app);

    assert_eq!(count_kind(&log, PerceptionEventKind::StimulusHeard), 10);
    let broadcasts = app
        .world()
        .resource::<Outbox>()
        .messages()
        .iter()
        .filter(|m| matches!(m, WireMessage::Notify(Notification::StimulusBroadcast { .. })))
        .count();
    assert_eq!(broadcasts, 10);
}

#[test]
fn stale_notification_for_despawned_target_resolves_as_absent() {
    let mut hub = agent_and_target(1, PerceptionConfig::default());

    let seen = Arc::new(Mutex::new(Vec::<Option<bevy_ecs::entity::Entity>>::new()));
    {
        let seen = seen.clone();
        hub.mirror_mut(0)
            .world_mut()
            .resource_mut::<PerceptionBus>()
            .subscribe(
                PerceptionEventKind::AwarenessChanged,
                move |event, ctx| {
                    if let PerceptionEvent::AwarenessChanged { target, .. } = event {
                        seen.lock().unwrap().push(ctx.resolve(*target));
                    }
                    Ok(())
                },
            );
    }

    queue_command(
        hub.authority_mut().world_mut(),
        PerceptionCommand::track(AGENT, TARGET),
    );
    queue_command(
        hub.authority_mut().world_mut(),
        PerceptionCommand::set_awareness(AGENT, TARGET, 0.3),
    );
    tick(hub.authority_mut());
    hub.pump();

    // Notification is in flight; the mirror loses the target first.
    assert!(despawn_net_entity(hub.mirror_mut(0).world_mut(), TARGET));
    tick(hub.mirror_mut(0));

    assert_eq!(*seen.lock().unwrap(), vec![None]);
    let bus = hub.mirror(0).world().resource::<PerceptionBus>();
    assert_eq!(bus.failures(), 0);
}

#[test]
fn stimulus_from_mirror_is_broadcast_to_every_participant() {
    let mut hub = session(2, PerceptionConfig::default());
    agent_everywhere(&mut hub, AGENT, Some(ParticipantId(1)), Position::default());
    let mirror_two = record_events(hub.mirror_mut(1));

    queue_command(
        hub.mirror_mut(0).world_mut(),
        PerceptionCommand::emit_stimulus(Position::new(1.0, 0.0, 0.0), 2.0, "glass", 5.0),
    );
    hub.settle(10);

    let heard: Vec<_> = events(&mirror_two)
        .into_iter()
        .filter_map(|e| match e {
            PerceptionEvent::StimulusHeard { stimulus } => Some(stimulus),
            _ => None,
        })
        .collect();
    assert_eq!(heard.len(), 1);
    assert_eq!(heard[0].origin, ParticipantId(1));
    assert_eq!(heard[0].tag, "glass");
}
