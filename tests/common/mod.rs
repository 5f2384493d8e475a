#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use bevy_app::App;
use perception_sync::config::PerceptionConfig;
use perception_sync::ecs::events::PerceptionEvent;
use perception_sync::ecs::{build_authority_app, build_mirror_app, spawn_agent, spawn_evidence, spawn_target};
use perception_sync::id::{NetId, ParticipantId};
use perception_sync::model::Position;
use perception_sync::transport::LoopbackHub;

pub const AGENT: NetId = NetId(10);
pub const TARGET: NetId = NetId(20);
pub const EVIDENCE: NetId = NetId(30);

pub type EventLog = Arc<Mutex<Vec<PerceptionEvent>>>;

/// Authority plus `mirrors` mirror participants numbered from 1.
pub fn session(mirrors: u32, config: PerceptionConfig) -> LoopbackHub {
    let mut hub = LoopbackHub::new(build_authority_app(config.clone()));
    for p in 1..=mirrors {
        let mirror = build_mirror_app(ParticipantId(p), config.clone()).expect("mirror participant");
        hub.add_mirror(mirror);
    }
    hub
}

/// Spawn the same agent on every participant.
pub fn agent_everywhere(hub: &mut LoopbackHub, id: NetId, owner: Option<ParticipantId>, at: Position) {
    for app in hub.apps_mut() {
        spawn_agent(app.world_mut(), id, owner, at);
    }
}

pub fn target_everywhere(hub: &mut LoopbackHub, id: NetId, at: Position) {
    for app in hub.apps_mut() {
        spawn_target(app.world_mut(), id, at);
    }
}

pub fn evidence_everywhere(hub: &mut LoopbackHub, id: NetId, tag: &str) {
    for app in hub.apps_mut() {
        spawn_evidence(app.world_mut(), id, tag);
    }
}

/// Standard two-entity setup: `AGENT` owned by participant 1 and `TARGET`.
pub fn agent_and_target(mirrors: u32, config: PerceptionConfig) -> LoopbackHub {
    let mut hub = session(mirrors, config);
    agent_everywhere(&mut hub, AGENT, Some(ParticipantId(1)), Position::default());
    target_everywhere(&mut hub, TARGET, Position::new(3.0, 0.0, 0.0));
    hub
}

pub fn events(log: &EventLog) -> Vec<PerceptionEvent> {
    log.lock().unwrap().clone()
}

pub fn clear(log: &EventLog) {
    log.lock().unwrap().clear();
}

pub fn outbox_len(app: &App) -> usize {
    app.world()
        .resource::<perception_sync::ecs::resources::Outbox>()
        .len()
}
