use std::sync::{Arc, Mutex};

use bevy_app::App;

use crate::ecs::bus::PerceptionBus;
use crate::ecs::commands::{PerceptionCommand, queue_command};
use crate::ecs::events::{PerceptionEvent, PerceptionEventKind};
use crate::ecs::schedule::NetTick;

const ALL_KINDS: [PerceptionEventKind; 7] = [
    PerceptionEventKind::AwarenessChanged,
    PerceptionEventKind::StageChanged,
    PerceptionEventKind::TargetTracked,
    PerceptionEventKind::TargetUntracked,
    PerceptionEventKind::StimulusHeard,
    PerceptionEventKind::EvidenceChanged,
    PerceptionEventKind::OwnershipChanged,
];

/// Run one `NetTick`.
pub fn tick(app: &mut App) {
    app.world_mut().run_schedule(NetTick);
}

/// Run `n` ticks.
pub fn tick_n(app: &mut App, n: u32) {
    for _ in 0..n {
        tick(app);
    }
}

/// Queue a command and run one tick so it is applied (or forwarded).
pub fn command_and_tick(app: &mut App, command: PerceptionCommand) {
    queue_command(app.world_mut(), command);
    tick(app);
}

/// Subscribe to every event kind and collect what the bus delivers.
pub fn record_events(app: &mut App) -> Arc<Mutex<Vec<PerceptionEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut bus = app.world_mut().resource_mut::<PerceptionBus>();
    for kind in ALL_KINDS {
        let sink = log.clone();
        bus.subscribe(kind, move |event, _| {
            if let Ok(mut events) = sink.lock() {
                events.push(event.clone());
            }
            Ok(())
        });
    }
    log
}

/// Count recorded events of one kind.
pub fn count_kind(log: &Arc<Mutex<Vec<PerceptionEvent>>>, kind: PerceptionEventKind) -> usize {
    log.lock()
        .map(|events| events.iter().filter(|e| e.kind() == kind).count())
        .unwrap_or(0)
}
