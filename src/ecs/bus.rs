//! Publish/subscribe fan-out of perception events.
//!
//! The replication layer enqueues one `PerceptionEvent` per applied
//! notification; `dispatch_perception_events` (in `NetPhase::Publish`) hands
//! them to subscribers in FIFO order and mirrors them into the
//! `Messages<PerceptionEvent>` channel for ECS systems.
//!
//! Subscribers are isolated: an `Err` or a panic from one is logged and the
//! remaining subscribers still receive the event.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use bevy_ecs::entity::Entity;
use bevy_ecs::message::Messages;
use bevy_ecs::resource::Resource;
use bevy_ecs::world::{Mut, World};

use crate::ecs::events::{PerceptionEvent, PerceptionEventKind};
use crate::ecs::resources::{AgentRegistry, NetEntityMap};
use crate::id::NetId;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Failure reported by a subscriber. Logged by the bus, never propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberError {
    message: String,
}

impl SubscriberError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SubscriberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SubscriberError {}

/// Read-only lookups available to subscribers while an event is delivered.
///
/// Events name entities by `NetId`; an id that no longer resolves means the
/// entity was despawned after the event was published and should be skipped.
pub struct BusContext<'a> {
    entity_map: &'a NetEntityMap,
    registry: &'a AgentRegistry,
}

impl<'a> BusContext<'a> {
    pub fn new(entity_map: &'a NetEntityMap, registry: &'a AgentRegistry) -> Self {
        Self {
            entity_map,
            registry,
        }
    }

    /// Any replicated entity.
    pub fn resolve(&self, net_id: NetId) -> Option<Entity> {
        self.entity_map.get_entity(net_id)
    }

    /// A registered perception agent.
    pub fn agent(&self, net_id: NetId) -> Option<Entity> {
        self.registry.get_by_entity_id(net_id)
    }

    pub fn local_agent(&self) -> Option<Entity> {
        self.registry.local_agent()
    }
}

type Subscriber =
    Box<dyn FnMut(&PerceptionEvent, &BusContext<'_>) -> Result<(), SubscriberError> + Send + Sync>;

/// Subscriber table plus the queue of events awaiting dispatch.
#[derive(Resource, Default)]
pub struct PerceptionBus {
    next_id: u64,
    subscribers: BTreeMap<PerceptionEventKind, Vec<(SubscriptionId, Subscriber)>>,
    pending: VecDeque<PerceptionEvent>,
    failures: u64,
}

impl PerceptionBus {
    /// Register a callback for one event kind.
    pub fn subscribe<F>(&mut self, kind: PerceptionEventKind, callback: F) -> SubscriptionId
    where
        F: FnMut(&PerceptionEvent, &BusContext<'_>) -> Result<(), SubscriberError>
            + Send
            + Sync
            + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers
            .entry(kind)
            .or_default()
            .push((id, Box::new(callback)));
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut removed = false;
        for subs in self.subscribers.values_mut() {
            let before = subs.len();
            subs.retain(|(sub_id, _)| *sub_id != id);
            removed |= subs.len() != before;
        }
        self.subscribers.retain(|_, subs| !subs.is_empty());
        removed
    }

    pub fn subscriber_count(&self, kind: PerceptionEventKind) -> usize {
        self.subscribers.get(&kind).map_or(0, Vec::len)
    }

    pub fn enqueue(&mut self, event: PerceptionEvent) {
        self.pending.push_back(event);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Subscriber errors and panics seen since the bus was created.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Drop queued events without delivering them.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Deliver every queued event in publish order and return them.
    pub fn flush(&mut self, ctx: &BusContext<'_>) -> Vec<PerceptionEvent> {
        let events: Vec<PerceptionEvent> = self.pending.drain(..).collect();
        for event in &events {
            self.dispatch(event, ctx);
        }
        events
    }

    fn dispatch(&mut self, event: &PerceptionEvent, ctx: &BusContext<'_>) {
        let Some(subs) = self.subscribers.get_mut(&event.kind()) else {
            return;
        };
        for (id, callback) in subs.iter_mut() {
            match catch_unwind(AssertUnwindSafe(|| callback(event, ctx))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    self.failures += 1;
                    tracing::warn!("subscriber {id:?} failed on {:?}: {err}", event.kind());
                }
                Err(_) => {
                    self.failures += 1;
                    tracing::warn!("subscriber {id:?} panicked on {:?}", event.kind());
                }
            }
        }
    }
}

/// Exclusive system that flushes the bus and mirrors the delivered events
/// into `Messages<PerceptionEvent>`.
///
/// Runs in `NetPhase::Publish`.
pub fn dispatch_perception_events(world: &mut World) {
    let delivered = world.resource_scope(|world, mut bus: Mut<PerceptionBus>| {
        if bus.pending_len() == 0 {
            return Vec::new();
        }
        let ctx = BusContext::new(
            world.resource::<NetEntityMap>(),
            world.resource::<AgentRegistry>(),
        );
        bus.flush(&ctx)
    });

    if delivered.is_empty() {
        return;
    }
    if let Some(mut messages) = world.get_resource_mut::<Messages<PerceptionEvent>>() {
        messages.write_batch(delivered);
    }
}
