use bevy_ecs::entity::Entity;
use bevy_ecs::world::World;

use crate::config::{PerceptionConfig, RemotePolicy};
use crate::ecs::bus::PerceptionBus;
use crate::ecs::clock::SessionClock;
use crate::ecs::components::{AwarenessState, Evidence, PerceptionAgent};
use crate::ecs::events::PerceptionEvent;
use crate::ecs::resources::{AgentRegistry, NetEntityMap, Outbox, SessionRole};
use crate::ecs::time::SimTime;
use crate::id::{NetId, ParticipantId};
use crate::model::stimulus::clamp_or_min;
use crate::model::wire::{Notification, Request};

/// Write capability over perception state. Only constructible on the authority.
///
/// Every mutation of awareness, stage, evidence, or ownership goes through
/// this type. Operations return whether they changed anything; failures
/// (unknown ids) are logged and never surfaced as errors. Collected
/// notifications are broadcast and published locally by `commit`.
#[must_use = "notifications are only sent by `commit`"]
pub struct AuthorityWriter<'w> {
    pub(super) world: &'w mut World,
    pub(super) config: PerceptionConfig,
    pub(super) now: SimTime,
    pub(super) participant: ParticipantId,
    pub(super) notifications: Vec<Notification>,
}

impl<'w> AuthorityWriter<'w> {
    /// `None` unless the world belongs to the authority.
    pub fn new(world: &'w mut World) -> Option<Self> {
        let role = *world.get_resource::<SessionRole>()?;
        if !role.is_authority() {
            return None;
        }
        let config = world.resource::<PerceptionConfig>().clone();
        let now = world.resource::<SessionClock>().time;
        Some(Self {
            world,
            config,
            now,
            participant: role.participant(),
            notifications: Vec::new(),
        })
    }

    /// Notifications collected so far and not yet committed.
    pub fn pending(&self) -> &[Notification] {
        &self.notifications
    }

    /// Clamp `level` to `[0, max_awareness]` and store it.
    pub fn set_awareness(&mut self, agent: NetId, target: NetId, level: f32) -> bool {
        let level = clamp_or_min(level, 0.0, self.config.max_awareness);
        self.write_level(agent, target, level)
    }

    /// Add `delta` to the current level, clamped to `[0, max]` where `max`
    /// itself never exceeds `max_awareness`.
    pub fn add_awareness(&mut self, agent: NetId, target: NetId, delta: f32, max: f32) -> bool {
        if delta.is_nan() {
            tracing::warn!("ignoring NaN awareness delta for {agent} -> {target}");
            return false;
        }
        let Some(entity) = self.resolve_agent(agent) else {
            return false;
        };
        let current = self
            .world
            .get::<AwarenessState>(entity)
            .map_or(0.0, |state| state.awareness(target));
        let cap = if max.is_nan() {
            self.config.max_awareness
        } else {
            max.clamp(0.0, self.config.max_awareness)
        };
        let level = clamp_or_min(current + delta, 0.0, cap);
        self.write_level(agent, target, level)
    }

    /// Start tracking `target`. No-op if already tracked.
    pub fn track(&mut self, agent: NetId, target: NetId) -> bool {
        let Some(mut state) = self.agent_state(agent, target) else {
            return false;
        };
        if !state.track(target) {
            return false;
        }
        self.notifications
            .push(Notification::TargetTracked { agent, target });
        true
    }

    /// Stop tracking `target`. The target does not need to resolve, so
    /// despawned targets can still be untracked.
    pub fn untrack(&mut self, agent: NetId, target: NetId) -> bool {
        let Some(entity) = self.resolve_agent(agent) else {
            return false;
        };
        let Some(mut state) = self.world.get_mut::<AwarenessState>(entity) else {
            tracing::warn!("agent {agent} has no awareness state");
            return false;
        };
        if !state.untrack(target) {
            return false;
        }
        self.notifications
            .push(Notification::TargetUntracked { agent, target });
        true
    }

    /// Set or clear an evidence object's tampered flag on behalf of `actor`.
    pub fn set_evidence_tampered(&mut self, evidence: NetId, tampered: bool, actor: ParticipantId) -> bool {
        let Some(entity) = self.world.resource::<NetEntityMap>().get_entity(evidence) else {
            tracing::warn!("evidence {evidence} does not resolve");
            return false;
        };
        let Some(mut record) = self.world.get_mut::<Evidence>(entity) else {
            tracing::warn!("{evidence} is not an evidence object");
            return false;
        };
        if !record.set_tampered(tampered) {
            return false;
        }
        self.notifications.push(Notification::EvidenceChanged {
            evidence,
            tampered,
            actor,
        });
        true
    }

    /// Hand an agent to a new owner, or to none.
    pub fn transfer_ownership(&mut self, agent: NetId, owner: Option<ParticipantId>) -> bool {
        let Some(entity) = self.resolve_agent(agent) else {
            return false;
        };
        if !self
            .world
            .resource_mut::<AgentRegistry>()
            .transfer_ownership(agent, owner)
        {
            return false;
        }
        if let Some(mut component) = self.world.get_mut::<PerceptionAgent>(entity) {
            component.owner = owner;
        }
        self.notifications
            .push(Notification::OwnershipChanged { agent, owner });
        true
    }

    /// Whether a request from `from` may be applied under the remote policy.
    pub fn permits(&self, from: ParticipantId, request: &Request) -> bool {
        if from == self.participant {
            return true;
        }
        let Some(agent) = request.agent() else {
            return true;
        };
        match self.config.remote_policy {
            RemotePolicy::AllowAll => true,
            RemotePolicy::Deny => false,
            RemotePolicy::OwnerOnly => {
                self.world.resource::<AgentRegistry>().owner_of(agent) == Some(from)
            }
        }
    }

    /// Apply one request attributed to `from`.
    pub fn apply_request(&mut self, from: ParticipantId, request: Request) -> bool {
        match request {
            Request::SetAwareness {
                agent,
                target,
                level,
            } => self.set_awareness(agent, target, level),
            Request::AddAwareness {
                agent,
                target,
                delta,
                max,
            } => self.add_awareness(agent, target, delta, max),
            Request::TrackTarget { agent, target } => self.track(agent, target),
            Request::UntrackTarget { agent, target } => self.untrack(agent, target),
            Request::EmitStimulus {
                position,
                radius,
                tag,
                intensity,
            } => self.emit_stimulus(from, position, radius, &tag, intensity),
            Request::TamperEvidence { evidence } => self.set_evidence_tampered(evidence, true, from),
            Request::RestoreEvidence { evidence } => {
                self.set_evidence_tampered(evidence, false, from)
            }
        }
    }

    /// Broadcast every collected notification and publish it on the local bus.
    /// Returns how many notifications were sent.
    pub fn commit(self) -> usize {
        let Self {
            world,
            notifications,
            ..
        } = self;
        if notifications.is_empty() {
            return 0;
        }
        {
            let mut bus = world.resource_mut::<PerceptionBus>();
            for notification in &notifications {
                bus.enqueue(PerceptionEvent::from(notification));
            }
        }
        let count = notifications.len();
        let mut outbox = world.resource_mut::<Outbox>();
        for notification in notifications {
            outbox.push_notification(notification);
        }
        count
    }

    /// Store an already-clamped level, implicitly tracking the target.
    fn write_level(&mut self, agent: NetId, target: NetId, level: f32) -> bool {
        let thresholds = self.config.thresholds;
        let sync_threshold = self.config.sync_threshold;
        let now = self.now;
        let Some(mut state) = self.agent_state(agent, target) else {
            return false;
        };
        let newly_tracked = state.track(target);
        let update = state
            .entry_mut(target)
            .and_then(|entry| entry.write_level(level, &thresholds, sync_threshold, now));

        if newly_tracked {
            self.notifications
                .push(Notification::TargetTracked { agent, target });
        }
        let Some(update) = update else {
            return newly_tracked;
        };
        if update.broadcast_level {
            self.notifications.push(Notification::AwarenessChanged {
                agent,
                target,
                level: update.level,
                stage: update.stage,
            });
        } else {
            tracing::debug!(
                "suppressed awareness update {agent} -> {target} at {:.4}",
                update.level
            );
        }
        if let Some(stage) = update.stage_edge {
            self.notifications.push(Notification::StageChanged {
                agent,
                target,
                stage,
            });
        }
        true
    }

    fn resolve_agent(&self, agent: NetId) -> Option<Entity> {
        let entity = self
            .world
            .resource::<AgentRegistry>()
            .get_by_entity_id(agent);
        if entity.is_none() {
            tracing::warn!("agent {agent} is not registered");
        }
        entity
    }

    /// Awareness state of `agent`, provided `target` is a live replicated entity.
    fn agent_state(
        &mut self,
        agent: NetId,
        target: NetId,
    ) -> Option<bevy_ecs::world::Mut<'_, AwarenessState>> {
        let entity = self.resolve_agent(agent)?;
        if !self.world.resource::<NetEntityMap>().contains(target) {
            tracing::warn!("target {target} does not resolve for agent {agent}");
            return None;
        }
        let state = self.world.get_mut::<AwarenessState>(entity);
        if state.is_none() {
            tracing::warn!("agent {agent} has no awareness state");
        }
        state
    }
}
