use bevy_ecs::entity::Entity;
use bevy_ecs::message::Messages;
use bevy_ecs::world::Mut;

use crate::ecs::components::{NetEntity, PerceptionAgent};
use crate::ecs::events::StimulusDelivered;
use crate::ecs::resources::StimulusRateLimiter;
use crate::ecs::spatial::SpatialQuery;
use crate::id::ParticipantId;
use crate::model::stimulus::{Position, Stimulus, clamp_or_min, truncate_tag};
use crate::model::wire::Notification;

use super::authority::AuthorityWriter;

impl AuthorityWriter<'_> {
    /// Validate, rate-limit, and fan out a stimulus emitted by `requester`.
    ///
    /// Radius, intensity, and tag are clamped rather than rejected. Affected
    /// agents each get one `StimulusDelivered` message; every participant gets
    /// a `StimulusBroadcast`. Returns false when the emission was dropped.
    pub fn emit_stimulus(
        &mut self,
        requester: ParticipantId,
        position: Position,
        radius: f32,
        tag: &str,
        intensity: f32,
    ) -> bool {
        if !position.is_finite() {
            tracing::warn!("dropping stimulus from {requester}: non-finite position");
            return false;
        }
        let bounds = &self.config.stimulus;
        let radius = clamp_or_min(radius, bounds.min_radius, bounds.max_radius);
        let intensity = clamp_or_min(intensity, bounds.min_intensity, bounds.max_intensity);
        let tag = truncate_tag(tag, bounds.max_tag_bytes);
        let (limit, window_ms) = (bounds.rate_limit, bounds.rate_window_ms);

        let admitted = self
            .world
            .resource_mut::<StimulusRateLimiter>()
            .try_acquire(requester, self.now, limit, window_ms);
        if !admitted {
            tracing::warn!(
                "dropping stimulus '{tag}' from {requester}: more than {limit} in {window_ms}ms"
            );
            return false;
        }

        let stimulus = Stimulus {
            position,
            radius,
            tag,
            intensity,
            origin: requester,
        };

        let mut candidates: Vec<Entity> = match self.world.get_resource::<SpatialQuery>() {
            Some(_) => self
                .world
                .resource_scope(|world, spatial: Mut<SpatialQuery>| {
                    spatial.0.agents_within(world, position, radius)
                }),
            None => {
                tracing::warn!("no spatial query installed, stimulus reaches no agents");
                Vec::new()
            }
        };
        candidates.sort();
        candidates.dedup();

        let mut deliveries = Vec::with_capacity(candidates.len());
        for agent in candidates {
            // Despawned between query and delivery: skip quietly.
            let (Some(net), Some(_)) = (
                self.world.get::<NetEntity>(agent),
                self.world.get::<PerceptionAgent>(agent),
            ) else {
                tracing::debug!("stimulus target {agent:?} no longer resolves");
                continue;
            };
            deliveries.push(StimulusDelivered {
                agent,
                agent_id: net.id,
                stimulus: stimulus.clone(),
            });
        }
        if !deliveries.is_empty()
            && let Some(mut messages) = self.world.get_resource_mut::<Messages<StimulusDelivered>>()
        {
            messages.write_batch(deliveries);
        }

        self.notifications.push(Notification::StimulusBroadcast {
            position: stimulus.position,
            radius: stimulus.radius,
            tag: stimulus.tag,
            intensity: stimulus.intensity,
            origin: stimulus.origin,
        });
        true
    }
}
