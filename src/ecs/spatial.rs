use bevy_ecs::entity::Entity;
use bevy_ecs::query::With;
use bevy_ecs::resource::Resource;
use bevy_ecs::world::World;

use crate::ecs::components::{PerceptionAgent, WorldPosition};
use crate::model::stimulus::Position;

/// "Agents within radius" capability consumed by the stimulus emitter.
///
/// Real games plug in their own partitioning structure; the emitter only
/// relies on the returned entities being perception agents at query time.
pub trait SpatialIndex: Send + Sync + 'static {
    fn agents_within(&self, world: &mut World, center: Position, radius: f32) -> Vec<Entity>;
}

/// Brute-force scan over every agent with a `WorldPosition`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearScan;

impl SpatialIndex for LinearScan {
    fn agents_within(&self, world: &mut World, center: Position, radius: f32) -> Vec<Entity> {
        let radius_sq = radius * radius;
        let mut found: Vec<Entity> = world
            .query_filtered::<(Entity, &WorldPosition), With<PerceptionAgent>>()
            .iter(world)
            .filter(|(_, pos)| pos.0.distance_squared(center) <= radius_sq)
            .map(|(entity, _)| entity)
            .collect();
        found.sort();
        found
    }
}

/// The spatial index installed for this participant.
#[derive(Resource)]
pub struct SpatialQuery(pub Box<dyn SpatialIndex>);

impl Default for SpatialQuery {
    fn default() -> Self {
        Self(Box::new(LinearScan))
    }
}
