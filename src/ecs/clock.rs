use bevy_ecs::resource::Resource;
use bevy_ecs::system::ResMut;

use super::time::SimTime;

/// Session clock resource tracking the current time and tick count.
///
/// Advances by `tick_millis` per tick. The `advance_clock` system moves the
/// clock forward at the end of each tick (in `NetPhase::Last`), so systems see
/// the current time before it advances.
#[derive(Resource, Debug)]
pub struct SessionClock {
    pub time: SimTime,
    pub tick_count: u64,
    pub tick_millis: u64,
}

impl SessionClock {
    pub fn new(tick_millis: u64) -> Self {
        Self {
            time: SimTime::ZERO,
            tick_count: 0,
            tick_millis,
        }
    }

    /// Advance the clock by one tick.
    pub fn advance(&mut self) {
        self.time = self.time.plus_millis(self.tick_millis);
        self.tick_count += 1;
    }

    /// Tick length in seconds.
    pub fn tick_secs(&self) -> f32 {
        self.tick_millis as f32 / 1000.0
    }
}

/// Bevy system that advances the session clock by one tick.
pub fn advance_clock(mut clock: ResMut<SessionClock>) {
    clock.advance();
}
