use std::collections::{HashMap, VecDeque};

use bevy_ecs::resource::Resource;

use crate::ecs::time::SimTime;
use crate::id::ParticipantId;

/// Rolling-window admission counter for stimulus emissions, per requester.
#[derive(Resource, Debug, Default)]
pub struct StimulusRateLimiter {
    windows: HashMap<ParticipantId, VecDeque<SimTime>>,
}

impl StimulusRateLimiter {
    /// Admit one emission if fewer than `limit` were admitted in the
    /// `window_ms` ending at `now`.
    pub fn try_acquire(
        &mut self,
        requester: ParticipantId,
        now: SimTime,
        limit: u32,
        window_ms: u64,
    ) -> bool {
        let window = self.windows.entry(requester).or_default();
        while let Some(&oldest) = window.front() {
            if now.millis_since(oldest) >= window_ms {
                window.pop_front();
            } else {
                break;
            }
        }
        if window.len() >= limit as usize {
            return false;
        }
        window.push_back(now);
        true
    }

    /// Emissions admitted for `requester` that are still inside a window.
    pub fn in_window(&self, requester: ParticipantId) -> usize {
        self.windows.get(&requester).map_or(0, VecDeque::len)
    }

    pub fn clear(&mut self) {
        self.windows.clear();
    }
}
