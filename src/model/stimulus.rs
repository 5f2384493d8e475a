use serde::{Deserialize, Serialize};

use crate::id::ParticipantId;

/// Upper bound on a stimulus or evidence tag, in bytes.
pub const MAX_TAG_BYTES: usize = 32;

/// A point in world space.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance_squared(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(self, other: Position) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// An ephemeral sensory occurrence, e.g. a footstep.
///
/// Lives for one dispatch cycle on the authority; mirrors only ever see it
/// as a `StimulusBroadcast` notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stimulus {
    pub position: Position,
    pub radius: f32,
    pub tag: String,
    pub intensity: f32,
    pub origin: ParticipantId,
}

/// Truncate a tag to at most `max_bytes`, never splitting a UTF-8 character.
pub fn truncate_tag(tag: &str, max_bytes: usize) -> String {
    if tag.len() <= max_bytes {
        return tag.to_string();
    }
    let mut end = max_bytes;
    while !tag.is_char_boundary(end) {
        end -= 1;
    }
    tag[..end].to_string()
}

/// Clamp into `[min, max]`, mapping NaN to `min`.
pub(crate) fn clamp_or_min(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}
