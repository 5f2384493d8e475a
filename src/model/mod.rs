pub mod stage;
pub mod stimulus;
pub mod wire;

pub use stage::{AwarenessStage, StageThresholds};
pub use stimulus::{MAX_TAG_BYTES, Position, Stimulus, truncate_tag};
pub use wire::{Notification, Request, WireMessage};
