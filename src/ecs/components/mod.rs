pub mod awareness;
pub mod common;
pub mod evidence;

pub use awareness::{AwarenessState, TrackedTarget};
pub use common::{NetEntity, PerceptionAgent, WorldPosition};
pub use evidence::Evidence;
