pub mod config;
pub mod ecs;
pub mod id;
pub mod model;
pub mod transport;

pub use config::{PerceptionConfig, RemotePolicy};
pub use id::{IdGenerator, NetId, ParticipantId};
pub use model::{AwarenessStage, Notification, Position, Request, StageThresholds, Stimulus, WireMessage};
pub use transport::LoopbackHub;
