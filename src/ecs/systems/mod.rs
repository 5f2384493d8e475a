pub mod decay;
pub mod mirror;
pub mod purge;

pub use decay::decay_awareness;
pub use mirror::apply_inbound_notifications;
pub use purge::purge_despawned_targets;
