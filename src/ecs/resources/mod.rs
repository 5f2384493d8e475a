pub mod entity_map;
pub mod net_queues;
pub mod rate_limiter;
pub mod registry;
pub mod session;

pub use entity_map::NetEntityMap;
pub use net_queues::{Inbox, Outbox};
pub use rate_limiter::StimulusRateLimiter;
pub use registry::AgentRegistry;
pub use session::{Role, SessionRole};
