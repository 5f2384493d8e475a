//! In-process transports. A real network transport is out of scope; it only
//! needs to move `Outbox` contents into the peer's `Inbox` with per-source
//! ordering, which is what `LoopbackHub` does.

pub mod loopback;

pub use loopback::LoopbackHub;
