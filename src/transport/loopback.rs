use std::collections::VecDeque;

use bevy_app::App;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::ecs::resources::{Inbox, Outbox, SessionRole};
use crate::ecs::schedule::NetTick;
use crate::id::ParticipantId;
use crate::model::wire::WireMessage;

/// Connects one authority app and any number of mirror apps in-process.
///
/// Every message goes through the JSON wire codec. Messages from one source
/// are delivered in emission order. With interleaving enabled, batches from
/// different mirrors are merged in a seeded random order.
pub struct LoopbackHub {
    authority: App,
    mirrors: Vec<App>,
    interleave: Option<SmallRng>,
}

impl LoopbackHub {
    pub fn new(authority: App) -> Self {
        debug_assert!(
            authority.world().resource::<SessionRole>().is_authority(),
            "LoopbackHub::new expects the authority app"
        );
        Self {
            authority,
            mirrors: Vec::new(),
            interleave: None,
        }
    }

    /// Shuffle cross-source delivery order with a fixed seed.
    pub fn with_interleaving(mut self, seed: u64) -> Self {
        self.interleave = Some(SmallRng::seed_from_u64(seed));
        self
    }

    /// Attach a mirror app and return its index.
    pub fn add_mirror(&mut self, mirror: App) -> usize {
        debug_assert!(
            !mirror.world().resource::<SessionRole>().is_authority(),
            "only one authority per session"
        );
        self.mirrors.push(mirror);
        self.mirrors.len() - 1
    }

    pub fn authority(&self) -> &App {
        &self.authority
    }

    pub fn authority_mut(&mut self) -> &mut App {
        &mut self.authority
    }

    pub fn mirror(&self, index: usize) -> &App {
        &self.mirrors[index]
    }

    pub fn mirror_mut(&mut self, index: usize) -> &mut App {
        &mut self.mirrors[index]
    }

    pub fn mirror_count(&self) -> usize {
        self.mirrors.len()
    }

    /// Every app in the session, authority first.
    pub fn apps_mut(&mut self) -> impl Iterator<Item = &mut App> {
        std::iter::once(&mut self.authority).chain(self.mirrors.iter_mut())
    }

    /// Run one `NetTick` on every app, authority first.
    pub fn tick_all(&mut self) {
        for app in self.apps_mut() {
            app.world_mut().run_schedule(NetTick);
        }
    }

    /// Move queued traffic between participants. Returns the number of
    /// messages delivered (a broadcast counts once per receiving mirror).
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;

        // Mirrors -> authority
        let batches: Vec<(ParticipantId, VecDeque<WireMessage>)> = self
            .mirrors
            .iter_mut()
            .map(|app| {
                let source = app.world().resource::<SessionRole>().participant();
                let messages = app.world_mut().resource_mut::<Outbox>().drain();
                (source, messages.into())
            })
            .collect();
        let merged = merge_batches(batches, self.interleave.as_mut());
        if !merged.is_empty() {
            let mut inbox = self.authority.world_mut().resource_mut::<Inbox>();
            for (source, message) in merged {
                let Some(raw) = encode(&message) else {
                    continue;
                };
                if let Some(message) = decode(&raw) {
                    inbox.deliver(source, message);
                    delivered += 1;
                }
            }
        }

        // Authority -> every mirror
        let outgoing = self.authority.world_mut().resource_mut::<Outbox>().drain();
        for message in outgoing {
            let Some(raw) = encode(&message) else {
                continue;
            };
            for mirror in &mut self.mirrors {
                if let Some(message) = decode(&raw) {
                    mirror
                        .world_mut()
                        .resource_mut::<Inbox>()
                        .deliver(ParticipantId::AUTHORITY, message);
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Tick every app, then pump.
    pub fn step(&mut self) -> usize {
        self.tick_all();
        self.pump()
    }

    /// Step until a step moves no traffic, up to `max_steps`. Returns the
    /// number of steps taken.
    pub fn settle(&mut self, max_steps: u32) -> u32 {
        for taken in 1..=max_steps {
            if self.step() == 0 && self.inboxes_empty() {
                return taken;
            }
        }
        tracing::warn!("loopback did not settle within {max_steps} steps");
        max_steps
    }

    fn inboxes_empty(&self) -> bool {
        self.authority.world().resource::<Inbox>().is_empty()
            && self
                .mirrors
                .iter()
                .all(|app| app.world().resource::<Inbox>().is_empty())
    }
}

fn encode(message: &WireMessage) -> Option<String> {
    match message.encode() {
        Ok(raw) => Some(raw),
        Err(err) => {
            tracing::warn!("failed to encode {message:?}: {err}");
            None
        }
    }
}

fn decode(raw: &str) -> Option<WireMessage> {
    match WireMessage::decode(raw) {
        Ok(message) => Some(message),
        Err(err) => {
            tracing::warn!("failed to decode wire message: {err}");
            None
        }
    }
}

/// Merge per-source queues. Without an RNG, sources are concatenated in
/// order; with one, each next message comes from a random non-empty source.
fn merge_batches(
    mut batches: Vec<(ParticipantId, VecDeque<WireMessage>)>,
    rng: Option<&mut SmallRng>,
) -> Vec<(ParticipantId, WireMessage)> {
    let total = batches.iter().map(|(_, q)| q.len()).sum();
    let mut merged = Vec::with_capacity(total);
    match rng {
        None => {
            for (source, queue) in batches {
                merged.extend(queue.into_iter().map(|m| (source, m)));
            }
        }
        Some(rng) => {
            batches.retain(|(_, q)| !q.is_empty());
            while !batches.is_empty() {
                let index = rng.random_range(0..batches.len());
                let (source, queue) = &mut batches[index];
                if let Some(message) = queue.pop_front() {
                    merged.push((*source, message));
                }
                if queue.is_empty() {
                    batches.swap_remove(index);
                }
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NetId;
    use crate::model::wire::Request;

    fn batch(source: u32, evidence: &[u64]) -> (ParticipantId, VecDeque<WireMessage>) {
        let queue = evidence
            .iter()
            .map(|e| WireMessage::Request {
                from: ParticipantId(source),
                request: Request::TamperEvidence { evidence: NetId(*e) },
            })
            .collect();
        (ParticipantId(source), queue)
    }

    fn evidence_of(message: &WireMessage) -> u64 {
        match message {
            WireMessage::Request {
                request: Request::TamperEvidence { evidence },
                ..
            } => evidence.0,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn merge_without_rng_concatenates() {
        let merged = merge_batches(vec![batch(1, &[1, 2]), batch(2, &[3])], None);
        let order: Vec<u64> = merged.iter().map(|(_, m)| evidence_of(m)).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn interleaved_merge_keeps_per_source_order() {
        let mut rng = SmallRng::seed_from_u64(7);
        let a: Vec<u64> = (0..50).collect();
        let b: Vec<u64> = (100..150).collect();
        let merged = merge_batches(vec![batch(1, &a), batch(2, &b)], Some(&mut rng));
        assert_eq!(merged.len(), 100);

        let from = |p: u32| -> Vec<u64> {
            merged
                .iter()
                .filter(|(s, _)| *s == ParticipantId(p))
                .map(|(_, m)| evidence_of(m))
                .collect()
        };
        assert_eq!(from(1), a);
        assert_eq!(from(2), b);
    }
}
