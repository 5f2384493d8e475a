use bevy_ecs::resource::Resource;

use crate::id::ParticipantId;
use crate::model::wire::{Notification, Request, WireMessage};

/// Traffic waiting to leave this participant, in emission order.
///
/// A mirror only ever queues requests; the authority only ever queues
/// notifications. The transport drains it after each tick.
#[derive(Resource, Debug, Default)]
pub struct Outbox {
    messages: Vec<WireMessage>,
}

impl Outbox {
    pub fn push_request(&mut self, from: ParticipantId, request: Request) {
        self.messages.push(WireMessage::Request { from, request });
    }

    pub fn push_notification(&mut self, notification: Notification) {
        self.messages.push(WireMessage::Notify(notification));
    }

    pub fn drain(&mut self) -> Vec<WireMessage> {
        std::mem::take(&mut self.messages)
    }

    pub fn messages(&self) -> &[WireMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Traffic delivered by the transport, consumed during `NetPhase::Replicate`.
#[derive(Resource, Debug, Default)]
pub struct Inbox {
    pub requests: Vec<(ParticipantId, Request)>,
    pub notifications: Vec<Notification>,
}

impl Inbox {
    /// Route a decoded wire message. `source` is the participant the
    /// transport received it from and overrides any self-declared sender.
    pub fn deliver(&mut self, source: ParticipantId, message: WireMessage) {
        match message {
            WireMessage::Request { from, request } => {
                if from != source {
                    tracing::warn!("request claims to be from {from} but arrived from {source}");
                }
                self.requests.push((source, request));
            }
            WireMessage::Notify(notification) => self.notifications.push(notification),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.notifications.is_empty()
    }

    pub fn clear(&mut self) {
        self.requests.clear();
        self.notifications.clear();
    }
}
