use bevy_ecs::component::Component;

use crate::model::stimulus::{MAX_TAG_BYTES, truncate_tag};

/// Tamper state of a world object. Written only by the authority.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    tag: String,
    tampered: bool,
}

impl Evidence {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: truncate_tag(tag, MAX_TAG_BYTES),
            tampered: false,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_tampered(&self) -> bool {
        self.tampered
    }

    /// Returns true when the flag actually changed.
    pub(crate) fn set_tampered(&mut self, tampered: bool) -> bool {
        let changed = self.tampered != tampered;
        self.tampered = tampered;
        changed
    }
}
