use bevy_ecs::resource::Resource;
use serde::{Deserialize, Serialize};

use crate::model::stage::StageThresholds;
use crate::model::stimulus::MAX_TAG_BYTES;

/// Which remote participants may mutate an agent's awareness state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemotePolicy {
    /// Any participant's request is applied.
    AllowAll,
    /// Only the participant owning the agent may request changes to it.
    #[default]
    OwnerOnly,
    /// Remote awareness requests are always dropped.
    Deny,
}

/// Bounds applied to incoming stimulus requests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StimulusConfig {
    pub min_radius: f32,
    pub max_radius: f32,
    pub min_intensity: f32,
    pub max_intensity: f32,
    /// Tags longer than this are cut on a character boundary.
    pub max_tag_bytes: usize,
    /// Emissions admitted per requester per window.
    pub rate_limit: u32,
    /// Rolling window length in milliseconds.
    pub rate_window_ms: u64,
}

impl Default for StimulusConfig {
    fn default() -> Self {
        Self {
            min_radius: 0.0,
            max_radius: 50.0,
            min_intensity: 0.0,
            max_intensity: 10.0,
            max_tag_bytes: MAX_TAG_BYTES,
            rate_limit: 10,
            rate_window_ms: 1000,
        }
    }
}

/// Passive awareness decay on the authority.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Time without an increase before decay starts.
    pub delay_ms: u64,
    /// Level lost per second once decaying. Zero disables decay.
    pub per_second: f32,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            delay_ms: 3000,
            per_second: 0.0,
        }
    }
}

impl DecayConfig {
    pub fn is_enabled(&self) -> bool {
        self.per_second > 0.0
    }
}

/// Perception replication settings, shared by every participant in a session.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Upper clamp for awareness levels.
    pub max_awareness: f32,
    /// Minimum level change, against the last broadcast value, worth sending.
    pub sync_threshold: f32,
    pub thresholds: StageThresholds,
    pub stimulus: StimulusConfig,
    pub decay: DecayConfig,
    pub remote_policy: RemotePolicy,
    /// Simulated milliseconds per `NetTick`.
    pub tick_millis: u64,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            max_awareness: 1.0,
            sync_threshold: 0.01,
            thresholds: StageThresholds::default(),
            stimulus: StimulusConfig::default(),
            decay: DecayConfig::default(),
            remote_policy: RemotePolicy::default(),
            tick_millis: 16,
        }
    }
}

impl PerceptionConfig {
    /// Parse a JSON document; omitted fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(raw)?;
        Ok(config.normalized())
    }

    /// Repair values that would break the clamping invariants.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.max_awareness.is_finite() && self.max_awareness > 0.0) {
            tracing::warn!(
                "max_awareness {} is invalid, using {}",
                self.max_awareness,
                defaults.max_awareness
            );
            self.max_awareness = defaults.max_awareness;
        }
        if !(self.sync_threshold.is_finite() && self.sync_threshold >= 0.0) {
            self.sync_threshold = defaults.sync_threshold;
        }
        self.thresholds = self.thresholds.normalized();

        let s = &mut self.stimulus;
        if !s.min_radius.is_finite() || s.min_radius < 0.0 {
            s.min_radius = 0.0;
        }
        if !s.max_radius.is_finite() || s.max_radius < s.min_radius {
            s.max_radius = s.min_radius.max(defaults.stimulus.max_radius);
        }
        if !s.min_intensity.is_finite() || s.min_intensity < 0.0 {
            s.min_intensity = 0.0;
        }
        if !s.max_intensity.is_finite() || s.max_intensity < s.min_intensity {
            s.max_intensity = s.min_intensity.max(defaults.stimulus.max_intensity);
        }
        s.max_tag_bytes = s.max_tag_bytes.min(MAX_TAG_BYTES);
        if s.rate_window_ms == 0 {
            s.rate_window_ms = defaults.stimulus.rate_window_ms;
        }

        if !self.decay.per_second.is_finite() || self.decay.per_second < 0.0 {
            self.decay.per_second = 0.0;
        }
        if self.tick_millis == 0 {
            self.tick_millis = defaults.tick_millis;
        }
        self
    }
}
