use std::fmt;

use serde::{Deserialize, Serialize};

/// Discretized band of a continuous awareness level.
///
/// Variants are declared in ascending order so `Ord` follows alertness.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AwarenessStage {
    #[default]
    None,
    Suspicious,
    Alert,
    Aware,
}

impl fmt::Display for AwarenessStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AwarenessStage::None => "none",
            AwarenessStage::Suspicious => "suspicious",
            AwarenessStage::Alert => "alert",
            AwarenessStage::Aware => "aware",
        };
        f.write_str(s)
    }
}

/// Lower bounds of each stage band above `None`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageThresholds {
    pub suspicious: f32,
    pub alert: f32,
    pub aware: f32,
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            suspicious: 0.2,
            alert: 0.4,
            aware: 0.8,
        }
    }
}

impl StageThresholds {
    /// Stage for a level. A level exactly on a threshold belongs to the upper band.
    pub fn stage_for(&self, level: f32) -> AwarenessStage {
        if level >= self.aware {
            AwarenessStage::Aware
        } else if level >= self.alert {
            AwarenessStage::Alert
        } else if level >= self.suspicious {
            AwarenessStage::Suspicious
        } else {
            AwarenessStage::None
        }
    }

    /// Thresholds sorted ascending, with non-finite values replaced by defaults.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        let pick = |v: f32, d: f32| if v.is_finite() { v } else { d };
        let mut values = [
            pick(self.suspicious, defaults.suspicious),
            pick(self.alert, defaults.alert),
            pick(self.aware, defaults.aware),
        ];
        values.sort_by(f32::total_cmp);
        Self {
            suspicious: values[0],
            alert: values[1],
            aware: values[2],
        }
    }
}
