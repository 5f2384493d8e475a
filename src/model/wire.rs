use serde::{Deserialize, Serialize};

use crate::id::{NetId, ParticipantId};
use crate::model::stage::AwarenessStage;
use crate::model::stimulus::Position;

/// Authority-bound request. Any participant may send one; only the authority
/// acts on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    SetAwareness {
        agent: NetId,
        target: NetId,
        level: f32,
    },
    AddAwareness {
        agent: NetId,
        target: NetId,
        delta: f32,
        max: f32,
    },
    TrackTarget {
        agent: NetId,
        target: NetId,
    },
    UntrackTarget {
        agent: NetId,
        target: NetId,
    },
    EmitStimulus {
        position: Position,
        radius: f32,
        tag: String,
        intensity: f32,
    },
    TamperEvidence {
        evidence: NetId,
    },
    RestoreEvidence {
        evidence: NetId,
    },
}

impl Request {
    /// The agent whose awareness state this request mutates, if any.
    pub fn agent(&self) -> Option<NetId> {
        match self {
            Request::SetAwareness { agent, .. }
            | Request::AddAwareness { agent, .. }
            | Request::TrackTarget { agent, .. }
            | Request::UntrackTarget { agent, .. } => Some(*agent),
            Request::EmitStimulus { .. }
            | Request::TamperEvidence { .. }
            | Request::RestoreEvidence { .. } => None,
        }
    }

    /// Copy of the request with every float representable in JSON.
    ///
    /// Infinities saturate to `f32::MAX` / `f32::MIN` and NaN takes the value
    /// the authority would clamp it to, so the authority sees the same input
    /// it would clamp locally. Returns `None` for requests the authority
    /// rejects outright (NaN delta, non-finite position).
    pub fn wire_safe(&self) -> Option<Self> {
        let request = match self.clone() {
            Request::SetAwareness {
                agent,
                target,
                level,
            } => Request::SetAwareness {
                agent,
                target,
                level: finite_or(level, 0.0),
            },
            Request::AddAwareness {
                agent,
                target,
                delta,
                max,
            } => {
                if delta.is_nan() {
                    return None;
                }
                Request::AddAwareness {
                    agent,
                    target,
                    delta: finite_or(delta, 0.0),
                    max: finite_or(max, f32::MAX),
                }
            }
            Request::EmitStimulus {
                position,
                radius,
                tag,
                intensity,
            } => {
                if !position.is_finite() {
                    return None;
                }
                Request::EmitStimulus {
                    position,
                    radius: finite_or(radius, 0.0),
                    tag,
                    intensity: finite_or(intensity, 0.0),
                }
            }
            other => other,
        };
        Some(request)
    }
}

/// JSON has no encoding for NaN or infinity.
fn finite_or(value: f32, nan_as: f32) -> f32 {
    if value.is_nan() {
        nan_as
    } else {
        value.clamp(f32::MIN, f32::MAX)
    }
}

/// Authority-to-everyone notification of an already-validated change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    AwarenessChanged {
        agent: NetId,
        target: NetId,
        level: f32,
        stage: AwarenessStage,
    },
    StageChanged {
        agent: NetId,
        target: NetId,
        stage: AwarenessStage,
    },
    TargetTracked {
        agent: NetId,
        target: NetId,
    },
    TargetUntracked {
        agent: NetId,
        target: NetId,
    },
    StimulusBroadcast {
        position: Position,
        radius: f32,
        tag: String,
        intensity: f32,
        origin: ParticipantId,
    },
    EvidenceChanged {
        evidence: NetId,
        tampered: bool,
        actor: ParticipantId,
    },
    OwnershipChanged {
        agent: NetId,
        owner: Option<ParticipantId>,
    },
}

/// Envelope for everything that crosses participants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "snake_case")]
pub enum WireMessage {
    Request {
        from: ParticipantId,
        request: Request,
    },
    Notify(Notification),
}

impl WireMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
