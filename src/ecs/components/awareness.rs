use std::collections::BTreeMap;

use bevy_ecs::component::Component;

use crate::ecs::time::SimTime;
use crate::id::NetId;
use crate::model::stage::{AwarenessStage, StageThresholds};

/// One agent's awareness of one target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackedTarget {
    pub(crate) level: f32,
    pub(crate) stage: AwarenessStage,
    pub(crate) last_increase: Option<SimTime>,
    pub(crate) last_sent_level: f32,
    pub(crate) last_sent_stage: AwarenessStage,
}

/// What an authoritative level write needs to broadcast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LevelUpdate {
    pub level: f32,
    pub stage: AwarenessStage,
    pub broadcast_level: bool,
    pub stage_edge: Option<AwarenessStage>,
}

impl TrackedTarget {
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> AwarenessStage {
        self.stage
    }

    /// When the level last went up, if ever.
    pub fn last_increase(&self) -> Option<SimTime> {
        self.last_increase
    }

    /// Authoritative write of an already-clamped level.
    ///
    /// Returns `None` when the level is unchanged. Level deltas are measured
    /// against the last broadcast value; stage edges against the last
    /// broadcast stage.
    pub(crate) fn write_level(
        &mut self,
        level: f32,
        thresholds: &StageThresholds,
        sync_threshold: f32,
        now: SimTime,
    ) -> Option<LevelUpdate> {
        if level == self.level {
            return None;
        }
        if level > self.level {
            self.last_increase = Some(now);
        }
        self.level = level;
        self.stage = thresholds.stage_for(level);

        let stage_edge = (self.stage != self.last_sent_stage).then_some(self.stage);
        let broadcast_level =
            stage_edge.is_some() || (level - self.last_sent_level).abs() >= sync_threshold;
        if broadcast_level {
            self.last_sent_level = level;
        }
        if stage_edge.is_some() {
            self.last_sent_stage = self.stage;
        }
        Some(LevelUpdate {
            level,
            stage: self.stage,
            broadcast_level,
            stage_edge,
        })
    }

    /// Mirror-side copy of an authoritative level.
    pub(crate) fn mirror_level(&mut self, level: f32, stage: AwarenessStage, now: SimTime) {
        if level > self.level {
            self.last_increase = Some(now);
        }
        self.level = level;
        self.stage = stage;
        self.last_sent_level = level;
        self.last_sent_stage = stage;
    }

    pub(crate) fn mirror_stage(&mut self, stage: AwarenessStage) {
        self.stage = stage;
        self.last_sent_stage = stage;
    }
}

/// Replicated awareness state of one perception agent, keyed by target.
///
/// Read access is public; writes happen only through the authority writer or
/// the mirror notification path.
#[derive(Component, Debug, Clone, Default)]
pub struct AwarenessState {
    targets: BTreeMap<NetId, TrackedTarget>,
}

impl AwarenessState {
    /// Current level, or 0 when the target is not tracked.
    pub fn awareness(&self, target: NetId) -> f32 {
        self.targets.get(&target).map_or(0.0, |t| t.level)
    }

    /// Current stage, or `None` when the target is not tracked.
    pub fn stage(&self, target: NetId) -> AwarenessStage {
        self.targets.get(&target).map_or(AwarenessStage::None, |t| t.stage)
    }

    pub fn is_tracking(&self, target: NetId) -> bool {
        self.targets.contains_key(&target)
    }

    pub fn get(&self, target: NetId) -> Option<&TrackedTarget> {
        self.targets.get(&target)
    }

    pub fn tracked(&self) -> impl Iterator<Item = (NetId, &TrackedTarget)> {
        self.targets.iter().map(|(id, t)| (*id, t))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Start tracking. Returns false if the target was already tracked.
    pub(crate) fn track(&mut self, target: NetId) -> bool {
        if self.targets.contains_key(&target) {
            return false;
        }
        self.targets.insert(target, TrackedTarget::default());
        true
    }

    /// Stop tracking. Returns false if the target was not tracked.
    pub(crate) fn untrack(&mut self, target: NetId) -> bool {
        self.targets.remove(&target).is_some()
    }

    pub(crate) fn entry_mut(&mut self, target: NetId) -> Option<&mut TrackedTarget> {
        self.targets.get_mut(&target)
    }

    /// Mirror entry, created if the tracked notification was never seen.
    pub(crate) fn mirror_entry(&mut self, target: NetId) -> &mut TrackedTarget {
        self.targets.entry(target).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYNC: f32 = 0.01;

    fn write(t: &mut TrackedTarget, level: f32) -> Option<LevelUpdate> {
        t.write_level(level, &StageThresholds::default(), SYNC, SimTime::from_millis(5))
    }

    #[test]
    fn untracked_reads_are_zero_and_none() {
        let state = AwarenessState::default();
        assert_eq!(state.awareness(NetId(1)), 0.0);
        assert_eq!(state.stage(NetId(1)), AwarenessStage::None);
        assert!(!state.is_tracking(NetId(1)));
    }

    #[test]
    fn track_is_unique_per_target() {
        let mut state = AwarenessState::default();
        assert!(state.track(NetId(1)));
        assert!(!state.track(NetId(1)));
        assert_eq!(state.len(), 1);
        assert!(state.untrack(NetId(1)));
        assert!(!state.untrack(NetId(1)));
        assert!(state.is_empty());
    }

    #[test]
    fn crossing_into_alert_reports_one_edge() {
        let mut t = TrackedTarget::default();
        let update = write(&mut t, 0.5).unwrap();
        assert!(update.broadcast_level);
        assert_eq!(update.stage_edge, Some(AwarenessStage::Alert));
        assert_eq!(t.stage(), AwarenessStage::Alert);
        assert_eq!(t.last_increase(), Some(SimTime::from_millis(5)));
    }

    #[test]
    fn same_level_is_a_noop() {
        let mut t = TrackedTarget::default();
        write(&mut t, 0.5);
        assert!(write(&mut t, 0.5).is_none());
    }

    #[test]
    fn moves_within_a_band_have_no_edge() {
        let mut t = TrackedTarget::default();
        write(&mut t, 0.45);
        for level in [0.5, 0.55, 0.6, 0.7, 0.79] {
            let update = write(&mut t, level).unwrap();
            assert_eq!(update.stage_edge, None);
            assert!(update.broadcast_level);
        }
    }

    #[test]
    fn sub_threshold_change_is_suppressed() {
        let mut t = TrackedTarget::default();
        write(&mut t, 0.5);
        let update = write(&mut t, 0.505).unwrap();
        assert!(!update.broadcast_level);
        assert_eq!(t.level(), 0.505);
    }

    #[test]
    fn accumulated_drift_is_measured_against_last_broadcast() {
        let mut t = TrackedTarget::default();
        write(&mut t, 0.5);
        assert!(!write(&mut t, 0.504).unwrap().broadcast_level);
        assert!(!write(&mut t, 0.508).unwrap().broadcast_level);
        // 0.512 is 0.012 away from the last broadcast 0.5
        assert!(write(&mut t, 0.512).unwrap().broadcast_level);
    }

    #[test]
    fn sub_threshold_crossing_still_broadcasts() {
        let mut t = TrackedTarget::default();
        write(&mut t, 0.398);
        let update = write(&mut t, 0.401).unwrap();
        assert!(update.broadcast_level);
        assert_eq!(update.stage_edge, Some(AwarenessStage::Alert));
    }

    #[test]
    fn decrease_keeps_last_increase() {
        let mut t = TrackedTarget::default();
        write(&mut t, 0.5);
        t.write_level(0.3, &StageThresholds::default(), SYNC, SimTime::from_millis(900));
        assert_eq!(t.last_increase(), Some(SimTime::from_millis(5)));
    }

    #[test]
    fn mirror_entry_creates_missing_target() {
        let mut state = AwarenessState::default();
        state
            .mirror_entry(NetId(3))
            .mirror_level(0.9, AwarenessStage::Aware, SimTime::ZERO);
        assert!(state.is_tracking(NetId(3)));
        assert_eq!(state.stage(NetId(3)), AwarenessStage::Aware);
    }
}
