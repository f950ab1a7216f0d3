//! Distance-based level-of-detail selection

use serde::{Deserialize, Serialize};
use studio_core::{LodLevel, Result, StudioError};

/// Camera distances at which the coarser tiers take over
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodThresholds {
    pub wire_ghost: f32,
    pub spatial_proxy: f32,
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self {
            wire_ghost: 8.0,
            spatial_proxy: 15.0,
        }
    }
}

impl LodThresholds {
    /// Distance at which `level` activates
    pub fn activation_distance(&self, level: LodLevel) -> f32 {
        match level {
            LodLevel::HighFidelity => 0.0,
            LodLevel::WireGhost => self.wire_ghost,
            LodLevel::SpatialProxy => self.spatial_proxy,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.wire_ghost > 0.0 && self.wire_ghost.is_finite()) {
            return Err(StudioError::ConfigError(format!(
                "lod.wire_ghost must be a positive distance, got {}",
                self.wire_ghost
            )));
        }
        if !(self.spatial_proxy > self.wire_ghost && self.spatial_proxy.is_finite()) {
            return Err(StudioError::ConfigError(format!(
                "lod.spatial_proxy ({}) must be greater than lod.wire_ghost ({})",
                self.spatial_proxy, self.wire_ghost
            )));
        }
        Ok(())
    }
}

/// Pick the coarsest level whose activation distance `distance` meets.
/// Exact boundaries resolve to the coarser level.
pub fn select_lod(distance: f32, thresholds: &LodThresholds) -> LodLevel {
    LodLevel::ALL
        .iter()
        .rev()
        .copied()
        .find(|level| distance >= thresholds.activation_distance(*level))
        .unwrap_or(LodLevel::HighFidelity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tiers() {
        let t = LodThresholds::default();
        assert_eq!(select_lod(0.0, &t), LodLevel::HighFidelity);
        assert_eq!(select_lod(5.0, &t), LodLevel::HighFidelity);
        assert_eq!(select_lod(10.0, &t), LodLevel::WireGhost);
        assert_eq!(select_lod(40.0, &t), LodLevel::SpatialProxy);
    }

    #[test]
    fn boundaries_pick_the_coarser_level() {
        let t = LodThresholds::default();
        assert_eq!(select_lod(8.0, &t), LodLevel::WireGhost);
        assert_eq!(select_lod(15.0, &t), LodLevel::SpatialProxy);
        assert_eq!(select_lod(7.999, &t), LodLevel::HighFidelity);
    }

    #[test]
    fn selection_is_monotonic_in_distance() {
        let t = LodThresholds::default();
        let mut previous = LodLevel::HighFidelity;
        for step in 0..=4000 {
            let d = step as f32 * 0.01;
            let level = select_lod(d, &t);
            assert!(level >= previous, "{} became finer at {}", level, d);
            previous = level;
        }
    }

    #[test]
    fn nan_distance_falls_back_to_full_detail() {
        assert_eq!(select_lod(f32::NAN, &LodThresholds::default()), LodLevel::HighFidelity);
    }

    #[test]
    fn validate_rejects_unordered_thresholds() {
        assert!(LodThresholds::default().validate().is_ok());
        let bad = LodThresholds {
            wire_ghost: 15.0,
            spatial_proxy: 8.0,
        };
        assert!(bad.validate().is_err());
        let zero = LodThresholds {
            wire_ghost: 0.0,
            spatial_proxy: 8.0,
        };
        assert!(zero.validate().is_err());
    }
}
