//! `From` implementations bridging `grasp_config` types to `grasp_core` types.

use std::time::Duration;

use crate::config::{ControllerCfg, SafetyCfg, StaticCriterion};

// ── StaticCriterion ──────────────────────────────────────────────────────────

impl From<grasp_config::StaticCriterion> for StaticCriterion {
    fn from(c: grasp_config::StaticCriterion) -> Self {
        match c {
            grasp_config::StaticCriterion::Position => StaticCriterion::Position,
            grasp_config::StaticCriterion::Velocity => StaticCriterion::Velocity,
        }
    }
}

// ── ControllerCfg ────────────────────────────────────────────────────────────

impl From<&grasp_config::ControllerCfg> for ControllerCfg {
    fn from(c: &grasp_config::ControllerCfg) -> Self {
        Self {
            feedback_period: Duration::from_millis(c.feedback_period_ms),
            static_vel_threshold: c.static_vel_threshold,
            static_pos_threshold: c.static_pos_threshold,
            vel_filter_coeff: c.vel_filter_coeff,
            pos_filter_coeff: c.pos_filter_coeff,
            min_static_duration: Duration::from_millis(c.min_static_duration_ms),
            static_criterion: c.static_criterion.into(),
            clock_skew_tolerance: Duration::from_millis(c.clock_skew_tolerance_ms),
        }
    }
}

// ── SafetyCfg ────────────────────────────────────────────────────────────────

impl From<&grasp_config::Safety> for SafetyCfg {
    fn from(c: &grasp_config::Safety) -> Self {
        Self {
            max_attempt_ms: c.max_attempt_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_defaults_match_runtime_defaults() {
        let parsed = grasp_config::load_toml("").unwrap_or_else(|e| panic!("{e}"));
        let runtime: ControllerCfg = (&parsed.controller).into();
        let dflt = ControllerCfg::default();
        assert_eq!(runtime.min_static_duration, dflt.min_static_duration);
        assert_eq!(runtime.max_static_duration(), Duration::from_millis(200));
        assert_eq!(runtime.clock_skew_tolerance, dflt.clock_skew_tolerance);
        assert_eq!(runtime.static_criterion, StaticCriterion::Position);
    }
}
