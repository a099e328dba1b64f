//! Runtime configuration for the grasp controller.
//!
//! These are the structs the controller actually runs on. They are separate
//! from the TOML-deserialized schema in `grasp_config`; see `conversions`.

use std::time::Duration;

/// Which signal decides that a joint has stopped moving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StaticCriterion {
    /// Smoothed position range over the window is below `static_pos_threshold`.
    #[default]
    Position,
    /// Every smoothed velocity in the window is below `static_vel_threshold`.
    Velocity,
}

/// Controller tuning, fixed for the controller's lifetime.
#[derive(Debug, Clone)]
pub struct ControllerCfg {
    /// Minimum spacing between feedback snapshots.
    pub feedback_period: Duration,
    /// Velocity bound (rad/s) used by `StaticCriterion::Velocity`.
    pub static_vel_threshold: f64,
    /// Position range bound (rad) used by `StaticCriterion::Position`.
    pub static_pos_threshold: f64,
    /// Weight of the previous smoothed velocity: `y = a*y_prev + (1-a)*x`.
    pub vel_filter_coeff: f64,
    /// Weight of the previous smoothed position.
    pub pos_filter_coeff: f64,
    /// Window span required before a joint can be judged.
    pub min_static_duration: Duration,
    pub static_criterion: StaticCriterion,
    /// Samples stamped further than this ahead of the receiver clock are rejected.
    pub clock_skew_tolerance: Duration,
}

impl ControllerCfg {
    /// Samples older than this are evicted from the window.
    #[inline]
    pub fn max_static_duration(&self) -> Duration {
        self.min_static_duration.saturating_mul(2)
    }
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            feedback_period: Duration::from_millis(100),
            static_vel_threshold: 0.1,
            static_pos_threshold: 0.05,
            vel_filter_coeff: 0.5,
            pos_filter_coeff: 0.5,
            min_static_duration: Duration::from_millis(100),
            static_criterion: StaticCriterion::Position,
            clock_skew_tolerance: Duration::from_millis(10),
        }
    }
}

/// Safety guards.
#[derive(Debug, Clone, Default)]
pub struct SafetyCfg {
    /// Send the hand to idle when an attempt is still approaching or closing
    /// after this many milliseconds. 0 disables the guard.
    pub max_attempt_ms: u64,
}
