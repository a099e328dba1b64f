//! Per-joint motion filtering and "done moving" detection.
//!
//! Each joint keeps an exponentially smoothed velocity and position plus a
//! time-bounded window of smoothed samples. After every update the window is
//! trimmed to `max_static_duration` (measured against the receiver clock) and
//! the joint is judged:
//!
//! - window spans less than `min_static_duration`: undecided, flag untouched
//! - otherwise the flag is set from the configured static criterion
//!
//! Output depends only on the ordered inputs per joint and the receiver times
//! they were applied at.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use grasp_traits::msg::{JOINT_COUNT, JointSample};

use crate::config::{ControllerCfg, StaticCriterion};
use crate::error::FilterError;
use crate::joint::{Finger, JointId};

/// Result of the static test for one joint after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticDecision {
    /// Window too short (or sample discarded); flag left as it was.
    Undecided,
    Moving,
    Static,
}

#[derive(Debug, Clone, Copy)]
struct WindowSample {
    stamp: Instant,
    position: f64,
    velocity: f64,
}

/// Filter state of one joint.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    velocity: Option<f64>,
    position: Option<f64>,
    latest_stamp: Option<Instant>,
    window: VecDeque<WindowSample>,
}

#[inline]
fn smooth(prev: Option<f64>, raw: f64, a: f64) -> f64 {
    match prev {
        None => raw,
        Some(p) => a * p + (1.0 - a) * raw,
    }
}

impl FilterState {
    /// Smoothed velocity, `None` before the first sample.
    pub fn velocity(&self) -> Option<f64> {
        self.velocity
    }

    /// Smoothed position, `None` before the first sample.
    pub fn position(&self) -> Option<f64> {
        self.position
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Age of the oldest retained sample at `now`.
    pub fn window_span(&self, now: Instant) -> Option<Duration> {
        self.window
            .front()
            .map(|s| now.saturating_duration_since(s.stamp))
    }

    /// Smoothed position range (max - min) over the window.
    pub fn position_range(&self) -> Option<f64> {
        let mut it = self.window.iter().map(|s| s.position);
        let first = it.next()?;
        let (lo, hi) = it.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(hi - lo)
    }

    fn evict(&mut self, now: Instant, max_age: Duration) {
        while let Some(front) = self.window.front() {
            if now.saturating_duration_since(front.stamp) > max_age {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }

    fn judge(&self, now: Instant, params: &FilterParams) -> StaticDecision {
        match self.window_span(now) {
            Some(span) if span >= params.min_static_duration => {}
            _ => return StaticDecision::Undecided,
        }
        let is_static = match params.criterion {
            StaticCriterion::Position => self
                .position_range()
                .is_some_and(|r| r < params.static_pos_threshold),
            StaticCriterion::Velocity => self
                .window
                .iter()
                .all(|s| s.velocity.abs() < params.static_vel_threshold),
        };
        if is_static {
            StaticDecision::Static
        } else {
            StaticDecision::Moving
        }
    }
}

/// The subset of `ControllerCfg` the filter runs on.
#[derive(Debug, Clone, Copy)]
pub struct FilterParams {
    pub vel_coeff: f64,
    pub pos_coeff: f64,
    pub min_static_duration: Duration,
    pub max_static_duration: Duration,
    pub static_pos_threshold: f64,
    pub static_vel_threshold: f64,
    pub criterion: StaticCriterion,
    pub skew_tolerance: Duration,
}

impl From<&ControllerCfg> for FilterParams {
    fn from(c: &ControllerCfg) -> Self {
        Self {
            vel_coeff: c.vel_filter_coeff.clamp(0.0, 1.0),
            pos_coeff: c.pos_filter_coeff.clamp(0.0, 1.0),
            min_static_duration: c.min_static_duration,
            max_static_duration: c.max_static_duration(),
            static_pos_threshold: c.static_pos_threshold,
            static_vel_threshold: c.static_vel_threshold,
            criterion: c.static_criterion,
            skew_tolerance: c.clock_skew_tolerance,
        }
    }
}

/// One done-moving flag per joint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoneMoving([bool; JOINT_COUNT]);

impl DoneMoving {
    #[inline]
    pub fn get(&self, joint: JointId) -> bool {
        self.0[joint.index()]
    }

    #[inline]
    pub fn set(&mut self, joint: JointId, value: bool) {
        self.0[joint.index()] = value;
    }

    /// Whether both joints of the finger have stopped.
    pub fn finger(&self, finger: Finger) -> bool {
        finger.joints().iter().all(|j| self.get(*j))
    }

    /// Whether every joint of every masked-in finger has stopped.
    pub fn all_used(&self, mask: &[bool; 3]) -> bool {
        Finger::ALL
            .iter()
            .filter(|f| mask[f.index()])
            .all(|f| self.finger(*f))
    }

    pub fn as_array(&self) -> [bool; JOINT_COUNT] {
        self.0
    }
}

/// Smoothing and static detection for all joints of one hand.
#[derive(Debug, Clone)]
pub struct MotionFilter {
    params: FilterParams,
    joints: [FilterState; JOINT_COUNT],
    done: DoneMoving,
}

impl MotionFilter {
    pub fn new(params: FilterParams) -> Self {
        Self {
            params,
            joints: Default::default(),
            done: DoneMoving::default(),
        }
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    pub fn state(&self, joint: JointId) -> &FilterState {
        &self.joints[joint.index()]
    }

    pub fn done_moving(&self) -> &DoneMoving {
        &self.done
    }

    /// Reject samples stamped too far ahead of the receiver clock.
    pub fn check_skew(&self, stamp: Instant, now: Instant) -> Result<(), FilterError> {
        match stamp.checked_duration_since(now) {
            Some(ahead) if ahead > self.params.skew_tolerance => {
                Err(FilterError::ClockSkew { ahead })
            }
            _ => Ok(()),
        }
    }

    /// Apply one raw reading to one joint and re-judge it.
    ///
    /// Readings not newer than the joint's latest applied stamp are discarded
    /// so the window stays strictly time-ordered.
    pub fn update(
        &mut self,
        joint: JointId,
        stamp: Instant,
        now: Instant,
        raw_velocity: f64,
        raw_position: f64,
    ) -> Result<StaticDecision, FilterError> {
        self.check_skew(stamp, now)?;
        let p = self.params;
        let st = &mut self.joints[joint.index()];

        if st.latest_stamp.is_some_and(|last| stamp <= last) {
            tracing::trace!(joint = %joint.name(), "discarding out-of-order sample");
            return Ok(StaticDecision::Undecided);
        }
        st.latest_stamp = Some(stamp);

        let velocity = smooth(st.velocity, raw_velocity, p.vel_coeff);
        let position = smooth(st.position, raw_position, p.pos_coeff);
        st.velocity = Some(velocity);
        st.position = Some(position);
        st.window.push_back(WindowSample {
            stamp,
            position,
            velocity,
        });
        st.evict(now, p.max_static_duration);

        let decision = st.judge(now, &p);
        match decision {
            StaticDecision::Static => self.done.set(joint, true),
            StaticDecision::Moving => self.done.set(joint, false),
            StaticDecision::Undecided => {}
        }
        Ok(decision)
    }

    /// Apply a full joint-state sample. The skew check runs once, before any
    /// joint is touched, so a rejected sample leaves the filter unchanged.
    pub fn ingest(&mut self, sample: &JointSample, now: Instant) -> Result<(), FilterError> {
        self.check_skew(sample.stamp, now)?;
        for joint in JointId::ALL {
            let i = joint.index();
            self.update(
                joint,
                sample.stamp,
                now,
                sample.velocity[i],
                sample.position[i],
            )?;
        }
        Ok(())
    }
}
