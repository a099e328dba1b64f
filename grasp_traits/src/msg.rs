//! Messages exchanged with the hand driver.
//!
//! Index layout is fixed by the driver: joint samples carry eight entries
//! (two spread joints, three inner finger joints, three outer finger joints),
//! status reports carry one mode per finger, and commands carry one slot per
//! finger plus the spread slot.

use std::time::Instant;

/// Entries in a joint sample.
pub const JOINT_COUNT: usize = 8;
/// Fingers on the hand.
pub const FINGER_COUNT: usize = 3;
/// Command slots: one per finger plus the spread slot.
pub const AXIS_COUNT: usize = 4;
/// Index of the spread slot in a command.
pub const SPREAD_SLOT: usize = 3;

/// Control mode of one hand axis, as commanded or as reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HandMode {
    /// Keep whatever the axis is currently doing.
    #[default]
    Unchanged,
    /// Motor off.
    Idle,
    /// Constant effort (torque) mode.
    HoldEffort,
    /// Velocity-limited trapezoidal closing.
    ApproachVelocity,
    /// PID position hold. Never commanded by the grasp controller.
    Position,
    /// Raw velocity mode. Never commanded by the grasp controller.
    Velocity,
}

impl HandMode {
    pub fn name(self) -> &'static str {
        match self {
            HandMode::Unchanged => "unchanged",
            HandMode::Idle => "idle",
            HandMode::HoldEffort => "hold_effort",
            HandMode::ApproachVelocity => "approach_velocity",
            HandMode::Position => "position",
            HandMode::Velocity => "velocity",
        }
    }
}

/// Command for a single slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisCommand {
    /// Sentinel: the driver must not touch this axis at all.
    Ignore,
    Drive { mode: HandMode, value: f64 },
}

impl AxisCommand {
    pub fn mode(&self) -> Option<HandMode> {
        match self {
            AxisCommand::Ignore => None,
            AxisCommand::Drive { mode, .. } => Some(*mode),
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            AxisCommand::Ignore => 0.0,
            AxisCommand::Drive { value, .. } => *value,
        }
    }
}

/// A complete command snapshot for every slot of the hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandCommand {
    pub axes: [AxisCommand; AXIS_COUNT],
}

/// Status report from the hand driver.
#[derive(Debug, Clone, PartialEq)]
pub struct HandStatus {
    /// Mode currently executed by each finger.
    pub modes: [HandMode; FINGER_COUNT],
    /// Puck temperatures; informational only.
    pub temperature: [f64; AXIS_COUNT],
}

impl HandStatus {
    pub fn with_modes(modes: [HandMode; FINGER_COUNT]) -> Self {
        Self {
            modes,
            temperature: [0.0; AXIS_COUNT],
        }
    }
}

/// One joint-state sample: positions in radians, velocities in rad/s.
#[derive(Debug, Clone, PartialEq)]
pub struct JointSample {
    pub stamp: Instant,
    pub position: [f64; JOINT_COUNT],
    pub velocity: [f64; JOINT_COUNT],
}
