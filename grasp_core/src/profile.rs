//! Command profiles derived from a grasp request.
//!
//! Three snapshots are built once per accepted request and never mutated:
//!
//! | finger   | approach                | hold               | abort     |
//! |----------|-------------------------|--------------------|-----------|
//! | used     | ApproachVelocity(speed) | HoldEffort(effort) | Idle(0)   |
//! | not used | Unchanged(0)            | Unchanged(0)       | Unchanged(0) |
//!
//! The spread slot is always `Ignore`.

use grasp_traits::msg::{AXIS_COUNT, AxisCommand, HandCommand, HandMode};

use crate::joint::{Finger, HandAxis};
use crate::request::GraspRequest;

/// One complete command snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandProfile {
    axes: [AxisCommand; AXIS_COUNT],
}

impl CommandProfile {
    fn build(req: &GraspRequest, used: impl Fn(Finger) -> (HandMode, f64)) -> Self {
        let mut axes = [AxisCommand::Ignore; AXIS_COUNT];
        for f in Finger::ALL {
            let (mode, value) = if req.uses(f) {
                used(f)
            } else {
                (HandMode::Unchanged, 0.0)
            };
            axes[HandAxis::Finger(f).slot()] = AxisCommand::Drive { mode, value };
        }
        axes[HandAxis::Spread.slot()] = AxisCommand::Ignore;
        Self { axes }
    }

    #[inline]
    pub fn axis(&self, axis: HandAxis) -> AxisCommand {
        self.axes[axis.slot()]
    }

    /// Wire form handed to the command channel.
    #[inline]
    pub fn to_command(&self) -> HandCommand {
        HandCommand { axes: self.axes }
    }
}

/// Approach, hold and abort profiles for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandProfiles {
    pub approach: CommandProfile,
    pub hold: CommandProfile,
    pub abort: CommandProfile,
}

impl CommandProfiles {
    pub fn from_request(req: &GraspRequest) -> Self {
        Self {
            approach: CommandProfile::build(req, |f| (HandMode::ApproachVelocity, req.speed(f))),
            hold: CommandProfile::build(req, |f| (HandMode::HoldEffort, req.effort(f))),
            abort: CommandProfile::build(req, |_| (HandMode::Idle, 0.0)),
        }
    }
}
