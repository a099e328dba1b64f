//! Phases, outcomes and feedback of a grasp attempt.

use std::time::Duration;

use crate::error::{AbortReason, AttemptFailed};
use crate::filter::DoneMoving;

/// Activity of an attempt. "No attempt" is represented by its absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Sending the approach profile until every used finger reports it.
    Approaching,
    /// Closing; switches to hold once every used joint has stopped.
    Closing,
    /// Hold effort confirmed. Success has been reported.
    Holding,
    /// Idling the fingers before reporting an abort.
    Aborting,
    /// Idling the fingers before reporting a preemption.
    Preempting,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Approaching => "approaching",
            Phase::Closing => "closing",
            Phase::Holding => "holding",
            Phase::Aborting => "aborting",
            Phase::Preempting => "preempting",
        }
    }
}

/// Terminal report for an accepted request.
#[derive(Debug, Clone, PartialEq)]
pub enum GraspOutcome {
    Succeeded,
    Aborted(AbortReason),
    Preempted,
}

impl GraspOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            GraspOutcome::Succeeded => "succeeded",
            GraspOutcome::Aborted(_) => "aborted",
            GraspOutcome::Preempted => "preempted",
        }
    }

    pub fn into_result(self) -> Result<(), AttemptFailed> {
        match self {
            GraspOutcome::Succeeded => Ok(()),
            GraspOutcome::Aborted(reason) => Err(AttemptFailed::Aborted(reason)),
            GraspOutcome::Preempted => Err(AttemptFailed::Preempted),
        }
    }
}

/// Periodic progress snapshot of an active attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub phase: Phase,
    pub elapsed: Duration,
    pub done_moving: DoneMoving,
    /// Inscribed-circle radius per finger (m), from the latest joint sample.
    pub radii: [f64; 3],
}
