//! The grasp state machine.
//!
//! One `GraspController` drives one hand on behalf of one requester. Every
//! input is a plain method call and the controller never blocks; callers must
//! serialize calls (see `event_loop`).
//!
//! Phase transitions are driven by status reports:
//!
//! - `Approaching`: publish approach; all used fingers in ApproachVelocity -> `Closing`
//! - `Closing`: publish hold once every used joint is done moving; all used
//!   fingers in HoldEffort -> `Holding` (reports `Succeeded`)
//! - `Holding`: inert
//! - `Aborting` / `Preempting`: publish abort until all used fingers are Idle,
//!   then drop the attempt and report the outcome for the phase it was in
//!
//! Sensor samples feed the motion filter. A sample stamped too far ahead of
//! the controller clock aborts the attempt at once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use grasp_traits::msg::{HandMode, HandStatus, JointSample};
use grasp_traits::{Clock, HandCommander};

use crate::config::{ControllerCfg, SafetyCfg};
use crate::error::{AbortReason, FilterError};
use crate::filter::{DoneMoving, FilterParams, MotionFilter};
use crate::geometry::radius;
use crate::hw_error::map_hw_error;
use crate::joint::Finger;
use crate::profile::{CommandProfile, CommandProfiles};
use crate::request::GraspRequest;
use crate::status::{Feedback, GraspOutcome, Phase};

/// Everything that belongs to one accepted request. Created fresh on accept
/// and dropped when the attempt ends.
#[derive(Debug, Clone)]
pub struct ActiveAttempt {
    request: GraspRequest,
    profiles: CommandProfiles,
    phase: Phase,
    filter: MotionFilter,
    started_at: Instant,
    closing_since: Option<Instant>,
    radii: [f64; 3],
    abort_reason: Option<AbortReason>,
}

impl ActiveAttempt {
    fn new(request: GraspRequest, params: FilterParams, now: Instant) -> Self {
        let profiles = CommandProfiles::from_request(&request);
        Self {
            request,
            profiles,
            phase: Phase::Approaching,
            filter: MotionFilter::new(params),
            started_at: now,
            closing_since: None,
            radii: [0.0; 3],
            abort_reason: None,
        }
    }

    pub fn request(&self) -> &GraspRequest {
        &self.request
    }

    pub fn profiles(&self) -> &CommandProfiles {
        &self.profiles
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn filter(&self) -> &MotionFilter {
        &self.filter
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// When the attempt entered `Closing`.
    pub fn closing_since(&self) -> Option<Instant> {
        self.closing_since
    }

    pub fn radii(&self) -> [f64; 3] {
        self.radii
    }

    /// Whether every used finger reports `mode`.
    fn all_used_in(&self, status: &HandStatus, mode: HandMode) -> bool {
        self.request
            .fingers()
            .all(|f| status.modes[f.index()] == mode)
    }
}

fn publish<C: HandCommander>(commander: &mut C, name: &str, profile: &CommandProfile) {
    if let Err(e) = commander.send(&profile.to_command()) {
        let e = map_hw_error(&*e);
        tracing::warn!(controller = %name, error = %e, "failed to publish hand command");
    }
}

pub struct GraspController<C: HandCommander> {
    name: String,
    cfg: ControllerCfg,
    safety: SafetyCfg,
    commander: C,
    clock: Arc<dyn Clock + Send + Sync>,
    attempt: Option<ActiveAttempt>,
}

impl<C: HandCommander> std::fmt::Debug for GraspController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraspController")
            .field("name", &self.name)
            .field("cfg", &self.cfg)
            .field("safety", &self.safety)
            .field("attempt", &self.attempt)
            .finish()
    }
}

impl<C: HandCommander> GraspController<C> {
    pub fn new(name: impl Into<String>, cfg: ControllerCfg, commander: C) -> Self {
        Self::with_clock(name, cfg, commander, Arc::new(grasp_traits::MonotonicClock::new()))
    }

    pub fn with_clock(
        name: impl Into<String>,
        cfg: ControllerCfg,
        commander: C,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            name: name.into(),
            cfg,
            safety: SafetyCfg::default(),
            commander,
            clock,
            attempt: None,
        }
    }

    #[must_use]
    pub fn with_safety(mut self, safety: SafetyCfg) -> Self {
        self.safety = safety;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cfg(&self) -> &ControllerCfg {
        &self.cfg
    }

    pub fn commander(&self) -> &C {
        &self.commander
    }

    pub fn commander_mut(&mut self) -> &mut C {
        &mut self.commander
    }

    pub fn attempt(&self) -> Option<&ActiveAttempt> {
        self.attempt.as_ref()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.attempt.as_ref().map(ActiveAttempt::phase)
    }

    /// True while an accepted request has not been finalized.
    pub fn is_active(&self) -> bool {
        self.attempt.is_some()
    }

    pub fn done_moving(&self) -> Option<&DoneMoving> {
        self.attempt.as_ref().map(|a| a.filter.done_moving())
    }

    /// Start a new attempt, replacing any current one.
    ///
    /// An attempt that had not yet succeeded is reported as `Preempted`; its
    /// fingers are not idled since the new request takes them over directly.
    pub fn accept(&mut self, request: GraspRequest) -> Option<GraspOutcome> {
        let now = self.clock.now();
        for f in Finger::ALL {
            tracing::info!(
                controller = %self.name,
                finger = f.number(),
                used = request.uses(f),
                speed = request.speed(f),
                effort = request.effort(f),
                "grasp finger"
            );
        }
        let attempt = ActiveAttempt::new(request, FilterParams::from(&self.cfg), now);
        let superseded = self.attempt.replace(attempt).and_then(|old| match old.phase {
            Phase::Holding => None,
            phase => {
                tracing::info!(controller = %self.name, phase = phase.name(), "superseding unfinished attempt");
                Some(GraspOutcome::Preempted)
            }
        });
        tracing::info!(controller = %self.name, "accepted new grasp request");
        superseded
    }

    /// Request an idling preemption. Takes effect on the next status report.
    pub fn cancel(&mut self) {
        match self.attempt.as_mut() {
            Some(att) => {
                tracing::warn!(controller = %self.name, phase = att.phase.name(), "preemption requested");
                att.phase = Phase::Preempting;
            }
            None => tracing::debug!(controller = %self.name, "cancel with no active attempt"),
        }
    }

    /// Request an idling abort with a message. Takes effect on the next status report.
    pub fn abort(&mut self, message: impl Into<String>) {
        let message = message.into();
        match self.attempt.as_mut() {
            Some(att) => {
                tracing::warn!(controller = %self.name, %message, "abort requested");
                att.phase = Phase::Aborting;
                att.abort_reason = Some(AbortReason::Requested(message));
            }
            None => tracing::debug!(controller = %self.name, "abort with no active attempt"),
        }
    }

    /// A sibling took the hand. Ends the attempt at once without idling.
    pub fn peer_preempt(&mut self) -> Option<GraspOutcome> {
        let att = self.attempt.take()?;
        tracing::warn!(controller = %self.name, phase = att.phase.name(), "preemption requested by peer");
        Some(GraspOutcome::Aborted(AbortReason::PeerPreempted))
    }

    /// Feed one joint-state sample.
    ///
    /// Ignored with no attempt and while holding. Returns an outcome only
    /// when the sample is rejected for clock skew, which ends the attempt.
    pub fn on_joint_state(&mut self, sample: &JointSample) -> Option<GraspOutcome> {
        let now = self.clock.now();
        let att = self.attempt.as_mut()?;
        if att.phase == Phase::Holding {
            return None;
        }

        if let Err(FilterError::ClockSkew { ahead }) = att.filter.ingest(sample, now) {
            let reason = AbortReason::ClockSkew { ahead };
            tracing::error!(controller = %self.name, error = %reason, "rejecting joint sample");
            self.attempt = None;
            return Some(GraspOutcome::Aborted(reason));
        }

        for f in Finger::ALL {
            let [inner, outer] = f.joints();
            att.radii[f.index()] = radius(
                sample.position[inner.index()],
                sample.position[outer.index()],
            );
        }
        tracing::debug!(controller = %self.name, radii = ?att.radii, "finger radii");
        tracing::trace!(
            controller = %self.name,
            done = ?att.filter.done_moving().as_array(),
            "done moving"
        );
        None
    }

    /// Feed one status report and publish the command for the current phase.
    pub fn on_status(&mut self, status: &HandStatus) -> Option<GraspOutcome> {
        let now = self.clock.now();
        let max_attempt = self.safety.max_attempt_ms;
        let name = self.name.as_str();
        let att = self.attempt.as_mut()?;

        if max_attempt > 0
            && matches!(att.phase, Phase::Approaching | Phase::Closing)
            && now.saturating_duration_since(att.started_at) > Duration::from_millis(max_attempt)
        {
            tracing::warn!(controller = %name, max_attempt_ms = max_attempt, "attempt exceeded max runtime; idling");
            att.phase = Phase::Aborting;
            att.abort_reason = Some(AbortReason::MaxRuntime);
        }

        match att.phase {
            Phase::Approaching => {
                tracing::debug!(controller = %name, "sending approach command");
                publish(&mut self.commander, name, &att.profiles.approach);
                if att.all_used_in(status, HandMode::ApproachVelocity) {
                    att.phase = Phase::Closing;
                    att.closing_since = Some(now);
                    tracing::info!(controller = %name, "closing");
                }
                None
            }
            Phase::Closing => {
                if att.all_used_in(status, HandMode::HoldEffort) {
                    att.phase = Phase::Holding;
                    tracing::info!(
                        controller = %name,
                        elapsed_ms = now.saturating_duration_since(att.started_at).as_millis() as u64,
                        "grasped"
                    );
                    return Some(GraspOutcome::Succeeded);
                }
                if att.filter.done_moving().all_used(att.request.mask()) {
                    tracing::debug!(controller = %name, "sending hold command");
                    publish(&mut self.commander, name, &att.profiles.hold);
                }
                None
            }
            Phase::Holding => None,
            phase @ (Phase::Aborting | Phase::Preempting) => {
                if !att.all_used_in(status, HandMode::Idle) {
                    tracing::warn!(controller = %name, phase = phase.name(), "idling fingers");
                    publish(&mut self.commander, name, &att.profiles.abort);
                    return None;
                }
                let reason = att.abort_reason.take();
                self.attempt = None;
                let outcome = match (phase, reason) {
                    (Phase::Aborting, Some(reason)) => GraspOutcome::Aborted(reason),
                    (Phase::Aborting, None) => {
                        GraspOutcome::Aborted(AbortReason::Requested("aborted".into()))
                    }
                    _ => GraspOutcome::Preempted,
                };
                tracing::info!(controller = %self.name, outcome = outcome.name(), "fingers idle; attempt finished");
                Some(outcome)
            }
        }
    }

    /// Progress snapshot of the current attempt.
    pub fn feedback(&self) -> Option<Feedback> {
        let att = self.attempt.as_ref()?;
        Some(Feedback {
            phase: att.phase,
            elapsed: self.clock.elapsed_since(att.started_at),
            done_moving: *att.filter.done_moving(),
            radii: att.radii,
        })
    }
}
