//! Cooperative sharing of one hand between several grasp controllers.
//!
//! Accepting a request on one controller first peer-preempts every sibling so
//! only one of them commands the hand at a time. This is advisory: a
//! controller driven directly, bypassing the coordinator, is not stopped.

use grasp_traits::HandCommander;
use grasp_traits::msg::{HandStatus, JointSample};

use crate::controller::GraspController;
use crate::error::{GraspError, Result};
use crate::request::GraspRequest;
use crate::status::{Feedback, GraspOutcome};

/// A terminal outcome attributed to the controller that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub controller: String,
    pub outcome: GraspOutcome,
}

impl Report {
    fn new(controller: &str, outcome: GraspOutcome) -> Self {
        Self {
            controller: controller.to_string(),
            outcome,
        }
    }
}

#[derive(Debug)]
pub struct HandCoordinator<C: HandCommander> {
    controllers: Vec<GraspController<C>>,
}

impl<C: HandCommander> Default for HandCoordinator<C> {
    fn default() -> Self {
        Self {
            controllers: Vec::new(),
        }
    }
}

impl<C: HandCommander> HandCoordinator<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller. Names must be unique.
    pub fn add(&mut self, controller: GraspController<C>) -> Result<()> {
        if self.position(controller.name()).is_some() {
            return Err(eyre::Report::new(GraspError::Config(format!(
                "duplicate controller name '{}'",
                controller.name()
            ))));
        }
        tracing::debug!(controller = %controller.name(), "registered controller");
        self.controllers.push(controller);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.controllers.iter().map(GraspController::name)
    }

    pub fn get(&self, name: &str) -> Option<&GraspController<C>> {
        self.controllers.iter().find(|c| c.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut GraspController<C>> {
        self.controllers.iter_mut().find(|c| c.name() == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.controllers.iter().position(|c| c.name() == name)
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| eyre::Report::new(GraspError::UnknownController(name.to_string())))
    }

    /// Peer-preempt every controller except `name`.
    pub fn notify_peers(&mut self, name: &str) -> Vec<Report> {
        tracing::info!(controller = %name, "preempting peers");
        self.controllers
            .iter_mut()
            .filter(|c| c.name() != name)
            .filter_map(|c| c.peer_preempt().map(|o| Report::new(c.name(), o)))
            .collect()
    }

    /// Peer-preempt siblings, then start the request on `name`.
    pub fn accept(&mut self, name: &str, request: GraspRequest) -> Result<Vec<Report>> {
        let idx = self.index_of(name)?;
        let mut reports = self.notify_peers(name);
        let c = &mut self.controllers[idx];
        if let Some(outcome) = c.accept(request) {
            reports.push(Report::new(c.name(), outcome));
        }
        Ok(reports)
    }

    pub fn cancel(&mut self, name: &str) -> Result<()> {
        let idx = self.index_of(name)?;
        self.controllers[idx].cancel();
        Ok(())
    }

    pub fn abort(&mut self, name: &str, message: impl Into<String>) -> Result<()> {
        let idx = self.index_of(name)?;
        self.controllers[idx].abort(message);
        Ok(())
    }

    pub fn peer_preempt(&mut self, name: &str) -> Result<Option<Report>> {
        let idx = self.index_of(name)?;
        let c = &mut self.controllers[idx];
        Ok(c.peer_preempt().map(|o| Report::new(c.name(), o)))
    }

    /// Broadcast a joint sample to every controller.
    pub fn on_joint_state(&mut self, sample: &JointSample) -> Vec<Report> {
        self.controllers
            .iter_mut()
            .filter_map(|c| c.on_joint_state(sample).map(|o| Report::new(c.name(), o)))
            .collect()
    }

    /// Broadcast a status report to every controller.
    pub fn on_status(&mut self, status: &HandStatus) -> Vec<Report> {
        self.controllers
            .iter_mut()
            .filter_map(|c| c.on_status(status).map(|o| Report::new(c.name(), o)))
            .collect()
    }

    /// Feedback of every controller with an attempt.
    pub fn feedback(&self) -> Vec<(String, Feedback)> {
        self.controllers
            .iter()
            .filter_map(|c| c.feedback().map(|f| (c.name().to_string(), f)))
            .collect()
    }

    pub fn any_active(&self) -> bool {
        self.controllers.iter().any(GraspController::is_active)
    }
}
