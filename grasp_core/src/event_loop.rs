//! Single-consumer event loop around a `HandCoordinator`.
//!
//! Sensor samples, status reports and control events all travel through one
//! unbounded channel, so they are handled strictly in arrival order and never
//! concurrently. Producers hold typed handles (`SensorFeed`, `StatusFeed`,
//! `ControlHandle`); the loop owns the coordinator and pushes outcomes and
//! rate-limited feedback out through a second channel.
//!
//! The loop exits on `ControlHandle::shutdown` or once every handle is dropped.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel as xch;
use grasp_traits::msg::{HandCommand, HandStatus, JointSample};
use grasp_traits::{Clock, HandCommander, MonotonicClock};

use crate::coordinator::{HandCoordinator, Report};
use crate::error::GraspError;
use crate::request::GraspRequest;
use crate::status::Feedback;

#[derive(Debug, Clone)]
pub enum HandEvent {
    Joint(JointSample),
    Status(HandStatus),
    Accept {
        controller: String,
        request: GraspRequest,
    },
    Cancel {
        controller: String,
    },
    Abort {
        controller: String,
        message: String,
    },
    PeerPreempt {
        controller: String,
    },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopOutput {
    Outcome(Report),
    Feedback {
        controller: String,
        feedback: Feedback,
    },
}

fn post(tx: &xch::Sender<HandEvent>, ev: HandEvent) -> Result<(), GraspError> {
    tx.send(ev).map_err(|_| GraspError::Disconnected)
}

/// Producer side of the sensor stream.
#[derive(Debug, Clone)]
pub struct SensorFeed {
    tx: xch::Sender<HandEvent>,
}

impl SensorFeed {
    pub fn send(&self, sample: JointSample) -> Result<(), GraspError> {
        post(&self.tx, HandEvent::Joint(sample))
    }
}

/// Producer side of the status stream.
#[derive(Debug, Clone)]
pub struct StatusFeed {
    tx: xch::Sender<HandEvent>,
}

impl StatusFeed {
    pub fn send(&self, status: HandStatus) -> Result<(), GraspError> {
        post(&self.tx, HandEvent::Status(status))
    }
}

/// Requester side: accept, cancel, abort and shutdown.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: xch::Sender<HandEvent>,
}

impl ControlHandle {
    pub fn accept(&self, controller: &str, request: GraspRequest) -> Result<(), GraspError> {
        post(
            &self.tx,
            HandEvent::Accept {
                controller: controller.to_string(),
                request,
            },
        )
    }

    pub fn cancel(&self, controller: &str) -> Result<(), GraspError> {
        post(
            &self.tx,
            HandEvent::Cancel {
                controller: controller.to_string(),
            },
        )
    }

    pub fn abort(&self, controller: &str, message: impl Into<String>) -> Result<(), GraspError> {
        post(
            &self.tx,
            HandEvent::Abort {
                controller: controller.to_string(),
                message: message.into(),
            },
        )
    }

    pub fn peer_preempt(&self, controller: &str) -> Result<(), GraspError> {
        post(
            &self.tx,
            HandEvent::PeerPreempt {
                controller: controller.to_string(),
            },
        )
    }

    pub fn shutdown(&self) -> Result<(), GraspError> {
        post(&self.tx, HandEvent::Shutdown)
    }
}

/// The shared inbox. Hand out feeds first, then give the inbox to `EventLoop::new`.
#[derive(Debug)]
pub struct Inbox {
    tx: xch::Sender<HandEvent>,
    rx: xch::Receiver<HandEvent>,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox {
    pub fn new() -> Self {
        let (tx, rx) = xch::unbounded();
        Self { tx, rx }
    }

    pub fn sensor_feed(&self) -> SensorFeed {
        SensorFeed {
            tx: self.tx.clone(),
        }
    }

    pub fn status_feed(&self) -> StatusFeed {
        StatusFeed {
            tx: self.tx.clone(),
        }
    }

    pub fn control(&self) -> ControlHandle {
        ControlHandle {
            tx: self.tx.clone(),
        }
    }
}

/// `HandCommander` that forwards commands over a channel, e.g. to the
/// thread driving the hand.
#[derive(Debug, Clone)]
pub struct ChannelCommander {
    tx: xch::Sender<HandCommand>,
}

impl ChannelCommander {
    pub fn new(tx: xch::Sender<HandCommand>) -> Self {
        Self { tx }
    }

    /// Commander plus the receiving end.
    pub fn pair() -> (Self, xch::Receiver<HandCommand>) {
        let (tx, rx) = xch::unbounded();
        (Self { tx }, rx)
    }
}

impl HandCommander for ChannelCommander {
    fn send(&mut self, cmd: &HandCommand) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.tx
            .send(*cmd)
            .map_err(|_| Box::new(std::io::Error::other("command channel closed")) as _)
    }
}

pub struct EventLoop<C: HandCommander> {
    coordinator: HandCoordinator<C>,
    rx: xch::Receiver<HandEvent>,
    out: xch::Sender<LoopOutput>,
    clock: Arc<dyn Clock + Send + Sync>,
    feedback_period: Duration,
    last_feedback: Option<Instant>,
}

impl<C: HandCommander> EventLoop<C> {
    /// Build the loop and the receiver for its outputs. Consumes the inbox so
    /// the loop sees disconnection once every feed and handle is dropped.
    pub fn new(
        coordinator: HandCoordinator<C>,
        inbox: Inbox,
        feedback_period: Duration,
    ) -> (Self, xch::Receiver<LoopOutput>) {
        Self::with_clock(coordinator, inbox, feedback_period, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(
        coordinator: HandCoordinator<C>,
        inbox: Inbox,
        feedback_period: Duration,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> (Self, xch::Receiver<LoopOutput>) {
        let (out, out_rx) = xch::unbounded();
        let Inbox { rx, .. } = inbox;
        (
            Self {
                coordinator,
                rx,
                out,
                clock,
                feedback_period,
                last_feedback: None,
            },
            out_rx,
        )
    }

    pub fn coordinator(&self) -> &HandCoordinator<C> {
        &self.coordinator
    }

    fn emit(&self, out: LoopOutput) {
        if self.out.send(out).is_err() {
            tracing::debug!("loop output receiver dropped");
        }
    }

    fn emit_reports(&self, reports: Vec<Report>) {
        for r in reports {
            tracing::info!(controller = %r.controller, outcome = r.outcome.name(), "attempt finished");
            self.emit(LoopOutput::Outcome(r));
        }
    }

    fn maybe_feedback(&mut self) {
        let now = self.clock.now();
        if self
            .last_feedback
            .is_some_and(|t| now.saturating_duration_since(t) < self.feedback_period)
        {
            return;
        }
        let snapshots = self.coordinator.feedback();
        if snapshots.is_empty() {
            return;
        }
        self.last_feedback = Some(now);
        for (controller, feedback) in snapshots {
            self.emit(LoopOutput::Feedback {
                controller,
                feedback,
            });
        }
    }

    /// Handle one event. Returns `false` when the loop should stop.
    pub fn handle(&mut self, event: HandEvent) -> bool {
        let reports = match event {
            HandEvent::Joint(sample) => self.coordinator.on_joint_state(&sample),
            HandEvent::Status(status) => {
                let reports = self.coordinator.on_status(&status);
                self.emit_reports(reports);
                self.maybe_feedback();
                return true;
            }
            HandEvent::Accept {
                controller,
                request,
            } => match self.coordinator.accept(&controller, request) {
                Ok(reports) => reports,
                Err(e) => {
                    tracing::warn!(controller = %controller, error = %e, "rejected accept");
                    Vec::new()
                }
            },
            HandEvent::Cancel { controller } => {
                if let Err(e) = self.coordinator.cancel(&controller) {
                    tracing::warn!(controller = %controller, error = %e, "rejected cancel");
                }
                Vec::new()
            }
            HandEvent::Abort {
                controller,
                message,
            } => {
                if let Err(e) = self.coordinator.abort(&controller, message) {
                    tracing::warn!(controller = %controller, error = %e, "rejected abort");
                }
                Vec::new()
            }
            HandEvent::PeerPreempt { controller } => {
                match self.coordinator.peer_preempt(&controller) {
                    Ok(report) => report.into_iter().collect(),
                    Err(e) => {
                        tracing::warn!(controller = %controller, error = %e, "rejected peer preemption");
                        Vec::new()
                    }
                }
            }
            HandEvent::Shutdown => {
                tracing::debug!("event loop shutdown requested");
                return false;
            }
        };
        self.emit_reports(reports);
        true
    }

    /// Process events until shutdown or disconnection; returns the coordinator.
    pub fn run(mut self) -> HandCoordinator<C> {
        while let Ok(ev) = self.rx.recv() {
            if !self.handle(ev) {
                break;
            }
        }
        tracing::trace!("event loop exiting");
        self.coordinator
    }

    /// Run on a dedicated thread.
    pub fn spawn(self) -> JoinHandle<HandCoordinator<C>>
    where
        C: Send + 'static,
    {
        std::thread::spawn(move || self.run())
    }
}
