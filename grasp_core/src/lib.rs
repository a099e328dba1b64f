#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Closed-loop two-phase grasp control (hardware-agnostic).
//!
//! All hand interactions go through `grasp_traits::HandCommander` for commands
//! and plain `JointSample` / `HandStatus` values for telemetry.
//!
//! ## Architecture
//!
//! - **Joints**: named fingers, joints and command slots (`joint` module)
//! - **Geometry**: inscribed-circle contact radius diagnostic (`geometry`)
//! - **Filtering**: per-joint exponential smoothing and static detection (`filter`)
//! - **Profiles**: approach / hold / abort command snapshots (`profile`)
//! - **Control**: the grasp state machine (`controller`)
//! - **Peers**: cooperative preemption between controllers sharing a hand (`coordinator`)
//! - **Event loop**: single-consumer inbox that serializes every input (`event_loop`)

pub mod config;
pub mod controller;
pub mod conversions;
pub mod coordinator;
pub mod error;
pub mod event_loop;
pub mod filter;
pub mod geometry;
pub mod hw_error;
pub mod joint;
pub mod mocks;
pub mod profile;
pub mod request;
pub mod status;

pub use config::{ControllerCfg, SafetyCfg, StaticCriterion};
pub use controller::{ActiveAttempt, GraspController};
pub use coordinator::{HandCoordinator, Report};
pub use error::{AbortReason, AttemptFailed, FilterError, GraspError, Result};
pub use event_loop::{
    ChannelCommander, ControlHandle, EventLoop, HandEvent, Inbox, LoopOutput, SensorFeed, StatusFeed,
};
pub use filter::{DoneMoving, MotionFilter, StaticDecision};
pub use geometry::{InscribedCircle, inscribed_circle, radius};
pub use joint::{Finger, HandAxis, JointId};
pub use profile::{CommandProfile, CommandProfiles};
pub use request::GraspRequest;
pub use status::{Feedback, GraspOutcome, Phase};
