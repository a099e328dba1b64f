use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraspError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unknown controller: {0}")]
    UnknownController(String),
    #[error("event loop disconnected")]
    Disconnected,
}

/// Why an accepted grasp ended in the aborted outcome.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AbortReason {
    #[error("hand state timestamp is in the future by {} seconds", .ahead.as_secs_f64())]
    ClockSkew { ahead: Duration },
    #[error("preempted by peer")]
    PeerPreempted,
    #[error("abort requested: {0}")]
    Requested(String),
    #[error("grasp did not settle within the max attempt time")]
    MaxRuntime,
}

/// An attempt that finished without success, for callers that want `?`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttemptFailed {
    #[error("grasp aborted: {0}")]
    Aborted(AbortReason),
    #[error("grasp preempted")]
    Preempted,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FilterError {
    #[error("sample stamped {ahead:?} ahead of the receiver clock")]
    ClockSkew { ahead: Duration },
}

pub type Result<T> = eyre::Result<T>;
