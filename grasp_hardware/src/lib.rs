//! Simulated three-finger hand.
//!
//! A kinematic stand-in for a hand driver, stepped explicitly by the caller:
//!
//! - `ApproachVelocity` closes the inner joint at the commanded speed until it
//!   reaches the finger's contact angle, then stops
//! - `HoldEffort`, `Idle` and anything else keep the finger where it is
//! - the outer joint follows the inner one at a third of its angle
//! - a newly commanded mode is reported back only after
//!   `mode_latency_reports` status reports
//!
//! Handles are cheap clones sharing one state, so one can be handed to a
//! controller as its `HandCommander` while another drives the simulation.

pub mod error;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use grasp_traits::HandCommander;
use grasp_traits::msg::{
    AXIS_COUNT, AxisCommand, FINGER_COUNT, HandCommand, HandMode, HandStatus, JOINT_COUNT,
    JointSample,
};

pub use error::{HwError, Result};

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SimParams {
    /// Inner-joint angle (rad) at which each finger meets the object.
    pub contact_angle: [f64; FINGER_COUNT],
    /// Peak amplitude of uniform position noise (rad).
    pub position_noise: f64,
    pub mode_latency_reports: u32,
    pub seed: u64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            contact_angle: [1.2, 1.3, 1.1],
            position_noise: 0.0,
            mode_latency_reports: 1,
            seed: 7,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FingerSim {
    inner: f64,
    velocity: f64,
    commanded: HandMode,
    value: f64,
    reported: HandMode,
    pending: u32,
}

impl Default for FingerSim {
    fn default() -> Self {
        Self {
            inner: 0.0,
            velocity: 0.0,
            commanded: HandMode::Idle,
            value: 0.0,
            reported: HandMode::Idle,
            pending: 0,
        }
    }
}

#[derive(Debug)]
struct HandState {
    params: SimParams,
    fingers: [FingerSim; FINGER_COUNT],
    rng: u64,
    commands: u64,
}

impl HandState {
    /// xorshift64, uniform in [-1, 1).
    fn noise(&mut self) -> f64 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng = x;
        (x >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
    }
}

const TEMPERATURE_C: f64 = 31.5;

#[derive(Debug, Clone)]
pub struct SimulatedHand {
    state: Arc<Mutex<HandState>>,
}

impl Default for SimulatedHand {
    fn default() -> Self {
        Self::new(SimParams::default())
    }
}

impl SimulatedHand {
    pub fn new(params: SimParams) -> Self {
        let rng = params.seed.max(1);
        Self {
            state: Arc::new(Mutex::new(HandState {
                params,
                fingers: [FingerSim::default(); FINGER_COUNT],
                rng,
                commands: 0,
            })),
        }
    }

    // A panic while holding the lock leaves plain numbers behind; keep going.
    fn lock(&self) -> MutexGuard<'_, HandState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a command snapshot. Slots carrying `Ignore` or `Unchanged` are
    /// left alone; the whole command is rejected if any driven slot is invalid.
    pub fn apply(&self, cmd: &HandCommand) -> Result<()> {
        let mut st = self.lock();
        for (i, axis) in cmd.axes.iter().enumerate().take(FINGER_COUNT) {
            if let AxisCommand::Drive { mode, value } = *axis {
                let finger = i as u8 + 1;
                if matches!(mode, HandMode::Position | HandMode::Velocity) {
                    return Err(HwError::UnsupportedMode {
                        finger,
                        mode: mode.name(),
                    });
                }
                if !value.is_finite() {
                    return Err(HwError::InvalidValue { finger, value });
                }
            }
        }
        st.commands += 1;
        let latency = st.params.mode_latency_reports;
        for (f, axis) in st.fingers.iter_mut().zip(cmd.axes.iter()) {
            let AxisCommand::Drive { mode, value } = *axis else {
                continue;
            };
            if mode == HandMode::Unchanged {
                continue;
            }
            if mode != f.commanded {
                tracing::trace!(mode = mode.name(), "simulated finger switching mode");
                f.pending = latency;
            }
            f.commanded = mode;
            f.value = value;
        }
        Ok(())
    }

    /// Advance the kinematics by `dt`.
    pub fn step(&self, dt: Duration) {
        let mut st = self.lock();
        let dt = dt.as_secs_f64();
        let contact = st.params.contact_angle;
        for (f, stop) in st.fingers.iter_mut().zip(contact) {
            match f.commanded {
                HandMode::ApproachVelocity if f.inner < stop => {
                    let next = (f.inner + f.value * dt).min(stop);
                    f.velocity = if dt > 0.0 { (next - f.inner) / dt } else { 0.0 };
                    f.inner = next;
                }
                _ => f.velocity = 0.0,
            }
        }
    }

    /// Joint sample stamped with `stamp`, noise applied to the finger joints.
    pub fn joint_sample(&self, stamp: Instant) -> JointSample {
        let mut st = self.lock();
        let amp = st.params.position_noise;
        let mut position = [0.0; JOINT_COUNT];
        let mut velocity = [0.0; JOINT_COUNT];
        let fingers = st.fingers;
        for (i, f) in fingers.iter().enumerate() {
            let n_inner = if amp > 0.0 { st.noise() * amp } else { 0.0 };
            let n_outer = if amp > 0.0 { st.noise() * amp } else { 0.0 };
            position[2 + i] = f.inner + n_inner;
            position[5 + i] = f.inner / 3.0 + n_outer;
            velocity[2 + i] = f.velocity;
            velocity[5 + i] = f.velocity / 3.0;
        }
        JointSample {
            stamp,
            position,
            velocity,
        }
    }

    /// Produce a status report. Every call counts down pending mode switches.
    pub fn status(&self) -> HandStatus {
        let mut st = self.lock();
        let mut modes = [HandMode::Idle; FINGER_COUNT];
        for (f, m) in st.fingers.iter_mut().zip(modes.iter_mut()) {
            if f.pending > 0 {
                f.pending -= 1;
            } else {
                f.reported = f.commanded;
            }
            *m = f.reported;
        }
        HandStatus {
            modes,
            temperature: [TEMPERATURE_C; AXIS_COUNT],
        }
    }

    /// Inner-joint angle of a finger (0-based).
    pub fn inner_angle(&self, finger: usize) -> f64 {
        self.lock().fingers.get(finger).map_or(0.0, |f| f.inner)
    }

    pub fn commanded_mode(&self, finger: usize) -> HandMode {
        self.lock()
            .fingers
            .get(finger)
            .map_or(HandMode::Unchanged, |f| f.commanded)
    }

    /// Number of accepted commands.
    pub fn commands_received(&self) -> u64 {
        self.lock().commands
    }
}

impl HandCommander for SimulatedHand {
    fn send(&mut self, cmd: &HandCommand) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.apply(cmd).map_err(|e| {
            tracing::warn!(error = %e, "simulated hand rejected command");
            Box::new(e) as _
        })
    }
}
