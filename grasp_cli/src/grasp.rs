//! Grasp execution against the simulated hand, trace replay and self-check.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eyre::{Result, WrapErr};
use grasp_config::{Config, SimCfg};
use grasp_core::filter::FilterParams;
use grasp_core::{
    CommandProfiles, ControllerCfg, EventLoop, Feedback, Finger, GraspController, GraspError,
    GraspOutcome, GraspRequest, HandCoordinator, Inbox, JointId, LoopOutput, MotionFilter,
    SafetyCfg, radius,
};
use grasp_hardware::{SimParams, SimulatedHand};
use grasp_traits::msg::{HandMode, JointSample};

use crate::cli::LAST_MAX_ATTEMPT_MS;

/// Name of the single controller the CLI runs.
pub const CONTROLLER: &str = "bhand";

pub fn sim_params(c: &SimCfg) -> SimParams {
    SimParams {
        contact_angle: c.contact_angle,
        position_noise: c.position_noise,
        mode_latency_reports: c.mode_latency_reports,
        seed: c.seed,
    }
}

/// Turn `--fingers 1,3` into a finger mask.
pub fn mask_from_fingers(fingers: &[u8]) -> Result<[bool; 3]> {
    let mut mask = [false; 3];
    for n in fingers {
        let f = Finger::from_number(*n).ok_or_else(|| {
            GraspError::InvalidRequest(format!("finger {n} does not exist (expected 1, 2 or 3)"))
        })?;
        mask[f.index()] = true;
    }
    Ok(mask)
}

#[derive(Debug, Clone)]
pub struct GraspOpts {
    pub fingers: Vec<u8>,
    pub speed: f64,
    pub effort: f64,
    pub cancel_after: Option<Duration>,
    pub max_attempt_ms: Option<u64>,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct GraspSummary {
    pub outcome: GraspOutcome,
    pub elapsed: Duration,
    pub radii: [f64; 3],
    pub feedback_count: usize,
}

fn emit_feedback(json: bool, fb: &Feedback) {
    if json {
        let line = serde_json::json!({
            "type": "feedback",
            "phase": fb.phase.name(),
            "elapsed_ms": fb.elapsed.as_millis() as u64,
            "done_moving": fb.done_moving.as_array(),
            "radii": fb.radii,
        });
        println!("{line}");
    } else {
        tracing::info!(
            phase = fb.phase.name(),
            elapsed_ms = fb.elapsed.as_millis() as u64,
            radii = ?fb.radii,
            "feedback"
        );
    }
}

/// Drive one grasp to its terminal outcome.
///
/// The simulated hand is stepped on this thread at the sensor period while
/// the controller runs behind an event loop on its own thread. `shutdown`
/// (Ctrl-C) and `cancel_after` both turn into a single cancel.
pub fn run_grasp(cfg: &Config, opts: &GraspOpts, shutdown: Arc<AtomicBool>) -> Result<GraspSummary> {
    let mask = mask_from_fingers(&opts.fingers)?;
    let request = GraspRequest::uniform(mask, opts.speed, opts.effort)?;

    let controller_cfg: ControllerCfg = (&cfg.controller).into();
    let mut safety: SafetyCfg = (&cfg.safety).into();
    if let Some(ms) = opts.max_attempt_ms {
        safety.max_attempt_ms = ms;
    }
    let _ = LAST_MAX_ATTEMPT_MS.set(safety.max_attempt_ms);

    let hand = SimulatedHand::new(sim_params(&cfg.sim));
    let feedback_period = controller_cfg.feedback_period;
    let mut hc = HandCoordinator::new();
    hc.add(GraspController::new(CONTROLLER, controller_cfg, hand.clone()).with_safety(safety))?;

    let inbox = Inbox::new();
    let sensor = inbox.sensor_feed();
    let status = inbox.status_feed();
    let control = inbox.control();
    let (ev, out) = EventLoop::new(hc, inbox, feedback_period);
    let worker = ev.spawn();

    control.accept(CONTROLLER, request)?;
    tracing::info!(?mask, speed = opts.speed, effort = opts.effort, "grasp start");

    let sensor_period = Duration::from_millis(cfg.sim.sensor_period_ms);
    let status_period = Duration::from_millis(cfg.sim.status_period_ms);
    let started = Instant::now();
    let mut last_step = started;
    let mut next_status = started;
    let mut cancelled = false;
    let mut last_feedback: Option<Feedback> = None;
    let mut feedback_count = 0usize;

    let outcome = loop {
        std::thread::sleep(sensor_period);
        let now = Instant::now();
        hand.step(now.saturating_duration_since(last_step));
        last_step = now;

        if !cancelled {
            let timed_out = opts
                .cancel_after
                .is_some_and(|d| now.saturating_duration_since(started) >= d);
            if shutdown.load(Ordering::Relaxed) || timed_out {
                tracing::warn!(timed_out, "cancelling grasp");
                control.cancel(CONTROLLER)?;
                cancelled = true;
            }
        }

        sensor.send(hand.joint_sample(now))?;
        if now >= next_status {
            status.send(hand.status())?;
            next_status = now + status_period;
        }

        let mut finished = None;
        for o in out.try_iter() {
            match o {
                LoopOutput::Outcome(r) => finished = Some(r.outcome),
                LoopOutput::Feedback { feedback, .. } => {
                    emit_feedback(opts.json, &feedback);
                    feedback_count += 1;
                    last_feedback = Some(feedback);
                }
            }
        }
        if let Some(o) = finished {
            break o;
        }
    };

    control.shutdown()?;
    worker
        .join()
        .map_err(|_| eyre::eyre!("event loop thread panicked"))?;

    let elapsed = started.elapsed();
    tracing::info!(outcome = outcome.name(), elapsed_ms = elapsed.as_millis() as u64, "grasp finished");
    Ok(GraspSummary {
        outcome,
        elapsed,
        radii: last_feedback.map_or([0.0; 3], |f| f.radii),
        feedback_count,
    })
}

#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub rows: usize,
    pub duration_s: f64,
    /// Trace time (s) at which each joint was first judged done moving.
    pub settled_at: [Option<f64>; 8],
    /// Trace time (s) at which every joint of the selected fingers was done.
    pub all_settled_at: Option<f64>,
    pub final_done: [bool; 8],
    pub radii: [f64; 3],
}

/// Feed a recorded joint trace through the motion filter, with the receiver
/// clock equal to each row's timestamp.
pub fn run_replay(cfg: &Config, trace: &Path, fingers: &[u8]) -> Result<ReplaySummary> {
    let mask = mask_from_fingers(fingers)?;
    let rows = grasp_config::load_joint_trace_csv(trace).wrap_err("load joint trace")?;
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        eyre::bail!("joint trace {} has no rows", trace.display());
    };
    let t0 = first.t;

    let params = FilterParams::from(&ControllerCfg::from(&cfg.controller));
    let mut filter = MotionFilter::new(params);
    let base = Instant::now();
    let mut settled_at = [None; 8];
    let mut all_settled_at = None;

    for row in &rows {
        let rel = row.t - t0;
        let stamp = Duration::try_from_secs_f64(rel)
            .ok()
            .and_then(|offset| base.checked_add(offset))
            .ok_or_else(|| eyre::eyre!("trace time {} out of range", row.t))?;
        let sample = JointSample {
            stamp,
            position: row.position,
            velocity: row.velocity,
        };
        filter.ingest(&sample, stamp)?;

        let done = filter.done_moving();
        for j in JointId::ALL {
            let slot = &mut settled_at[j.index()];
            if slot.is_none() && done.get(j) {
                *slot = Some(rel);
                tracing::debug!(joint = %j.name(), t = rel, "joint settled");
            }
        }
        if all_settled_at.is_none() && done.all_used(&mask) {
            all_settled_at = Some(rel);
        }
    }

    let mut radii = [0.0; 3];
    for f in Finger::ALL {
        let [inner, outer] = f.joints();
        radii[f.index()] = radius(last.position[inner.index()], last.position[outer.index()]);
    }

    Ok(ReplaySummary {
        rows: rows.len(),
        duration_s: last.t - t0,
        settled_at,
        all_settled_at,
        final_done: filter.done_moving().as_array(),
        radii,
    })
}

/// Exercise the simulated hand: accept an approach command, move, and report
/// the commanded mode back.
pub fn self_check(cfg: &Config) -> Result<()> {
    let hand = SimulatedHand::new(sim_params(&cfg.sim));
    let request = GraspRequest::uniform([true; 3], 1.0, 0.5)?;
    let profiles = CommandProfiles::from_request(&request);
    hand.apply(&profiles.approach.to_command())
        .wrap_err("simulated hand rejected approach command")?;
    hand.step(Duration::from_millis(100));
    if Finger::ALL.iter().any(|f| hand.inner_angle(f.index()) <= 0.0) {
        eyre::bail!("simulated hand did not move under approach command");
    }

    let mut modes = hand.status().modes;
    for _ in 0..cfg.sim.mode_latency_reports {
        modes = hand.status().modes;
    }
    if modes != [HandMode::ApproachVelocity; 3] {
        eyre::bail!("simulated hand reports {modes:?} instead of approach_velocity");
    }

    for (i, a) in cfg.sim.contact_angle.iter().enumerate() {
        let r = radius(*a, *a / 3.0);
        if !r.is_finite() {
            eyre::bail!("radius diagnostic is not finite at finger {} contact angle", i + 1);
        }
    }
    Ok(())
}
