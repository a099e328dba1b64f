#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and joint-trace parsing for the grasp controller.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section has defaults, so an empty file is a valid config.
//! - The joint-trace CSV loader enforces exact headers and strictly
//!   increasing timestamps before handing rows to the replay tooling.
use serde::Deserialize;

/// Number of joints in a trace row.
pub const TRACE_JOINTS: usize = 8;

/// Which signal decides that a joint has stopped moving.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StaticCriterion {
    /// Range of smoothed position over the window is below the threshold.
    #[default]
    Position,
    /// Every smoothed velocity in the window is below the threshold.
    Velocity,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControllerCfg {
    /// Minimum spacing between feedback snapshots (ms).
    pub feedback_period_ms: u64,
    /// Velocity bound (rad/s) for the velocity criterion.
    pub static_vel_threshold: f64,
    /// Position range bound (rad) for the position criterion.
    pub static_pos_threshold: f64,
    /// Smoothing weight of the previous velocity estimate, in [0, 1).
    pub vel_filter_coeff: f64,
    /// Smoothing weight of the previous position estimate, in [0, 1).
    pub pos_filter_coeff: f64,
    /// Window span required before a joint can be judged static (ms).
    /// The retained window is twice this long.
    pub min_static_duration_ms: u64,
    pub static_criterion: StaticCriterion,
    /// How far in the future a joint sample may be stamped before it is rejected (ms).
    pub clock_skew_tolerance_ms: u64,
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            feedback_period_ms: 100,
            static_vel_threshold: 0.1,
            static_pos_threshold: 0.05,
            vel_filter_coeff: 0.5,
            pos_filter_coeff: 0.5,
            min_static_duration_ms: 100,
            static_criterion: StaticCriterion::Position,
            clock_skew_tolerance_ms: 10,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Safety {
    /// Abort (with idling) an attempt still closing after this many ms. 0 disables.
    pub max_attempt_ms: u64,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Parameters of the simulated hand used by the CLI and tests.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimCfg {
    /// Inner-joint angle (rad) at which each finger meets the object.
    pub contact_angle: [f64; 3],
    /// Joint-state publication period (ms).
    pub sensor_period_ms: u64,
    /// Status publication period (ms).
    pub status_period_ms: u64,
    /// Peak amplitude of uniform position noise (rad).
    pub position_noise: f64,
    /// Status reports between receiving a mode and reporting it.
    pub mode_latency_reports: u32,
    /// Seed for the noise generator.
    pub seed: u64,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            contact_angle: [1.2, 1.3, 1.1],
            sensor_period_ms: 10,
            status_period_ms: 20,
            position_noise: 0.0,
            mode_latency_reports: 1,
            seed: 7,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerCfg,
    #[serde(default)]
    pub safety: Safety,
    #[serde(default)]
    pub sim: SimCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        let c = &self.controller;
        if c.feedback_period_ms == 0 {
            eyre::bail!("controller.feedback_period_ms must be >= 1");
        }
        if !(c.static_pos_threshold.is_finite() && c.static_pos_threshold > 0.0) {
            eyre::bail!("controller.static_pos_threshold must be > 0");
        }
        if !(c.static_vel_threshold.is_finite() && c.static_vel_threshold > 0.0) {
            eyre::bail!("controller.static_vel_threshold must be > 0");
        }
        if !(0.0..1.0).contains(&c.vel_filter_coeff) {
            eyre::bail!("controller.vel_filter_coeff must be in [0.0, 1.0)");
        }
        if !(0.0..1.0).contains(&c.pos_filter_coeff) {
            eyre::bail!("controller.pos_filter_coeff must be in [0.0, 1.0)");
        }
        if c.min_static_duration_ms == 0 {
            eyre::bail!("controller.min_static_duration_ms must be >= 1");
        }
        if c.min_static_duration_ms > 60 * 1000 {
            eyre::bail!("controller.min_static_duration_ms is unreasonably large (>1min)");
        }
        if c.clock_skew_tolerance_ms > 1000 {
            eyre::bail!("controller.clock_skew_tolerance_ms must be <= 1000");
        }

        if self.safety.max_attempt_ms > 24 * 60 * 60 * 1000 {
            eyre::bail!("safety.max_attempt_ms is unreasonably large (>24h)");
        }

        let s = &self.sim;
        if s.sensor_period_ms == 0 {
            eyre::bail!("sim.sensor_period_ms must be >= 1");
        }
        if s.status_period_ms == 0 {
            eyre::bail!("sim.status_period_ms must be >= 1");
        }
        if s.contact_angle
            .iter()
            .any(|a| !a.is_finite() || *a <= 0.0 || *a > std::f64::consts::PI)
        {
            eyre::bail!("sim.contact_angle entries must be in (0, pi]");
        }
        if !(s.position_noise.is_finite() && s.position_noise >= 0.0) {
            eyre::bail!("sim.position_noise must be >= 0");
        }

        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

/// One recorded joint-state sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceRow {
    /// Seconds since the start of the recording.
    pub t: f64,
    pub position: [f64; TRACE_JOINTS],
    pub velocity: [f64; TRACE_JOINTS],
}

fn trace_headers() -> Vec<String> {
    let mut h = vec!["t".to_string()];
    h.extend((0..TRACE_JOINTS).map(|i| format!("p{i}")));
    h.extend((0..TRACE_JOINTS).map(|i| format!("v{i}")));
    h
}

/// Parse a joint trace from any reader. Headers must be exactly
/// `t,p0..p7,v0..v7` and timestamps strictly increasing.
pub fn read_joint_trace<R: std::io::Read>(rdr: R) -> eyre::Result<Vec<TraceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read trace CSV headers: {}", e))?
        .clone();
    let expected = trace_headers();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "joint trace CSV must have headers '{}', got: {}",
            expected.join(","),
            actual.join(",")
        );
    }

    let mut rows: Vec<TraceRow> = Vec::new();
    for (idx, rec) in rdr.records().enumerate() {
        let line = idx + 2;
        let rec = rec.map_err(|e| eyre::eyre!("invalid trace row {}: {}", line, e))?;
        if rec.len() != 1 + 2 * TRACE_JOINTS {
            eyre::bail!("trace row {} has {} columns", line, rec.len());
        }
        let values = rec
            .iter()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|e| eyre::eyre!("invalid trace row {}: {}", line, e))?;
        if values.iter().any(|v| !v.is_finite()) {
            eyre::bail!("trace row {} contains a non-finite value", line);
        }
        let mut row = TraceRow {
            t: values[0],
            position: [0.0; TRACE_JOINTS],
            velocity: [0.0; TRACE_JOINTS],
        };
        row.position.copy_from_slice(&values[1..=TRACE_JOINTS]);
        row.velocity.copy_from_slice(&values[1 + TRACE_JOINTS..]);
        if let Some(prev) = rows.last()
            && row.t <= prev.t
        {
            eyre::bail!(
                "trace timestamps must be strictly increasing (row {}: {} after {})",
                line,
                row.t,
                prev.t
            );
        }
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_joint_trace_csv(path: &std::path::Path) -> eyre::Result<Vec<TraceRow>> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open joint trace CSV {:?}: {}", path, e))?;
    read_joint_trace(file)
}
