//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();
/// Effective attempt cap of the current run (for JSON details).
pub static LAST_MAX_ATTEMPT_MS: OnceLock<u64> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "grasp", version, about = "Two-phase grasp controller CLI")]
pub struct Cli {
    /// Path to config TOML; built-in defaults are used when the file is absent
    #[arg(long, value_name = "FILE", default_value = "etc/grasp_config.toml")]
    pub config: PathBuf,

    /// Log as JSON lines and print results as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides logging.level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one grasp against the simulated hand
    Grasp {
        /// Fingers to close, as a comma separated list of 1, 2, 3
        #[arg(long, value_delimiter = ',', default_value = "1,2,3")]
        fingers: Vec<u8>,
        /// Approach speed (rad/s) for every selected finger
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// Holding effort for every selected finger
        #[arg(long, default_value_t = 0.5)]
        effort: f64,
        /// Cancel the grasp (idling the fingers) after this many ms
        #[arg(long, value_name = "MS")]
        cancel_after_ms: Option<u64>,
        /// Override safety.max_attempt_ms
        #[arg(long, value_name = "MS")]
        max_attempt_ms: Option<u64>,
    },
    /// Run the motion filter over a recorded joint trace
    Replay {
        /// Joint trace CSV (strict header t,p0..p7,v0..v7)
        #[arg(long, value_name = "FILE")]
        trace: PathBuf,
        /// Fingers whose joints must settle
        #[arg(long, value_delimiter = ',', default_value = "1,2,3")]
        fingers: Vec<u8>,
    },
    /// Print the inscribed circle of one finger
    Radius {
        /// Inner joint angle (rad)
        #[arg(long, allow_negative_numbers = true)]
        q1: f64,
        /// Outer joint angle (rad)
        #[arg(long, allow_negative_numbers = true)]
        q2: f64,
    },
    /// Quick health check (config valid, simulated hand responds)
    SelfCheck,
}
