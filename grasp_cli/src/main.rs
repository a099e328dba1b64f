mod cli;
mod error_fmt;
mod grasp;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::grasp::{GraspOpts, run_grasp, run_replay, self_check};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error handler: {e}");
    }

    if let Err(err) = run(cli) {
        let json = JSON_MODE.get().copied().unwrap_or(false);
        if json {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn load_config(path: &Path) -> Result<grasp_config::Config> {
    let cfg = if path.exists() {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("read config {}", path.display()))?;
        grasp_config::load_toml(&text).wrap_err("parse config TOML")?
    } else {
        grasp_config::Config::default()
    };
    cfg.validate()?;
    Ok(cfg)
}

fn init_logging(cli: &Cli, logging: &grasp_config::Logging) -> Result<()> {
    let level = cli
        .log_level
        .clone()
        .or_else(|| logging.level.clone())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .wrap_err_with(|| format!("invalid log level '{level}'"))?;

    let console = if cli.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().compact().with_writer(std::io::stderr).boxed()
    };

    let file = match logging.file.as_deref() {
        Some(path) => {
            let path = PathBuf::from(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file '{}' has no file name", path.display()))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(&dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(&dir, name),
                _ => tracing_appender::rolling::never(&dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer).boxed())
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| eyre::eyre!("init logging: {e}"))
}

fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?;
    init_logging(&cli, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match &cli.cmd {
        Commands::Grasp {
            fingers,
            speed,
            effort,
            cancel_after_ms,
            max_attempt_ms,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
                tracing::warn!(error = %e, "failed to install Ctrl-C handler; continuing without it");
            }
            let opts = GraspOpts {
                fingers: fingers.clone(),
                speed: *speed,
                effort: *effort,
                cancel_after: cancel_after_ms.map(Duration::from_millis),
                max_attempt_ms: *max_attempt_ms,
                json: cli.json,
            };
            let summary = run_grasp(&cfg, &opts, shutdown)?;
            summary.outcome.clone().into_result()?;
            if cli.json {
                let line = serde_json::json!({
                    "type": "result",
                    "outcome": summary.outcome.name(),
                    "elapsed_ms": summary.elapsed.as_millis() as u64,
                    "radii": summary.radii,
                    "feedback": summary.feedback_count,
                });
                println!("{line}");
            } else {
                println!(
                    "grasp succeeded in {} ms; radii (m): {:.4} {:.4} {:.4}",
                    summary.elapsed.as_millis(),
                    summary.radii[0],
                    summary.radii[1],
                    summary.radii[2]
                );
            }
        }
        Commands::Replay { trace, fingers } => {
            let s = run_replay(&cfg, trace, fingers)?;
            if cli.json {
                let line = serde_json::json!({
                    "type": "replay",
                    "rows": s.rows,
                    "duration_s": s.duration_s,
                    "settled_at": s.settled_at,
                    "all_settled_at": s.all_settled_at,
                    "done_moving": s.final_done,
                    "radii": s.radii,
                });
                println!("{line}");
            } else {
                println!("replayed {} rows over {:.3} s", s.rows, s.duration_s);
                match s.all_settled_at {
                    Some(t) => println!("selected fingers settled at {t:.3} s"),
                    None => println!("selected fingers never settled"),
                }
                for j in grasp_core::JointId::ALL {
                    let at = s.settled_at[j.index()]
                        .map_or_else(|| "-".to_string(), |t| format!("{t:.3} s"));
                    println!("  {:<9} settled {:<10} done {}", j.name(), at, s.final_done[j.index()]);
                }
                println!(
                    "final radii (m): {:.4} {:.4} {:.4}",
                    s.radii[0], s.radii[1], s.radii[2]
                );
            }
        }
        Commands::Radius { q1, q2 } => {
            let c = grasp_core::inscribed_circle(*q1, *q2);
            if cli.json {
                println!("{}", serde_json::json!({ "x": c.x, "y": c.y, "r": c.r }));
            } else {
                println!("x={:.6} y={:.6} r={:.6}", c.x, c.y, c.r);
            }
        }
        Commands::SelfCheck => {
            self_check(&cfg)?;
            println!("OK");
        }
    }
    Ok(())
}
