//! Human-readable error descriptions, exit codes and structured JSON errors.

use grasp_core::{AbortReason, AttemptFailed, GraspError};

use crate::cli::LAST_MAX_ATTEMPT_MS;

pub fn abort_reason_name(r: &AbortReason) -> &'static str {
    match r {
        AbortReason::ClockSkew { .. } => "ClockSkew",
        AbortReason::PeerPreempted => "PeerPreempted",
        AbortReason::Requested(_) => "Requested",
        AbortReason::MaxRuntime => "MaxRuntime",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(failed) = err.downcast_ref::<AttemptFailed>() {
        return match failed {
            AttemptFailed::Preempted => "What happened: The grasp was cancelled and the fingers were idled.\nLikely causes: Ctrl-C or --cancel-after-ms.\nHow to fix: Nothing to fix; start a new grasp.".to_string(),
            AttemptFailed::Aborted(reason) => match reason {
                AbortReason::ClockSkew { ahead } => format!(
                    "What happened: A joint sample was stamped {:.3} s in the future.\nLikely causes: Sensor and controller clocks disagree.\nHow to fix: Synchronize the clocks or raise controller.clock_skew_tolerance_ms.",
                    ahead.as_secs_f64()
                ),
                AbortReason::PeerPreempted => "What happened: Another controller took over the hand.\nLikely causes: A second grasp request on a sibling controller.\nHow to fix: Serialize requests to controllers sharing a hand.".to_string(),
                AbortReason::Requested(msg) => format!(
                    "What happened: The grasp was aborted on request ({msg}).\nLikely causes: Operator or supervisor abort.\nHow to fix: Start a new grasp once the cause is cleared."
                ),
                AbortReason::MaxRuntime => "What happened: The grasp did not settle within the max attempt time; fingers were idled.\nLikely causes: Approach speed too low, or joints never stop moving (noise above static_pos_threshold).\nHow to fix: Increase safety.max_attempt_ms or --speed, or raise controller.static_pos_threshold.".to_string(),
            },
        };
    }

    if let Some(ge) = err.downcast_ref::<GraspError>() {
        return match ge {
            GraspError::InvalidRequest(msg) => format!(
                "What happened: Invalid grasp request ({msg}).\nLikely causes: Bad --fingers, --speed or --effort.\nHow to fix: Select fingers from 1,2,3 and pass finite values."
            ),
            GraspError::Disconnected => "What happened: The control loop stopped unexpectedly.\nLikely causes: The event loop thread exited early.\nHow to fix: Re-run with --log-level=debug for details.".to_string(),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("joint trace csv must have headers") {
        return "Invalid headers in joint trace CSV. Expected 't,p0,...,p7,v0,...,v7'.".to_string();
    }

    if lower.contains("controller.") || lower.contains("sim.") || lower.contains("safety.") {
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per outcome; any other error returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<AttemptFailed>() {
        Some(AttemptFailed::Preempted) => 2,
        Some(AttemptFailed::Aborted(reason)) => match reason {
            AbortReason::PeerPreempted => 3,
            AbortReason::ClockSkew { .. } => 4,
            AbortReason::MaxRuntime => 5,
            AbortReason::Requested(_) => 6,
        },
        None => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let msg = humanize(err);
    match err.downcast_ref::<AttemptFailed>() {
        Some(AttemptFailed::Preempted) => json!({ "reason": "Preempted", "message": msg }).to_string(),
        Some(AttemptFailed::Aborted(reason)) => {
            let details = match reason {
                AbortReason::MaxRuntime => LAST_MAX_ATTEMPT_MS
                    .get()
                    .map(|ms| json!({ "max_attempt_ms": ms })),
                AbortReason::ClockSkew { ahead } => Some(json!({ "ahead_s": ahead.as_secs_f64() })),
                AbortReason::Requested(m) => Some(json!({ "request": m })),
                AbortReason::PeerPreempted => None,
            };
            let name = abort_reason_name(reason);
            match details {
                Some(d) => json!({ "reason": name, "details": d, "message": msg }),
                None => json!({ "reason": name, "message": msg }),
            }
            .to_string()
        }
        None => json!({ "reason": "Error", "message": msg }).to_string(),
    }
}
