//! Maps `Box<dyn Error>` from trait boundaries to typed `GraspError`.
//!
//! With the `hardware-errors` feature, errors raised by `grasp_hardware` are
//! recognised by type; anything else falls back to its message.

use crate::error::GraspError;

/// Map a trait-boundary error to a typed `GraspError`.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> GraspError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<grasp_hardware::HwError>() {
            return GraspError::Hardware(hw.to_string());
        }
    }

    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("closed") || lower.contains("disconnected") {
        GraspError::Disconnected
    } else {
        GraspError::Hardware(s)
    }
}
