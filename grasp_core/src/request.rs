//! Grasp requests.

use crate::error::GraspError;
use crate::joint::Finger;

/// Immutable description of one grasp attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct GraspRequest {
    mask: [bool; 3],
    speed: [f64; 3],
    effort: [f64; 3],
}

impl GraspRequest {
    /// Build a request. At least one finger must be selected and every value
    /// of a selected finger must be finite; values of unused fingers are kept
    /// but never sent.
    pub fn new(mask: [bool; 3], speed: [f64; 3], effort: [f64; 3]) -> Result<Self, GraspError> {
        if !mask.iter().any(|m| *m) {
            return Err(GraspError::InvalidRequest("no fingers selected".into()));
        }
        for f in Finger::ALL {
            let i = f.index();
            if !mask[i] {
                continue;
            }
            if !speed[i].is_finite() {
                return Err(GraspError::InvalidRequest(format!(
                    "finger {} speed is not finite",
                    f.number()
                )));
            }
            if !effort[i].is_finite() {
                return Err(GraspError::InvalidRequest(format!(
                    "finger {} effort is not finite",
                    f.number()
                )));
            }
        }
        Ok(Self {
            mask,
            speed,
            effort,
        })
    }

    /// Same speed and effort on every selected finger.
    pub fn uniform(mask: [bool; 3], speed: f64, effort: f64) -> Result<Self, GraspError> {
        Self::new(mask, [speed; 3], [effort; 3])
    }

    #[inline]
    pub fn uses(&self, finger: Finger) -> bool {
        self.mask[finger.index()]
    }

    pub fn mask(&self) -> &[bool; 3] {
        &self.mask
    }

    pub fn speed(&self, finger: Finger) -> f64 {
        self.speed[finger.index()]
    }

    pub fn effort(&self, finger: Finger) -> f64 {
        self.effort[finger.index()]
    }

    /// Selected fingers in order.
    pub fn fingers(&self) -> impl Iterator<Item = Finger> + '_ {
        Finger::ALL.into_iter().filter(|f| self.uses(*f))
    }
}
