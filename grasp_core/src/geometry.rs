//! Inscribed-circle diagnostic for a single finger.
//!
//! Models the proximal and distal links as two rays and computes the circle
//! tangent to both, i.e. the largest round object the finger wraps around in
//! its current configuration. Telemetry only; control never reads it.
//!
//! Near configurations where the denominator vanishes the result diverges.
//! That is expected and is not treated as an error.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Length of the proximal link (m).
pub const LINK_LENGTH_M: f64 = 0.07;

/// Sign coefficients `(t1, t2, t3)` selecting the branch of the closed form.
///
/// `t1` flips once the proximal link passes vertical, `t2` once the distal
/// link does. `t3` is always 1. Both comparisons are strict.
#[inline]
pub fn sign_coefficients(th1: f64, th2: f64) -> (f64, f64, f64) {
    let t1 = if th1 > FRAC_PI_2 { -1.0 } else { 1.0 };
    let t2 = if th1 + th2 > FRAC_PI_2 { -1.0 } else { 1.0 };
    (t1, t2, 1.0)
}

/// Centre and radius of the inscribed circle, in the finger base frame (m).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InscribedCircle {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

/// Solve the inscribed circle from the inner joint angle `q1` and the outer
/// joint angle `q2` (rad). The distal link sits at a fixed 45 degree offset.
pub fn inscribed_circle(q1: f64, q2: f64) -> InscribedCircle {
    let th1 = q1;
    let th2 = FRAC_PI_4 + q2;
    let (t1, t2, t3) = sign_coefficients(th1, th2);

    let tan1 = th1.tan();
    let tan12 = (th1 + th2).tan();
    let sec1 = (1.0 + tan1 * tan1).sqrt();
    let sec12 = (1.0 + tan12 * tan12).sqrt();

    let den = (-t3 + t1 * sec1) * tan12 + tan1 * (t3 - t2 * sec12);
    let chord = LINK_LENGTH_M * tan1 - LINK_LENGTH_M * tan12;

    InscribedCircle {
        x: LINK_LENGTH_M * (t3 - t1 * sec1) * (th1.sin() - th1.cos() * tan12) / den,
        y: t3 * th1.sin() * chord / den,
        r: th1.sin() * chord / den,
    }
}

/// Contact radius (m) of one finger.
#[inline]
pub fn radius(q1: f64, q2: f64) -> f64 {
    inscribed_circle(q1, q2).r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficients_flip_strictly_past_vertical() {
        assert_eq!(sign_coefficients(FRAC_PI_2, 0.0).0, 1.0);
        assert_eq!(sign_coefficients(FRAC_PI_2 + 1e-9, 0.0).0, -1.0);
        // th1 + th2 exactly at pi/2 keeps t2 positive
        assert_eq!(sign_coefficients(0.5, FRAC_PI_2 - 0.5).1, 1.0);
        assert_eq!(sign_coefficients(0.5, FRAC_PI_2 - 0.5 + 1e-9).1, -1.0);
        assert_eq!(sign_coefficients(3.0, 3.0).2, 1.0);
    }

    #[test]
    fn radius_matches_reference_configuration() {
        // q1 = 0.3, q2 = 0.2 -> th1 = 0.3, th1 + th2 = 0.3 + pi/4 + 0.2
        let th1: f64 = 0.3;
        let th12 = th1 + FRAC_PI_4 + 0.2;
        let sec1 = (1.0 + th1.tan().powi(2)).sqrt();
        let sec12 = (1.0 + th12.tan().powi(2)).sqrt();
        let den = (-1.0 + sec1) * th12.tan() + th1.tan() * (1.0 - sec12);
        let expected = th1.sin() * (0.07 * th1.tan() - 0.07 * th12.tan()) / den;
        assert!((radius(0.3, 0.2) - expected).abs() < 1e-12);
    }

    #[test]
    fn radius_and_y_agree_when_t3_is_one() {
        let c = inscribed_circle(0.8, 0.4);
        assert!((c.r - c.y).abs() < 1e-12);
        assert!(c.r.is_finite());
    }
}
