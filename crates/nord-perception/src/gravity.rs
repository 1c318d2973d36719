//! Gravity compensation.
//!
//! The world "down" axis is rotated into the robot frame using the third row
//! of the rotation matrix derived from the orientation quaternion:
//!
//! ```text
//! g.right   = 2(xz − wy)
//! g.forward = 2(wx + yz)
//! g.up      = w² − x² − y² + z²
//! ```
//!
//! The unit vector is scaled by standard gravity and subtracted from the raw
//! accelerometer reading, leaving only motion-induced acceleration. A
//! non-unit quaternion yields a gravity vector whose magnitude deviates
//! from 1; compensation degrades but does not fail.

use nord_types::{Quaternion, Vector3};

/// Standard gravity (m/s²).
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Unit gravity direction expressed in the robot frame.
pub fn gravity_vector(q: &Quaternion) -> Vector3 {
    Vector3 {
        right: 2.0 * (q.x * q.z - q.w * q.y),
        forward: 2.0 * (q.w * q.x + q.y * q.z),
        up: q.w * q.w - q.x * q.x - q.y * q.y + q.z * q.z,
    }
}

/// Subtract `gravity_g` times the gravity direction from `raw`.
pub fn compensate(q: &Quaternion, raw: &Vector3, gravity_g: f64) -> Vector3 {
    let g = gravity_vector(q);
    Vector3 {
        right: raw.right - g.right * gravity_g,
        forward: raw.forward - g.forward * gravity_g,
        up: raw.up - g.up * gravity_g,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_1_SQRT_2;

    #[test]
    fn identity_points_gravity_straight_up_the_normal() {
        let g = gravity_vector(&Quaternion::identity());
        assert_eq!(g, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn identity_only_touches_up_axis() {
        let raw = Vector3::new(0.4, -1.2, 10.0);
        let c = compensate(&Quaternion::identity(), &raw, STANDARD_GRAVITY);
        assert!((c.right - 0.4).abs() < 1e-12);
        assert!((c.forward + 1.2).abs() < 1e-12);
        assert!((c.up - (10.0 - 9.81)).abs() < 1e-12);
    }

    #[test]
    fn yaw_does_not_change_gravity() {
        // 90° about the vertical axis.
        let q = Quaternion::new(FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2);
        let g = gravity_vector(&q);
        assert!(g.right.abs() < 1e-12);
        assert!(g.forward.abs() < 1e-12);
        assert!((g.up - 1.0).abs() < 1e-12);
    }

    #[test]
    fn roll_about_forward_axis_moves_gravity_to_right() {
        // 90° about the forward (y) axis.
        let q = Quaternion::new(FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2, 0.0);
        let g = gravity_vector(&q);
        assert!((g.right + 1.0).abs() < 1e-12, "right={}", g.right);
        assert!(g.forward.abs() < 1e-12);
        assert!(g.up.abs() < 1e-12, "up={}", g.up);

        // A stationary robot lying on its side reads −g on the right axis.
        let raw = Vector3::new(-9.81, 0.0, 0.0);
        let c = compensate(&q, &raw, STANDARD_GRAVITY);
        assert!(c.right.abs() < 1e-9);
        assert!(c.forward.abs() < 1e-9);
        assert!(c.up.abs() < 1e-9);
    }

    #[test]
    fn pitch_about_right_axis_moves_gravity_to_forward() {
        // 90° about the right (x) axis.
        let q = Quaternion::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0, 0.0);
        let g = gravity_vector(&q);
        assert!(g.right.abs() < 1e-12);
        assert!((g.forward - 1.0).abs() < 1e-12);
        assert!(g.up.abs() < 1e-12);
    }

    #[test]
    fn non_unit_quaternion_scales_gravity() {
        // |q| = 2 → |g| = 4; accepted, not rejected.
        let q = Quaternion::new(2.0, 0.0, 0.0, 0.0);
        let g = gravity_vector(&q);
        assert!((g.up - 4.0).abs() < 1e-12);
    }

    #[test]
    fn custom_gravity_scale_is_applied() {
        let raw = Vector3::new(0.0, 0.0, 9.80665);
        let c = compensate(&Quaternion::identity(), &raw, 9.80665);
        assert!(c.up.abs() < 1e-12);
    }
}
