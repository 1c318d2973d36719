//! Optional input checks.
//!
//! The pipeline itself never rejects a sample. Hosts that would rather drop
//! a malformed reading than publish NaNs call [`validate_sample`] first.

use nord_types::{ImuSample, NordError};

/// Limits applied by [`validate_sample`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationConfig {
    /// Accepted deviation of |q| from 1.
    pub unit_norm_tolerance: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            unit_norm_tolerance: 1e-2,
        }
    }
}

/// Reject samples with non-finite components or a non-unit orientation.
pub fn validate_sample(sample: &ImuSample, config: &ValidationConfig) -> Result<(), NordError> {
    let q = &sample.orientation;
    let a = &sample.linear_acceleration;
    let w = &sample.angular_velocity;

    let fields = [
        ("orientation.w", q.w),
        ("orientation.x", q.x),
        ("orientation.y", q.y),
        ("orientation.z", q.z),
        ("angular_velocity.x", w.x),
        ("angular_velocity.y", w.y),
        ("angular_velocity.z", w.z),
        ("linear_acceleration.x", a.right),
        ("linear_acceleration.y", a.forward),
        ("linear_acceleration.z", a.up),
    ];
    if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
        return Err(NordError::InvalidSample(format!("{name} is not finite ({value})")));
    }

    let norm = q.norm();
    if (norm - 1.0).abs() > config.unit_norm_tolerance {
        return Err(NordError::InvalidSample(format!(
            "orientation norm {norm:.4} outside 1 ± {}",
            config.unit_norm_tolerance
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nord_types::{AngularVelocity, Quaternion, Vector3};

    fn sample(q: Quaternion, acc: Vector3) -> ImuSample {
        ImuSample {
            orientation: q,
            angular_velocity: AngularVelocity::default(),
            linear_acceleration: acc,
        }
    }

    #[test]
    fn well_formed_sample_passes() {
        let s = sample(Quaternion::identity(), Vector3::new(0.0, 0.0, 9.81));
        assert!(validate_sample(&s, &ValidationConfig::default()).is_ok());
    }

    #[test]
    fn nan_acceleration_rejected() {
        let s = sample(Quaternion::identity(), Vector3::new(0.0, f64::NAN, 9.81));
        let err = validate_sample(&s, &ValidationConfig::default()).unwrap_err();
        assert!(err.to_string().contains("linear_acceleration.y"));
    }

    #[test]
    fn infinite_angular_velocity_rejected() {
        let mut s = sample(Quaternion::identity(), Vector3::default());
        s.angular_velocity.z = f64::INFINITY;
        assert!(validate_sample(&s, &ValidationConfig::default()).is_err());
    }

    #[test]
    fn non_unit_quaternion_rejected() {
        let s = sample(Quaternion::new(1.0, 0.5, 0.0, 0.0), Vector3::default());
        let err = validate_sample(&s, &ValidationConfig::default()).unwrap_err();
        assert!(matches!(err, NordError::InvalidSample(_)));
        assert!(err.to_string().contains("norm"));
    }

    #[test]
    fn tolerance_is_configurable() {
        let s = sample(Quaternion::new(1.05, 0.0, 0.0, 0.0), Vector3::default());
        assert!(validate_sample(&s, &ValidationConfig::default()).is_err());
        let loose = ValidationConfig {
            unit_norm_tolerance: 0.1,
        };
        assert!(validate_sample(&s, &loose).is_ok());
    }
}
