//! Per-sample pipeline.
//!
//! Stages run in fixed order: gravity compensation → heading → bump
//! detection → output assembly. [`process`] is the whole transform; the
//! caller owns the [`BumpHistory`] and passes it in.
//!
//! [`ImuProcessor`] bundles a config, a history and the last angular
//! velocity for hosts that drive one sensor stream from one place.

use nord_types::{AngularVelocity, BumpEvent, CalculatedSample, ImuSample};

use crate::bump::{BumpAxes, BumpHistory, DEFAULT_BUMP_THRESHOLD};
use crate::gravity::{STANDARD_GRAVITY, compensate};
use crate::heading::heading;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Tunables for the transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorConfig {
    /// Scale applied to the gravity unit vector (m/s²).
    pub gravity_g: f64,
    /// Jump magnitude above which a bump fires (m/s²).
    pub bump_threshold: f64,
    /// Axes contributing to the jump magnitude.
    pub bump_axes: BumpAxes,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            gravity_g: STANDARD_GRAVITY,
            bump_threshold: DEFAULT_BUMP_THRESHOLD,
            bump_axes: BumpAxes::ForwardUp,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stateless transform
// ────────────────────────────────────────────────────────────────────────────

/// Transform one sample.
///
/// Always returns exactly one [`CalculatedSample`]; returns a [`BumpEvent`]
/// only when the compensated acceleration jumped past the threshold since
/// the previous call with the same `history`. `history` is updated on every
/// call.
pub fn process(
    config: &ProcessorConfig,
    history: &mut BumpHistory,
    sample: &ImuSample,
) -> (CalculatedSample, Option<BumpEvent>) {
    let q = &sample.orientation;
    let acc = compensate(q, &sample.linear_acceleration, config.gravity_g);
    let direction = heading(q);
    let bump = history.detect(&acc, config.bump_threshold, config.bump_axes);

    let out = CalculatedSample {
        direction,
        acc_forward: acc.forward,
        acc_right: acc.right,
        acc_up: acc.up,
    };
    (out, bump)
}

// ────────────────────────────────────────────────────────────────────────────
// ImuProcessor
// ────────────────────────────────────────────────────────────────────────────

/// Owns the cross-sample state of one sensor stream.
///
/// Not meant to be shared between streams or driven from several threads at
/// once; create one per physical IMU.
#[derive(Debug, Clone)]
pub struct ImuProcessor {
    config: ProcessorConfig,
    history: BumpHistory,
    last_angular_velocity: AngularVelocity,
}

impl ImuProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            config,
            history: BumpHistory::new(),
            last_angular_velocity: AngularVelocity::default(),
        }
    }

    /// Run [`process`] against this stream's history.
    pub fn process(&mut self, sample: &ImuSample) -> (CalculatedSample, Option<BumpEvent>) {
        self.last_angular_velocity = sample.angular_velocity;
        process(&self.config, &mut self.history, sample)
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// The compensated reading the next sample will be compared against.
    pub fn history(&self) -> &BumpHistory {
        &self.history
    }

    /// Gyro rates of the most recent sample. Not part of any output.
    pub fn last_angular_velocity(&self) -> AngularVelocity {
        self.last_angular_velocity
    }

    /// Forget all carried state, as if freshly constructed.
    pub fn reset(&mut self) {
        self.history = BumpHistory::new();
        self.last_angular_velocity = AngularVelocity::default();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
