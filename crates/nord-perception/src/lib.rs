//! `nord-perception` – the per-sample IMU transform.
//!
//! Turns one fused orientation + raw acceleration reading into a robot-frame
//! heading and gravity-compensated acceleration, and flags abrupt
//! acceleration jumps as bump events.
//!
//! # Modules
//!
//! - [`gravity`] – gravity direction from the orientation quaternion and its
//!   subtraction from raw acceleration.
//! - [`heading`] – yaw extraction.
//! - [`bump`] – [`BumpHistory`][bump::BumpHistory]: the only state carried
//!   between samples, and the delta-acceleration comparator that uses it.
//! - [`pipeline`] – [`process`][pipeline::process] composes the stages in
//!   fixed order; [`ImuProcessor`][pipeline::ImuProcessor] owns one sensor
//!   stream's state for hosts that prefer a single handle.
//! - [`validation`] – optional NaN/Inf and unit-norm checks for hosts that
//!   want to reject malformed samples before they reach the pipeline.
//!
//! Everything here is synchronous, allocation-free and never fails. Inputs
//! are not sanitised: NaN in, NaN out.
//!
//! # Example
//!
//! ```rust
//! use nord_perception::{ImuProcessor, ProcessorConfig};
//! use nord_types::{ImuSample, Quaternion, Vector3, AngularVelocity};
//!
//! let mut processor = ImuProcessor::new(ProcessorConfig::default());
//! let sample = ImuSample {
//!     orientation: Quaternion::identity(),
//!     angular_velocity: AngularVelocity::default(),
//!     linear_acceleration: Vector3::new(0.0, 0.0, 9.81),
//! };
//!
//! let (out, bump) = processor.process(&sample);
//! assert!(out.direction.abs() < 1e-12);
//! assert!(out.acc_up.abs() < 1e-12);
//! assert!(bump.is_none());
//! ```

pub mod bump;
pub mod gravity;
pub mod heading;
pub mod pipeline;
pub mod validation;

pub use bump::{BumpAxes, BumpHistory, DEFAULT_BUMP_THRESHOLD};
pub use gravity::STANDARD_GRAVITY;
pub use pipeline::{ImuProcessor, ProcessorConfig, process};
pub use validation::{ValidationConfig, validate_sample};
