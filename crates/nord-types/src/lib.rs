use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Fused orientation of the sensor relative to the world frame (w, x, y, z
/// convention).
///
/// Assumed unit-norm by the upstream fusion stage; nothing here enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (robot level, facing the world reference
    /// direction).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Euclidean norm |q|.
    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// A robot-frame vector.
///
/// On the wire the axes keep the IMU's `x`/`y`/`z` names; in code they are
/// named after the robot body: `right` is lateral, `forward` is the direction
/// the front of the robot travels, `up` is the PCB normal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    #[serde(rename = "x")]
    pub right: f64,
    #[serde(rename = "y")]
    pub forward: f64,
    #[serde(rename = "z")]
    pub up: f64,
}

impl Vector3 {
    pub fn new(right: f64, forward: f64, up: f64) -> Self {
        Self { right, forward, up }
    }
}

/// Gyroscope rates (rad/s).
///
/// `x` is pitch, `y` is slope (rotation around the cord axis), `z` is
/// rotation around the PCB normal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AngularVelocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One raw IMU reading as delivered on `/imu/data`.
///
/// Field names follow `sensor_msgs/Imu`; covariances and the header are
/// ignored when decoding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImuSample {
    pub orientation: Quaternion,
    #[serde(default)]
    pub angular_velocity: AngularVelocity,
    pub linear_acceleration: Vector3,
}

/// Heading plus gravity-compensated acceleration, published on
/// `/imu/calc_data` once per processed sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculatedSample {
    /// Heading in radians, principal value of `atan2`.
    pub direction: f64,
    pub acc_forward: f64,
    pub acc_right: f64,
    pub acc_up: f64,
}

/// An abrupt change in compensated acceleration between two consecutive
/// samples, published on `/imu/bump`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BumpEvent {
    /// Delta forward acceleration (m/s²).
    pub x: f64,
    /// Delta up acceleration (m/s²).
    pub y: f64,
    /// Delta lateral acceleration, present only when the detector folds the
    /// lateral axis into its magnitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lateral: Option<f64>,
}

/// Unified event wrapper for the in-process event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "nord-middleware::bridge/imu/data"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Wrap `payload` with a fresh id and the current time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data routed over the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    Imu(ImuSample),
    Calculated(CalculatedSample),
    Bump(BumpEvent),
    SensorFault { component: String, message: String },
}

/// Error type spanning frame decoding, sample validation, transport and
/// configuration failures.
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum NordError {
    #[error("Invalid IMU sample: {0}")]
    InvalidSample(String),

    #[error("Frame Parsing Error: {0}")]
    Parsing(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}
