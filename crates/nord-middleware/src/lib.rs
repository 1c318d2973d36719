//! `nord-middleware` – transport plumbing around the IMU pipeline.
//!
//! Routes samples and results between the sensor source, the processing
//! node and downstream consumers without caring about their meaning.
//!
//! # Modules
//!
//! - [`bus`] – Topic-based publish/subscribe event bus built on Tokio
//!   broadcast channels, one lane per ROS-style topic. Lossy for slow
//!   subscribers; used for fan-out to observers.
//! - [`intake`] – bounded single-producer queue feeding samples into one
//!   node, with back-pressure.
//! - [`imu_bridge`] – rosbridge-style JSON framing for inbound
//!   `/imu/data` samples and outbound `/imu/calc_data` / `/imu/bump`
//!   records, plus an optional read-only WebSocket endpoint.

pub mod bus;
pub mod imu_bridge;
pub mod intake;

pub use bus::{EventBus, Topic, TopicReceiver};
pub use imu_bridge::ImuBridge;
pub use intake::{DEFAULT_INTAKE_CAPACITY, SampleInbox, SampleIntake, sample_channel};
