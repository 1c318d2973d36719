//! `nord-runtime` – host side of the IMU pipeline.
//!
//! # Modules
//!
//! - [`imu_node`] – [`ImuNode`][imu_node::ImuNode]: takes samples from its
//!   bounded [`SampleIntake`][nord_middleware::SampleIntake], runs the
//!   [`ImuProcessor`][nord_perception::ImuProcessor] once per sample and
//!   publishes `/imu/calc_data` and `/imu/bump` on the
//!   [`EventBus`][nord_middleware::EventBus].
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace export.

pub mod imu_node;
pub mod telemetry;

pub use imu_node::{ImuNode, ImuNodeConfig, NodeOutput, NodeStats};
pub use telemetry::{TracerProviderGuard, init_tracing};
