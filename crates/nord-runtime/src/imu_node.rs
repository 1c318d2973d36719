//! [`ImuNode`] – the per-sample driver.
//!
//! Each sample taken from the node's [`SampleInbox`] goes through:
//!
//! 1. **Validate** (optional) – malformed samples are reported on
//!    `/system/alerts` and skipped; the node keeps running.
//! 2. **Process** – [`ImuProcessor::process`] computes the heading,
//!    compensated acceleration and bump decision.
//! 3. **Publish** – exactly one [`CalculatedSample`] on `/imu/calc_data`,
//!    plus a [`BumpEvent`] on `/imu/bump` when one fired. When an output
//!    channel is attached, the same pair is also sent there as one
//!    [`NodeOutput`], so an ordered consumer sees each bump right after the
//!    sample that produced it.
//!
//! Samples are handled strictly in arrival order by a single task, so the
//! bump history is never touched concurrently. The intake has exactly one
//! producer: one node serves one sensor stream.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use nord_middleware::{EventBus, Topic};
//! use nord_runtime::{ImuNode, ImuNodeConfig};
//! use nord_types::{AngularVelocity, ImuSample, Quaternion, Vector3};
//!
//! let bus = Arc::new(EventBus::default());
//! let mut calc = bus.subscribe_to(Topic::CalcData);
//! let (mut node, _intake) = ImuNode::new(ImuNodeConfig::default(), Arc::clone(&bus));
//!
//! let sample = ImuSample {
//!     orientation: Quaternion::identity(),
//!     angular_velocity: AngularVelocity::default(),
//!     linear_acceleration: Vector3::new(0.0, 0.0, 9.81),
//! };
//! let out = node.handle_sample(&sample).unwrap();
//! assert_eq!(out.seq, 0);
//! assert!(out.bump.is_none());
//! assert!(calc.try_recv().is_ok());
//! ```

use std::sync::Arc;

use nord_middleware::{
    DEFAULT_INTAKE_CAPACITY, EventBus, SampleInbox, SampleIntake, Topic, sample_channel,
};
use nord_perception::{ImuProcessor, ProcessorConfig, ValidationConfig, validate_sample};
use nord_types::{BumpEvent, CalculatedSample, Event, EventPayload, ImuSample, NordError};
use tokio::sync::{mpsc, watch};
use tracing::{info, trace, warn};

const NODE_SOURCE: &str = "nord-runtime::imu_node";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`ImuNode`].
#[derive(Debug, Clone, Default)]
pub struct ImuNodeConfig {
    pub processor: ProcessorConfig,
    /// `None` processes every sample as delivered.
    pub validation: Option<ValidationConfig>,
}

/// Records produced for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeOutput {
    /// Zero-based index of the sample among those the node processed.
    pub seq: u64,
    pub calculated: CalculatedSample,
    pub bump: Option<BumpEvent>,
}

/// Counters reported when the node stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub processed: u64,
    pub rejected: u64,
    pub bumps: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// ImuNode
// ─────────────────────────────────────────────────────────────────────────────

/// Owns one stream's [`ImuProcessor`] and the consuming end of its intake.
pub struct ImuNode {
    processor: ImuProcessor,
    validation: Option<ValidationConfig>,
    bus: Arc<EventBus>,
    inbox: SampleInbox,
    output: Option<mpsc::Sender<NodeOutput>>,
    stats: NodeStats,
}

impl ImuNode {
    /// Build the node together with the single [`SampleIntake`] that feeds
    /// it.
    pub fn new(config: ImuNodeConfig, bus: Arc<EventBus>) -> (Self, SampleIntake) {
        let (intake, inbox) = sample_channel(Arc::clone(&bus), DEFAULT_INTAKE_CAPACITY);
        let node = Self {
            processor: ImuProcessor::new(config.processor),
            validation: config.validation,
            bus,
            inbox,
            output: None,
            stats: NodeStats::default(),
        };
        (node, intake)
    }

    /// Also deliver every [`NodeOutput`] on `output`, in sample order. The
    /// node waits for room on the channel, so a slow consumer slows intake
    /// rather than losing records. The sender is dropped when the node stops.
    pub fn with_output(mut self, output: mpsc::Sender<NodeOutput>) -> Self {
        self.output = Some(output);
        self
    }

    /// Validate, process and publish one sample.
    ///
    /// # Errors
    ///
    /// Returns [`NordError::InvalidSample`] when validation is enabled and
    /// the sample fails it. The bump history is left untouched in that case.
    pub fn handle_sample(&mut self, sample: &ImuSample) -> Result<NodeOutput, NordError> {
        if let Some(limits) = &self.validation
            && let Err(e) = validate_sample(sample, limits)
        {
            self.stats.rejected += 1;
            self.bus.publish_to(
                Topic::SystemAlerts,
                Event::new(
                    NODE_SOURCE,
                    EventPayload::SensorFault {
                        component: "imu".to_string(),
                        message: e.to_string(),
                    },
                ),
            );
            return Err(e);
        }

        let (calculated, bump) = self.processor.process(sample);
        let seq = self.stats.processed;
        self.stats.processed += 1;
        trace!(
            seq,
            direction = calculated.direction,
            acc_forward = calculated.acc_forward,
            acc_right = calculated.acc_right,
            acc_up = calculated.acc_up,
            "sample processed"
        );

        self.bus.publish_to(
            Topic::CalcData,
            Event::new(NODE_SOURCE, EventPayload::Calculated(calculated)),
        );

        if let Some(b) = bump {
            self.stats.bumps += 1;
            info!(seq, dx = b.x, dy = b.y, lateral = ?b.lateral, "bump detected");
            self.bus
                .publish_to(Topic::Bump, Event::new(NODE_SOURCE, EventPayload::Bump(b)));
        }

        Ok(NodeOutput { seq, calculated, bump })
    }

    /// Process samples until the intake is dropped or `shutdown` flips to
    /// `true`, then process whatever is still queued and return.
    ///
    /// A dropped `shutdown` sender only means no stop request can arrive; the
    /// node then runs until its intake closes.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> NodeStats {
        info!("imu node running");

        let mut watching = true;
        if !*shutdown.borrow() {
            loop {
                tokio::select! {
                    biased;
                    changed = shutdown.changed(), if watching => {
                        match changed {
                            Ok(()) if *shutdown.borrow() => break,
                            Ok(()) => {}
                            Err(_) => watching = false,
                        }
                    }
                    sample = self.inbox.recv() => {
                        match sample {
                            Some(sample) => self.accept(sample).await,
                            None => break,
                        }
                    }
                }
            }
        }

        while let Some(sample) = self.inbox.try_recv() {
            self.accept(sample).await;
        }
        info!(
            processed = self.stats.processed,
            rejected = self.stats.rejected,
            bumps = self.stats.bumps,
            "imu node stopped"
        );
        self.stats
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    async fn accept(&mut self, sample: ImuSample) {
        let out = match self.handle_sample(&sample) {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, "sample skipped");
                return;
            }
        };
        let delivered = match &self.output {
            Some(tx) => tx.send(out).await.is_ok(),
            None => true,
        };
        if !delivered {
            warn!("output consumer gone; records go to the bus only");
            self.output = None;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
