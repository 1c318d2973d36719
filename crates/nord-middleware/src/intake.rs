//! Single-producer sample intake for one IMU node.
//!
//! [`sample_channel`] returns the two ends of a bounded queue:
//!
//! - [`SampleIntake`] – the producer. It is deliberately not `Clone`, so a
//!   node has exactly one upstream sensor stream and its bump history can
//!   never see two streams interleaved.
//! - [`SampleInbox`] – the consumer, owned by the node.
//!
//! Sending waits while the queue is full, so a fast producer is slowed to
//! the node's pace instead of losing samples. Every accepted sample is also
//! mirrored on [`Topic::ImuData`] for observers; that copy is best-effort.

use std::sync::Arc;

use nord_types::{Event, EventPayload, ImuSample, NordError};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::bus::{EventBus, Topic};
use crate::imu_bridge::ImuBridge;

const IMU_SOURCE: &str = "nord-middleware::intake/imu/data";

/// Default number of samples queued between a producer and its node.
pub const DEFAULT_INTAKE_CAPACITY: usize = 64;

/// Create a bounded intake queue holding at most `capacity` samples.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn sample_channel(bus: Arc<EventBus>, capacity: usize) -> (SampleIntake, SampleInbox) {
    let (tx, rx) = mpsc::channel(capacity);
    (SampleIntake { tx, bus }, SampleInbox { rx })
}

/// Producer end of a node's intake.
pub struct SampleIntake {
    tx: mpsc::Sender<ImuSample>,
    bus: Arc<EventBus>,
}

impl SampleIntake {
    /// Queue `sample` for the node, waiting for room if the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`NordError::Channel`] once the node has stopped.
    pub async fn ingest_sample(&self, sample: ImuSample) -> Result<(), NordError> {
        self.tx
            .send(sample)
            .await
            .map_err(|_| NordError::Channel("imu node is no longer accepting samples".to_string()))?;
        self.bus
            .publish_to(Topic::ImuData, Event::new(IMU_SOURCE, EventPayload::Imu(sample)));
        Ok(())
    }

    /// Decode one JSON text frame (see [`ImuBridge::decode_frame`]) and queue
    /// the sample it carries.
    ///
    /// # Errors
    ///
    /// [`NordError::Parsing`] for an undecodable frame, [`NordError::Channel`]
    /// once the node has stopped.
    pub async fn ingest_frame(&self, text: &str) -> Result<(), NordError> {
        let sample = ImuBridge::decode_frame(text)?;
        self.ingest_sample(sample).await
    }

    /// `true` once the consuming node has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer end of a node's intake.
pub struct SampleInbox {
    rx: mpsc::Receiver<ImuSample>,
}

impl SampleInbox {
    /// Wait for the next sample. Returns `None` once the producer is dropped
    /// and the queue is empty.
    pub async fn recv(&mut self) -> Option<ImuSample> {
        self.rx.recv().await
    }

    /// Take a queued sample without waiting.
    pub fn try_recv(&mut self) -> Option<ImuSample> {
        match self.rx.try_recv() {
            Ok(sample) => Some(sample),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
