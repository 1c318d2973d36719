//! Headless, typed, topic-based publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message without any single subscriber blocking
//! the others.
//!
//! # Topics
//!
//! Each [`Topic`] lane keeps the ROS topic name the node has always used:
//!
//! | Topic | Name | Traffic |
//! |---|---|---|
//! | [`Topic::ImuData`] | `/imu/data` | Mirror of samples accepted by a node's intake |
//! | [`Topic::CalcData`] | `/imu/calc_data` | One calculated sample per processed input |
//! | [`Topic::Bump`] | `/imu/bump` | Bump events |
//! | [`Topic::SystemAlerts`] | `/system/alerts` | Rejected samples, transport faults |
//!
//! Lanes drop the oldest events for a subscriber that falls behind, so the
//! bus is for observers only. Samples reach a node through its bounded
//! [`SampleIntake`][crate::intake::SampleIntake].

use nord_types::Event;
use tokio::sync::broadcast;

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Enumeration of all routing topics on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Raw orientation + motion samples from the IMU driver.
    ImuData,
    /// Heading and gravity-compensated acceleration.
    CalcData,
    /// Abrupt acceleration changes.
    Bump,
    /// Rejected samples and other non-fatal faults.
    SystemAlerts,
}

impl Topic {
    /// The ROS-style topic name carried in bridge frames.
    pub fn name(self) -> &'static str {
        match self {
            Topic::ImuData => "/imu/data",
            Topic::CalcData => "/imu/calc_data",
            Topic::Bump => "/imu/bump",
            Topic::SystemAlerts => "/system/alerts",
        }
    }

    /// Inverse of [`Topic::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "/imu/data" => Some(Topic::ImuData),
            "/imu/calc_data" => Some(Topic::CalcData),
            "/imu/bump" => Some(Topic::Bump),
            "/system/alerts" => Some(Topic::SystemAlerts),
            _ => None,
        }
    }
}

/// Shared event bus. Clone it cheaply – all clones share the same underlying
/// broadcast channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    imu_data: broadcast::Sender<Event>,
    calc_data: broadcast::Sender<Event>,
    bump: broadcast::Sender<Event>,
    system_alerts: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// The `capacity` is applied to every topic channel independently.
    pub fn new(capacity: usize) -> Self {
        let (imu_data, _) = broadcast::channel(capacity);
        let (calc_data, _) = broadcast::channel(capacity);
        let (bump, _) = broadcast::channel(capacity);
        let (system_alerts, _) = broadcast::channel(capacity);
        Self {
            imu_data,
            calc_data,
            bump,
            system_alerts,
        }
    }

    /// Publish `event` to the given [`Topic`] channel.
    ///
    /// Returns the number of active receivers that were handed the event.
    /// Returns `0` when nobody is listening on the topic; that is a normal
    /// condition, not an error.
    pub fn publish_to(&self, topic: Topic, event: Event) -> usize {
        self.topic_sender(topic).send(event).unwrap_or(0)
    }

    /// Subscribe to a specific [`Topic`] channel.
    ///
    /// Only events published after this call are delivered.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::ImuData => &self.imu_data,
            Topic::CalcData => &self.calc_data,
            Topic::Bump => &self.bump,
            Topic::SystemAlerts => &self.system_alerts,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Topic-based receiver
// ---------------------------------------------------------------------------

/// An async receiver bound to a single [`Topic`] channel.
///
/// Obtained via [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event on this topic.
    ///
    /// Returns:
    /// * `Ok(event)` – a successfully received event.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` messages were dropped.  The caller decides whether to
    ///   continue or abort.
    /// * `Err(broadcast::error::RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Take the next already-buffered event without waiting.
    pub fn try_recv(&mut self) -> Result<Event, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// The [`Topic`] this receiver is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}
