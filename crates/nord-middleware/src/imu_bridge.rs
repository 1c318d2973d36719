//! rosbridge-style JSON bridge for the IMU node.
//!
//! [`ImuBridge`]:
//!
//! 1. **Decodes** `sensor_msgs/Imu`-shaped samples, either wrapped in a
//!    rosbridge publish frame (`{"op":"publish","topic":"/imu/data","msg":{..}}`)
//!    or as a bare message object. Decoded samples enter a node through its
//!    [`SampleIntake`][crate::intake::SampleIntake].
//!
//! 2. **Encodes** outbound records as publish frames on `/imu/calc_data`,
//!    `/imu/bump` and `/system/alerts`.
//!
//! 3. **Serves** an optional WebSocket endpoint that streams the
//!    calculated-sample and bump frames to every client. Clients are
//!    consumers only; inbound text frames are ignored, so a socket can never
//!    inject a second sensor stream into a running node.
//!
//! The bridge only handles framing and transport; it never looks at the
//! numbers.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use nord_types::{BumpEvent, CalculatedSample, Event, EventPayload, ImuSample, NordError};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::bus::{EventBus, Topic};

#[derive(Serialize)]
struct PublishFrame<'a, T: Serialize> {
    op: &'static str,
    topic: &'static str,
    msg: &'a T,
}

/// Bridge between the internal [`EventBus`] and JSON consumers.
#[derive(Clone)]
pub struct ImuBridge {
    bus: Arc<EventBus>,
}

impl ImuBridge {
    /// Create a new bridge backed by `bus`.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    // -----------------------------------------------------------------------
    // Decode
    // -----------------------------------------------------------------------

    /// Decode one JSON text frame into a sample.
    ///
    /// # Errors
    ///
    /// Returns [`NordError::Parsing`] when the text is not JSON, when a
    /// rosbridge frame is not a publish on `/imu/data`, or when the message
    /// lacks the orientation / acceleration fields.
    pub fn decode_frame(text: &str) -> Result<ImuSample, NordError> {
        let mut json: Value =
            serde_json::from_str(text).map_err(|e| NordError::Parsing(e.to_string()))?;

        let msg = if json.get("op").is_some() {
            let op = json.get("op").and_then(Value::as_str).unwrap_or("");
            let topic = json.get("topic").and_then(Value::as_str).unwrap_or("");
            if op != "publish" || Topic::from_name(topic) != Some(Topic::ImuData) {
                return Err(NordError::Parsing(format!(
                    "expected a publish on {}, got op '{op}' on '{topic}'",
                    Topic::ImuData.name()
                )));
            }
            json.get_mut("msg")
                .map(Value::take)
                .ok_or_else(|| NordError::Parsing("publish frame without msg".to_string()))?
        } else {
            json
        };

        serde_json::from_value(msg).map_err(|e| NordError::Parsing(e.to_string()))
    }

    // -----------------------------------------------------------------------
    // Encode
    // -----------------------------------------------------------------------

    /// Encode `event` as a rosbridge publish frame.
    pub fn encode_frame(event: &Event) -> Result<String, NordError> {
        let encoded = match &event.payload {
            EventPayload::Imu(sample) => publish_frame(Topic::ImuData, sample),
            EventPayload::Calculated(out) => publish_frame(Topic::CalcData, out),
            EventPayload::Bump(bump) => publish_frame(Topic::Bump, bump),
            EventPayload::SensorFault { component, message } => publish_frame(
                Topic::SystemAlerts,
                &json!({ "component": component, "message": message }),
            ),
        };
        encoded.map_err(|e| NordError::Serialization(e.to_string()))
    }

    /// Encode a calculated sample as a publish frame on `/imu/calc_data`.
    pub fn encode_calculated(sample: &CalculatedSample) -> Result<String, NordError> {
        publish_frame(Topic::CalcData, sample).map_err(|e| NordError::Serialization(e.to_string()))
    }

    /// Encode a bump as a publish frame on `/imu/bump`.
    pub fn encode_bump(bump: &BumpEvent) -> Result<String, NordError> {
        publish_frame(Topic::Bump, bump).map_err(|e| NordError::Serialization(e.to_string()))
    }

    // -----------------------------------------------------------------------
    // WebSocket server
    // -----------------------------------------------------------------------

    /// Start a WebSocket server on `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`NordError::Channel`] if the TCP listener cannot be bound.
    pub async fn run_ws_server(self, addr: SocketAddr) -> Result<(), NordError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| NordError::Channel(format!("ws bind error on {addr}: {e}")))?;
        self.serve(listener).await
    }

    /// Accept WebSocket clients on an already bound `listener`. Runs until the
    /// task is cancelled.
    pub async fn serve(self, listener: TcpListener) -> Result<(), NordError> {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "imu bridge listening");
        }

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let bridge = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = bridge.handle_ws_client(stream, peer).await {
                            error!(peer = %peer, error = %e, "ws client error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "ws accept error");
                }
            }
        }
    }

    async fn handle_ws_client(&self, stream: TcpStream, peer: SocketAddr) -> Result<(), NordError> {
        let ws_stream = accept_async(stream)
            .await
            .map_err(|e| NordError::Channel(format!("ws handshake from {peer}: {e}")))?;
        debug!(peer = %peer, "ws client connected");

        let (mut ws_tx, mut ws_rx) = ws_stream.split();
        let mut calc_rx = self.bus.subscribe_to(Topic::CalcData);
        let mut bump_rx = self.bus.subscribe_to(Topic::Bump);

        loop {
            let outbound = tokio::select! {
                result = calc_rx.recv() => result,
                result = bump_rx.recv() => result,
                msg = ws_rx.next() => {
                    match msg {
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(_)) => break,
                        Some(Ok(Message::Text(_))) => {
                            debug!(peer = %peer, "ignoring inbound frame; ws clients are read-only");
                        }
                        _ => {}
                    }
                    continue;
                }
            };

            match outbound {
                Ok(event) => {
                    let frame = Self::encode_frame(&event)?;
                    if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    warn!(peer = %peer, lagged_by = n, "ws client lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }

        debug!(peer = %peer, "ws client disconnected");
        Ok(())
    }
}

fn publish_frame<T: Serialize>(topic: Topic, msg: &T) -> serde_json::Result<String> {
    serde_json::to_string(&PublishFrame {
        op: "publish",
        topic: topic.name(),
        msg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const BARE: &str = r#"{"orientation":{"x":0,"y":0,"z":0,"w":1},
        "angular_velocity":{"x":0,"y":0,"z":0.5},
        "linear_acceleration":{"x":0.1,"y":0.2,"z":9.9}}"#;

    #[test]
    fn bare_message_is_decoded() {
        let sample = ImuBridge::decode_frame(BARE).unwrap();
        assert!((sample.linear_acceleration.up - 9.9).abs() < 1e-12);
        assert!((sample.angular_velocity.z - 0.5).abs() < 1e-12);
    }

    #[test]
    fn publish_frame_is_unwrapped() {
        let frame = format!(r#"{{"op":"publish","topic":"/imu/data","msg":{BARE}}}"#);
        let sample = ImuBridge::decode_frame(&frame).unwrap();
        assert!((sample.linear_acceleration.forward - 0.2).abs() < 1e-12);
    }

    #[test]
    fn frame_on_other_topic_is_rejected() {
        let frame = format!(r#"{{"op":"publish","topic":"/cmd_vel","msg":{BARE}}}"#);
        let err = ImuBridge::decode_frame(&frame).unwrap_err();
        assert!(matches!(err, NordError::Parsing(_)));
        assert!(err.to_string().contains("/cmd_vel"));
    }

    #[test]
    fn subscribe_op_is_rejected() {
        let err = ImuBridge::decode_frame(r#"{"op":"subscribe","topic":"/imu/data"}"#).unwrap_err();
        assert!(matches!(err, NordError::Parsing(_)));
    }

    #[test]
    fn garbage_and_incomplete_messages_are_rejected() {
        assert!(ImuBridge::decode_frame("not json").is_err());
        assert!(ImuBridge::decode_frame(r#"{"orientation":{"x":0,"y":0,"z":0,"w":1}}"#).is_err());
    }

    #[test]
    fn calculated_sample_encodes_on_calc_data() {
        let calculated = CalculatedSample {
            direction: 1.0,
            acc_forward: 2.0,
            acc_right: 3.0,
            acc_up: 4.0,
        };
        let event = Event::new("test", EventPayload::Calculated(calculated));
        let encoded = ImuBridge::encode_frame(&event).unwrap();
        assert_eq!(encoded, ImuBridge::encode_calculated(&calculated).unwrap());

        let frame: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(frame["op"], "publish");
        assert_eq!(frame["topic"], "/imu/calc_data");
        assert_eq!(frame["msg"]["direction"], 1.0);
        assert_eq!(frame["msg"]["acc_up"], 4.0);
    }

    #[test]
    fn bump_encodes_on_bump_topic() {
        let bump = BumpEvent { x: 5.0, y: -5.0, lateral: None };
        let event = Event::new("test", EventPayload::Bump(bump));
        let encoded = ImuBridge::encode_frame(&event).unwrap();
        assert_eq!(encoded, ImuBridge::encode_bump(&bump).unwrap());

        let frame: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(frame["topic"], "/imu/bump");
        assert_eq!(frame["msg"]["x"], 5.0);
        assert_eq!(frame["msg"]["y"], -5.0);
        assert!(frame["msg"].get("lateral").is_none());
    }

    #[test]
    fn sensor_fault_encodes_on_alerts() {
        let event = Event::new(
            "test",
            EventPayload::SensorFault {
                component: "imu".to_string(),
                message: "norm 2.0".to_string(),
            },
        );
        let frame: Value = serde_json::from_str(&ImuBridge::encode_frame(&event).unwrap()).unwrap();
        assert_eq!(frame["topic"], "/system/alerts");
        assert_eq!(frame["msg"]["component"], "imu");
    }

    #[tokio::test]
    async fn ws_clients_receive_records_but_cannot_inject_samples() {
        let bus = Arc::new(EventBus::default());
        let mut samples = bus.subscribe_to(Topic::ImuData);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(ImuBridge::new(Arc::clone(&bus)).serve(listener));

        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        client.send(Message::Text(BARE.into())).await.unwrap();

        // Keep publishing until the server side has subscribed.
        let publisher_bus = Arc::clone(&bus);
        let publisher = tokio::spawn(async move {
            loop {
                publisher_bus.publish_to(
                    Topic::CalcData,
                    Event::new(
                        "test",
                        EventPayload::Calculated(CalculatedSample {
                            direction: 0.0,
                            acc_forward: 1.0,
                            acc_right: 0.0,
                            acc_up: 0.0,
                        }),
                    ),
                );
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });

        let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("frame within timeout")
            .unwrap()
            .unwrap();
        publisher.abort();
        let frame: Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
        assert_eq!(frame["topic"], "/imu/calc_data");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(samples.try_recv().is_err(), "inbound ws frame reached /imu/data");
    }
}
