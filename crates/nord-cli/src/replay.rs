//! Line-oriented sample source and record sink.
//!
//! [`replay`] feeds newline-delimited JSON samples into a node's intake at
//! the configured cadence; [`write_frames`] writes every [`NodeOutput`] as
//! rosbridge publish frames, one per line.
//!
//! Both ends apply back-pressure, so with pacing disabled the replay simply
//! runs as fast as the node and the writer allow. Output lines follow sample
//! order, and a `/imu/bump` line always directly follows the
//! `/imu/calc_data` line of the sample that produced it.

use std::time::Duration;

use nord_middleware::{ImuBridge, SampleIntake};
use nord_runtime::NodeOutput;
use nord_types::NordError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::warn;

/// Outcome of a [`replay`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub accepted: u64,
    pub malformed: u64,
}

/// Read samples line by line from `reader` and queue them on `intake`.
///
/// Blank lines are skipped; malformed lines are logged and skipped. With a
/// `period`, one sample is delivered per tick. Stops early if the node goes
/// away.
pub async fn replay<R>(
    reader: R,
    intake: &SampleIntake,
    period: Option<Duration>,
) -> std::io::Result<ReplayStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut ticker = period.map(|p| {
        let mut t = interval(p);
        t.set_missed_tick_behavior(MissedTickBehavior::Delay);
        t
    });
    let mut stats = ReplayStats::default();
    let mut line_no = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let sample = match ImuBridge::decode_frame(&line) {
            Ok(sample) => sample,
            Err(e) => {
                stats.malformed += 1;
                warn!(line = line_no, error = %e, "skipping malformed sample");
                continue;
            }
        };
        if let Some(t) = ticker.as_mut() {
            t.tick().await;
        }
        if let Err(e) = intake.ingest_sample(sample).await {
            warn!(line = line_no, error = %e, "imu node stopped; ending replay");
            break;
        }
        stats.accepted += 1;
    }

    Ok(stats)
}

/// Write each [`NodeOutput`] received on `outputs` to `writer` until every
/// sender is dropped, then flush. Returns the number of lines written.
pub async fn write_frames<W>(
    mut outputs: mpsc::Receiver<NodeOutput>,
    mut writer: W,
) -> std::io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;

    while let Some(out) = outputs.recv().await {
        written += write_line(&mut writer, ImuBridge::encode_calculated(&out.calculated)).await?;
        if let Some(bump) = &out.bump {
            written += write_line(&mut writer, ImuBridge::encode_bump(bump)).await?;
        }
    }

    writer.flush().await?;
    Ok(written)
}

async fn write_line<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frame: Result<String, NordError>,
) -> std::io::Result<u64> {
    match frame {
        Ok(frame) => {
            writer.write_all(frame.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            Ok(1)
        }
        Err(e) => {
            warn!(error = %e, "dropping unencodable record");
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nord_middleware::{EventBus, sample_channel};
    use nord_types::{BumpEvent, CalculatedSample};
    use std::sync::Arc;

    const SAMPLE: &str = r#"{"orientation":{"x":0,"y":0,"z":0,"w":1},"linear_acceleration":{"x":0,"y":0,"z":9.81}}"#;

    fn calculated(acc_forward: f64) -> CalculatedSample {
        CalculatedSample {
            direction: 0.0,
            acc_forward,
            acc_right: 0.0,
            acc_up: 0.0,
        }
    }

    #[tokio::test]
    async fn replay_ingests_valid_lines_and_skips_bad_ones() {
        let bus = Arc::new(EventBus::default());
        let (intake, mut inbox) = sample_channel(bus, 8);

        let input = format!("{SAMPLE}\n\nnot json\n{SAMPLE}\n");
        let stats = replay(input.as_bytes(), &intake, None).await.unwrap();

        assert_eq!(stats, ReplayStats { accepted: 2, malformed: 1 });
        assert!(inbox.try_recv().is_some());
        assert!(inbox.try_recv().is_some());
        assert!(inbox.try_recv().is_none());
    }

    #[tokio::test]
    async fn replay_paces_samples() {
        let bus = Arc::new(EventBus::default());
        let (intake, _inbox) = sample_channel(bus, 8);
        let input = format!("{SAMPLE}\n{SAMPLE}\n{SAMPLE}\n");

        let start = tokio::time::Instant::now();
        replay(input.as_bytes(), &intake, Some(Duration::from_millis(20)))
            .await
            .unwrap();
        // First tick is immediate; two more periods follow.
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn replay_stops_when_the_node_is_gone() {
        let bus = Arc::new(EventBus::default());
        let (intake, inbox) = sample_channel(bus, 8);
        drop(inbox);

        let input = format!("{SAMPLE}\n{SAMPLE}\n");
        let stats = replay(input.as_bytes(), &intake, None).await.unwrap();
        assert_eq!(stats.accepted, 0);
    }

    #[tokio::test]
    async fn bump_line_follows_its_calculated_line() {
        let (tx, rx) = mpsc::channel(8);
        let outputs = [
            NodeOutput { seq: 0, calculated: calculated(0.0), bump: None },
            NodeOutput {
                seq: 1,
                calculated: calculated(7.0),
                bump: Some(BumpEvent { x: 7.0, y: 0.0, lateral: None }),
            },
            NodeOutput { seq: 2, calculated: calculated(7.0), bump: None },
        ];
        for out in outputs {
            tx.send(out).await.unwrap();
        }
        drop(tx);

        let mut buf = Vec::new();
        let written = write_frames(rx, &mut buf).await.unwrap();

        assert_eq!(written, 4);
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("/imu/calc_data"));
        assert!(lines[1].contains("/imu/calc_data") && lines[1].contains("\"acc_forward\":7.0"));
        assert!(lines[2].contains("/imu/bump"));
        assert!(lines[3].contains("/imu/calc_data"));
    }
}
