//! One replay session: intake, node and writer running side by side.

use std::sync::Arc;

use nord_middleware::EventBus;
use nord_runtime::{ImuNode, NodeStats};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::config::Config;
use crate::replay::{self, ReplayStats};

/// Records buffered between the node and the writer.
const OUTPUT_CAPACITY: usize = 64;

/// What a finished session did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// `None` when the replay was interrupted by `stop`.
    pub replay: Option<ReplayStats>,
    pub node: NodeStats,
    pub lines: u64,
}

/// Replay `input` through a fresh [`ImuNode`] and write its records to
/// `output`.
///
/// Returns once the input is exhausted or `stop` flips to `true`, after
/// every accepted sample has been processed and written.
pub async fn run_session<R, W>(
    cfg: &Config,
    bus: Arc<EventBus>,
    input: R,
    output: W,
    stop: watch::Receiver<bool>,
) -> std::io::Result<SessionSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (node, intake) = ImuNode::new(cfg.node_config(), bus);
    let (out_tx, out_rx) = mpsc::channel(OUTPUT_CAPACITY);
    let node = node.with_output(out_tx);

    let mut stop_intake = stop.clone();
    let period = cfg.sample_period();
    let intake_side = async move {
        let result = tokio::select! {
            stats = replay::replay(input, &intake, period) => stats.map(Some),
            Ok(_) = stop_intake.wait_for(|stop| *stop) => Ok(None),
        };
        // Dropping the intake lets the node finish once its queue is empty.
        drop(intake);
        result
    };

    let (replayed, node_stats, written) =
        tokio::join!(intake_side, node.run(stop), replay::write_frames(out_rx, output));

    let replayed = replayed?;
    match replayed {
        Some(stats) => info!(accepted = stats.accepted, malformed = stats.malformed, "input closed"),
        None => info!("replay interrupted"),
    }

    Ok(SessionSummary {
        replay: replayed,
        node: node_stats,
        lines: written?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const LEVEL: &str = r#"{"orientation":{"x":0,"y":0,"z":0,"w":1},"linear_acceleration":{"x":0,"y":0,"z":9.81}}"#;
    const JOLT: &str = r#"{"orientation":{"x":0,"y":0,"z":0,"w":1},"linear_acceleration":{"x":0,"y":5,"z":14.81}}"#;

    fn unpaced() -> Config {
        Config {
            sample_rate_hz: 0,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn unpaced_replay_processes_every_sample() {
        let input = format!("{LEVEL}\n").repeat(5_000);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let mut out = Vec::new();

        let summary = run_session(
            &unpaced(),
            Arc::new(EventBus::default()),
            input.as_bytes(),
            &mut out,
            stop_rx,
        )
        .await
        .unwrap();

        let replayed = summary.replay.expect("input ran to the end");
        assert_eq!(replayed.accepted, 5_000);
        assert_eq!(summary.node.processed, replayed.accepted);
        assert_eq!(summary.lines, 5_000);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 5_000);
    }

    #[tokio::test]
    async fn bump_lines_follow_their_samples() {
        let input = format!("{LEVEL}\n{JOLT}\n{JOLT}\n{LEVEL}\n");
        let (_stop_tx, stop_rx) = watch::channel(false);
        let mut out = Vec::new();

        let summary = run_session(
            &unpaced(),
            Arc::new(EventBus::default()),
            input.as_bytes(),
            &mut out,
            stop_rx,
        )
        .await
        .unwrap();

        // JOLT after LEVEL and LEVEL after JOLT both jump by (5, 5).
        assert_eq!(summary.node.bumps, 2);
        let text = String::from_utf8(out).unwrap();
        let topics: Vec<&str> = text
            .lines()
            .map(|l| if l.contains("/imu/bump") { "bump" } else { "calc" })
            .collect();
        assert_eq!(topics, ["calc", "calc", "bump", "calc", "calc", "bump"]);
    }

    #[tokio::test]
    async fn stop_signal_ends_a_session_with_open_input() {
        let (_writer, reader) = tokio::io::duplex(64);
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut out = Vec::new();
        let cfg = Config::default();

        let session = run_session(
            &cfg,
            Arc::new(EventBus::default()),
            tokio::io::BufReader::new(reader),
            &mut out,
            stop_rx,
        );
        let stopper = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            stop_tx.send(true).unwrap();
        };

        let (summary, ()) = tokio::time::timeout(Duration::from_secs(2), async {
            tokio::join!(session, stopper)
        })
        .await
        .expect("session ends after stop");
        let summary = summary.unwrap();
        assert_eq!(summary.replay, None);
        assert_eq!(summary.lines, 0);
    }
}
