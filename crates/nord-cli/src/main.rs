//! `nord-imu` – IMU heading, gravity compensation and bump detection node.
//!
//! 1. Loads `~/.nord/config.toml` (or `$NORD_CONFIG`), writing a default
//!    file on first run, then applies `NORD_*` environment overrides.
//! 2. Starts the [`ImuNode`][nord_runtime::ImuNode] on an in-process event
//!    bus.
//! 3. Replays newline-delimited `sensor_msgs/Imu` JSON from stdin at
//!    `sample_rate_hz` and writes `/imu/calc_data` and `/imu/bump` frames to
//!    stdout, one JSON object per line, in sample order.
//! 4. Optionally streams the same records to WebSocket clients.
//! 5. Intercepts **Ctrl-C** to stop intake, drain pending samples and exit.

mod config;
mod replay;
mod session;

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use nord_middleware::{EventBus, ImuBridge};
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::Config;

fn main() {
    let _guard = nord_runtime::init_tracing("nord-imu");

    print_banner();

    let mut cfg = match config::load() {
        Ok(Some(cfg)) => {
            info!(path = %config::config_path().display(), "config loaded");
            cfg
        }
        Ok(None) => {
            let cfg = Config::default();
            match config::save(&cfg) {
                Ok(()) => info!(
                    path = %config::config_path().display(),
                    "no config found; wrote defaults"
                ),
                Err(e) => warn!(error = %e, "no config found and defaults could not be written"),
            }
            cfg
        }
        Err(e) => {
            warn!(error = %e, "config unreadable; using defaults");
            Config::default()
        }
    };
    config::apply_env_overrides(&mut cfg);
    info!(
        gravity_g = cfg.gravity_g,
        bump_threshold = cfg.bump_threshold,
        sample_rate_hz = cfg.sample_rate_hz,
        validate_input = cfg.validate_input,
        "configuration"
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start Tokio runtime");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(run(cfg));
    // A pending stdin read sits on a blocking thread that cannot be cancelled.
    runtime.shutdown_timeout(Duration::from_millis(200));

    if let Err(e) = result {
        error!(error = %e, "nord-imu exited with an error");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> std::io::Result<()> {
    let bus = Arc::new(EventBus::default());

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let (stop_tx, stop_rx) = watch::channel(false);
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("{}", "⚠  Ctrl-C received – draining and shutting down …".yellow().bold());
        let _ = stop_tx.send(true);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    if cfg.ws_enabled {
        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, cfg.ws_port));
        let ws_bridge = ImuBridge::new(Arc::clone(&bus));
        tokio::spawn(async move {
            if let Err(e) = ws_bridge.run_ws_server(addr).await {
                error!(error = %e, "websocket bridge stopped");
            }
        });
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let summary = session::run_session(&cfg, bus, stdin, tokio::io::stdout(), stop_rx).await?;
    info!(
        processed = summary.node.processed,
        rejected = summary.node.rejected,
        bumps = summary.node.bumps,
        lines = summary.lines,
        "node finished"
    );

    Ok(())
}

fn print_banner() {
    eprintln!("{}", "nord-imu".bold().cyan());
    eprintln!(
        "{}",
        "  heading · gravity compensation · bump detection".dimmed()
    );
}
