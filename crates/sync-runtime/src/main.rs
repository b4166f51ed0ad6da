//! # Repair-Sync CLI
//!
//! Connects to a sync server, subscribes the given channels and logs entity
//! changes and connection transitions until Ctrl+C.
//!
//! ```text
//! repair-sync --url wss://shop.example/sync --channel repair:42 --channel notifications:7
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use shared_bus::{EventFilter, SyncEvent};
use sync_runtime::{SyncClient, SyncConfig};
use sync_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use tokio_stream::StreamExt;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "repair-sync", version, about = "Real-time repair-shop sync client")]
struct Args {
    /// Sync server URL (ws:// or wss://).
    #[arg(long, env = "SYNC_URL")]
    url: Option<String>,

    /// Channel to subscribe to. Repeat for several channels.
    #[arg(long = "channel", value_name = "CHANNEL")]
    channels: Vec<String>,

    /// Emit JSON formatted logs.
    #[arg(long)]
    json_logs: bool,

    /// Reconnect attempts before giving up.
    #[arg(long)]
    max_retries: Option<u32>,

    /// Print Prometheus metrics to stdout on exit.
    #[arg(long)]
    dump_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::from_env();
    telemetry.json_logs |= args.json_logs;
    let _telemetry = init_telemetry(telemetry).context("Failed to initialize telemetry")?;

    let mut config = SyncConfig::from_env().context("Invalid environment configuration")?;
    if let Some(url) = args.url {
        config.url = url;
    }
    if let Some(retries) = args.max_retries {
        config.connection.max_attempts = retries;
    }
    config.validate().context("Invalid configuration")?;

    let client = SyncClient::builder(config).build();
    let mut events = client.events(EventFilter::all());
    client.start().context("Failed to start sync client")?;

    let mut guards = Vec::with_capacity(args.channels.len());
    for channel in args.channels {
        let guard = client
            .subscribe(channel.as_str())
            .await
            .with_context(|| format!("Failed to subscribe to {channel}"))?;
        guards.push(guard);
    }

    info!(channels = guards.len(), "Sync client running. Press Ctrl+C to stop.");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.next() => match event {
                Some(SyncEvent::ConnectionStateChanged(change)) => {
                    if change.gave_up {
                        warn!(reason = ?change.reason, "Gave up reconnecting");
                    } else {
                        info!(from = %change.from, to = %change.to, attempt = change.attempt, "Connection state changed");
                    }
                }
                Some(event) => info!(
                    event = event.name(),
                    ids = ?event.entity_ids(),
                    "Sync event"
                ),
                None => break,
            },
        }
    }

    drop(guards);
    client.shutdown().await;

    if args.dump_metrics {
        print!("{}", encode_metrics().context("Failed to encode metrics")?);
    }
    Ok(())
}
