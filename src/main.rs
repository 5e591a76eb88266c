//! Hotel booking tool server.
//!
//! Speaks line-delimited JSON-RPC on stdin/stdout; logs go to stderr. Each request
//! runs on its own task, so slow tool calls do not hold up the ones behind them.
//! Responses are written by a single task, one complete line at a time, in the
//! order they finish; callers match them up by `id`.
//!
//! ```bash
//! AMADEUS_CLIENT_ID=... AMADEUS_CLIENT_SECRET=... RUST_LOG=debug hotel-booking-mcp
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use hotel_booking_gateway::{rpc, GatewayConfig, HotelService};
use serde_json::Value;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::mpsc,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = GatewayConfig::from_env().context("missing or invalid configuration")?;
    let service = Arc::new(
        HotelService::from_config(&config).context("failed to initialise the HTTP client")?,
    );
    info!(base_url = %config.base_url, "Hotel booking tool server ready");

    let (responses, mut outgoing) = mpsc::unbounded_channel::<Value>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = outgoing.recv().await {
            let mut payload = serde_json::to_vec(&response)?;
            payload.push(b'\n');
            stdout.write_all(&payload).await?;
            stdout.flush().await?;
        }
        anyhow::Ok(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let service = service.clone();
        let responses = responses.clone();
        tokio::spawn(async move {
            match rpc::handle_line(&service, &line).await {
                Ok(Some(response)) => {
                    // Only fails once the writer is gone, i.e. during shutdown.
                    let _ = responses.send(response);
                }
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "Fatal upstream authentication failure, shutting down");
                    std::process::exit(1);
                }
            }
        });
    }

    info!("stdin closed, waiting for in-flight requests");
    // The writer ends once every request task has dropped its sender.
    drop(responses);
    writer.await??;
    Ok(())
}
