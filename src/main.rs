//! Operation result demo service.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ request id ──▶ OperationLayer ──▶ handler
//!                              (RequestScope)      │
//!                                   │              ▼
//!                                   │      ManagedInvocation
//!                                   │              │
//!                                   │              ▼
//!                                   │      OperationExecutor ──▶ listeners (logs)
//!                                   │              │
//!                                   │              ▼
//!                                   │      RoutingMetricsRecorder (buffers)
//!                                   ▼
//!                            MetricsFlusher ──▶ metrics facade ──▶ Prometheus
//! ```
//!
//! # Usage
//!
//! ```text
//! operation-demo --config operation.toml
//! curl localhost:8080/items/7
//! curl localhost:8080/items/5000          # 404, recorded as REJECT
//! curl localhost:8080/items/7/explode     # panic, rendered as 500
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use operation_result::config::{load_config, ConfigWatcher, OperationConfig};
use operation_result::lifecycle::{shutdown_signal, Shutdown};
use operation_result::observability::{init_logging, init_metrics};
use operation_result::{HttpServer, OperationExecutor, Operations};

#[derive(Debug, Parser)]
#[command(name = "operation-demo", version, about = "Operation result demo service")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => OperationConfig::default(),
    };

    init_logging(&config.logging)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "operation-demo starting");

    if let Some(address) = &config.metrics.exporter_address {
        init_metrics(address.parse()?)?;
    }

    Operations::configure(OperationExecutor::from_config(&config));

    let server = HttpServer::new(&config);
    let shutdown = Shutdown::new();

    // Keep the notify handle alive for the lifetime of the server.
    let _watcher = match &args.config {
        Some(path) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            let state = server.state();
            let mut stop = shutdown.subscribe();
            let mut current = config.clone();

            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = stop.recv() => break,
                        update = updates.recv() => {
                            let Some(next) = update else { break };
                            for field in current.restart_required(&next) {
                                tracing::warn!(field, "Changed setting takes effect after restart");
                            }
                            let executor = OperationExecutor::from_config(&next);
                            state.replace(executor.clone());
                            Operations::configure(executor);
                            current = next;
                            tracing::info!("Executor reconfigured");
                        }
                    }
                }
            });
            Some(handle)
        }
        None => None,
    };

    let listener = TcpListener::bind(&config.http.bind_address).await?;

    let trigger = shutdown.clone();
    server
        .run(listener, async move {
            shutdown_signal().await;
            trigger.trigger();
        })
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
