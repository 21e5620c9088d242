use clap::Parser;
use regionstats_server::config::{DEFAULT_ADDRESS, DEFAULT_TELEMETRY_PATH};
use regionstats_server::store::TelemetryStore;
use regionstats_server::{Server, ServerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "regionstats-server")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = DEFAULT_ADDRESS)]
    address: SocketAddr,

    /// Path to the JSON telemetry dataset loaded at startup.
    #[arg(long, default_value = DEFAULT_TELEMETRY_PATH)]
    telemetry: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    // A corrupt dataset must never be served.
    let store = match TelemetryStore::from_path(&args.telemetry) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "failed to load telemetry dataset");
            return Err(e.into());
        }
    };

    let config = ServerConfig {
        address: args.address,
    };

    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();

    // Print "Listening on <addr>" once the server signals it is bound.
    tokio::spawn(async move {
        if let Ok(addr) = ready_rx.await {
            println!("Listening on {}", addr);
        }
    });

    Server::new(config, Arc::new(store)).run(ready_tx).await?;
    Ok(())
}
