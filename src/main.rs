//! Kubernetes Console Backend
//!
//! Serves the console's aggregated resource views over REST, backed by a
//! live cluster or, in standalone mode, by an empty in-memory cluster.

use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use k8sconsole::{
    ApiServer, ApiServerConfig, ClusterClient, Error, InMemoryClusterClient, KubeClusterClient,
    Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Kubernetes Console Backend - aggregated resource views
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// REST API bind address
    #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:9090")]
    api_addr: String,

    /// Allow cross-origin requests
    #[arg(long, env = "API_CORS")]
    cors: bool,

    /// Kubeconfig context to use instead of the current one
    #[arg(long, env = "KUBE_CONTEXT")]
    kube_context: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    /// Run in standalone mode (no Kubernetes)
    #[arg(long, env = "STANDALONE")]
    standalone: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting Kubernetes Console Backend");
    info!("  Version: {}", k8sconsole::VERSION);
    info!("  REST API: {}", args.api_addr);
    info!("  Standalone mode: {}", args.standalone);

    let client: Arc<dyn ClusterClient> = if args.standalone {
        info!("Serving an empty in-memory cluster");
        Arc::new(InMemoryClusterClient::new())
    } else {
        let client = match args.kube_context.as_deref() {
            Some(context) => KubeClusterClient::from_context(context).await?,
            None => KubeClusterClient::try_default().await?,
        };
        info!(context = ?args.kube_context, "Kubernetes client initialized");
        Arc::new(client)
    };

    let api_config = ApiServerConfig {
        addr: args
            .api_addr
            .parse()
            .map_err(|e| Error::Configuration(format!("Invalid REST API address: {}", e)))?,
        cors: args.cors,
    };

    let api_server = ApiServer::new(api_config, client)?;
    api_server.run().await?;

    info!("Console backend shutdown complete");
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},hyper=warn,kube=info,tower=warn,tower_http=info,axum=info",
            level
        ))
    });

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
