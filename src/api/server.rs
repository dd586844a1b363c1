//! Console API Server
//!
//! Runs the REST API until shut down by signal or by [`ApiServer::shutdown`].

use super::rest::{AppState, RestRouter};
use crate::domain::ports::ClusterClient;
use crate::error::{Error, Result};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the API server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiServerConfig {
    /// REST API bind address
    pub addr: SocketAddr,
    /// Allow cross-origin requests
    pub cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9090)),
            cors: false,
        }
    }
}

// =============================================================================
// API Server
// =============================================================================

pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    shutdown_tx: watch::Sender<bool>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, client: Arc<dyn ClusterClient>) -> Result<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            config,
            state: AppState::new(client)?,
            shutdown_tx,
        })
    }

    /// Router serving this server's state
    pub fn router(&self) -> axum::Router {
        RestRouter::new(self.state.clone())
            .with_cors(self.config.cors)
            .build()
    }

    /// Serve until ctrl-c or [`shutdown`](ApiServer::shutdown)
    pub async fn run(&self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.config.addr)
            .await
            .map_err(|e| Error::Configuration(format!("Failed to bind {}: {}", self.config.addr, e)))?;
        info!(addr = %self.config.addr, cors = self.config.cors, "REST API listening");

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_rx.wait_for(|stop| *stop) => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
                info!("REST server shutting down");
            })
            .await
            .map_err(|e| Error::Internal(format!("REST server error: {}", e)))?;

        Ok(())
    }

    /// Trigger graceful shutdown. Takes effect even before `run` starts.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryClusterClient;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = ApiServerConfig::default();
        assert_eq!(config.addr.port(), 9090);
        assert!(!config.cors);
    }

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let config = ApiServerConfig {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            cors: true,
        };
        let server = Arc::new(ApiServer::new(config, Arc::new(InMemoryClusterClient::new())).unwrap());

        let running = server.clone();
        let handle = tokio::spawn(async move { running.run().await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        server.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
