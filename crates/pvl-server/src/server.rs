use std::sync::Arc;

use pvl_service::Traceability;
use tokio::net::TcpListener;

use crate::auth::StaticTokenProvider;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Provenance Ledger HTTP server.
pub struct PvlServer {
    config: ServerConfig,
    state: AppState,
}

impl PvlServer {
    /// Open the configured store and register the bootstrap actors.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let pvl = match &config.data_dir {
            Some(dir) => Traceability::open_durable(dir, config.service.clone())?,
            None => Traceability::in_memory(config.service.clone())?,
        };
        let provider = StaticTokenProvider::bootstrap(pvl.directory(), &config.bootstrap_actors)?;
        if provider.is_empty() {
            tracing::warn!("no bootstrap actors configured; every write will be rejected");
        }
        let state = AppState {
            pvl: Arc::new(pvl),
            identity: Arc::new(provider),
        };
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            durable = self.config.data_dir.is_some(),
            "PVL server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
