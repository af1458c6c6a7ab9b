//! Listener setup and serving.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::store::{MemoryTaskStore, TaskStore};
use crate::web::{self, AppState};

pub struct Server {
    config: ServerConfig,
    store: Arc<dyn TaskStore>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryTaskStore::new()))
    }

    /// Create a server around an existing task store.
    pub fn with_store(config: ServerConfig, store: Arc<dyn TaskStore>) -> Self {
        Self { config, store }
    }

    fn build_state(&self) -> Arc<AppState> {
        let settings = self.config.agent_settings();
        if !settings.templates_dir.is_dir() {
            tracing::warn!(
                dir = %settings.templates_dir.display(),
                "Templates directory not found, using built-in document template"
            );
        }
        Arc::new(AppState::new(self.config.clone(), self.store.clone()))
    }

    async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.bind_addr();
        TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))
    }

    /// Serve until ctrl-c.
    pub async fn run(self) -> Result<()> {
        let listener = self.bind().await?;
        tracing::info!("HTTP API listening on {}", listener.local_addr()?);
        if self.config.api_key.is_none() {
            tracing::info!("No default API key; runs without one use stub agents");
        }

        let app = web::router(self.build_state());
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down");
            })
            .await?;
        Ok(())
    }

    /// Start serving in the background (for testing).
    /// Returns the bound address and the serving task.
    pub async fn start(self) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
        let listener = self.bind().await?;
        let addr = listener.local_addr()?;
        tracing::info!("Listening on {addr}");

        let app = web::router(self.build_state());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await?;
            Ok::<_, anyhow::Error>(())
        });

        Ok((addr, handle))
    }
}
