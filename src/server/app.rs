//! HTTP server bootstrap
//!
//! Builds the shared state once, wraps the router in the optional CORS and
//! request-logging layers and serves it until the shutdown signal fires.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::batch::BatchAggregator;
use crate::cache::TtlCache;
use crate::config::Config;
use crate::storage::{LocationStore, PostgresStore};
use crate::upstream::{ForecastSource, UpstreamClient};

use super::routes::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Buoy, spot and tide station records
    pub store: Arc<dyn LocationStore>,

    /// Live upstream data
    pub source: Arc<dyn ForecastSource>,

    /// Forecast cache, also used by `source` when it is the real client
    pub cache: Arc<TtlCache>,

    pub aggregator: Arc<BatchAggregator>,

    /// Server start time
    pub start_time: Instant,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn LocationStore>,
        source: Arc<dyn ForecastSource>,
        cache: Arc<TtlCache>,
    ) -> Self {
        let aggregator = Arc::new(BatchAggregator::from_config(
            store.clone(),
            source.clone(),
            &config.batch,
        ));

        Self {
            store,
            source,
            cache,
            aggregator,
            start_time: Instant::now(),
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Server
// ============================================================================

pub struct SurfServer {
    state: AppState,
}

impl SurfServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Connect to PostgreSQL and build the upstream client from configuration
    pub async fn from_config(config: Config) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::ConfigError(e.to_string()))?;

        let store = PostgresStore::connect(&config.database)
            .await
            .map_err(|e| ServerError::InitError(format!("{e:#}")))?;

        let cache = Arc::new(TtlCache::new());
        let client = UpstreamClient::from_config(&config, cache.clone())
            .map_err(|e| ServerError::InitError(e.to_string()))?;

        let state = AppState::new(config, Arc::new(store), Arc::new(client), cache);
        Ok(Self::new(state))
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let server_config = &self.state.config.server;
        let mut router = create_router(self.state.clone());

        if server_config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if server_config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.state.config.server.bind_address;

        tracing::info!("Starting surfe-diem server on {} (with graceful shutdown)", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        let config = &self.state.config;
        ServerInfo {
            bind_address: config.server.bind_address,
            store_backend: self.state.store.backend_name(),
            max_concurrent_fetches: config.batch.max_concurrent_fetches,
            request_deadline_secs: config.batch.request_deadline_secs,
            cors_enabled: config.server.enable_cors,
            admin_enabled: config.server.api_key.is_some(),
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub store_backend: &'static str,
    pub max_concurrent_fetches: usize,
    pub request_deadline_secs: u64,
    pub cors_enabled: bool,
    pub admin_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "surfe-diem API\n\
             {:-<40}\n\
             Bind Address: {}\n\
             Store: {}\n\
             Batch Concurrency: {}\n\
             Batch Deadline: {}s\n\
             CORS: {}\n\
             Admin Routes: {}",
            "",
            self.bind_address,
            self.store_backend,
            self.max_concurrent_fetches,
            self.request_deadline_secs,
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.admin_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

#[derive(Debug, Clone, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Failed to bind: {0}")]
    BindError(String),

    #[error("Server error: {0}")]
    ServeError(String),
}
