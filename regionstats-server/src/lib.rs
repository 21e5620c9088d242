use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use regionstats_common::{ErrorResponse, MetricsQuery};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod aggregator;
pub mod config;
pub mod error;
pub mod store;

use aggregator::compute_metrics;
use config::MAX_REQUEST_BYTES;
use store::TelemetryStore;

/// Shared by every handler. The store is never written after startup, so no lock guards it.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TelemetryStore>,
}

impl AppState {
    pub fn new(store: Arc<TelemetryStore>) -> Self {
        Self { store }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
}

/// RegionStats Server
pub struct Server {
    config: ServerConfig,
    store: Arc<TelemetryStore>,
}

impl Server {
    /// Create a new server over an already loaded store
    pub fn new(config: ServerConfig, store: Arc<TelemetryStore>) -> Self {
        Self { config, store }
    }

    /// Get the server's configured address
    pub fn address(&self) -> SocketAddr {
        self.config.address
    }

    /// Create the application router with the given state
    pub fn create_router(state: AppState) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::POST])
            .allow_headers(Any);

        Router::new()
            .route("/", post(handle_compute_metrics))
            .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Run the server, signalling `ready_tx` with the bound address once accepting connections
    pub async fn run(
        self,
        ready_tx: tokio::sync::oneshot::Sender<SocketAddr>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let app = Self::create_router(AppState::new(self.store));
        let listener = tokio::net::TcpListener::bind(self.config.address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(address = %local_addr, "metrics server bound");
        ready_tx.send(local_addr).ok();
        axum::serve(listener, app).await?;
        Ok(())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        error: message.into(),
    };
    (status, Json(body)).into_response()
}

/// Handler for POST / — decodes a `MetricsQuery` and returns region → statistics.
/// A malformed body is a 400; a record failing aggregation is a 500 for this request only.
pub async fn handle_compute_metrics(State(state): State<AppState>, body: Bytes) -> Response {
    let query: MetricsQuery = match serde_json::from_slice(&body) {
        Ok(q) => q,
        Err(e) => {
            let message = format!("Invalid request body: {}", e);
            return error_response(StatusCode::BAD_REQUEST, message);
        }
    };

    tracing::debug!(
        regions = query.regions.len(),
        services = query.service_filter().len(),
        threshold_ms = query.threshold_ms,
        "computing metrics"
    );

    match compute_metrics(&state.store, &query) {
        Ok(metrics) => (StatusCode::OK, Json(metrics)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "aggregation hit an invalid record");
            let message = format!("Internal error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}
