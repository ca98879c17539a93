//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the single mount route
//! - Add permissive CORS headers to every response
//! - Wire up request tracing
//! - Serve until the shutdown signal fires, then drain for a bounded time

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::lifecycle::shutdown::signalled;
use crate::observability::metrics;
use crate::relay::{Relay, RelayError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
    config: RelayConfig,
}

impl RelayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let relay = Arc::new(Relay::new(&config.relay)?);
        let router = build_router(AppState { relay });
        Ok(Self { router, config })
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mount = %format!("/{}/", self.config.relay.mount_prefix),
            verify_upstream_tls = self.config.relay.verify_upstream_tls,
            "Relay listening"
        );

        let (draining_tx, mut draining_rx) = watch::channel(false);
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                signalled(shutdown).await;
                let _ = draining_tx.send(true);
            })
            .into_future();
        tokio::pin!(serve);

        let drain_timeout = self.config.listener.drain_timeout();
        let drain_expired = async move {
            if draining_rx.wait_for(|draining| *draining).await.is_err() {
                return std::future::pending().await;
            }
            tracing::info!(timeout = ?drain_timeout, "Draining in-flight requests");
            tokio::time::sleep(drain_timeout).await;
        };

        tokio::select! {
            result = &mut serve => result?,
            _ = drain_expired => {
                tracing::warn!(
                    timeout = ?drain_timeout,
                    "Drain timeout elapsed with responses still open, abandoning them"
                );
            }
        }

        tracing::info!("Relay stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    let prefix = state.relay.mount_prefix().to_string();

    Router::new()
        .route(&format!("/{prefix}"), any(relay_handler))
        .route(&format!("/{prefix}/"), any(relay_handler))
        .route(&format!("/{prefix}/{{*target}}"), any(relay_handler))
        .fallback(not_mounted)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Relay handler for every method under the mount prefix.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let span = tracing::info_span!(
        "relay",
        request_id = %Uuid::new_v4(),
        method = %method,
        target = tracing::field::Empty,
    );

    async move {
        let response = state.relay.handle(request).await.into_response();
        metrics::record_request(method.as_str(), response.status().as_u16(), start);
        response
    }
    .instrument(span)
    .await
}

async fn not_mounted(State(state): State<AppState>, request: Request<Body>) -> Response {
    tracing::debug!(path = %request.uri().path(), "Request outside mount prefix");
    (
        StatusCode::NOT_FOUND,
        format!(
            "No relay route for {}; expected /{}/<percent-encoded absolute URL>",
            request.uri().path(),
            state.relay.mount_prefix()
        ),
    )
        .into_response()
}
