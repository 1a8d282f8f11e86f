//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all mirror handler
//! - Buffer the inbound body exactly once (POST keys depend on it)
//! - Wire up middleware (timeout, tracing)
//! - Serve with graceful shutdown

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::MirrorConfig;
use crate::handlers::{Dispatcher, InboundRequest};

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Dispatcher,
    max_body_bytes: usize,
}

/// HTTP server for the caching proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server for the given configuration and dispatcher.
    pub fn new(config: &MirrorConfig, dispatcher: Dispatcher) -> Self {
        let state = AppState {
            dispatcher,
            max_body_bytes: config.listener.max_body_bytes,
        };
        let router = Router::new()
            .route("/{*path}", any(mirror_handler))
            .route("/", any(mirror_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: buffer the body once, hand off to the mode handler.
async fn mirror_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let path = parts.uri.path().trim_start_matches('/').to_string();
    let query = parts.uri.query().map(str::to_owned);

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(path = %path, error = %error, "failed to buffer request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let inbound = InboundRequest {
        method: parts.method,
        path,
        query,
        headers: parts.headers,
        body,
    };
    state.dispatcher.dispatch(inbound).await.into_response()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
