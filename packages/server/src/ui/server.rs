//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use hiroba_shared::time::{Clock, SystemClock};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::ServerConfig, domain::MessageStore};

use super::{
    error::ServerError,
    handler::{get_messages, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Build the application router: websocket endpoint, history and health APIs,
/// request logging and (when configured) the CORS origin restriction.
///
/// # Errors
///
/// Returns `ServerError::InvalidOrigin` if the configured origin is not a
/// valid header value.
pub fn build_router(state: Arc<AppState>) -> Result<Router, ServerError> {
    let cors = match state.config.allowed_origin.as_deref() {
        Some(origin) => Some(cors_layer(origin)?),
        None => None,
    };

    let app = Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/api/messages", get(get_messages))
        .route("/api/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    Ok(match cors {
        Some(cors) => app.layer(cors),
        None => app,
    })
}

fn cors_layer(origin: &str) -> Result<CorsLayer, ServerError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origin == "*" {
        return Ok(layer.allow_origin(Any));
    }

    let origin = HeaderValue::from_str(origin)
        .map_err(|_| ServerError::InvalidOrigin(origin.to_string()))?;
    Ok(layer.allow_origin(origin))
}

/// WebSocket chat relay server
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemoryMessageStore::new());
/// let server = Server::new(ServerConfig::default(), store);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    config: ServerConfig,
    /// MessageStore（永続化の抽象化）
    store: Arc<dyn MessageStore>,
    clock: Arc<dyn Clock>,
}

impl Server {
    /// Create a new Server instance using the system clock
    pub fn new(config: ServerConfig, store: Arc<dyn MessageStore>) -> Self {
        Self {
            config,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Run the relay until Ctrl+C or SIGTERM.
    ///
    /// On a stop signal the hub is shut down first, so every client receives a
    /// close frame, then the HTTP server drains. Before returning, waits up to
    /// twice the write timeout for websocket writers to flush.
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "0.0.0.0")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, if the server fails
    /// to bind to the specified address or if there's an error during server
    /// execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), ServerError> {
        self.config.validate()?;

        let state = Arc::new(AppState::new(self.config, self.store, self.clock));
        let hub = state.hub.clone();
        let active_connections = state.active_connections.clone();
        // close フレームの送信と sender.close() がそれぞれ write_timeout まで待つ
        let drain_limit = state.config.write_timeout * 2;
        let app = build_router(state)?;

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: bind_addr.clone(),
                source,
            })?;

        let local_addr = listener.local_addr().map_err(ServerError::Serve)?;
        tracing::info!("Chat relay listening on {}", local_addr);
        tracing::info!("Connect to: ws://{}/ws", local_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                tracing::info!("Closing client connections ...");
                let closed = hub.shutdown().await;
                tracing::info!(closed, "Client connections closed");
            })
            .await
            .map_err(ServerError::Serve)?;

        if !active_connections.wait_idle(drain_limit).await {
            tracing::warn!(
                remaining = active_connections.count(),
                "Connections still open after {:?}, exiting anyway",
                drain_limit
            );
        }

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
