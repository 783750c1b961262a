//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::domain::SharedLobbyStore;

use super::{
    handler::{
        create_lobby, delete_lobby, fetch_lobby, health_check, update_lobby, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Lobby document service
///
/// # Example
///
/// ```ignore
/// let server = Server::new(Arc::new(InMemoryLobbyStore::conditional()));
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// SharedLobbyStore（共有文書ストアの抽象化）
    store: Arc<dyn SharedLobbyStore>,
}

impl Server {
    pub fn new(store: Arc<dyn SharedLobbyStore>) -> Self {
        Self { store }
    }

    /// Build the router without binding it, for embedding and tests
    pub fn router(self) -> Router {
        let app_state = Arc::new(AppState { store: self.store });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws/lobbies/{code}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route(
                "/api/lobbies/{code}",
                post(create_lobby)
                    .get(fetch_lobby)
                    .patch(update_lobby)
                    .delete(delete_lobby),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the lobby document service
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let conditional_writes = self.store.capabilities().conditional_writes;
        let app = self.router();

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Lobby store listening on {} ({})",
            listener.local_addr()?,
            if conditional_writes {
                "conditional writes"
            } else {
                "last-write-wins"
            }
        );
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
