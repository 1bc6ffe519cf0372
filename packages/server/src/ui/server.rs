//! Server execution logic.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::handler::{
    create_room, get_room_detail, health_check, join_room, list_rooms, websocket_handler,
};
use super::signal::shutdown_signal;
use super::state::AppState;
use super::sweeper::run_presence_sweeper;

/// Lobby synchronization server
///
/// This struct encapsulates the server configuration and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(app_state, Duration::from_secs(10));
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// 全ユースケースを束ねた共有状態
    state: AppState,
    /// 期限切れプレゼンスの回収間隔
    sweep_interval: Duration,
}

impl Server {
    /// Create a new Server instance
    pub fn new(state: AppState, sweep_interval: Duration) -> Self {
        Self {
            state,
            sweep_interval,
        }
    }

    /// Run the lobby server
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
        let app_state = Arc::new(self.state);

        // Define handlers
        let app = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(list_rooms).post(create_room))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .route("/api/rooms/{room_id}/join", post(join_room))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state.clone());

        // 無音で死んだ接続を通常の切断経路に流すタスク
        let sweeper = tokio::spawn(run_presence_sweeper(app_state, self.sweep_interval));

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!("Lobby server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        sweeper.abort();
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
