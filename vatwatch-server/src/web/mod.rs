//! Web server: axum JSON API over the live dashboard.
//!
//! Handlers only read the dashboard, except for airport selection, which
//! applies the event and forwards the resulting effects to the poller.

use std::future::Future;
use std::sync::{Arc, RwLock};

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use vatwatch_core::dashboard::{Dashboard, Effect};

pub mod routes;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub dashboard: Arc<RwLock<Dashboard>>,
    pub effects: mpsc::Sender<Effect>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/board", get(routes::api_board))
        .route("/api/weather", get(routes::api_weather))
        .route("/api/controllers", get(routes::api_controllers))
        .route("/api/atis", get(routes::api_atis))
        .route("/api/airport", post(routes::api_select_airport))
        .route("/api/status", get(routes::api_status))
        .route("/api/metar/decode", get(routes::api_metar_decode))
        .with_state(state)
        .layer(cors)
}

/// Serve the API until `shutdown` resolves.
pub async fn serve(
    state: Arc<AppState>,
    host: &str,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("vatwatch listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
