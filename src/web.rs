//! Axum-based HTTP surface
//!
//! Presentation clients consume the derived-state stream and issue the
//! awning commands through this API; their layout and navigation are not
//! this daemon's concern.

use crate::commands::CommandIssuer;
use crate::config::Config;
use crate::error::{Result, VelariumError};
use crate::status::{AwningStatus, DerivedAwningState};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub issuer: CommandIssuer,
    pub state_rx: watch::Receiver<Option<Arc<DerivedAwningState>>>,
    pub config: Arc<Config>,
}

/// Terminal status accepted by the force endpoint
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForceTarget {
    Opened,
    Closed,
}

impl From<ForceTarget> for AwningStatus {
    fn from(target: ForceTarget) -> Self {
        match target {
            ForceTarget::Opened => AwningStatus::Opened,
            ForceTarget::Closed => AwningStatus::Closed,
        }
    }
}

#[derive(Deserialize)]
pub struct ForceBody {
    pub target: ForceTarget,
}

#[derive(Deserialize)]
pub struct TimingsBody {
    pub opening_ms: Option<u64>,
    pub closing_ms: Option<u64>,
}

pub(crate) async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(crate) async fn status(State(state): State<AppState>) -> Response {
    let latest = state.state_rx.borrow().clone();
    match latest {
        Some(derived) => Json((*derived).clone()).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"error": "no state received yet"})),
        )
            .into_response(),
    }
}

pub(crate) async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let stream = WatchStream::new(state.state_rx.clone()).filter_map(|latest| {
        latest
            .and_then(|derived| Event::default().json_data(derived.as_ref()).ok())
            .map(Ok::<_, Infallible>)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub(crate) async fn open(State(state): State<AppState>) -> impl IntoResponse {
    let ok = state.issuer.request_open().await;
    Json(serde_json::json!({"ok": ok}))
}

pub(crate) async fn close(State(state): State<AppState>) -> impl IntoResponse {
    let ok = state.issuer.request_close().await;
    Json(serde_json::json!({"ok": ok}))
}

pub(crate) async fn stop(State(state): State<AppState>) -> impl IntoResponse {
    let ok = state.issuer.request_stop().await;
    Json(serde_json::json!({"ok": ok}))
}

pub(crate) async fn force(
    State(state): State<AppState>,
    Json(body): Json<ForceBody>,
) -> impl IntoResponse {
    let ok = state.issuer.force_status(body.target.into()).await;
    Json(serde_json::json!({"ok": ok}))
}

pub(crate) async fn timings(
    State(state): State<AppState>,
    Json(body): Json<TimingsBody>,
) -> impl IntoResponse {
    let mut ok = true;
    if let Some(ms) = body.opening_ms {
        ok &= state.issuer.set_opening_time(ms).await;
    }
    if let Some(ms) = body.closing_ms {
        ok &= state.issuer.set_closing_time(ms).await;
    }
    Json(serde_json::json!({"ok": ok}))
}

pub(crate) async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let json = serde_json::to_value(state.config.as_ref())
        .unwrap_or(serde_json::json!({"error": "serialization"}));
    Json(json)
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/api/events", get(events))
        .route("/api/open", post(open))
        .route("/api/close", post(close))
        .route("/api/stop", post(stop))
        .route("/api/force", post(force))
        .route("/api/timings", post(timings))
        .route("/api/config", get(get_config))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Serve the API until the process stops
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = router(state);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .unwrap_or(([127, 0, 0, 1], port).into());
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| VelariumError::web(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("Web API listening on {}", addr);
    axum::serve(listener, app)
        .await
        .map_err(|e| VelariumError::web(e.to_string()))?;
    Ok(())
}
