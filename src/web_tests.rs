#![cfg(test)]

use super::web::*;
use crate::commands::CommandIssuer;
use crate::config::Config;
use crate::status::{AwningStatus, DerivedAwningState, RemoteAwningRecord, derive_state};
use crate::store::MemoryStore;
use axum::http::Request;
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::sync::watch;
use tower::ServiceExt;

type StateSender = watch::Sender<Option<Arc<DerivedAwningState>>>;

fn test_state(store: Arc<MemoryStore>) -> (AppState, StateSender) {
    let config = Config::default();
    let (tx, rx) = watch::channel(None);
    let issuer = CommandIssuer::new(config.commands.clone(), store, rx.clone());
    (
        AppState {
            issuer,
            state_rx: rx,
            config: Arc::new(config),
        },
        tx,
    )
}

#[tokio::test]
async fn health_ok() {
    let router = axum::Router::new().route("/api/health", get(health));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}

#[tokio::test]
async fn status_unavailable_before_first_notification() {
    let (state, _tx) = test_state(Arc::new(MemoryStore::new()));
    let router = axum::Router::new()
        .route("/api/status", get(status))
        .with_state(state);
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.status(),
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn status_returns_latest_derived_state() {
    let (state, tx) = test_state(Arc::new(MemoryStore::new()));
    let record: RemoteAwningRecord = serde_json::from_value(serde_json::json!({
        "requested_status": 2,
        "status": 1,
        "progress": 40,
    }))
    .unwrap();
    tx.send(Some(Arc::new(derive_state(&record)))).unwrap();

    let router = axum::Router::new()
        .route("/api/status", get(status))
        .with_state(state);
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], serde_json::json!("Opening"));
    assert_eq!(json["progress"], serde_json::json!(40));
}

#[tokio::test]
async fn stop_endpoint_writes_requested_status() {
    let store = Arc::new(MemoryStore::new());
    let (state, _tx) = test_state(store.clone());
    let router = axum::Router::new()
        .route("/api/stop", post(stop))
        .with_state(state);
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/stop")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["ok"], serde_json::json!(true));
    assert_eq!(store.field("requested_status"), Some(serde_json::json!(0)));
}

#[tokio::test]
async fn force_endpoint_parses_target() {
    let store = Arc::new(MemoryStore::new());
    let (state, _tx) = test_state(store.clone());
    let router = axum::Router::new()
        .route("/api/force", post(force))
        .with_state(state);
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/force")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(r#"{"target":"opened"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    assert_eq!(store.field("status"), Some(serde_json::json!(2)));
    assert_eq!(store.field("requested_status"), Some(serde_json::json!(2)));
    assert_eq!(store.field("progress"), Some(serde_json::json!(0)));
}

#[tokio::test]
async fn config_endpoint_redacts_password() {
    let store = Arc::new(MemoryStore::new());
    let (mut state, _tx) = test_state(store);
    let mut config = Config::default();
    config.credentials.password = "secret".to_string();
    state.config = Arc::new(config);

    let router = axum::Router::new()
        .route("/api/config", get(get_config))
        .with_state(state);
    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/config")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(!text.contains("secret"));
}

#[test]
fn force_target_maps_to_awning_status() {
    assert_eq!(
        AwningStatus::from(ForceTarget::Opened),
        AwningStatus::Opened
    );
    assert_eq!(
        AwningStatus::from(ForceTarget::Closed),
        AwningStatus::Closed
    );
}
