//! # Tests for Handlers
//!
//! Handler-level tests that call the functions directly, without a router.

use crate::config::AppConfig;
use crate::handlers::lifecycle::{TransitionsQuery, list_transitions};
use crate::handlers::types::ApiQuery;
use crate::handlers::{health, root};
use crate::models::ServiceInfo;
use crate::server::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;

async fn sqlite_state() -> AppState {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None).await.expect("Failed to migrate");
    AppState::new(AppConfig::default(), db)
}

#[tokio::test]
async fn test_root_handler_returns_expected_service_info() {
    let Json(service_info) = root().await;

    assert_eq!(service_info.service, "kontena");
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_root_handler_returns_valid_json() {
    let Json(service_info) = root().await;

    // Convert to JSON value to verify it can be serialized
    let json_value: Value =
        serde_json::to_value(&service_info).expect("Failed to serialize ServiceInfo");

    assert_eq!(json_value["service"], "kontena");
    assert!(json_value.get("version").is_some());
}

#[test]
fn test_service_info_default() {
    let service_info = ServiceInfo::default();

    assert_eq!(service_info.service, "kontena");
    assert_eq!(service_info.version, "0.1.0");
}

#[tokio::test]
async fn test_health_reports_ok_with_reachable_database() {
    let state = sqlite_state().await;

    let (status, Json(body)) = health(State(state)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.status, "ok");
    assert_eq!(body.database, "ok");
}

#[tokio::test]
async fn test_health_reports_unavailable_without_database() {
    // A disconnected handle fails every query
    let state = AppState::new(AppConfig::default(), DatabaseConnection::default());

    let (status, Json(body)) = health(State(state)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body.status, "unavailable");
}

#[tokio::test]
async fn test_transitions_lookup_normalizes_entity_type() {
    let query = TransitionsQuery {
        entity_type: "ProcurementRequest".to_string(),
        from: "submitted".to_string(),
    };

    let Json(body) = list_transitions(ApiQuery(query)).await.unwrap();

    assert_eq!(body.entity_type, "procurement_request");
    assert_eq!(body.from, "submitted");
    assert!(body.allowed.contains(&"approved".to_string()));
    assert!(body.allowed.contains(&"rejected".to_string()));
    assert!(!body.allowed.contains(&"ordered".to_string()));
}

#[tokio::test]
async fn test_transitions_lookup_rejects_unknown_values() {
    let unknown_kind = TransitionsQuery {
        entity_type: "spaceship".to_string(),
        from: "docked".to_string(),
    };
    let response = list_transitions(ApiQuery(unknown_kind))
        .await
        .unwrap_err()
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let unknown_status = TransitionsQuery {
        entity_type: "asset".to_string(),
        from: "lost".to_string(),
    };
    let response = list_transitions(ApiQuery(unknown_status))
        .await
        .unwrap_err()
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transitions_lookup_terminal_status_is_empty() {
    let query = TransitionsQuery {
        entity_type: "asset".to_string(),
        from: "retired".to_string(),
    };

    let Json(body) = list_transitions(ApiQuery(query)).await.unwrap();

    assert!(body.allowed.is_empty());
}
