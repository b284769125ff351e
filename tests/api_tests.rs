//! Router-level tests: requests go through the middleware stack and
//! handlers into SQLite, and the JSON error bodies are checked.

mod test_utils;

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use kontena::config::AppConfig;
use kontena::server::{AppState, create_app};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use test_utils::{TenantFixture, insert_asset, seed_tenant, setup_test_db};

async fn test_app() -> Result<(Router, DatabaseConnection, TenantFixture)> {
    let db = setup_test_db().await?;
    let fx = seed_tenant(&db, "Acme").await?;
    let app = create_app(AppState::new(AppConfig::default(), db.clone()));
    Ok((app, db, fx))
}

fn request(method: Method, uri: &str, fx: &TenantFixture, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Tenant-Id", fx.tenant_id.to_string())
        .header("X-Person-Id", fx.requester.id.to_string());
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

#[tokio::test]
async fn tenant_routes_require_tenant_header() -> Result<()> {
    let (app, _db, _fx) = test_app().await?;

    let request = Request::builder()
        .uri("/api/v1/assets")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert!(body["details"].get("X-Tenant-Id").is_some());
    Ok(())
}

#[tokio::test]
async fn asset_assignment_round_trip() -> Result<()> {
    let (app, _db, fx) = test_app().await?;

    let (status, asset) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/assets",
            &fx,
            Some(json!({
                "name": "ThinkPad X1 Carbon",
                "category_id": fx.category.id,
                "location_id": fx.location.id,
                "serial_number": "PF-12345"
            })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(asset["status"], "in_stock");
    let asset_id = asset["id"].as_str().unwrap().to_string();

    let (status, assignment) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/assignments",
            &fx,
            Some(json!({ "asset_id": asset_id, "assigned_to_id": fx.manager.id })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(assignment["status"], "active");
    assert_eq!(assignment["assigned_by_id"], fx.requester.id.to_string());

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/assignments",
            &fx,
            Some(json!({ "asset_id": asset_id, "assigned_to_id": fx.requester.id })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_ASSIGNED");

    let (status, assigned) = send(
        &app,
        request(Method::GET, "/api/v1/assets?status=assigned", &fx, None),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["data"].as_array().unwrap().len(), 1);

    let assignment_id = assignment["id"].as_str().unwrap();
    let (status, returned) = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/v1/assignments/{assignment_id}"),
            &fx,
            Some(json!({ "status": "returned" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "returned");
    assert!(returned["return_date"].is_string());

    let (_, asset) = send(
        &app,
        request(Method::GET, &format!("/api/v1/assets/{asset_id}"), &fx, None),
    )
    .await?;
    assert_eq!(asset["status"], "in_stock");
    assert!(asset["current_assignee_id"].is_null());
    Ok(())
}

#[tokio::test]
async fn illegal_status_change_is_a_conflict() -> Result<()> {
    let (app, db, fx) = test_app().await?;
    let asset = insert_asset(&db, &fx, "laptop-1", "in_stock").await?;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/api/v1/assets/{}/status", asset.id),
            &fx,
            Some(json!({ "status": "maintenance" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ILLEGAL_TRANSITION");

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/api/v1/assets/{}/status", asset.id),
            &fx,
            Some(json!({ "status": "retired" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "retired");
    Ok(())
}

#[tokio::test]
async fn procurement_request_approval_over_http() -> Result<()> {
    let (app, _db, fx) = test_app().await?;

    let (status, created) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/procurement",
            &fx,
            Some(json!({
                "notes": "Q1 hires",
                "items": [{
                    "category_id": fx.category.id,
                    "description": "Developer laptop",
                    "quantity": 3,
                    "estimated_price": 1000.0
                }]
            })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "draft");
    assert!(created["request_number"].as_str().unwrap().starts_with("PR-"));
    assert_eq!(created["total_budget"], 3000.0);
    assert_eq!(created["items"].as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/procurement/{}", created["id"].as_str().unwrap());
    let (status, submitted) = send(
        &app,
        request(Method::PATCH, &uri, &fx, Some(json!({ "status": "submitted" }))),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "submitted");

    let (status, body) = send(
        &app,
        request(Method::PATCH, &uri, &fx, Some(json!({ "status": "approved" }))),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, approved) = send(
        &app,
        request(
            Method::PATCH,
            &uri,
            &fx,
            Some(json!({ "status": "approved", "approver_id": fx.manager.id })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["approved_by_id"], fx.manager.id.to_string());
    assert!(approved["approval_date"].is_string());

    let (status, body) = send(
        &app,
        request(Method::DELETE, &uri, &fx, None),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NOT_EDITABLE");
    Ok(())
}

#[tokio::test]
async fn deletion_guard_is_reported_before_and_on_delete() -> Result<()> {
    let (app, db, fx) = test_app().await?;
    insert_asset(&db, &fx, "laptop-1", "in_stock").await?;

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            &format!(
                "/api/v1/lifecycle/can-delete?entity_type=asset_category&id={}",
                fx.category.id
            ),
            &fx,
            None,
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletable"], false);
    assert_eq!(body["entity_type"], "asset_category");

    let (status, body) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/api/v1/categories/{}", fx.category.id),
            &fx,
            None,
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "HAS_DEPENDENTS");

    let (status, _) = send(
        &app,
        request(
            Method::GET,
            &format!(
                "/api/v1/lifecycle/can-delete?entity_type=vendor&id={}",
                Uuid::new_v4()
            ),
            &fx,
            None,
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn transitions_lookup_lists_next_statuses() -> Result<()> {
    let (app, _db, fx) = test_app().await?;

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            "/api/v1/lifecycle/transitions?entity_type=maintenance_record&from=scheduled",
            &fx,
            None,
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let allowed: Vec<&str> = body["allowed"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(allowed.contains(&"in_progress"));
    assert!(allowed.contains(&"cancelled"));
    assert!(!allowed.contains(&"completed"));
    Ok(())
}

#[tokio::test]
async fn malformed_input_is_reported_as_problem_json() -> Result<()> {
    let (app, _db, fx) = test_app().await?;

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/assets")
        .header("X-Tenant-Id", fx.tenant_id.to_string())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.clone().oneshot(malformed).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert!(body["trace_id"].is_string());

    // Well-formed JSON of the wrong shape
    let (status, body) = send(
        &app,
        request_with_body(&fx, json!({ "name": "Monitor", "category_id": "not-a-uuid" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/v1/assets?limit=many", &fx, None),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    Ok(())
}

fn request_with_body(fx: &TenantFixture, body: Value) -> Request<Body> {
    request(Method::POST, "/api/v1/assets", fx, Some(body))
}
