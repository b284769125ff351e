//! # API Handlers
//!
//! HTTP endpoint handlers for the Kontena API. Tenant-scoped resources live
//! under `/api/v1` and require the `X-Tenant-Id` header.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db;
use crate::models::ServiceInfo;
use crate::server::AppState;

pub mod assets;
pub mod assignments;
pub mod categories;
pub mod lifecycle;
pub mod locations;
pub mod maintenance;
pub mod people;
pub mod procurement;
pub mod purchase_orders;
pub mod tenants;
pub mod types;
pub mod vendors;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    /// "ok" when the database answered, "unavailable" otherwise
    #[schema(example = "ok")]
    pub status: String,
    /// Database connectivity
    #[schema(example = "ok")]
    pub database: String,
}

/// Reports whether the service can reach its database
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy", body = HealthStatus),
        (status = 503, description = "Database unreachable", body = HealthStatus)
    ),
    tag = "root"
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    match db::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthStatus {
                status: "ok".to_string(),
                database: "ok".to_string(),
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus {
                    status: "unavailable".to_string(),
                    database: "unreachable".to_string(),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests;
