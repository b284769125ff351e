//! # Tenants API Handlers
//!
//! Tenants are the isolation boundary. These endpoints sit outside the
//! tenant-header middleware.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::types::{ApiJson, utc};
use crate::error::ApiError;
use crate::models::tenant;
use crate::repositories::{CreateTenantRequest, TenantRepository};
use crate::server::AppState;

/// Request payload for creating a new tenant
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTenantRequestDto {
    /// Display name for the tenant (required, max 255 characters)
    #[schema(example = "Acme Corp")]
    pub name: String,
}

/// Tenant representation returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantDto {
    /// Unique identifier for the tenant
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    /// Display name of the tenant
    #[schema(example = "Acme Corp")]
    pub name: Option<String>,
    /// Timestamp when the tenant was created
    pub created_at: DateTime<Utc>,
}

impl From<tenant::Model> for TenantDto {
    fn from(model: tenant::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: utc(model.created_at),
        }
    }
}

/// Tenant collection response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TenantsResponse {
    pub tenants: Vec<TenantDto>,
}

/// Create a new tenant
#[utoipa::path(
    post,
    path = "/api/v1/tenants",
    request_body = CreateTenantRequestDto,
    responses(
        (status = 201, description = "Tenant created successfully", body = TenantDto, headers(
            ("Location", description = "URL of the created tenant")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn create_tenant(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTenantRequestDto>,
) -> Result<(StatusCode, [(&'static str, String); 1], Json<TenantDto>), ApiError> {
    let tenant = TenantRepository::new(&state.db)
        .create(
            CreateTenantRequest { name: request.name },
            state.lifecycle.clock().now(),
        )
        .await?;

    tracing::info!(tenant_id = %tenant.id, "Tenant created");
    let location = format!("/api/v1/tenants/{}", tenant.id);
    Ok((
        StatusCode::CREATED,
        [("Location", location)],
        Json(tenant.into()),
    ))
}

/// List every tenant
#[utoipa::path(
    get,
    path = "/api/v1/tenants",
    responses(
        (status = 200, description = "Tenants", body = TenantsResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn list_tenants(State(state): State<AppState>) -> Result<Json<TenantsResponse>, ApiError> {
    let tenants = TenantRepository::new(&state.db).list().await?;
    Ok(Json(TenantsResponse {
        tenants: tenants.into_iter().map(TenantDto::from).collect(),
    }))
}

/// Get a tenant by ID
#[utoipa::path(
    get,
    path = "/api/v1/tenants/{id}",
    params(
        ("id" = Uuid, Path, description = "Tenant UUID")
    ),
    responses(
        (status = 200, description = "Tenant retrieved successfully", body = TenantDto),
        (status = 404, description = "Tenant not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "tenants"
)]
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<TenantDto>, ApiError> {
    TenantRepository::new(&state.db)
        .get(tenant_id)
        .await?
        .map(|tenant| Json(tenant.into()))
        .ok_or_else(|| ApiError::not_found(format!("tenant {tenant_id} not found")))
}
