//! # Maintenance API Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ApiJson, ApiQuery, ListResponse, utc, utc_opt};
use crate::auth::{ActorExtension, TenantExtension, TenantHeader};
use crate::error::ApiError;
use crate::lifecycle::{
    DeleteTarget, EntityKind, LifecycleStatus, MaintenanceStatus, MaintenanceType, NewMaintenance,
    TransitionContext,
};
use crate::models::maintenance_record;
use crate::repositories::{MaintenanceFilter, MaintenanceRepository, Page, UpdateMaintenance};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMaintenanceDto {
    pub asset_id: Uuid,
    pub maintenance_type: MaintenanceType,
    /// `scheduled` (default) or `in_progress`; the latter takes the asset
    /// out of service immediately
    pub status: Option<MaintenanceStatus>,
    pub scheduled_date: DateTime<Utc>,
    pub performed_by_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub cost: Option<f64>,
    #[schema(example = "Replace battery")]
    pub description: String,
    pub results: Option<String>,
    pub next_scheduled: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateMaintenanceDto {
    pub description: Option<String>,
    pub results: Option<String>,
    pub cost: Option<f64>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub performed_by_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub next_scheduled: Option<DateTime<Utc>>,
    #[schema(example = "completed")]
    pub status: Option<MaintenanceStatus>,
    /// Recorded on completion; defaults to now
    pub completed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceDto {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub maintenance_type: String,
    pub status: String,
    pub scheduled_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub performed_by_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub cost: Option<f64>,
    pub description: String,
    pub results: Option<String>,
    pub next_scheduled: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<maintenance_record::Model> for MaintenanceDto {
    fn from(model: maintenance_record::Model) -> Self {
        Self {
            id: model.id,
            asset_id: model.asset_id,
            maintenance_type: model.maintenance_type,
            status: model.status,
            scheduled_date: utc(model.scheduled_date),
            completed_date: utc_opt(model.completed_date),
            performed_by_id: model.performed_by_id,
            vendor_id: model.vendor_id,
            cost: model.cost,
            description: model.description,
            results: model.results,
            next_scheduled: utc_opt(model.next_scheduled),
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct ListMaintenanceQuery {
    pub asset_id: Option<Uuid>,
    #[param(value_type = Option<String>)]
    pub status: Option<MaintenanceStatus>,
    #[param(value_type = Option<String>)]
    pub maintenance_type: Option<MaintenanceType>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/maintenance",
    params(TenantHeader),
    request_body = CreateMaintenanceDto,
    responses(
        (status = 201, description = "Maintenance recorded", body = MaintenanceDto),
        (status = 400, description = "Validation failed or unknown reference", body = ApiError),
        (status = 409, description = "Asset unavailable for maintenance", body = ApiError)
    ),
    tag = "maintenance"
)]
pub async fn create_maintenance(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    ApiJson(body): ApiJson<CreateMaintenanceDto>,
) -> Result<(StatusCode, Json<MaintenanceDto>), ApiError> {
    let record = state
        .lifecycle
        .create_maintenance(
            actor,
            NewMaintenance {
                asset_id: body.asset_id,
                maintenance_type: body.maintenance_type,
                status: body.status,
                scheduled_date: body.scheduled_date,
                performed_by_id: body.performed_by_id,
                vendor_id: body.vendor_id,
                cost: body.cost,
                description: body.description,
                results: body.results,
                next_scheduled: body.next_scheduled,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/maintenance",
    params(TenantHeader, ListMaintenanceQuery),
    responses(
        (status = 200, description = "Maintenance records", body = ListResponse<MaintenanceDto>)
    ),
    tag = "maintenance"
)]
pub async fn list_maintenance(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    ApiQuery(query): ApiQuery<ListMaintenanceQuery>,
) -> Result<Json<ListResponse<MaintenanceDto>>, ApiError> {
    let page = Page::new(query.limit, query.offset);
    let filter = MaintenanceFilter {
        asset_id: query.asset_id,
        status: query.status.map(|status| status.as_str().to_string()),
        maintenance_type: query.maintenance_type.map(|kind| kind.as_str().to_string()),
    };
    let records = MaintenanceRepository::new(&state.db)
        .list(tenant.0, filter, page)
        .await?;
    Ok(Json(ListResponse::new(records, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/maintenance/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Maintenance record UUID")),
    responses(
        (status = 200, description = "Maintenance record", body = MaintenanceDto),
        (status = 404, description = "Maintenance record not found", body = ApiError)
    ),
    tag = "maintenance"
)]
pub async fn get_maintenance(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<MaintenanceDto>, ApiError> {
    MaintenanceRepository::new(&state.db)
        .get(tenant.0, id)
        .await?
        .map(|record| Json(record.into()))
        .ok_or_else(|| ApiError::not_found(format!("maintenance_record {id} not found")))
}

#[utoipa::path(
    patch,
    path = "/api/v1/maintenance/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Maintenance record UUID")),
    request_body = UpdateMaintenanceDto,
    responses(
        (status = 200, description = "Maintenance record updated", body = MaintenanceDto),
        (status = 404, description = "Maintenance record not found", body = ApiError),
        (status = 409, description = "Transition not allowed", body = ApiError)
    ),
    tag = "maintenance"
)]
pub async fn update_maintenance(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateMaintenanceDto>,
) -> Result<Json<MaintenanceDto>, ApiError> {
    let ctx = TransitionContext::new(actor).with_effective_date(body.completed_date);
    let record = state
        .lifecycle
        .update_maintenance(
            ctx,
            id,
            UpdateMaintenance {
                description: body.description,
                results: body.results,
                cost: body.cost,
                scheduled_date: body.scheduled_date,
                performed_by_id: body.performed_by_id,
                vendor_id: body.vendor_id,
                next_scheduled: body.next_scheduled,
            },
            body.status,
        )
        .await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/maintenance/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Maintenance record UUID")),
    responses(
        (status = 204, description = "Maintenance record deleted"),
        (status = 404, description = "Maintenance record not found", body = ApiError),
        (status = 409, description = "Only scheduled or cancelled records can be deleted", body = ApiError)
    ),
    tag = "maintenance"
)]
pub async fn delete_maintenance(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .lifecycle
        .delete(actor, DeleteTarget::new(EntityKind::MaintenanceRecord, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
