//! # Asset API Handlers
//!
//! Descriptive fields are edited directly. Status moves only through
//! `POST /api/v1/assets/{id}/status`, which runs the transition validator;
//! `assigned` and `maintenance` are reached through the assignment and
//! maintenance endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ApiJson, ApiQuery, ListResponse, double_option, utc, utc_opt};
use crate::auth::{ActorExtension, TenantExtension, TenantHeader};
use crate::error::ApiError;
use crate::lifecycle::{
    AssetStatus, DeleteTarget, EntityKind, LifecycleStatus, TransitionContext, TransitionRequest,
};
use crate::models::asset;
use crate::repositories::{AssetFilter, AssetRepository, CreateAsset, Page, UpdateAsset};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAssetDto {
    #[schema(example = "ThinkPad X1 Carbon")]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub serial_number: Option<String>,
    pub model_number: Option<String>,
    pub manufacturer: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub purchase_price: Option<f64>,
    pub warranty_expiry: Option<DateTime<Utc>>,
    pub location_id: Option<Uuid>,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub barcode: Option<String>,
    /// `procurement` or `in_stock` (default)
    pub status: Option<AssetStatus>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateAssetDto {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub serial_number: Option<String>,
    pub model_number: Option<String>,
    pub manufacturer: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub purchase_price: Option<f64>,
    pub warranty_expiry: Option<DateTime<Utc>>,
    /// `null` removes the asset from its location
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub location_id: Option<Option<Uuid>>,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub barcode: Option<String>,
}

/// Direct status change request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssetStatusChangeDto {
    #[schema(example = "retired")]
    pub status: AssetStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssetDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub serial_number: Option<String>,
    pub model_number: Option<String>,
    pub manufacturer: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub purchase_price: Option<f64>,
    pub warranty_expiry: Option<DateTime<Utc>>,
    #[schema(example = "in_stock")]
    pub status: String,
    pub location_id: Option<Uuid>,
    pub current_assignee_id: Option<Uuid>,
    pub notes: Option<String>,
    pub tags: Option<String>,
    pub barcode: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<asset::Model> for AssetDto {
    fn from(model: asset::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            category_id: model.category_id,
            serial_number: model.serial_number,
            model_number: model.model_number,
            manufacturer: model.manufacturer,
            purchase_date: utc_opt(model.purchase_date),
            purchase_price: model.purchase_price,
            warranty_expiry: utc_opt(model.warranty_expiry),
            status: model.status,
            location_id: model.location_id,
            current_assignee_id: model.current_assignee_id,
            notes: model.notes,
            tags: model.tags,
            barcode: model.barcode,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct ListAssetsQuery {
    pub category_id: Option<Uuid>,
    #[param(value_type = Option<String>)]
    pub status: Option<AssetStatus>,
    pub location_id: Option<Uuid>,
    /// Person currently holding the asset
    pub assignee_id: Option<Uuid>,
    /// Case-sensitive match on name or serial number
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    post,
    path = "/api/v1/assets",
    params(TenantHeader),
    request_body = CreateAssetDto,
    responses(
        (status = 201, description = "Asset created", body = AssetDto),
        (status = 400, description = "Validation failed or unknown reference", body = ApiError)
    ),
    tag = "assets"
)]
pub async fn create_asset(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    ApiJson(body): ApiJson<CreateAssetDto>,
) -> Result<(StatusCode, Json<AssetDto>), ApiError> {
    let asset = state
        .lifecycle
        .create_asset(
            actor,
            body.status,
            CreateAsset {
                name: body.name,
                description: body.description,
                category_id: body.category_id,
                serial_number: body.serial_number,
                model_number: body.model_number,
                manufacturer: body.manufacturer,
                purchase_date: body.purchase_date,
                purchase_price: body.purchase_price,
                warranty_expiry: body.warranty_expiry,
                location_id: body.location_id,
                notes: body.notes,
                tags: body.tags,
                barcode: body.barcode,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(asset.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/assets",
    params(TenantHeader, ListAssetsQuery),
    responses(
        (status = 200, description = "Assets", body = ListResponse<AssetDto>),
        (status = 400, description = "Invalid filter", body = ApiError)
    ),
    tag = "assets"
)]
pub async fn list_assets(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    ApiQuery(query): ApiQuery<ListAssetsQuery>,
) -> Result<Json<ListResponse<AssetDto>>, ApiError> {
    let page = Page::new(query.limit, query.offset);
    let filter = AssetFilter {
        category_id: query.category_id,
        status: query.status.map(|status| status.as_str().to_string()),
        location_id: query.location_id,
        assignee_id: query.assignee_id,
        search: query.search,
    };
    let assets = AssetRepository::new(&state.db)
        .list(tenant.0, filter, page)
        .await?;
    Ok(Json(ListResponse::new(assets, page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/assets/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Asset UUID")),
    responses(
        (status = 200, description = "Asset", body = AssetDto),
        (status = 404, description = "Asset not found", body = ApiError)
    ),
    tag = "assets"
)]
pub async fn get_asset(
    State(state): State<AppState>,
    TenantExtension(tenant): TenantExtension,
    Path(id): Path<Uuid>,
) -> Result<Json<AssetDto>, ApiError> {
    AssetRepository::new(&state.db)
        .get(tenant.0, id)
        .await?
        .map(|asset| Json(asset.into()))
        .ok_or_else(|| ApiError::not_found(format!("asset {id} not found")))
}

#[utoipa::path(
    patch,
    path = "/api/v1/assets/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Asset UUID")),
    request_body = UpdateAssetDto,
    responses(
        (status = 200, description = "Asset updated", body = AssetDto),
        (status = 400, description = "Validation failed or unknown reference", body = ApiError),
        (status = 404, description = "Asset not found", body = ApiError)
    ),
    tag = "assets"
)]
pub async fn update_asset(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateAssetDto>,
) -> Result<Json<AssetDto>, ApiError> {
    let asset = state
        .lifecycle
        .update_asset(
            actor,
            id,
            UpdateAsset {
                name: body.name,
                description: body.description,
                category_id: body.category_id,
                serial_number: body.serial_number,
                model_number: body.model_number,
                manufacturer: body.manufacturer,
                purchase_date: body.purchase_date,
                purchase_price: body.purchase_price,
                warranty_expiry: body.warranty_expiry,
                location_id: body.location_id,
                notes: body.notes,
                tags: body.tags,
                barcode: body.barcode,
            },
        )
        .await?;
    Ok(Json(asset.into()))
}

/// Move an asset along its status table (e.g. procurement → in_stock → retired)
#[utoipa::path(
    post,
    path = "/api/v1/assets/{id}/status",
    params(TenantHeader, ("id" = Uuid, Path, description = "Asset UUID")),
    request_body = AssetStatusChangeDto,
    responses(
        (status = 200, description = "Status changed", body = AssetDto),
        (status = 404, description = "Asset not found", body = ApiError),
        (status = 409, description = "Transition not allowed from the current status", body = ApiError)
    ),
    tag = "assets"
)]
pub async fn change_asset_status(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<AssetStatusChangeDto>,
) -> Result<Json<AssetDto>, ApiError> {
    state
        .lifecycle
        .transition(
            TransitionRequest::Asset {
                id,
                to: body.status,
            },
            TransitionContext::new(actor),
        )
        .await?;

    AssetRepository::new(&state.db)
        .get(actor.tenant_id, id)
        .await?
        .map(|asset| Json(asset.into()))
        .ok_or_else(|| ApiError::not_found(format!("asset {id} not found")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/assets/{id}",
    params(TenantHeader, ("id" = Uuid, Path, description = "Asset UUID")),
    responses(
        (status = 204, description = "Asset deleted"),
        (status = 404, description = "Asset not found", body = ApiError),
        (status = 409, description = "Asset is assigned or has open maintenance", body = ApiError)
    ),
    tag = "assets"
)]
pub async fn delete_asset(
    State(state): State<AppState>,
    ActorExtension(actor): ActorExtension,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .lifecycle
        .delete(actor, DeleteTarget::new(EntityKind::Asset, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
